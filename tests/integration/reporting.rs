use std::collections::BTreeSet;
use std::io::Cursor;

use carshow_votes::export;
use carshow_votes::store;
use carshow_votes::voting::confirm::{self, PaidVote};
use carshow_votes::voting::leaderboard;

use crate::common::TestDb;

async fn cast(t: &TestDb, session: &str, show_id: i32, car_id: i32, category: &str, qty: i32) {
    let paid = PaidVote {
        show_id,
        show_car_id: car_id,
        category: category.to_string(),
        vote_qty: qty,
        amount_cents: qty * 100,
        stripe_session_id: session.to_string(),
    };
    assert!(confirm::record_paid_vote(&t.db, &paid).await.unwrap());
}

/// Car 1: Army 2+1, Navy 2. Car 2: Army 5. Car 3: Navy 1. Car 4: nothing.
async fn seeded() -> (TestDb, carshow_votes::entities::show::Model, Vec<i32>) {
    let t = TestDb::new().await;
    let show = t.active_show().await;
    let ids: Vec<i32> = t.cars(4).await.iter().map(|car| car.id).collect();
    cast(&t, "cs_a", show.id, ids[0], "Army", 2).await;
    cast(&t, "cs_b", show.id, ids[0], "Army", 1).await;
    cast(&t, "cs_c", show.id, ids[1], "Army", 5).await;
    cast(&t, "cs_d", show.id, ids[2], "Navy", 1).await;
    cast(&t, "cs_e", show.id, ids[0], "Navy", 2).await;
    (t, show, ids)
}

#[tokio::test]
async fn leaderboard_sums_and_ranks_votes() {
    let (t, show, ids) = seeded().await;
    let board = leaderboard::leaderboard_for_show(&t.db, &show).await.unwrap();

    assert!(!board.is_final);
    assert_eq!(board.total_votes, 11);

    let categories: Vec<&str> = board.by_category.iter().map(|b| b.category.as_str()).collect();
    assert_eq!(categories, ["Army", "Navy"]);

    let army: Vec<(i32, i64)> = board.by_category[0]
        .entries
        .iter()
        .map(|e| (e.car_number, e.total_votes))
        .collect();
    assert_eq!(army, [(2, 5), (1, 3)]);

    let navy: Vec<(i32, i64)> = board.by_category[1]
        .entries
        .iter()
        .map(|e| (e.car_number, e.total_votes))
        .collect();
    assert_eq!(navy, [(1, 2), (3, 1)]);

    // Cars 1 and 2 tie at 5; the lower number ranks first.
    let overall: Vec<(i32, i64)> = board
        .overall
        .iter()
        .map(|e| (e.car_number, e.total_votes))
        .collect();
    assert_eq!(overall, [(1, 5), (2, 5), (3, 1)]);
    assert!(board.overall.iter().all(|e| e.show_car_id != ids[3]));
}

#[tokio::test]
async fn closed_voting_marks_leaderboard_final() {
    let (t, show, _) = seeded().await;
    store::show::set_voting_open(&t.db, show.id, false)
        .await
        .unwrap();
    let show = store::show::get_show(&t.db, show.id).await.unwrap().unwrap();

    let board = leaderboard::leaderboard_for_show(&t.db, &show).await.unwrap();
    assert!(board.is_final);
}

#[tokio::test]
async fn votes_csv_matches_stored_votes() {
    let (t, show, _) = seeded().await;
    let bytes = export::votes_csv_for_show(&t.db, show.id).await.unwrap();

    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.len(), export::VOTE_HEADERS.len());
    let qty_index = headers.iter().position(|h| h == "vote_qty").unwrap();

    let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    let stored = store::vote::votes_for_show(&t.db, show.id).await.unwrap();
    assert_eq!(records.len(), stored.len());

    let total: i32 = records
        .iter()
        .map(|r| r[qty_index].parse::<i32>().unwrap())
        .sum();
    assert_eq!(total, 11);
}

#[tokio::test]
async fn empty_show_exports_header_only() {
    let t = TestDb::new().await;
    let show = t.active_show().await;
    let bytes = export::votes_csv_for_show(&t.db, show.id).await.unwrap();

    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    assert_eq!(reader.headers().unwrap().len(), export::VOTE_HEADERS.len());
    assert_eq!(reader.records().count(), 0);
}

#[tokio::test]
async fn snapshot_contains_every_table() {
    let (t, show, _) = seeded().await;
    let (bytes, filename) = export::snapshot_zip(&t.db, &show).await.unwrap();

    assert!(filename.starts_with("snapshot_karman-charity-show_"));
    assert!(filename.ends_with(".zip"));

    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let names: BTreeSet<&str> = archive.file_names().collect();
    let expected: BTreeSet<&str> = [
        "show.csv",
        "cars.csv",
        "votes.csv",
        "sponsors.csv",
        "attendees.csv",
        "donations.csv",
    ]
    .into_iter()
    .collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn reset_clears_only_that_show() {
    let (t, show, _) = seeded().await;
    let deleted = store::vote::reset_votes_for_show(&t.db, show.id)
        .await
        .unwrap();
    assert_eq!(deleted, 5);

    let board = leaderboard::leaderboard_for_show(&t.db, &show).await.unwrap();
    assert_eq!(board.total_votes, 0);
    assert!(board.by_category.is_empty());
    assert!(board.overall.is_empty());
}

#[tokio::test]
async fn fresh_show_snapshot_has_headers_in_every_file() {
    let t = TestDb::new().await;
    let show = t.active_show().await;
    let (bytes, _) = export::snapshot_zip(&t.db, &show).await.unwrap();

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    assert_eq!(names.len(), 6);
    for name in names {
        let file = archive.by_name(&name).unwrap();
        let mut reader = csv::Reader::from_reader(file);
        let headers = reader.headers().unwrap().clone();
        assert!(!headers.is_empty(), "{name} has no header row");
        let rows = reader.records().count();
        let expected = if name == "show.csv" { 1 } else { 0 };
        assert_eq!(rows, expected, "{name}");
    }
}
