use std::io::Cursor;

use carshow_votes::store;
use carshow_votes::voting::confirm::{self, PaidVote};

use crate::common::{TestApp, location};

async fn seed_vote(app: &TestApp, session: &str, qty: i32) {
    let show = app.active_show().await;
    let cars = app.cars(1).await;
    let paid = PaidVote {
        show_id: show.id,
        show_car_id: cars[0].id,
        category: "Air Force".into(),
        vote_qty: qty,
        amount_cents: qty * 100,
        stripe_session_id: session.into(),
    };
    confirm::record_paid_vote(&app.db, &paid).await.unwrap();
}

#[tokio::test]
async fn admin_pages_redirect_to_login() {
    let app = TestApp::spawn().await;

    let res = app.get("/admin/leaderboard").await;
    assert!(res.status().is_redirection());
    let to = location(&res);
    assert!(to.starts_with("/admin?"), "redirected to {to}");
    assert!(to.contains("next=%2Fadmin%2Fleaderboard"), "redirected to {to}");

    let res = app.post_form("/admin/reset-votes", &[]).await;
    assert!(res.status().is_redirection());
}

#[tokio::test]
async fn admin_index_shows_login_form_when_signed_out() {
    let app = TestApp::spawn().await;
    let res = app.get("/admin").await;
    assert_eq!(res.status(), 200);
    assert!(res.text().await.unwrap().contains("Log in"));
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = TestApp::spawn().await;
    let res = app
        .post_form(
            "/admin/login",
            &[("password", "guess"), ("next", "/admin/leaderboard")],
        )
        .await;
    assert_eq!(res.status(), 303);
    assert_eq!(location(&res), "/admin?next=%2Fadmin%2Fleaderboard");

    let body = app.text("/admin").await;
    assert!(body.contains("Incorrect password."));
    assert!(app.get("/admin/leaderboard").await.status().is_redirection());
}

#[tokio::test]
async fn login_follows_next_and_logout_ends_session() {
    let app = TestApp::spawn().await;
    let res = app
        .post_form(
            "/admin/login",
            &[
                ("password", crate::common::ADMIN_PASSWORD),
                ("next", "/admin/leaderboard"),
            ],
        )
        .await;
    assert_eq!(res.status(), 303);
    assert_eq!(location(&res), "/admin/leaderboard");
    assert_eq!(app.get("/admin/leaderboard").await.status(), 200);

    let body = app.text("/admin").await;
    assert!(body.contains("Log out"));

    let res = app.post_form("/admin/logout", &[]).await;
    assert_eq!(res.status(), 303);
    assert!(app.get("/admin/leaderboard").await.status().is_redirection());
}

#[tokio::test]
async fn votes_csv_download() {
    let app = TestApp::spawn().await;
    seed_vote(&app, "cs_csv", 7).await;
    app.login().await;

    let res = app.get("/admin/export-votes.csv").await;
    assert_eq!(res.status(), 200);
    let content_type = res.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/csv"));
    let disposition = res.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.contains("votes_export.csv"));

    let body = res.text().await.unwrap();
    let mut lines = body.lines();
    assert!(lines.next().unwrap().starts_with("created_at,category,vote_qty"));
    let row = lines.next().unwrap();
    assert!(row.contains("Air Force"));
    assert!(row.contains("cs_csv"));
    assert!(lines.next().is_none());
}

#[tokio::test]
async fn reset_votes_returns_snapshot_then_clears() {
    let app = TestApp::spawn().await;
    seed_vote(&app, "cs_reset", 2).await;
    app.login().await;

    let res = app.post_form("/admin/reset-votes", &[]).await;
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "application/zip");
    let bytes = res.bytes().await.unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    assert_eq!(archive.len(), 6);

    let mut votes = String::new();
    std::io::Read::read_to_string(&mut archive.by_name("votes.csv").unwrap(), &mut votes)
        .unwrap();
    assert!(votes.contains("cs_reset"));

    assert_eq!(
        store::vote::count_for_session(&app.db, "cs_reset")
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn close_voting_and_export_closes_the_show() {
    let app = TestApp::spawn().await;
    app.login().await;

    let res = app.post_form("/admin/close-voting-and-export", &[]).await;
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "application/zip");
    assert!(!app.active_show().await.voting_open);

    let res = app.post_form("/admin/open-voting", &[]).await;
    assert_eq!(res.status(), 303);
    assert!(app.active_show().await.voting_open);

    app.post_form("/admin/toggle-voting", &[]).await;
    assert!(!app.active_show().await.voting_open);
}

#[tokio::test]
async fn placeholders_skip_taken_numbers() {
    let app = TestApp::spawn().await;
    app.login().await;

    let res = app
        .post_form("/admin/placeholders/create", &[("start_number", "1"), ("count", "5")])
        .await;
    assert_eq!(res.status(), 303);
    assert_eq!(location(&res), "/admin/placeholders");
    assert!(app.text("/admin/placeholders").await.contains("Created 5 placeholder cars."));

    app.post_form("/admin/placeholders/create", &[("start_number", "3"), ("count", "5")])
        .await;
    assert!(app.text("/admin/placeholders").await.contains("Created 2 placeholder cars."));

    let show = app.active_show().await;
    let cars = store::car::list_show_cars(&app.db, show.id).await.unwrap();
    assert_eq!(cars.len(), 7);

    app.post_form("/admin/placeholders/create", &[("start_number", "1"), ("count", "0")])
        .await;
    assert!(app.text("/admin/placeholders").await.contains("Invalid placeholder range."));
}

#[tokio::test]
async fn waiver_receipt_is_recorded() {
    let app = TestApp::spawn().await;
    let car = app.cars(1).await.remove(0);
    app.login().await;

    let res = app
        .post_form("/admin/waiver-received", &[("show_car_id", &car.id.to_string())])
        .await;
    assert_eq!(res.status(), 303);

    let show = app.active_show().await;
    let cars = store::car::list_show_cars(&app.db, show.id).await.unwrap();
    assert_eq!(cars[0].car.waiver_received_by.as_deref(), Some("admin"));
    assert!(cars[0].car.waiver_received_at.is_some());
}

#[tokio::test]
async fn sponsors_can_be_added_and_removed() {
    let app = TestApp::spawn().await;
    let show = app.active_show().await;
    app.login().await;

    app.post_form(
        "/admin/sponsors/add",
        &[("name", "Acme Detailing"), ("placement", "title")],
    )
    .await;
    app.post_form(
        "/admin/sponsors/add",
        &[("name", "Bolt Tires"), ("sort_order", "5")],
    )
    .await;

    let listing = store::sponsor::show_sponsors(&app.db, show.id).await.unwrap();
    let title = listing.title_sponsor.clone().unwrap();
    assert_eq!(title.name, "Acme Detailing");
    assert_eq!(listing.sponsors.len(), 1);
    assert_eq!(listing.sponsors[0].name, "Bolt Tires");

    let body = app.text("/").await;
    assert!(body.contains("Acme Detailing"));

    app.post_form(
        "/admin/sponsors/remove",
        &[("sponsor_id", &listing.sponsors[0].id.to_string())],
    )
    .await;
    let listing = store::sponsor::show_sponsors(&app.db, show.id).await.unwrap();
    assert!(listing.sponsors.is_empty());

    let res = app.post_form("/admin/sponsors/add", &[("name", "  ")]).await;
    assert_eq!(res.status(), 303);
    assert!(app.text("/admin/sponsors").await.contains("Sponsor name is required."));
}

#[tokio::test]
async fn shows_can_be_created_and_activated() {
    let app = TestApp::spawn().await;
    app.login().await;

    app.post_form(
        "/admin/shows/create",
        &[("slug", "fall-classic"), ("title", "Fall Classic")],
    )
    .await;
    let created = store::show::get_show_by_slug(&app.db, "fall-classic")
        .await
        .unwrap()
        .unwrap();
    assert!(!created.is_active);

    app.post_form("/admin/shows/create", &[("slug", "Bad Slug!"), ("title", "x")])
        .await;
    assert!(app.text("/admin").await.contains("Slug may only contain"));

    app.post_form("/admin/shows/activate", &[("show_id", &created.id.to_string())])
        .await;
    let active = app.active_show().await;
    assert_eq!(active.slug, "fall-classic");

    let shows = store::show::list_shows(&app.db).await.unwrap();
    assert_eq!(shows.iter().filter(|s| s.is_active).count(), 1);
}
