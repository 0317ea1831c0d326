//! End-of-show exports: the votes CSV and a ZIP snapshot of every table that
//! belongs to a show.

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DbErr};
use serde::Serialize;
use std::{
    collections::HashMap,
    io::{Cursor, Write},
};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::{
    entities::show,
    store::{self, car::CarWithOwner},
};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Database(#[from] DbErr),
}

pub const VOTE_HEADERS: &[&str] = &[
    "created_at",
    "category",
    "vote_qty",
    "amount_cents",
    "stripe_session_id",
    "car_number",
    "year",
    "make",
    "model",
    "owner_name",
    "owner_phone",
    "owner_email",
    "opt_in_future",
];

/// One vote joined with its car and owner. Field order matches [`VOTE_HEADERS`].
#[derive(Debug, Clone, Serialize)]
pub struct VoteExportRow {
    pub created_at: DateTime<Utc>,
    pub category: String,
    pub vote_qty: i32,
    pub amount_cents: i32,
    pub stripe_session_id: String,
    pub car_number: Option<i32>,
    pub year: String,
    pub make: String,
    pub model: String,
    pub owner_name: String,
    pub owner_phone: String,
    pub owner_email: String,
    pub opt_in_future: bool,
}

#[derive(Debug, Clone, Serialize)]
struct CarExportRow {
    car_number: i32,
    car_token: String,
    year: String,
    make: String,
    model: String,
    owner_name: String,
    owner_phone: String,
    owner_email: String,
    opt_in_future: bool,
    waiver_received: bool,
    waiver_received_at: Option<DateTime<Utc>>,
    waiver_received_by: Option<String>,
}

impl From<&CarWithOwner> for CarExportRow {
    fn from(row: &CarWithOwner) -> Self {
        let owner = row.owner.as_ref();
        Self {
            car_number: row.car.car_number,
            car_token: row.car.car_token.clone(),
            year: row.car.year.clone(),
            make: row.car.make.clone(),
            model: row.car.model.clone(),
            owner_name: owner.map(|o| o.name.clone()).unwrap_or_default(),
            owner_phone: owner.map(|o| o.phone.clone()).unwrap_or_default(),
            owner_email: owner.map(|o| o.email.clone()).unwrap_or_default(),
            opt_in_future: owner.is_some_and(|o| o.opt_in_future),
            waiver_received: row.car.waiver_received,
            waiver_received_at: row.car.waiver_received_at,
            waiver_received_by: row.car.waiver_received_by.clone(),
        }
    }
}

const SHOW_HEADERS: &[&str] = &[
    "id",
    "slug",
    "title",
    "date_text",
    "time_text",
    "location_name",
    "address",
    "benefiting",
    "suggested_donation",
    "description",
    "is_active",
    "voting_open",
    "created_at",
];

const CAR_HEADERS: &[&str] = &[
    "car_number",
    "car_token",
    "year",
    "make",
    "model",
    "owner_name",
    "owner_phone",
    "owner_email",
    "opt_in_future",
    "waiver_received",
    "waiver_received_at",
    "waiver_received_by",
];

const SPONSOR_HEADERS: &[&str] = &[
    "id",
    "name",
    "logo_path",
    "website_url",
    "placement",
    "sort_order",
];

const ATTENDEE_HEADERS: &[&str] = &[
    "id",
    "show_id",
    "first_name",
    "last_name",
    "phone",
    "email",
    "zip_code",
    "sponsor_opt_in",
    "updates_opt_in",
    "consent_text",
    "consent_version",
    "created_at",
];

const DONATION_HEADERS: &[&str] = &[
    "id",
    "show_id",
    "attendee_id",
    "amount_cents",
    "status",
    "stripe_session_id",
    "paid_at",
    "created_at",
];

/// The header row is written up front so empty tables still export their columns.
/// Rows must serialize in `headers` order.
fn write_csv<T: Serialize>(headers: &[&str], rows: &[T]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))
}

pub async fn vote_export_rows<C: ConnectionTrait>(
    db: &C,
    show_id: i32,
) -> Result<Vec<VoteExportRow>, DbErr> {
    let votes = store::vote::votes_for_show(db, show_id).await?;
    let cars: HashMap<i32, CarWithOwner> = store::car::list_show_cars(db, show_id)
        .await?
        .into_iter()
        .map(|row| (row.car.id, row))
        .collect();

    Ok(votes
        .into_iter()
        .map(|vote| {
            let car = cars.get(&vote.show_car_id);
            let owner = car.and_then(|c| c.owner.as_ref());
            VoteExportRow {
                created_at: vote.created_at,
                category: vote.category,
                vote_qty: vote.vote_qty,
                amount_cents: vote.amount_cents,
                stripe_session_id: vote.stripe_session_id,
                car_number: car.map(|c| c.car.car_number),
                year: car.map(|c| c.car.year.clone()).unwrap_or_default(),
                make: car.map(|c| c.car.make.clone()).unwrap_or_default(),
                model: car.map(|c| c.car.model.clone()).unwrap_or_default(),
                owner_name: owner.map(|o| o.name.clone()).unwrap_or_default(),
                owner_phone: owner.map(|o| o.phone.clone()).unwrap_or_default(),
                owner_email: owner.map(|o| o.email.clone()).unwrap_or_default(),
                opt_in_future: owner.is_some_and(|o| o.opt_in_future),
            }
        })
        .collect())
}

/// Votes CSV. The header row is always written, even for a show without votes.
pub fn votes_csv(rows: &[VoteExportRow]) -> Result<Vec<u8>, ExportError> {
    write_csv(VOTE_HEADERS, rows)
}

pub async fn votes_csv_for_show<C: ConnectionTrait>(
    db: &C,
    show_id: i32,
) -> Result<Vec<u8>, ExportError> {
    let rows = vote_export_rows(db, show_id).await?;
    votes_csv(&rows)
}

pub fn snapshot_filename(show: &show::Model, now: DateTime<Utc>) -> String {
    format!("snapshot_{}_{}.zip", show.slug, now.format("%Y%m%d_%H%M%S"))
}

/// Everything recorded for the show, one CSV per table.
pub async fn snapshot_zip<C: ConnectionTrait>(
    db: &C,
    show: &show::Model,
) -> Result<(Vec<u8>, String), ExportError> {
    let cars = store::car::list_show_cars(db, show.id).await?;
    let car_rows: Vec<CarExportRow> = cars.iter().map(CarExportRow::from).collect();
    let votes = vote_export_rows(db, show.id).await?;
    let sponsors = store::sponsor::show_sponsors(db, show.id).await?;
    let sponsor_rows: Vec<_> = sponsors
        .title_sponsor
        .into_iter()
        .chain(sponsors.sponsors)
        .collect();
    let attendees = store::attendee::list_attendees(db, show.id).await?;
    let donations = store::attendee::list_donations(db, show.id).await?;

    let files: Vec<(&str, Vec<u8>)> = vec![
        ("show.csv", write_csv(SHOW_HEADERS, std::slice::from_ref(show))?),
        ("cars.csv", write_csv(CAR_HEADERS, &car_rows)?),
        ("votes.csv", votes_csv(&votes)?),
        ("sponsors.csv", write_csv(SPONSOR_HEADERS, &sponsor_rows)?),
        ("attendees.csv", write_csv(ATTENDEE_HEADERS, &attendees)?),
        ("donations.csv", write_csv(DONATION_HEADERS, &donations)?),
    ];

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in files {
        writer.start_file(name, options)?;
        writer.write_all(&content)?;
    }
    let cursor = writer.finish()?;

    Ok((cursor.into_inner(), snapshot_filename(show, Utc::now())))
}
