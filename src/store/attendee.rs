use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder,
};

use crate::entities::{
    attendee,
    donation::{self, DonationStatus},
    field_metric,
    prelude::*,
};

pub const CONSENT_TEXT: &str = "By selecting these options, you agree Karman Kar Shows & Events \
may contact you about the event and, if selected, share sponsor offers. Msg/data rates may apply. \
Opt out anytime.";
pub const CONSENT_VERSION: &str = "2026-02-24";

/// Optional attendee fields whose fill rate is tracked.
pub const TRACKED_FIELDS: &[&str] = &["phone", "email"];

#[derive(Debug, Clone)]
pub struct NewAttendee {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub zip_code: String,
    pub sponsor_opt_in: bool,
    pub updates_opt_in: bool,
}

pub async fn create_attendee<C: ConnectionTrait>(
    db: &C,
    show_id: i32,
    new: NewAttendee,
) -> Result<attendee::Model, DbErr> {
    attendee::ActiveModel {
        show_id: Set(show_id),
        first_name: Set(new.first_name),
        last_name: Set(new.last_name),
        phone: Set(new.phone),
        email: Set(new.email),
        zip_code: Set(new.zip_code),
        sponsor_opt_in: Set(new.sponsor_opt_in),
        updates_opt_in: Set(new.updates_opt_in),
        consent_text: Set(CONSENT_TEXT.to_string()),
        consent_version: Set(CONSENT_VERSION.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn record_field_metric<C: ConnectionTrait>(
    db: &C,
    show_id: i32,
    field_name: &str,
    provided: bool,
) -> Result<(), DbErr> {
    field_metric::ActiveModel {
        show_id: Set(show_id),
        field_name: Set(field_name.to_string()),
        provided: Set(provided),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

pub async fn find_attendee<C: ConnectionTrait>(
    db: &C,
    show_id: i32,
    attendee_id: i32,
) -> Result<Option<attendee::Model>, DbErr> {
    Attendee::find_by_id(attendee_id)
        .filter(attendee::Column::ShowId.eq(show_id))
        .one(db)
        .await
}

pub async fn list_attendees<C: ConnectionTrait>(
    db: &C,
    show_id: i32,
) -> Result<Vec<attendee::Model>, DbErr> {
    Attendee::find()
        .filter(attendee::Column::ShowId.eq(show_id))
        .order_by_asc(attendee::Column::Id)
        .all(db)
        .await
}

pub async fn create_donation<C: ConnectionTrait>(
    db: &C,
    show_id: i32,
    attendee_id: Option<i32>,
    amount_cents: i32,
    status: DonationStatus,
) -> Result<donation::Model, DbErr> {
    donation::ActiveModel {
        show_id: Set(show_id),
        attendee_id: Set(attendee_id),
        amount_cents: Set(amount_cents),
        status: Set(status),
        stripe_session_id: Set(None),
        paid_at: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn attach_session_to_donation<C: ConnectionTrait>(
    db: &C,
    donation: donation::Model,
    session_id: &str,
) -> Result<donation::Model, DbErr> {
    let mut model = donation.into_active_model();
    model.stripe_session_id = Set(Some(session_id.to_string()));
    model.update(db).await
}

/// Marks the donation behind `session_id` as paid. Already-paid donations are
/// returned untouched.
pub async fn mark_donation_paid<C: ConnectionTrait>(
    db: &C,
    session_id: &str,
) -> Result<Option<donation::Model>, DbErr> {
    let found = Donation::find()
        .filter(donation::Column::StripeSessionId.eq(session_id))
        .one(db)
        .await?;

    match found {
        Some(found) if found.status == DonationStatus::Paid => Ok(Some(found)),
        Some(found) => {
            let mut model = found.into_active_model();
            model.status = Set(DonationStatus::Paid);
            model.paid_at = Set(Some(Utc::now()));
            Ok(Some(model.update(db).await?))
        }
        None => Ok(None),
    }
}

pub async fn list_donations<C: ConnectionTrait>(
    db: &C,
    show_id: i32,
) -> Result<Vec<donation::Model>, DbErr> {
    Donation::find()
        .filter(donation::Column::ShowId.eq(show_id))
        .order_by_asc(donation::Column::Id)
        .all(db)
        .await
}

/// Dollars as typed by the visitor. Anything unparsable or negative donates nothing.
pub fn parse_donation_cents(raw: &str) -> i32 {
    let dollars: f64 = raw.trim().trim_start_matches('$').parse().unwrap_or(0.0);
    if !dollars.is_finite() || dollars <= 0.0 {
        return 0;
    }
    (dollars * 100.0).round().min(i32::MAX as f64) as i32
}
