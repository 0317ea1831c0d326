use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use minijinja::context;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::info;

use super::{checked, show_by_slug};
use crate::{
    entities::donation::DonationStatus,
    error::AppError,
    extract::Origin,
    router::AppState,
    store::{
        self,
        attendee::{NewAttendee, TRACKED_FIELDS},
    },
    stripe::{LineItem, NewCheckoutSession, SESSION_ID_PLACEHOLDER},
    util::encode_component,
    voting::confirm::{KIND_DONATION, KIND_KEY},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/attend/{show_slug}", get(attendee_page).post(attendee_submit))
        .route(
            "/attend/{show_slug}/donate/{attendee_id}",
            get(attendee_donate_page),
        )
        .route("/attend/{show_slug}/done", get(attendee_done))
        .route(
            "/attend/create-donation-checkout",
            post(create_donation_checkout),
        )
        .route("/donation-success", get(donation_success))
}

fn done_path(show_slug: &str) -> String {
    format!("/attend/{}/done", encode_component(show_slug))
}

fn donate_path(show_slug: &str, attendee_id: i32) -> String {
    format!("/attend/{}/donate/{}", encode_component(show_slug), attendee_id)
}

pub async fn attendee_page(
    State(state): State<AppState>,
    Path(show_slug): Path<String>,
) -> Result<Html<String>, AppError> {
    let show = show_by_slug(&state.db, &show_slug).await?;
    state.render(
        "attendee.html",
        context! { show => show, consent_text => store::attendee::CONSENT_TEXT },
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct AttendeeForm {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    zip: String,
    sponsor_opt_in: Option<String>,
    updates_opt_in: Option<String>,
}

pub async fn attendee_submit(
    State(state): State<AppState>,
    Path(show_slug): Path<String>,
    Form(form): Form<AttendeeForm>,
) -> Result<Response, AppError> {
    let show = show_by_slug(&state.db, &show_slug).await?;

    let new = NewAttendee {
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        phone: form.phone.trim().to_string(),
        email: form.email.trim().to_string(),
        zip_code: form.zip.trim().to_string(),
        sponsor_opt_in: checked(&form.sponsor_opt_in),
        updates_opt_in: checked(&form.updates_opt_in),
    };
    if new.first_name.is_empty() || new.last_name.is_empty() {
        return Ok(state
            .render(
                "attendee.html",
                context! {
                    show => show,
                    consent_text => store::attendee::CONSENT_TEXT,
                    error => "First and last name are required.",
                },
            )?
            .into_response());
    }

    let provided = [!new.phone.is_empty(), !new.email.is_empty()];
    let attendee = store::attendee::create_attendee(&state.db, show.id, new).await?;
    for (field, provided) in TRACKED_FIELDS.iter().zip(provided) {
        store::attendee::record_field_metric(&state.db, show.id, field, provided).await?;
    }

    Ok(Redirect::to(&donate_path(&show.slug, attendee.id)).into_response())
}

pub async fn attendee_donate_page(
    State(state): State<AppState>,
    Path((show_slug, attendee_id)): Path<(String, i32)>,
) -> Result<Html<String>, AppError> {
    let show = show_by_slug(&state.db, &show_slug).await?;
    state.render(
        "attendee_donate.html",
        context! { show => show, attendee_id => attendee_id },
    )
}

pub async fn attendee_done(
    State(state): State<AppState>,
    Path(show_slug): Path<String>,
) -> Result<Html<String>, AppError> {
    let show = show_by_slug(&state.db, &show_slug).await?;
    state.render("attendee_done.html", context! { show => show })
}

#[derive(Debug, Default, Deserialize)]
pub struct DonationForm {
    #[serde(default)]
    show_slug: String,
    #[serde(default)]
    attendee_id: String,
    #[serde(default)]
    amount_dollars: String,
}

pub async fn create_donation_checkout(
    State(state): State<AppState>,
    origin: Origin,
    Form(form): Form<DonationForm>,
) -> Result<Response, AppError> {
    let provider = state.payments()?;

    let show = show_by_slug(&state.db, form.show_slug.trim()).await?;
    let attendee_id: i32 = form
        .attendee_id
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid attendee.".into()))?;
    let attendee = store::attendee::find_attendee(&state.db, show.id, attendee_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid attendee.".into()))?;

    let amount_cents = store::attendee::parse_donation_cents(&form.amount_dollars);
    if amount_cents == 0 {
        store::attendee::create_donation(
            &state.db,
            show.id,
            Some(attendee.id),
            0,
            DonationStatus::Skipped,
        )
        .await?;
        return Ok(Redirect::to(&done_path(&show.slug)).into_response());
    }

    let donation = store::attendee::create_donation(
        &state.db,
        show.id,
        Some(attendee.id),
        amount_cents,
        DonationStatus::Pending,
    )
    .await?;

    let metadata = BTreeMap::from([
        (KIND_KEY.to_string(), KIND_DONATION.to_string()),
        ("show_id".to_string(), show.id.to_string()),
        ("donation_id".to_string(), donation.id.to_string()),
        ("show_slug".to_string(), show.slug.clone()),
    ]);
    let request = NewCheckoutSession {
        line_item: LineItem {
            name: format!("Donation – {}", show.title),
            unit_amount_cents: i64::from(amount_cents),
            quantity: 1,
        },
        success_url: origin.join(&format!(
            "/donation-success?session_id={SESSION_ID_PLACEHOLDER}"
        )),
        cancel_url: origin.join(&donate_path(&show.slug, attendee.id)),
        metadata,
    };

    let session = provider.create_checkout_session(&request).await?;
    let donation = store::attendee::attach_session_to_donation(&state.db, donation, &session.id)
        .await?;
    info!(
        "Created donation checkout {} for donation {} ({} cents)",
        session.id, donation.id, amount_cents
    );
    Ok(Redirect::to(session.checkout_url()?).into_response())
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    session_id: Option<String>,
}

pub async fn donation_success(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Response, AppError> {
    let provider = state.payments()?;
    let session_id = query.session_id.unwrap_or_default();
    let session_id = session_id.trim();
    if session_id.is_empty() {
        return Err(AppError::BadRequest("Missing session_id.".into()));
    }

    let session = provider.retrieve_checkout_session(session_id).await?;
    if !session.is_paid() {
        return Ok(state
            .render("payment_not_complete.html", context! {})?
            .into_response());
    }
    store::attendee::mark_donation_paid(&state.db, &session.id).await?;

    let show_slug = match session.metadata.get("show_slug").filter(|s| !s.is_empty()) {
        Some(slug) => slug.clone(),
        None => store::show::get_active_show(&state.db)
            .await?
            .map(|show| show.slug)
            .ok_or(AppError::NoActiveShow)?,
    };
    Ok(Redirect::to(&done_path(&show_slug)).into_response())
}
