use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    router::AppState,
    store,
    stripe::{
        PaymentProvider,
        webhook::{self, CHECKOUT_COMPLETED, Event, SIGNATURE_HEADER},
    },
    voting::confirm::{self, KIND_DONATION, KIND_KEY},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/stripe/webhook", post(stripe_webhook))
}

/// Re-reads the session from the provider and applies it as a vote or a
/// donation, depending on its metadata.
pub async fn apply_completed_session(
    state: &AppState,
    provider: &dyn PaymentProvider,
    session_id: &str,
) -> Result<(), AppError> {
    let session = provider.retrieve_checkout_session(session_id).await?;
    if session.metadata.get(KIND_KEY).map(String::as_str) == Some(KIND_DONATION) {
        if !session.is_paid() {
            debug!("Donation session {} not paid yet", session.id);
            return Ok(());
        }
        match store::attendee::mark_donation_paid(&state.db, &session.id).await? {
            Some(donation) => info!("Donation {} paid via webhook", donation.id),
            None => warn!("No donation row for session {}", session.id),
        }
        return Ok(());
    }

    confirm::confirm_paid_session(&state.db, &session).await?;
    Ok(())
}

pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let Some(secret) = state.config.stripe_webhook_secret.as_deref() else {
        return Err(AppError::NotFound("Webhook not configured."));
    };
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing signature.".into()))?;

    if let Err(err) = webhook::verify_signature(&body, signature, secret, Utc::now().timestamp()) {
        warn!("Rejected webhook delivery: {}", err);
        return Err(AppError::BadRequest("Invalid signature.".into()));
    }

    let event: Event = serde_json::from_slice(&body)
        .map_err(|_| AppError::BadRequest("Invalid payload.".into()))?;
    if event.event_type != CHECKOUT_COMPLETED {
        debug!("Ignoring webhook event {}", event.event_type);
        return Ok((StatusCode::OK, "ignored").into_response());
    }

    let provider = state.payments()?;
    apply_completed_session(&state, provider, &event.data.object.id).await?;
    Ok((StatusCode::OK, "ok").into_response())
}
