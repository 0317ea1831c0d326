//! Turning a paid checkout session into vote rows.
//!
//! Payment state always comes from the provider, never from the request that
//! reported it. A session yields at most one vote row: the existence check
//! skips the common repeat, and the unique `stripe_session_id` index settles
//! races between near-simultaneous confirmations.

use chrono::Utc;
use sea_orm::{ActiveValue::Set, ConnectionTrait, DbErr};
use std::collections::HashMap;
use tracing::{debug, info};

use super::categories;
use crate::{
    entities::vote,
    error::AppError,
    store,
    stripe::{CheckoutSession, PaymentProvider},
};

pub const KIND_KEY: &str = "kind";
pub const KIND_VOTE: &str = "vote";
pub const KIND_DONATION: &str = "donation";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaidVote {
    pub show_id: i32,
    pub show_car_id: i32,
    pub category: String,
    pub vote_qty: i32,
    pub amount_cents: i32,
    pub stripe_session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// This call wrote the vote row.
    Recorded(PaidVote),
    /// The session was paid and its vote already exists.
    AlreadyRecorded,
    /// Nothing was written.
    NotPaid,
}

impl Confirmation {
    pub fn is_success(&self) -> bool {
        !matches!(self, Confirmation::NotPaid)
    }
}

fn positive_int(metadata: &HashMap<String, String>, key: &str) -> Result<i32, AppError> {
    metadata
        .get(key)
        .and_then(|raw| raw.trim().parse::<i32>().ok())
        .filter(|value| *value > 0)
        .ok_or_else(|| AppError::InvalidMetadata(format!("missing or invalid {key}")))
}

impl PaidVote {
    pub fn from_session(session: &CheckoutSession) -> Result<Self, AppError> {
        let metadata = &session.metadata;
        if let Some(kind) = metadata.get(KIND_KEY) {
            if kind != KIND_VOTE {
                return Err(AppError::InvalidMetadata(format!(
                    "session {} is a {kind} checkout",
                    session.id
                )));
            }
        }

        let show_id = positive_int(metadata, "show_id")?;
        let show_car_id = positive_int(metadata, "show_car_id")?;
        let vote_qty = positive_int(metadata, "vote_qty")?;
        // The category was checked when the session was created.
        let category = metadata
            .get("category")
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::InvalidMetadata("missing category".into()))?;

        let amount_cents = match session.amount_total {
            Some(total) => i32::try_from(total)
                .map_err(|_| AppError::InvalidMetadata(format!("amount_total {total}")))?,
            None => i64::from(vote_qty)
                .checked_mul(categories::VOTE_PRICE_CENTS)
                .and_then(|cents| i32::try_from(cents).ok())
                .ok_or_else(|| AppError::InvalidMetadata(format!("vote_qty {vote_qty} too large")))?,
        };

        Ok(Self {
            show_id,
            show_car_id,
            category: category.to_string(),
            vote_qty,
            amount_cents,
            stripe_session_id: session.id.clone(),
        })
    }
}

/// Inserts the vote unless one already exists for the session.
/// Returns true if this call inserted it.
pub async fn record_paid_vote<C: ConnectionTrait>(db: &C, paid: &PaidVote) -> Result<bool, DbErr> {
    if store::vote::find_by_session(db, &paid.stripe_session_id)
        .await?
        .is_some()
    {
        return Ok(false);
    }

    let model = vote::ActiveModel {
        show_id: Set(paid.show_id),
        show_car_id: Set(paid.show_car_id),
        category: Set(paid.category.clone()),
        vote_qty: Set(paid.vote_qty),
        amount_cents: Set(paid.amount_cents),
        stripe_session_id: Set(paid.stripe_session_id.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    store::vote::insert_once(db, model).await
}

/// Records the vote for a session the provider has already returned.
pub async fn confirm_paid_session<C: ConnectionTrait>(
    db: &C,
    session: &CheckoutSession,
) -> Result<Confirmation, AppError> {
    if !session.is_paid() {
        debug!(
            "Session {} not paid ({:?}), nothing recorded",
            session.id, session.payment_status
        );
        return Ok(Confirmation::NotPaid);
    }

    let paid = PaidVote::from_session(session)?;
    if record_paid_vote(db, &paid).await? {
        info!(
            "Recorded {} vote(s) for car {} in '{}' from session {}",
            paid.vote_qty, paid.show_car_id, paid.category, paid.stripe_session_id
        );
        Ok(Confirmation::Recorded(paid))
    } else {
        debug!("Session {} already recorded", paid.stripe_session_id);
        Ok(Confirmation::AlreadyRecorded)
    }
}

/// Looks the session up with the provider and records its vote if paid.
/// Provider failures propagate and nothing is written.
pub async fn confirm_vote_session<C: ConnectionTrait>(
    db: &C,
    provider: &dyn PaymentProvider,
    session_id: &str,
) -> Result<Confirmation, AppError> {
    let session = provider.retrieve_checkout_session(session_id).await?;
    confirm_paid_session(db, &session).await
}
