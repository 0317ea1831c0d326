use async_session::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub mod checkout;
pub mod webhook;

pub use checkout::StripeClient;

const API_BASE: &str = "https://api.stripe.com/v1";

/// Placeholder Stripe substitutes with the real session id in `success_url`.
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error("Stripe returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Checkout session {0} has no redirect url")]
    MissingUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
    #[serde(other)]
    Unknown,
}

/// The provider's record of a checkout session. This is the only source
/// trusted for payment state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
    pub payment_status: PaymentStatus,
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    pub fn checkout_url(&self) -> Result<&str, PaymentError> {
        self.url
            .as_deref()
            .ok_or_else(|| PaymentError::MissingUrl(self.id.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct LineItem {
    pub name: String,
    pub unit_amount_cents: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone)]
pub struct NewCheckoutSession {
    pub line_item: LineItem,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Hosted checkout provider. Production uses [`StripeClient`].
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_checkout_session(
        &self,
        session: &NewCheckoutSession,
    ) -> Result<CheckoutSession, PaymentError>;

    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, PaymentError>;
}
