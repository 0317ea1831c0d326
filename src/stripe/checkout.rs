use async_session::async_trait;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Response, StatusCode};
use tracing::debug;

use super::{
    API_BASE, ApiErrorBody, CheckoutSession, NewCheckoutSession, PaymentError, PaymentProvider,
};

#[derive(Debug, Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeClient {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self::with_api_base(secret_key, API_BASE)
    }

    pub fn with_api_base(secret_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_default();
        Self {
            http,
            secret_key: secret_key.into(),
            api_base: api_base.into(),
        }
    }
}

/// Stripe expects nested parameters flattened into bracketed form keys.
pub fn form_params(session: &NewCheckoutSession) -> Vec<(String, String)> {
    let item = &session.line_item;
    let mut params = vec![
        ("mode".to_string(), "payment".to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        (
            "line_items[0][price_data][currency]".to_string(),
            "usd".to_string(),
        ),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            item.unit_amount_cents.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            item.name.clone(),
        ),
        ("line_items[0][quantity]".to_string(), item.quantity.to_string()),
        ("success_url".to_string(), session.success_url.clone()),
        ("cancel_url".to_string(), session.cancel_url.clone()),
    ];
    for (key, value) in &session.metadata {
        params.push((format!("metadata[{key}]"), value.clone()));
    }
    params
}

async fn parse_session(response: Response) -> Result<CheckoutSession, PaymentError> {
    let status = response.status();
    if status == StatusCode::OK {
        return Ok(response.json::<CheckoutSession>().await?);
    }

    let message = match response.json::<ApiErrorBody>().await {
        Ok(body) => body.error.message.unwrap_or_default(),
        Err(_) => String::new(),
    };
    Err(PaymentError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_checkout_session(
        &self,
        session: &NewCheckoutSession,
    ) -> Result<CheckoutSession, PaymentError> {
        let url = format!("{}/checkout/sessions", self.api_base);
        let response = self
            .http
            .post(url)
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&form_params(session))
            .send()
            .await?;

        let created = parse_session(response).await?;
        debug!("Created checkout session {}", created.id);
        Ok(created)
    }

    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        let url = format!(
            "{}/checkout/sessions/{}",
            self.api_base,
            utf8_percent_encode(session_id, NON_ALPHANUMERIC)
        );
        let response = self
            .http
            .get(url)
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?;

        parse_session(response).await
    }
}
