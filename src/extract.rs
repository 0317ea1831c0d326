use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use axum_extra::{TypedHeader, headers::Host};

use crate::{entities::show, error::AppError, router::AppState, store};

/// The show that is currently active, looked up per request.
#[derive(Debug, Clone)]
pub struct CurrentShow(pub show::Model);

impl FromRequestParts<AppState> for CurrentShow {
    type Rejection = AppError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        store::show::get_active_show(&state.db)
            .await?
            .map(CurrentShow)
            .ok_or(AppError::NoActiveShow)
    }
}

/// Absolute origin for links that leave the site, such as checkout return URLs.
/// `BASE_URL` wins; otherwise it is rebuilt from the request's host.
#[derive(Debug, Clone)]
pub struct Origin(pub String);

impl Origin {
    pub fn join(&self, path: &str) -> String {
        format!("{}{}", self.0, path)
    }
}

fn scheme(headers: &HeaderMap) -> &str {
    headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| *value == "https" || *value == "http")
        .unwrap_or("http")
}

impl FromRequestParts<AppState> for Origin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(base_url) = &state.config.base_url {
            return Ok(Origin(base_url.clone()));
        }

        let TypedHeader(host) = TypedHeader::<Host>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::BadRequest("Missing Host header.".into()))?;
        let authority = match host.port() {
            Some(port) => format!("{}:{}", host.hostname(), port),
            None => host.hostname().to_string(),
        };
        Ok(Origin(format!("{}://{}", scheme(&parts.headers), authority)))
    }
}
