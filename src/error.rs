use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;

use crate::{auth::user::Backend, export::ExportError, stripe::PaymentError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("Voting is currently closed.")]
    VotingClosed,

    #[error("No active show configured.")]
    NoActiveShow,

    #[error("Stripe is not configured. Set STRIPE_SECRET_KEY.")]
    PaymentsNotConfigured,

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("invalid checkout metadata: {0}")]
    InvalidMetadata(String),

    #[error(transparent)]
    Database(#[from] DbErr),

    #[error(transparent)]
    Template(#[from] minijinja::Error),

    #[error(transparent)]
    Session(#[from] tower_sessions::session::Error),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Auth(#[from] axum_login::Error<Backend>),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::VotingClosed => (StatusCode::FORBIDDEN, self.to_string()).into_response(),
            AppError::NoActiveShow | AppError::PaymentsNotConfigured => {
                tracing::error!("{}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
            AppError::Payment(err) => {
                // Fail closed: nothing was recorded, the visitor may retry.
                tracing::error!("Payment provider error: {}", err);
                (
                    StatusCode::BAD_GATEWAY,
                    "We could not confirm your payment right now. Please refresh this page in a moment.",
                )
                    .into_response()
            }
            AppError::InvalidMetadata(detail) => {
                tracing::error!("Invalid checkout metadata: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, "Invalid metadata.").into_response()
            }
            other => {
                tracing::error!("Internal error: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again.",
                )
                    .into_response()
            }
        }
    }
}
