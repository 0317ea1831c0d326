use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use sea_orm::ConnectionTrait;

use crate::{
    entities::show,
    error::AppError,
    store::{self, car::CarWithOwner},
};

pub mod admin;
pub mod attend;
pub mod checkin;
pub mod public;
pub mod voting;
pub mod webhook;

/// HTML checkboxes submit "on" when ticked and nothing otherwise.
pub(crate) fn checked(value: &Option<String>) -> bool {
    value.as_deref() == Some("on")
}

pub(crate) async fn show_by_slug<C: ConnectionTrait>(
    db: &C,
    slug: &str,
) -> Result<show::Model, AppError> {
    store::show::get_show_by_slug(db, slug)
        .await?
        .ok_or(AppError::NotFound("Show not found."))
}

pub(crate) async fn car_by_token<C: ConnectionTrait>(
    db: &C,
    show_id: i32,
    car_token: &str,
) -> Result<CarWithOwner, AppError> {
    store::car::find_with_owner(db, show_id, car_token)
        .await?
        .ok_or(AppError::NotFound("Car not found."))
}

pub(crate) fn attachment(content_type: &'static str, filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}
