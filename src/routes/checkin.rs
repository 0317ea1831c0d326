use axum::{
    Form, Router,
    extract::{Path, State},
    response::Html,
    routing::get,
};
use minijinja::context;
use serde::Deserialize;
use tracing::info;

use super::{car_by_token, checked, show_by_slug};
use crate::{
    error::AppError,
    router::AppState,
    store::{
        self,
        car::{CarDetails, OwnerDetails},
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/checkin/{show_slug}/{car_token}",
            get(checkin_page).post(checkin_submit),
        )
        .route("/waiver/{show_slug}/{car_token}", get(waiver_print))
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckinForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    email: String,
    opt_in_future: Option<String>,
    #[serde(default)]
    year: String,
    #[serde(default)]
    make: String,
    #[serde(default)]
    model: String,
}

pub async fn checkin_page(
    State(state): State<AppState>,
    Path((show_slug, car_token)): Path<(String, String)>,
) -> Result<Html<String>, AppError> {
    let show = show_by_slug(&state.db, &show_slug).await?;
    let car = car_by_token(&state.db, show.id, &car_token).await?;
    state.render("checkin.html", context! { show => show, car => car })
}

pub async fn checkin_submit(
    State(state): State<AppState>,
    Path((show_slug, car_token)): Path<(String, String)>,
    Form(form): Form<CheckinForm>,
) -> Result<Html<String>, AppError> {
    let show = show_by_slug(&state.db, &show_slug).await?;
    let row = car_by_token(&state.db, show.id, &car_token).await?;

    let owner = OwnerDetails {
        name: form.name.trim().to_string(),
        phone: form.phone.trim().to_string(),
        email: form.email.trim().to_string(),
        opt_in_future: checked(&form.opt_in_future),
    };
    let details = CarDetails {
        year: form.year.trim().to_string(),
        make: form.make.trim().to_string(),
        model: form.model.trim().to_string(),
    };

    let required = [
        &owner.name,
        &owner.phone,
        &owner.email,
        &details.year,
        &details.make,
        &details.model,
    ];
    if required.iter().any(|value| value.is_empty()) {
        return state.render(
            "checkin.html",
            context! {
                show => show,
                car => row,
                error => "Please fill out all required fields.",
            },
        );
    }

    let updated = store::car::check_in(&state.db, row.car, &owner, &details).await?;
    info!(
        "Checked in car #{} for show '{}'",
        updated.car.car_number, show.slug
    );
    state.render(
        "checkin.html",
        context! {
            show => show,
            car => updated,
            success => "Check-in complete. You're all set!",
        },
    )
}

pub async fn waiver_print(
    State(state): State<AppState>,
    Path((show_slug, car_token)): Path<(String, String)>,
) -> Result<Html<String>, AppError> {
    let show = show_by_slug(&state.db, &show_slug).await?;
    let car = car_by_token(&state.db, show.id, &car_token).await?;
    state.render("waiver_print.html", context! { show => show, car => car })
}
