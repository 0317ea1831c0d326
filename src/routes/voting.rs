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

use super::{car_by_token, show_by_slug};
use crate::{
    error::AppError,
    extract::Origin,
    router::AppState,
    stripe::{LineItem, NewCheckoutSession, SESSION_ID_PLACEHOLDER},
    util::encode_component,
    voting::{
        VOTE_PRICE_CENTS,
        categories::{self, Category},
        confirm::{self, Confirmation, KIND_KEY, KIND_VOTE},
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v/{show_slug}/{car_token}/{category_slug}", get(vote_qty_page))
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/success", get(vote_success))
}

fn vote_page_path(show_slug: &str, car_token: &str, category_slug: &str) -> String {
    format!(
        "/v/{}/{}/{}",
        encode_component(show_slug),
        encode_component(car_token),
        encode_component(category_slug)
    )
}

pub async fn vote_qty_page(
    State(state): State<AppState>,
    Path((show_slug, car_token, category_slug)): Path<(String, String, String)>,
) -> Result<Html<String>, AppError> {
    let show = show_by_slug(&state.db, &show_slug).await?;
    let category =
        categories::by_slug(&category_slug).ok_or(AppError::NotFound("Invalid category."))?;
    let row = car_by_token(&state.db, show.id, &car_token).await?;

    if !show.voting_open {
        return state.render("voting_closed.html", context! { show => show });
    }

    state.render(
        "vote_qty.html",
        context! {
            show => show,
            car => row.car,
            category_slug => category.slug,
            category_name => category.name,
            max_votes => categories::MAX_VOTES_PER_CHECKOUT,
        },
    )
}

#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    show_slug: String,
    #[serde(default)]
    car_token: String,
    #[serde(default)]
    category_slug: String,
    #[serde(default = "default_vote_qty")]
    vote_qty: String,
}

fn default_vote_qty() -> String {
    "1".into()
}

pub fn vote_line_item_name(category: &Category, car_number: i32) -> String {
    format!("Vote – {} (Car #{})", category.name, car_number)
}

pub async fn create_checkout_session(
    State(state): State<AppState>,
    origin: Origin,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, AppError> {
    let provider = state.payments()?;

    let show = show_by_slug(&state.db, form.show_slug.trim()).await?;
    if !show.voting_open {
        return Err(AppError::VotingClosed);
    }
    let category = categories::by_slug(form.category_slug.trim())
        .ok_or_else(|| AppError::BadRequest("Invalid category.".into()))?;
    let car = car_by_token(&state.db, show.id, form.car_token.trim())
        .await?
        .car;
    let vote_qty = categories::parse_vote_qty(&form.vote_qty)
        .map_err(|message| AppError::BadRequest(message.into()))?;

    let metadata = BTreeMap::from([
        (KIND_KEY.to_string(), KIND_VOTE.to_string()),
        ("show_id".to_string(), show.id.to_string()),
        ("show_car_id".to_string(), car.id.to_string()),
        ("category".to_string(), category.name.to_string()),
        ("vote_qty".to_string(), vote_qty.to_string()),
    ]);
    let request = NewCheckoutSession {
        line_item: LineItem {
            name: vote_line_item_name(category, car.car_number),
            unit_amount_cents: VOTE_PRICE_CENTS,
            quantity: i64::from(vote_qty),
        },
        success_url: origin.join(&format!("/success?session_id={SESSION_ID_PLACEHOLDER}")),
        cancel_url: origin.join(&vote_page_path(&show.slug, &car.car_token, category.slug)),
        metadata,
    };

    let session = provider.create_checkout_session(&request).await?;
    info!(
        "Created checkout session {} for {} vote(s) on car #{}",
        session.id, vote_qty, car.car_number
    );
    Ok(Redirect::to(session.checkout_url()?).into_response())
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    session_id: Option<String>,
}

pub async fn vote_success(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Response, AppError> {
    let provider = state.payments()?;
    let session_id = query.session_id.unwrap_or_default();
    let session_id = session_id.trim();
    if session_id.is_empty() {
        return Err(AppError::BadRequest("Missing session_id.".into()));
    }

    let confirmation = confirm::confirm_vote_session(&state.db, provider, session_id).await?;
    let page = match confirmation {
        Confirmation::NotPaid => state.render("payment_not_complete.html", context! {})?,
        Confirmation::Recorded(vote) => state.render(
            "vote_success.html",
            context! { category => vote.category, vote_qty => vote.vote_qty },
        )?,
        Confirmation::AlreadyRecorded => state.render("vote_success.html", context! {})?,
    };
    Ok(page.into_response())
}
