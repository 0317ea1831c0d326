//! Password-gated administration of the active show.
//!
//! `GET /admin` is public and shows the login form to anonymous visitors;
//! everything in [`router`] sits behind the login redirect.

use axum::{
    Form, Router,
    extract::{Query, State},
    response::{Html, Redirect, Response},
    routing::{get, post},
};
use minijinja::context;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use super::attachment;
use crate::{
    auth::user::AuthSession,
    entities::{show, show_sponsor::Placement},
    error::AppError,
    export,
    extract::CurrentShow,
    router::AppState,
    store::{self, show::NewShow, sponsor::DEFAULT_SORT_ORDER},
    util::flash,
    voting::leaderboard,
};

const ZIP: &str = "application/zip";
const CSV: &str = "text/csv; charset=utf-8";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/export-snapshot.zip", get(export_snapshot))
        .route("/admin/close-voting-and-export", post(close_voting_and_export))
        .route("/admin/toggle-voting", post(toggle_voting))
        .route("/admin/open-voting", post(open_voting))
        .route("/admin/close-voting", post(close_voting))
        .route("/admin/reset-votes", post(reset_votes))
        .route("/admin/leaderboard", get(leaderboard_page))
        .route("/admin/export-votes.csv", get(export_votes))
        .route("/admin/placeholders", get(placeholders))
        .route("/admin/placeholders/create", post(create_placeholders))
        .route("/admin/waiver-received", post(waiver_received))
        .route("/admin/sponsors", get(sponsors))
        .route("/admin/sponsors/add", post(add_sponsor))
        .route("/admin/sponsors/remove", post(remove_sponsor))
        .route("/admin/shows/create", post(create_show))
        .route("/admin/shows/activate", post(activate_show))
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    next: Option<String>,
}

pub async fn index(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
    Query(query): Query<NextQuery>,
) -> Result<Html<String>, AppError> {
    let show = store::show::get_active_show(&state.db).await?;
    let messages = flash::take(&session).await?;

    if auth_session.user.is_none() {
        return state.render(
            "admin.html",
            context! {
                authed => false,
                show => show,
                next => query.next.unwrap_or_default(),
                messages => messages,
            },
        );
    }

    let board = match &show {
        Some(show) => Some(leaderboard::leaderboard_for_show(&state.db, show).await?),
        None => None,
    };
    let car_count = match &show {
        Some(show) => store::car::list_show_cars(&state.db, show.id).await?.len(),
        None => 0,
    };
    let shows = store::show::list_shows(&state.db).await?;
    state.render(
        "admin.html",
        context! {
            authed => true,
            show => show,
            shows => shows,
            total_votes => board.map(|b| b.total_votes).unwrap_or_default(),
            car_count => car_count,
            payments_configured => state.payments.is_some(),
            voting_end => state.config.voting_end.map(|end| end.to_rfc3339()),
            messages => messages,
        },
    )
}

async fn snapshot_response(state: &AppState, show: &show::Model) -> Result<Response, AppError> {
    let (bytes, filename) = export::snapshot_zip(&state.db, show).await?;
    info!("Exported snapshot {} ({} bytes)", filename, bytes.len());
    Ok(attachment(ZIP, &filename, bytes))
}

pub async fn export_snapshot(
    State(state): State<AppState>,
    CurrentShow(show): CurrentShow,
) -> Result<Response, AppError> {
    snapshot_response(&state, &show).await
}

/// Closes voting, then hands back the final snapshot in the same response.
pub async fn close_voting_and_export(
    State(state): State<AppState>,
    CurrentShow(show): CurrentShow,
) -> Result<Response, AppError> {
    store::show::set_voting_open(&state.db, show.id, false).await?;
    info!("Voting closed for '{}'", show.slug);
    snapshot_response(&state, &show).await
}

pub async fn toggle_voting(
    State(state): State<AppState>,
    CurrentShow(show): CurrentShow,
) -> Result<Redirect, AppError> {
    let slug = show.slug.clone();
    let open = store::show::toggle_voting(&state.db, show).await?;
    info!("Voting for '{}' is now {}", slug, if open { "open" } else { "closed" });
    Ok(Redirect::to("/admin"))
}

pub async fn open_voting(
    State(state): State<AppState>,
    CurrentShow(show): CurrentShow,
) -> Result<Redirect, AppError> {
    store::show::set_voting_open(&state.db, show.id, true).await?;
    info!("Voting opened for '{}'", show.slug);
    Ok(Redirect::to("/admin"))
}

pub async fn close_voting(
    State(state): State<AppState>,
    CurrentShow(show): CurrentShow,
) -> Result<Redirect, AppError> {
    store::show::set_voting_open(&state.db, show.id, false).await?;
    info!("Voting closed for '{}'", show.slug);
    Ok(Redirect::to("/admin"))
}

/// The snapshot is built before anything is deleted, so a failed export
/// leaves the votes in place.
pub async fn reset_votes(
    State(state): State<AppState>,
    CurrentShow(show): CurrentShow,
) -> Result<Response, AppError> {
    let (bytes, filename) = export::snapshot_zip(&state.db, &show).await?;
    let deleted = store::vote::reset_votes_for_show(&state.db, show.id).await?;
    info!(
        "Reset {} vote(s) for '{}' after snapshot {}",
        deleted, show.slug, filename
    );
    Ok(attachment(ZIP, &filename, bytes))
}

pub async fn leaderboard_page(
    State(state): State<AppState>,
    CurrentShow(show): CurrentShow,
) -> Result<Html<String>, AppError> {
    let board = leaderboard::leaderboard_for_show(&state.db, &show).await?;
    state.render("leaderboard.html", context! { show => show, board => board })
}

pub async fn export_votes(
    State(state): State<AppState>,
    CurrentShow(show): CurrentShow,
) -> Result<Response, AppError> {
    let bytes = export::votes_csv_for_show(&state.db, show.id).await?;
    Ok(attachment(CSV, "votes_export.csv", bytes))
}

pub async fn placeholders(
    State(state): State<AppState>,
    CurrentShow(show): CurrentShow,
    session: Session,
) -> Result<Html<String>, AppError> {
    let cars = store::car::list_show_cars(&state.db, show.id).await?;
    let messages = flash::take(&session).await?;
    state.render(
        "admin_placeholders.html",
        context! { show => show, cars => cars, messages => messages },
    )
}

#[derive(Debug, Deserialize)]
pub struct PlaceholderForm {
    #[serde(default = "default_start")]
    start_number: String,
    #[serde(default = "default_count")]
    count: String,
}

fn default_start() -> String {
    "1".into()
}

fn default_count() -> String {
    "50".into()
}

pub async fn create_placeholders(
    State(state): State<AppState>,
    CurrentShow(show): CurrentShow,
    session: Session,
    Form(form): Form<PlaceholderForm>,
) -> Result<Redirect, AppError> {
    let back = Redirect::to("/admin/placeholders");
    let (Ok(start), Ok(count)) = (
        form.start_number.trim().parse::<i32>(),
        form.count.trim().parse::<i32>(),
    ) else {
        flash::error(&session, "Invalid placeholder range. Count must be 1–1000.").await?;
        return Ok(back);
    };

    match store::car::create_placeholder_cars(&state.db, show.id, start, count).await {
        Ok(created) => {
            info!("Created {} placeholder car(s) for '{}'", created, show.slug);
            flash::ok(&session, format!("Created {created} placeholder cars.")).await?;
        }
        Err(AppError::BadRequest(message)) => flash::error(&session, message).await?,
        Err(err) => return Err(err),
    }
    Ok(back)
}

#[derive(Debug, Deserialize)]
pub struct WaiverForm {
    #[serde(default)]
    show_car_id: String,
}

pub async fn waiver_received(
    State(state): State<AppState>,
    CurrentShow(show): CurrentShow,
    session: Session,
    Form(form): Form<WaiverForm>,
) -> Result<Redirect, AppError> {
    let back = Redirect::to("/admin/placeholders");
    let Ok(show_car_id) = form.show_car_id.trim().parse::<i32>() else {
        return Ok(back);
    };

    if store::car::mark_waiver_received(&state.db, show.id, show_car_id, "admin").await? {
        flash::ok(&session, "Waiver marked as received.").await?;
    } else {
        flash::error(&session, "Car not found in this show.").await?;
    }
    Ok(back)
}

pub async fn sponsors(
    State(state): State<AppState>,
    CurrentShow(show): CurrentShow,
    session: Session,
) -> Result<Html<String>, AppError> {
    let listing = store::sponsor::show_sponsors(&state.db, show.id).await?;
    let messages = flash::take(&session).await?;
    state.render(
        "admin_sponsors.html",
        context! {
            show => show,
            title_sponsor => listing.title_sponsor,
            sponsors => listing.sponsors,
            messages => messages,
        },
    )
}

#[derive(Debug, Deserialize)]
pub struct SponsorForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    logo_path: String,
    #[serde(default)]
    website_url: String,
    #[serde(default)]
    placement: String,
    #[serde(default)]
    sort_order: String,
}

pub async fn add_sponsor(
    State(state): State<AppState>,
    CurrentShow(show): CurrentShow,
    session: Session,
    Form(form): Form<SponsorForm>,
) -> Result<Redirect, AppError> {
    let back = Redirect::to("/admin/sponsors");
    let name = form.name.trim();
    if name.is_empty() {
        flash::error(&session, "Sponsor name is required.").await?;
        return Ok(back);
    }
    let sort_order = form.sort_order.trim().parse().unwrap_or(DEFAULT_SORT_ORDER);

    let sponsor = store::sponsor::upsert_sponsor(
        &state.db,
        name,
        form.logo_path.trim(),
        form.website_url.trim(),
    )
    .await?;
    if form.placement.trim() == "title" {
        store::sponsor::set_title_sponsor(&state.db, show.id, sponsor.id).await?;
    } else {
        store::sponsor::attach_sponsor_to_show(
            &state.db,
            show.id,
            sponsor.id,
            Placement::Standard,
            sort_order,
        )
        .await?;
    }

    flash::ok(&session, "Sponsor saved.").await?;
    Ok(back)
}

#[derive(Debug, Deserialize)]
pub struct RemoveSponsorForm {
    #[serde(default)]
    sponsor_id: String,
}

pub async fn remove_sponsor(
    State(state): State<AppState>,
    CurrentShow(show): CurrentShow,
    session: Session,
    Form(form): Form<RemoveSponsorForm>,
) -> Result<Redirect, AppError> {
    let back = Redirect::to("/admin/sponsors");
    let Ok(sponsor_id) = form.sponsor_id.trim().parse::<i32>() else {
        return Ok(back);
    };
    store::sponsor::remove_sponsor_from_show(&state.db, show.id, sponsor_id).await?;
    flash::ok(&session, "Sponsor removed from show.").await?;
    Ok(back)
}

pub async fn create_show(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<NewShow>,
) -> Result<Redirect, AppError> {
    match store::show::create_show(&state.db, form).await {
        Ok(show) => {
            info!("Created show '{}'", show.slug);
            flash::ok(&session, format!("Show '{}' created.", show.title)).await?;
        }
        Err(AppError::BadRequest(message)) => flash::error(&session, message).await?,
        Err(err) => return Err(err),
    }
    Ok(Redirect::to("/admin"))
}

#[derive(Debug, Deserialize)]
pub struct ActivateForm {
    #[serde(default)]
    show_id: String,
}

pub async fn activate_show(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ActivateForm>,
) -> Result<Redirect, AppError> {
    let back = Redirect::to("/admin");
    let Ok(show_id) = form.show_id.trim().parse::<i32>() else {
        return Ok(back);
    };
    let Some(show) = store::show::get_show(&state.db, show_id).await? else {
        flash::error(&session, "Show not found.").await?;
        return Ok(back);
    };

    store::show::activate_show(&state.db, show.id).await?;
    info!("Activated show '{}'", show.slug);
    flash::ok(&session, format!("'{}' is now the active show.", show.title)).await?;
    Ok(back)
}
