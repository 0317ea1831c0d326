use axum::{
    Form, Router,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use minijinja::context;
use serde::{Deserialize, Serialize};

use super::{car_by_token, checked, show_by_slug};
use crate::{
    error::AppError,
    extract::{CurrentShow, Origin},
    router::AppState,
    store::{
        self,
        car::{CarDetails, OwnerDetails},
    },
    util::encode_component,
    voting::CATEGORIES,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/instructions/{show_slug}", get(instructions))
        .route("/events", get(events))
        .route("/show/{slug}", get(show_page))
        .route("/register", get(register_page).post(register_submit))
        .route("/r/{show_slug}/{car_token}", get(registration_complete))
}

pub async fn home(
    State(state): State<AppState>,
    CurrentShow(show): CurrentShow,
) -> Result<Html<String>, AppError> {
    let sponsors = store::sponsor::show_sponsors(&state.db, show.id).await?;
    state.render(
        "home.html",
        context! {
            show => show,
            title_sponsor => sponsors.title_sponsor,
            sponsors => sponsors.sponsors,
        },
    )
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct UpcomingEvent {
    pub date: &'static str,
    pub title: &'static str,
    pub location: &'static str,
    pub status: &'static str,
}

pub const UPCOMING_EVENTS: &[UpcomingEvent] = &[
    UpcomingEvent {
        date: "May 23, 2026",
        title: "Pop-Up Car Show (Certificates + People’s Choice)",
        location: "Kansas City Metro (TBD)",
        status: "Planning",
    },
    UpcomingEvent {
        date: "June 20, 2026",
        title: "Summer Cruise + Mini Show",
        location: "Liberty, MO (TBD)",
        status: "Planning",
    },
];

/// Works without an active show.
pub async fn events(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let show = store::show::get_active_show(&state.db).await?;
    state.render(
        "events.html",
        context! { show => show, events => UPCOMING_EVENTS },
    )
}

pub async fn instructions(
    State(state): State<AppState>,
    Path(show_slug): Path<String>,
) -> Result<Html<String>, AppError> {
    let show = show_by_slug(&state.db, &show_slug).await?;
    state.render("instructions.html", context! { show => show })
}

/// Unknown slugs render the page with a not-found notice rather than an error.
pub async fn show_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, AppError> {
    let Some(show) = store::show::get_show_by_slug(&state.db, &slug).await? else {
        return state.render(
            "show.html",
            context! { not_found => true, show => context! { title => "Show Not Found" } },
        );
    };

    let cars = store::car::list_show_cars(&state.db, show.id).await?;
    let cars: Vec<_> = cars.into_iter().map(|row| row.car).collect();
    let sponsors = store::sponsor::show_sponsors(&state.db, show.id).await?;
    state.render(
        "show.html",
        context! {
            not_found => false,
            show => show,
            cars => cars,
            title_sponsor => sponsors.title_sponsor,
            sponsors => sponsors.sponsors,
        },
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    email: String,
    opt_in_future: Option<String>,
    #[serde(default)]
    car_number: String,
    #[serde(default)]
    year: String,
    #[serde(default)]
    make: String,
    #[serde(default)]
    model: String,
}

pub async fn register_page(
    State(state): State<AppState>,
    CurrentShow(show): CurrentShow,
) -> Result<Html<String>, AppError> {
    state.render("register.html", context! { show => show })
}

pub async fn register_submit(
    State(state): State<AppState>,
    CurrentShow(show): CurrentShow,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
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
    let car_number = form.car_number.trim();

    let rerender = |error: String| {
        state
            .render("register.html", context! { show => &show, error => error })
            .map(IntoResponse::into_response)
    };

    let required = [
        &owner.name,
        &owner.phone,
        &owner.email,
        &details.year,
        &details.make,
        &details.model,
    ];
    if car_number.is_empty() || required.iter().any(|value| value.is_empty()) {
        return rerender("Please fill out all required fields.".into());
    }
    let Ok(car_number) = car_number.parse::<i32>() else {
        return rerender("Car number must be a positive number.".into());
    };

    match store::car::register_car(&state.db, show.id, car_number, &owner, &details).await {
        Ok(car) => Ok(Redirect::to(&format!(
            "/r/{}/{}",
            encode_component(&show.slug),
            car.car_token
        ))
        .into_response()),
        Err(AppError::BadRequest(message)) => rerender(message),
        Err(err) => Err(err),
    }
}

#[derive(Debug, Serialize)]
struct CardLink {
    label: &'static str,
    url: String,
}

/// Links printed as QR codes on the windshield card.
fn card_links(origin: &Origin, show_slug: &str, car_token: &str) -> Vec<CardLink> {
    let show_slug = encode_component(show_slug);
    let mut links = vec![CardLink {
        label: "Owner check-in",
        url: origin.join(&format!("/checkin/{show_slug}/{car_token}")),
    }];
    links.extend(CATEGORIES.iter().map(|category| CardLink {
        label: category.name,
        url: origin.join(&format!("/v/{show_slug}/{car_token}/{}", category.slug)),
    }));
    links
}

pub async fn registration_complete(
    State(state): State<AppState>,
    origin: Origin,
    Path((show_slug, car_token)): Path<(String, String)>,
) -> Result<Html<String>, AppError> {
    let show = show_by_slug(&state.db, &show_slug).await?;
    let row = car_by_token(&state.db, show.id, &car_token).await?;
    let links = card_links(&origin, &show.slug, &row.car.car_token);
    state.render(
        "registration_complete.html",
        context! { show => show, car => row.car, links => links },
    )
}
