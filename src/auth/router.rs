use axum::{
    Form, Router,
    response::{IntoResponse, Redirect},
    routing::post,
};
use tower_sessions::Session;
use tracing::{info, warn};

use super::user::{AuthSession, Credentials};
use crate::{
    error::AppError,
    router::AppState,
    util::{encode_component, flash},
};

pub const ADMIN_HOME: &str = "/admin";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(self::post::login))
        .route("/admin/logout", post(self::post::logout))
}

/// Only local absolute paths are followed after login.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') => {
            next
        }
        _ => ADMIN_HOME,
    }
}

mod post {
    use super::*;

    pub async fn login(
        mut auth_session: AuthSession,
        session: Session,
        Form(creds): Form<Credentials>,
    ) -> Result<impl IntoResponse, AppError> {
        let next = safe_next(creds.next.as_deref()).to_string();

        let user = match auth_session.authenticate(creds).await {
            Ok(Some(user)) => user,
            Ok(None) | Err(_) => {
                warn!("Rejected admin login attempt");
                flash::error(&session, "Incorrect password.").await?;
                let back = if next == ADMIN_HOME {
                    ADMIN_HOME.to_string()
                } else {
                    format!("{ADMIN_HOME}?next={}", encode_component(&next))
                };
                return Ok(Redirect::to(&back).into_response());
            }
        };

        auth_session.login(&user).await?;
        info!("Admin logged in");
        Ok(Redirect::to(&next).into_response())
    }

    pub async fn logout(mut auth_session: AuthSession) -> Result<impl IntoResponse, AppError> {
        auth_session.logout().await?;
        Ok(Redirect::to(ADMIN_HOME))
    }
}
