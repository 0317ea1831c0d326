use crate::{
    auth::{router as auth_router, user::Backend},
    config::Config,
    error::AppError,
    routes,
    store,
    stripe::PaymentProvider,
    util::asset_loader::AssetLoader,
    voting::{CATEGORIES, VOTE_PRICE_CENTS},
};
use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::{Html, Response},
    routing::{get, get_service},
};
use axum_login::{
    AuthManagerLayerBuilder, login_required,
    tower_sessions::{
        Expiry, SessionManagerLayer,
        cookie::{Key, SameSite, time},
    },
};
use chrono::Utc;
use minijinja::{Environment, Value};
use sea_orm::DatabaseConnection;
use sha2::{Digest, Sha512};
use std::sync::Arc;
use tokio::{signal, task::AbortHandle};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions_sqlx_store::SqliteStore;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub templates: Arc<Environment<'static>>,
    pub payments: Option<Arc<dyn PaymentProvider>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        config: Config,
        payments: Option<Arc<dyn PaymentProvider>>,
    ) -> Self {
        let templates = setup_templates(&config.templates_dir, &config.static_dir);
        Self {
            db,
            templates: Arc::new(templates),
            payments,
            config: Arc::new(config),
        }
    }

    pub fn payments(&self) -> Result<&dyn PaymentProvider, AppError> {
        self.payments
            .as_deref()
            .ok_or(AppError::PaymentsNotConfigured)
    }

    pub fn render(&self, name: &str, ctx: Value) -> Result<Html<String>, AppError> {
        let tmpl = self.templates.get_template(name)?;
        Ok(Html(tmpl.render(ctx)?))
    }
}

pub fn create_router(state: AppState, session_store: SqliteStore) -> Router {
    // Signed cookies need a 64 byte key.
    let key = Key::from(Sha512::digest(state.config.session_secret.as_bytes()).as_slice());
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(12)))
        .with_signed(key);

    let backend = Backend::new(&state.config.admin_password);
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    let admin = routes::admin::router().route_layer(login_required!(
        Backend,
        login_url = "/admin",
        redirect_field = "next"
    ));

    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/admin", get(routes::admin::index))
        .merge(admin)
        .merge(auth_router::router())
        .merge(routes::public::router())
        .merge(routes::checkin::router())
        .merge(routes::voting::router())
        .merge(routes::attend::router())
        .merge(routes::webhook::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auto_close_voting,
        ))
        .with_state(state)
        .nest_service("/static", get_service(ServeDir::new(static_dir)))
        .layer(auth_layer)
        .layer(TraceLayer::new_for_http())
}

/// Closes voting on the active show once `VOTING_END` has passed.
async fn auto_close_voting(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(voting_end) = state.config.voting_end {
        if let Err(err) = store::show::close_voting_if_past(&state.db, voting_end, Utc::now()).await
        {
            tracing::error!("Could not apply voting end: {}", err);
        }
    }
    next.run(request).await
}

pub fn setup_templates(templates_dir: &str, static_dir: &str) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(minijinja::path_loader(templates_dir));
    env.add_global("categories", Value::from_serialize(CATEGORIES));
    env.add_global("vote_price_cents", VOTE_PRICE_CENTS);
    env.add_filter("dollars", |cents: i64| format!("{:.2}", cents as f64 / 100.0));
    let asset_loader = AssetLoader::new(static_dir);
    asset_loader.register(&mut env);
    env
}

pub async fn shutdown_signal(deletion_task_abort_handle: AbortHandle) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { deletion_task_abort_handle.abort() },
        _ = terminate => { deletion_task_abort_handle.abort() },
    }
    tracing::info!("Shutting down");
}
