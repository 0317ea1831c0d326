use carshow_votes::{
    config::Config,
    database::{setup_database, setup_session_store},
    router::{AppState, create_router, shutdown_signal},
    stripe::{PaymentProvider, StripeClient},
};
use axum_login::tower_sessions::ExpiredDeletion;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine in production.
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let db = setup_database(&config.database_url).await?;
    let session_store = setup_session_store(&db).await?;

    let deletion_task = tokio::task::spawn(
        session_store
            .clone()
            .continuously_delete_expired(tokio::time::Duration::from_secs(60)),
    );

    let payments: Option<Arc<dyn PaymentProvider>> = match &config.stripe_secret_key {
        Some(key) => Some(Arc::new(StripeClient::new(key.clone()))),
        None => {
            warn!("STRIPE_SECRET_KEY is not set, checkout is disabled");
            None
        }
    };
    if config.stripe_webhook_secret.is_none() {
        warn!("STRIPE_WEBHOOK_SECRET is not set, webhook deliveries will be refused");
    }

    let port = config.port;
    let state = AppState::new(db, config, payments);
    let app = create_router(state, session_store);

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(deletion_task.abort_handle()))
        .await?;

    match deletion_task.await {
        Ok(result) => result?,
        Err(err) if err.is_cancelled() => {}
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
