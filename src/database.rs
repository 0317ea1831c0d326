use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tower_sessions_sqlx_store::SqliteStore;
use tracing::info;

use crate::store;

/// Connects, applies pending migrations and seeds the default show.
pub async fn setup_database(db_url: &str) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(db_url);
    options.sqlx_logging(false);
    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;
    store::show::ensure_default_show(&db).await?;
    info!("Database ready");
    Ok(db)
}

/// Session store sharing the database's connection pool.
pub async fn setup_session_store(db: &DatabaseConnection) -> anyhow::Result<SqliteStore> {
    let pool = db.get_sqlite_connection_pool().clone();
    let session_store = SqliteStore::new(pool);
    session_store.migrate().await?;
    Ok(session_store)
}
