//! Session store factory
//!
//! Creates the `SessionRecordStore` implementation selected in configuration.

use formflow_core::{Error, InMemorySessionStore, Result, SessionRecordStore};
use std::sync::Arc;

use crate::config::{SessionConfig, StoreBackend};

/// Create a session record store based on configuration
///
/// # Errors
/// - `Error::Config` if the selected backend is not configured or not compiled in
/// - `Error::Database` if the database connection fails
pub async fn create_session_store(config: &SessionConfig) -> Result<Arc<dyn SessionRecordStore>> {
    match config.store {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory session store; sessions are lost on restart");
            Ok(Arc::new(InMemorySessionStore::new()))
        }
        StoreBackend::Sqlite => {
            let path = shellexpand::tilde(&config.sqlite.path).to_string();
            tracing::info!("Initializing SQLite session store (db={})", path);

            let store = formflow_session_sqlite::SqliteSessionStore::new(path).await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Postgres => create_postgres_store(config).await,
    }
}

#[cfg(feature = "postgres")]
async fn create_postgres_store(config: &SessionConfig) -> Result<Arc<dyn SessionRecordStore>> {
    use std::time::Duration;

    let postgres_config = config.postgres.as_ref().ok_or_else(|| {
        Error::Config("session.postgres must be configured for the postgres store".to_string())
    })?;

    tracing::info!("Initializing PostgreSQL session store");

    let pg_config = formflow_session_postgres::PostgresSessionStoreConfig::default()
        .with_max_connections(postgres_config.max_connections)
        .with_min_connections(postgres_config.min_connections)
        .with_acquire_timeout(Duration::from_secs(postgres_config.acquire_timeout_seconds))
        .with_idle_timeout(Duration::from_secs(postgres_config.idle_timeout_seconds))
        .with_max_lifetime(Duration::from_secs(postgres_config.max_lifetime_seconds));

    let store = formflow_session_postgres::PostgresSessionStore::with_config(
        &postgres_config.connection_string,
        pg_config,
    )
    .await?;

    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres"))]
async fn create_postgres_store(_config: &SessionConfig) -> Result<Arc<dyn SessionRecordStore>> {
    Err(Error::Config(
        "PostgreSQL session store requested but the server was built without the `postgres` feature"
            .to_string(),
    ))
}
