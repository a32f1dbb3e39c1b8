//! PostgresSessionStore - SessionRecordStore implementation for PostgreSQL

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::PostgresSessionStoreConfig;
use formflow_core::{
    CleanupStats, Error, FormId, NewSessionRecord, RecordId, Result, SessionData, SessionRecord,
    SessionRecordStore, value::session_data_from_json,
};

const RECORD_COLUMNS: &str = "id, form_id, data, created_at, updated_at, expires_at, completed_at";

/// PostgreSQL-backed session record store
#[derive(Clone)]
pub struct PostgresSessionStore {
    pool: Arc<PgPool>,
}

impl PostgresSessionStore {
    /// Connect with the default pool configuration
    ///
    /// # Errors
    /// - `Error::Database` if connection fails or schema migration fails
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::with_config(database_url, PostgresSessionStoreConfig::default()).await
    }

    /// Connect with a custom pool configuration
    ///
    /// # Errors
    /// - `Error::Database` if connection fails or schema migration fails
    ///
    /// # Example
    /// ```no_run
    /// # use formflow_session_postgres::{PostgresSessionStore, PostgresSessionStoreConfig};
    /// # async fn example() -> formflow_core::Result<()> {
    /// let config = PostgresSessionStoreConfig::default().with_max_connections(50);
    /// let store = PostgresSessionStore::with_config("postgres://localhost/formflow", config).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn with_config(
        database_url: &str,
        config: PostgresSessionStoreConfig,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .max_lifetime(Some(config.max_lifetime))
            .connect(database_url)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to PostgreSQL: {}", e)))?;

        let store = Self::from_pool(pool);
        store.run_migrations().await?;

        info!("Initialized PostgresSessionStore");
        Ok(store)
    }

    /// Wrap an existing pool; migrations are not run
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the `form_sessions` table and its indexes if missing
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS form_sessions (
                id UUID PRIMARY KEY,
                form_id TEXT NOT NULL,
                data JSONB NOT NULL DEFAULT '{}'::jsonb,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                expires_at TIMESTAMPTZ,
                completed_at TIMESTAMPTZ
            )
            "#,
        )
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to create form_sessions table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_form_sessions_expires ON form_sessions(expires_at) WHERE expires_at IS NOT NULL",
        )
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to create index: {}", e)))?;

        Ok(())
    }
}

fn store_error(e: sqlx::Error) -> Error {
    Error::StoreUnavailable(e.to_string())
}

fn row_to_record(row: &PgRow) -> Result<SessionRecord> {
    let id: sqlx::types::Uuid = row.try_get("id").map_err(store_error)?;
    let form_id: String = row.try_get("form_id").map_err(store_error)?;
    let Json(data): Json<serde_json::Value> = row.try_get("data").map_err(store_error)?;

    Ok(SessionRecord {
        id: RecordId::from_uuid(id),
        form_id: FormId::new(form_id),
        data: session_data_from_json(data)?,
        created_at: row.try_get("created_at").map_err(store_error)?,
        updated_at: row.try_get("updated_at").map_err(store_error)?,
        expires_at: row.try_get("expires_at").map_err(store_error)?,
        completed_at: row.try_get("completed_at").map_err(store_error)?,
    })
}

#[async_trait]
impl SessionRecordStore for PostgresSessionStore {
    async fn create(&self, record: NewSessionRecord) -> Result<SessionRecord> {
        let record = record.into_record(Utc::now());

        let row = sqlx::query(&format!(
            "INSERT INTO form_sessions ({RECORD_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {RECORD_COLUMNS}"
        ))
        .bind(*record.id.as_uuid())
        .bind(record.form_id.as_str())
        .bind(Json(&record.data))
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(record.expires_at)
        .bind(record.completed_at)
        .fetch_one(&*self.pool)
        .await
        .map_err(store_error)?;

        debug!(record_id = %record.id, form_id = %record.form_id, "Created session record");
        row_to_record(&row)
    }

    async fn find_by_id(&self, id: &RecordId) -> Result<Option<SessionRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM form_sessions WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(store_error)?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn update(&self, id: &RecordId, data: SessionData) -> Result<SessionRecord> {
        let row = sqlx::query(&format!(
            "UPDATE form_sessions SET data = $1, updated_at = $2 WHERE id = $3 RETURNING {RECORD_COLUMNS}"
        ))
        .bind(Json(&data))
        .bind(Utc::now())
        .bind(*id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(store_error)?;

        match row {
            Some(row) => row_to_record(&row),
            None => Err(Error::SessionNotFound(id.to_string())),
        }
    }

    async fn mark_completed(&self, id: &RecordId, at: DateTime<Utc>) -> Result<SessionRecord> {
        let row = sqlx::query(&format!(
            "UPDATE form_sessions SET completed_at = $1, updated_at = $1 WHERE id = $2 RETURNING {RECORD_COLUMNS}"
        ))
        .bind(at)
        .bind(*id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(store_error)?;

        match row {
            Some(row) => row_to_record(&row),
            None => Err(Error::SessionNotFound(id.to_string())),
        }
    }

    async fn delete(&self, id: &RecordId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM form_sessions WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<CleanupStats> {
        let result = sqlx::query(
            "DELETE FROM form_sessions WHERE expires_at IS NOT NULL AND expires_at <= $1",
        )
        .bind(now)
        .execute(&*self.pool)
        .await
        .map_err(store_error)?;

        let stats = CleanupStats {
            sessions_deleted: result.rows_affected(),
        };
        info!(deleted = stats.sessions_deleted, "Cleaned up expired form sessions");
        Ok(stats)
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&*self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}
