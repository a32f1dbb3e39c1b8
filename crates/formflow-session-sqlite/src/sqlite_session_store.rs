//! SqliteSessionStore - SessionRecordStore implementation for SQLite

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use formflow_core::{
    CleanupStats, Error, FormId, NewSessionRecord, RecordId, Result, SessionData, SessionRecord,
    SessionRecordStore, value::session_data_from_str,
};

const SCHEMA_VERSION: i32 = 1;

const RECORD_COLUMNS: &str = "id, form_id, data, created_at, updated_at, expires_at, completed_at";

/// SQLite-backed session record store
///
/// Timestamps are stored as microseconds since the Unix epoch so that expiry
/// comparisons run on integers.
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    /// Open (or create) the database at `db_path`
    ///
    /// # Errors
    /// - `Error::Io` if the parent directory can't be created
    /// - `Error::Database` if the connection or schema setup fails
    pub async fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(&db_path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .synchronous(SqliteSynchronous::Normal),
            )
            .await
            .map_err(|e| Error::Database(format!("Failed to open SQLite database: {}", e)))?;

        Self::initialize(pool, &db_path).await
    }

    /// Private in-memory database, mainly for tests
    pub async fn in_memory() -> Result<Self> {
        // A single connection that never expires, so the database lives as long as the pool
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(SqliteConnectOptions::new().in_memory(true))
            .await
            .map_err(|e| Error::Database(format!("Failed to open SQLite database: {}", e)))?;

        Self::initialize(pool, Path::new(":memory:")).await
    }

    async fn initialize(pool: SqlitePool, db_path: &Path) -> Result<Self> {
        Self::initialize_schema(&pool).await?;

        let version: i32 = sqlx::query_scalar("SELECT version FROM schema_version")
            .fetch_one(&pool)
            .await
            .map_err(db_error)?;

        if version != SCHEMA_VERSION {
            return Err(Error::Database(format!(
                "Unsupported schema version: {}",
                version
            )));
        }

        info!("Initialized SqliteSessionStore at {:?}", db_path);
        Ok(Self { pool })
    }

    async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(db_error)?;

        sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (1)")
            .execute(pool)
            .await
            .map_err(db_error)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS form_sessions (
                id TEXT PRIMARY KEY,
                form_id TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                expires_at INTEGER,
                completed_at INTEGER
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(db_error)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_form_sessions_expires ON form_sessions(expires_at)",
        )
        .execute(pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }
}

fn db_error(e: sqlx::Error) -> Error {
    Error::Database(e.to_string())
}

fn store_error(e: sqlx::Error) -> Error {
    Error::StoreUnavailable(e.to_string())
}

fn to_micros(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

fn from_micros(micros: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| Error::InvalidSessionState(format!("Invalid timestamp: {}", micros)))
}

fn row_to_record(row: &SqliteRow) -> Result<SessionRecord> {
    let id: String = row.try_get("id").map_err(store_error)?;
    let form_id: String = row.try_get("form_id").map_err(store_error)?;
    let data: String = row.try_get("data").map_err(store_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(store_error)?;
    let updated_at: i64 = row.try_get("updated_at").map_err(store_error)?;
    let expires_at: Option<i64> = row.try_get("expires_at").map_err(store_error)?;
    let completed_at: Option<i64> = row.try_get("completed_at").map_err(store_error)?;

    Ok(SessionRecord {
        id: RecordId::from_string(&id)?,
        form_id: FormId::new(form_id),
        data: session_data_from_str(&data)?,
        created_at: from_micros(created_at)?,
        updated_at: from_micros(updated_at)?,
        expires_at: expires_at.map(from_micros).transpose()?,
        completed_at: completed_at.map(from_micros).transpose()?,
    })
}

#[async_trait]
impl SessionRecordStore for SqliteSessionStore {
    async fn create(&self, record: NewSessionRecord) -> Result<SessionRecord> {
        let record = record.into_record(Utc::now());
        let data = serde_json::to_string(&record.data)?;

        let row = sqlx::query(&format!(
            "INSERT INTO form_sessions ({RECORD_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {RECORD_COLUMNS}"
        ))
        .bind(record.id.to_string())
        .bind(record.form_id.as_str())
        .bind(data)
        .bind(to_micros(record.created_at))
        .bind(to_micros(record.updated_at))
        .bind(record.expires_at.map(to_micros))
        .bind(record.completed_at.map(to_micros))
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        debug!(record_id = %record.id, form_id = %record.form_id, "Created session record");
        row_to_record(&row)
    }

    async fn find_by_id(&self, id: &RecordId) -> Result<Option<SessionRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM form_sessions WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn update(&self, id: &RecordId, data: SessionData) -> Result<SessionRecord> {
        let data = serde_json::to_string(&data)?;

        let row = sqlx::query(&format!(
            "UPDATE form_sessions SET data = ?, updated_at = ? WHERE id = ? RETURNING {RECORD_COLUMNS}"
        ))
        .bind(data)
        .bind(to_micros(Utc::now()))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        match row {
            Some(row) => row_to_record(&row),
            None => Err(Error::SessionNotFound(id.to_string())),
        }
    }

    async fn mark_completed(&self, id: &RecordId, at: DateTime<Utc>) -> Result<SessionRecord> {
        let row = sqlx::query(&format!(
            "UPDATE form_sessions SET completed_at = ?, updated_at = ? WHERE id = ? RETURNING {RECORD_COLUMNS}"
        ))
        .bind(to_micros(at))
        .bind(to_micros(at))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        match row {
            Some(row) => row_to_record(&row),
            None => Err(Error::SessionNotFound(id.to_string())),
        }
    }

    async fn delete(&self, id: &RecordId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM form_sessions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<CleanupStats> {
        let result = sqlx::query(
            "DELETE FROM form_sessions WHERE expires_at IS NOT NULL AND expires_at <= ?",
        )
        .bind(to_micros(now))
        .execute(&self.pool)
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
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use formflow_core::FieldValue;
    use tempfile::tempdir;

    fn sample_data() -> SessionData {
        let mut data = SessionData::new();
        data.insert("name".to_string(), FieldValue::from("John Doe"));
        data.insert(
            "apples".to_string(),
            FieldValue::List(vec!["apple-1".to_string(), "apple-3".to_string()]),
        );
        data.insert("notifications".to_string(), FieldValue::Bool(true));
        data
    }

    #[tokio::test]
    async fn test_schema_version() {
        let store = SqliteSessionStore::in_memory().await.unwrap();
        let version: i32 = sqlx::query_scalar("SELECT version FROM schema_version")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_create_and_find_round_trips_data() {
        let store = SqliteSessionStore::in_memory().await.unwrap();
        let created = store
            .create(NewSessionRecord::new(FormId::new("test"), sample_data()))
            .await
            .unwrap();

        let found = store.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
        assert_eq!(found.data, sample_data());
        assert!(found.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let store = SqliteSessionStore::in_memory().await.unwrap();
        assert!(store.find_by_id(&RecordId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update() {
        let store = SqliteSessionStore::in_memory().await.unwrap();
        let created = store
            .create(NewSessionRecord::new(FormId::new("test"), sample_data()))
            .await
            .unwrap();

        let mut replacement = sample_data();
        replacement.insert("phone".to_string(), FieldValue::from("(555) 123-4567"));
        let updated = store.update(&created.id, replacement.clone()).await.unwrap();
        assert_eq!(updated.data, replacement);
        assert_eq!(updated.created_at, created.created_at);

        let missing = store.update(&RecordId::new(), replacement).await;
        assert!(matches!(missing, Err(Error::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_mark_completed_and_delete() {
        let store = SqliteSessionStore::in_memory().await.unwrap();
        let created = store
            .create(NewSessionRecord::new(FormId::new("test"), sample_data()))
            .await
            .unwrap();

        let completed = store.mark_completed(&created.id, Utc::now()).await.unwrap();
        assert!(completed.is_completed());

        assert!(store.delete(&created.id).await.unwrap());
        assert!(!store.delete(&created.id).await.unwrap());
        assert!(matches!(
            store.mark_completed(&created.id, Utc::now()).await,
            Err(Error::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let store = SqliteSessionStore::in_memory().await.unwrap();
        let now = Utc::now();

        store
            .create(
                NewSessionRecord::new(FormId::new("test"), sample_data())
                    .with_expires_at(Some(now - Duration::minutes(5))),
            )
            .await
            .unwrap();
        let live = store
            .create(
                NewSessionRecord::new(FormId::new("test"), sample_data())
                    .with_expires_at(Some(now + Duration::minutes(5))),
            )
            .await
            .unwrap();

        let stats = store.cleanup_expired(now).await.unwrap();
        assert_eq!(stats.sessions_deleted, 1);
        assert!(store.find_by_id(&live.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_corrupt_data_is_invalid_session_state() {
        let store = SqliteSessionStore::in_memory().await.unwrap();
        let created = store
            .create(NewSessionRecord::new(FormId::new("test"), sample_data()))
            .await
            .unwrap();

        sqlx::query("UPDATE form_sessions SET data = ? WHERE id = ?")
            .bind(r#"{"nested":{"a":1}}"#)
            .bind(created.id.to_string())
            .execute(&store.pool)
            .await
            .unwrap();

        assert!(matches!(
            store.find_by_id(&created.id).await,
            Err(Error::InvalidSessionState(_))
        ));
    }

    #[tokio::test]
    async fn test_file_database_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("sessions.db");

        let id = {
            let store = SqliteSessionStore::new(&path).await.unwrap();
            store
                .create(NewSessionRecord::new(FormId::new("test"), sample_data()))
                .await
                .unwrap()
                .id
        };

        let store = SqliteSessionStore::new(&path).await.unwrap();
        let found = store.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(found.data, sample_data());
        assert!(store.health_check().await.is_ok());
    }
}
