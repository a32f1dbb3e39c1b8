//! Session record store trait
//!
//! The `SessionRecordStore` trait abstracts durable keyed storage for form
//! session records, allowing the Form Session Manager to run unchanged on top
//! of an in-process map (tests, development), SQLite (single node) or
//! PostgreSQL (shared deployments).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{NewSessionRecord, RecordId, Result, SessionData, SessionRecord};

/// Statistics returned by `SessionRecordStore::cleanup_expired`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupStats {
    /// Number of expired records removed
    pub sessions_deleted: u64,
}

/// Session record store trait
///
/// Implementations:
/// - `InMemorySessionStore`: process-local map (tests and development)
/// - `SqliteSessionStore`: SQLite database (single node)
/// - `PostgresSessionStore`: PostgreSQL database (shared deployments)
///
/// Stores never retry internally; any backend failure is reported as
/// `Error::StoreUnavailable` and retries belong to the caller.
///
/// # Example
/// ```no_run
/// # use formflow_core::{FormId, NewSessionRecord, SessionData, SessionRecordStore};
/// # async fn example(store: &dyn SessionRecordStore) -> formflow_core::Result<()> {
/// let record = store
///     .create(NewSessionRecord::new(FormId::new("test"), SessionData::new()))
///     .await?;
/// let found = store.find_by_id(&record.id).await?;
/// assert!(found.is_some());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait SessionRecordStore: Send + Sync {
    /// Create a new record
    ///
    /// The store generates the record id and the creation timestamps.
    ///
    /// # Errors
    /// - `Error::StoreUnavailable` for write errors
    async fn create(&self, record: NewSessionRecord) -> Result<SessionRecord>;

    /// Look up a record by id
    ///
    /// Returns `Ok(None)` when no record with this id exists.
    ///
    /// # Errors
    /// - `Error::StoreUnavailable` for read errors
    /// - `Error::InvalidSessionState` if the persisted data is not a flat map
    async fn find_by_id(&self, id: &RecordId) -> Result<Option<SessionRecord>>;

    /// Replace the data of an existing record
    ///
    /// # Errors
    /// - `Error::SessionNotFound` if the record doesn't exist
    /// - `Error::StoreUnavailable` for write errors
    async fn update(&self, id: &RecordId, data: SessionData) -> Result<SessionRecord>;

    /// Stamp the completion instant of an existing record
    ///
    /// # Errors
    /// - `Error::SessionNotFound` if the record doesn't exist
    /// - `Error::StoreUnavailable` for write errors
    async fn mark_completed(&self, id: &RecordId, at: DateTime<Utc>) -> Result<SessionRecord>;

    /// Delete a record, returning whether it existed
    ///
    /// Not used by the normal step flow; provided for cleanup jobs and tests.
    async fn delete(&self, id: &RecordId) -> Result<bool>;

    /// Remove records whose expiry instant is at or before `now`
    ///
    /// Should be called periodically by an external job.
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<CleanupStats> {
        // Default implementation: stores without expiry support keep everything
        let _ = now;
        Ok(CleanupStats::default())
    }

    /// Check that the backend is reachable
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
