//! In-memory session record store for tests and development

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use crate::{
    CleanupStats, Error, NewSessionRecord, RecordId, Result, SessionData, SessionRecord,
    SessionRecordStore,
};

/// Process-local session store
///
/// Records live for the lifetime of the process. Cloning the store shares the
/// underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    records: Arc<DashMap<RecordId, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl SessionRecordStore for InMemorySessionStore {
    async fn create(&self, record: NewSessionRecord) -> Result<SessionRecord> {
        let record = record.into_record(Utc::now());
        self.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: &RecordId) -> Result<Option<SessionRecord>> {
        Ok(self.records.get(id).map(|entry| entry.value().clone()))
    }

    async fn update(&self, id: &RecordId, data: SessionData) -> Result<SessionRecord> {
        let mut entry = self
            .records
            .get_mut(id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        entry.data = data;
        entry.updated_at = Utc::now();
        Ok(entry.value().clone())
    }

    async fn mark_completed(&self, id: &RecordId, at: DateTime<Utc>) -> Result<SessionRecord> {
        let mut entry = self
            .records
            .get_mut(id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        entry.completed_at = Some(at);
        entry.updated_at = at;
        Ok(entry.value().clone())
    }

    async fn delete(&self, id: &RecordId) -> Result<bool> {
        Ok(self.records.remove(id).is_some())
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<CleanupStats> {
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_expired_at(now));
        let deleted = before.saturating_sub(self.records.len());
        Ok(CleanupStats {
            sessions_deleted: deleted as u64,
        })
    }
}
