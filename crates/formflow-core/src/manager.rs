//! Form Session Manager
//!
//! Owns the read-modify-write cycle of form sessions: resolves a token and
//! form id to a live record, merges each step's data over the accumulated
//! answers, and transparently replaces records that have vanished from the
//! store. The manager keeps no state between calls besides its store handle.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::value::merge_session_data;
use crate::{
    Error, FormId, NewSessionRecord, Result, SessionData, SessionRecord, SessionRecordStore,
    SessionToken,
};

/// How `merge_and_persist` satisfied a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No mapping existed; a new record was created
    Created,
    /// An existing record was updated in place
    Merged,
    /// The token referenced a record that no longer exists; a new one replaced it
    Recovered,
}

impl MergeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeOutcome::Created => "created",
            MergeOutcome::Merged => "merged",
            MergeOutcome::Recovered => "recovered",
        }
    }
}

/// Result of `FormSessionManager::merge_and_persist`
#[derive(Debug, Clone)]
pub struct PersistedSession {
    /// Token to hand back to the caller
    pub token: SessionToken,
    /// The record after the merge
    pub record: SessionRecord,
    pub outcome: MergeOutcome,
}

/// Resolves and persists form sessions on top of a `SessionRecordStore`
#[derive(Clone)]
pub struct FormSessionManager {
    store: Arc<dyn SessionRecordStore>,
    ttl: Option<Duration>,
}

impl FormSessionManager {
    pub fn new(store: Arc<dyn SessionRecordStore>) -> Self {
        Self { store, ttl: None }
    }

    /// Give newly created records an expiry instant `ttl` after creation
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn store(&self) -> &Arc<dyn SessionRecordStore> {
        &self.store
    }

    /// Resolve the session record for `form_id` referenced by `token`
    ///
    /// Returns `Ok(None)` when the token has no mapping for the form, when the
    /// referenced record no longer exists or has expired, and when the record
    /// belongs to a different form.
    ///
    /// # Errors
    /// - `Error::StoreUnavailable` if the store cannot be read
    /// - `Error::InvalidSessionState` if the persisted data is corrupt
    pub async fn resolve(
        &self,
        token: &SessionToken,
        form_id: &FormId,
    ) -> Result<Option<SessionRecord>> {
        let Some(record_id) = token.get(form_id) else {
            return Ok(None);
        };

        let Some(record) = self.store.find_by_id(record_id).await? else {
            debug!(form_id = %form_id, record_id = %record_id, "Token references a missing session record");
            return Ok(None);
        };

        if &record.form_id != form_id {
            warn!(
                form_id = %form_id,
                record_id = %record_id,
                record_form_id = %record.form_id,
                "Session record belongs to a different form"
            );
            return Ok(None);
        }

        if record.is_expired_at(Utc::now()) {
            debug!(form_id = %form_id, record_id = %record_id, "Session record has expired");
            return Ok(None);
        }

        Ok(Some(record))
    }

    /// Merge one step's validated data into the session for `form_id`
    ///
    /// Keys in `new_data` override the same keys in the stored data; all other
    /// keys are kept. When no live record exists a new one is created and the
    /// returned token maps `form_id` to it. The input token is never modified,
    /// so on error the caller still holds its previous token.
    ///
    /// # Errors
    /// - `Error::StoreUnavailable` if the store fails; nothing is persisted
    /// - `Error::InvalidSessionState` if the stored data is corrupt
    pub async fn merge_and_persist(
        &self,
        token: &SessionToken,
        form_id: &FormId,
        new_data: SessionData,
    ) -> Result<PersistedSession> {
        let had_mapping = token.get(form_id).is_some();

        if let Some(existing) = self.resolve(token, form_id).await? {
            let merged = merge_session_data(existing.data, new_data.clone());
            match self.store.update(&existing.id, merged).await {
                Ok(record) => {
                    debug!(
                        form_id = %form_id,
                        record_id = %record.id,
                        fields = record.data.len(),
                        "Merged step data into session"
                    );
                    return Ok(PersistedSession {
                        token: token.with_mapping(form_id.clone(), record.id),
                        record,
                        outcome: MergeOutcome::Merged,
                    });
                }
                Err(Error::SessionNotFound(id)) => {
                    // Deleted between the read and the write
                    debug!(form_id = %form_id, record_id = %id, "Session record vanished during merge");
                }
                Err(e) => return Err(e),
            }
        }

        let record = self.create_record(form_id, new_data).await?;
        let outcome = if had_mapping {
            MergeOutcome::Recovered
        } else {
            MergeOutcome::Created
        };

        info!(
            form_id = %form_id,
            record_id = %record.id,
            outcome = outcome.as_str(),
            "Created form session"
        );

        Ok(PersistedSession {
            token: token.with_mapping(form_id.clone(), record.id),
            record,
            outcome,
        })
    }

    /// Forget the mapping for `form_id`; the stored record is left in place
    pub fn destroy(&self, token: &SessionToken, form_id: &FormId) -> SessionToken {
        token.without(form_id)
    }

    /// Mark the session for `form_id` completed and drop it from the token
    ///
    /// Returns the updated token and the completed record, if one was live.
    pub async fn complete(
        &self,
        token: &SessionToken,
        form_id: &FormId,
    ) -> Result<(SessionToken, Option<SessionRecord>)> {
        let completed = match self.resolve(token, form_id).await? {
            Some(record) => match self.store.mark_completed(&record.id, Utc::now()).await {
                Ok(record) => {
                    info!(form_id = %form_id, record_id = %record.id, "Completed form session");
                    Some(record)
                }
                Err(Error::SessionNotFound(_)) => None,
                Err(e) => return Err(e),
            },
            None => None,
        };

        Ok((self.destroy(token, form_id), completed))
    }

    async fn create_record(&self, form_id: &FormId, data: SessionData) -> Result<SessionRecord> {
        let expires_at = match self.ttl {
            Some(ttl) => Some(Utc::now().checked_add_signed(ttl).ok_or_else(|| {
                Error::Config(format!("session TTL of {}s is out of range", ttl.num_seconds()))
            })?),
            None => None,
        };
        self.store
            .create(NewSessionRecord::new(form_id.clone(), data).with_expires_at(expires_at))
            .await
    }
}
