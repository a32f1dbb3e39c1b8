//! Session record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result, SessionData};

/// Identifier of a form configuration (the `{form_id}` route segment).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormId(String);

impl FormId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FormId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FormId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Store-generated identifier of a session record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Create a new random record ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parse a record ID from its string form
    pub fn from_string(s: &str) -> Result<Self> {
        let uuid = Uuid::parse_str(s)
            .map_err(|e| Error::InvalidSessionState(format!("Invalid record ID format: {}", e)))?;
        Ok(Self(uuid))
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_string(s)
    }
}

/// The accumulating answers of one `(caller, form)` lineage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: RecordId,
    pub form_id: FormId,
    pub data: SessionData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    /// Whether the record has passed its expiry instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Input to `SessionRecordStore::create`; the store assigns id and timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct NewSessionRecord {
    pub form_id: FormId,
    pub data: SessionData,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewSessionRecord {
    pub fn new(form_id: FormId, data: SessionData) -> Self {
        Self {
            form_id,
            data,
            expires_at: None,
        }
    }

    pub fn with_expires_at(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// Materialize the record with a fresh id, as in-process stores do
    pub fn into_record(self, now: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            id: RecordId::new(),
            form_id: self.form_id,
            data: self.data,
            created_at: now,
            updated_at: now,
            expires_at: self.expires_at,
            completed_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_record_id_creation() {
        let id1 = RecordId::new();
        let id2 = RecordId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_record_id_from_string() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id: RecordId = uuid_str.parse().unwrap();
        assert_eq!(id.to_string(), uuid_str);
    }

    #[test]
    fn test_record_id_invalid_string() {
        assert!(RecordId::from_string("not-a-uuid").is_err());
    }

    #[test]
    fn test_form_id_serializes_as_plain_string() {
        let id = FormId::new("test");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"test\"");
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let mut record = NewSessionRecord::new(FormId::new("test"), SessionData::new())
            .with_expires_at(Some(now + Duration::minutes(5)))
            .into_record(now);

        assert!(!record.is_expired_at(now));
        assert!(record.is_expired_at(now + Duration::minutes(5)));

        record.expires_at = None;
        assert!(!record.is_expired_at(now + Duration::days(365)));
    }
}
