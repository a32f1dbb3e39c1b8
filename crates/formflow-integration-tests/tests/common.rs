//! Common test utilities for integration tests

use formflow_core::{FieldValue, InMemorySessionStore, SessionData, SessionRecordStore};
use formflow_session_sqlite::SqliteSessionStore;
use std::sync::Arc;
use tempfile::TempDir;

/// A store under test; keeps its temporary directory alive
#[allow(dead_code)]
pub struct StoreFixture {
    pub name: &'static str,
    pub store: Arc<dyn SessionRecordStore>,
    _dir: Option<TempDir>,
}

/// Every session store backend that runs without external services
#[allow(dead_code)]
pub async fn stores() -> Vec<StoreFixture> {
    let dir = tempfile::tempdir().unwrap();
    let sqlite_file = SqliteSessionStore::new(dir.path().join("sessions.db"))
        .await
        .unwrap();

    vec![
        StoreFixture {
            name: "memory",
            store: Arc::new(InMemorySessionStore::new()),
            _dir: None,
        },
        StoreFixture {
            name: "sqlite-memory",
            store: Arc::new(SqliteSessionStore::in_memory().await.unwrap()),
            _dir: None,
        },
        StoreFixture {
            name: "sqlite-file",
            store: Arc::new(sqlite_file),
            _dir: Some(dir),
        },
    ]
}

/// Build session data from text pairs
#[allow(dead_code)]
pub fn text_data(pairs: &[(&str, &str)]) -> SessionData {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), FieldValue::from(*v)))
        .collect()
}
