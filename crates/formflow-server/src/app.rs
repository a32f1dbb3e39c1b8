//! Shared application state
//!
//! Holds the session manager, token codec and form catalog behind `Arc`s so
//! every request handler sees the same instances. The catalog sits behind a
//! `RwLock` so the file watcher can swap in a reloaded version.

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue};
use std::sync::Arc;
use tokio::sync::RwLock;

use formflow_core::{
    Error, FormSessionManager, Result, SessionRecordStore, SessionToken, TokenCodec,
    form::FormCatalog,
};
use formflow_observability::health::{ComponentStatus, ReadinessChecker};
use formflow_observability::metrics::Metrics;

use crate::cookie::CookieSettings;

#[derive(Clone)]
pub struct AppState {
    manager: FormSessionManager,
    codec: TokenCodec,
    catalog: Arc<RwLock<Arc<FormCatalog>>>,
    metrics: Arc<Metrics>,
    cookie: CookieSettings,
}

impl AppState {
    pub fn new(
        manager: FormSessionManager,
        codec: TokenCodec,
        catalog: FormCatalog,
        metrics: Arc<Metrics>,
        cookie: CookieSettings,
    ) -> Self {
        Self {
            manager,
            codec,
            catalog: Arc::new(RwLock::new(Arc::new(catalog))),
            metrics,
            cookie,
        }
    }

    pub fn manager(&self) -> &FormSessionManager {
        &self.manager
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn cookie(&self) -> &CookieSettings {
        &self.cookie
    }

    /// Snapshot of the current catalog
    pub async fn catalog(&self) -> Arc<FormCatalog> {
        self.catalog.read().await.clone()
    }

    /// Swap in a new catalog; in-flight requests keep their snapshot
    pub async fn replace_catalog(&self, catalog: FormCatalog) {
        *self.catalog.write().await = Arc::new(catalog);
    }

    /// Session token carried by the request, empty when absent or unreadable
    pub fn session_token(&self, headers: &HeaderMap) -> SessionToken {
        self.codec.decode(self.cookie.read(headers))
    }

    /// `Set-Cookie` header carrying `token`
    pub fn session_cookie(&self, token: &SessionToken) -> Result<HeaderValue> {
        let raw = self.codec.encode(token)?;
        self.cookie
            .to_header(&raw)
            .ok_or_else(|| Error::Internal("session cookie is not a valid header value".to_string()))
    }
}

/// Readiness check backed by the session store's health check
pub struct StoreReadiness {
    store: Arc<dyn SessionRecordStore>,
}

impl StoreReadiness {
    pub fn new(store: Arc<dyn SessionRecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ReadinessChecker for StoreReadiness {
    async fn check(&self) -> Vec<ComponentStatus> {
        match self.store.health_check().await {
            Ok(()) => vec![ComponentStatus::healthy("session_store")],
            Err(e) => vec![ComponentStatus::unhealthy("session_store", e.to_string())],
        }
    }
}
