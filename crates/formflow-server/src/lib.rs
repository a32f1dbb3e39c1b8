//! FormFlow server
//!
//! The HTTP step controller for multi-step forms, together with its
//! configuration, session store factory and catalog hot reload.

pub mod app;
pub mod config;
pub mod cookie;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod reload;
pub mod session_factory;

use axum::{Router, middleware::from_fn_with_state};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use formflow_observability::health::{HealthState, health_router};

pub use app::{AppState, StoreReadiness};

/// Build the full application router: flow routes plus health and metrics
pub fn router(state: AppState) -> Router {
    let readiness = Arc::new(StoreReadiness::new(state.manager().store().clone()));
    let health = health_router(HealthState::with_readiness_checker(
        state.metrics().clone(),
        readiness,
    ));

    let flow = handlers::flow_routes()
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::request_metrics_middleware,
        ))
        .with_state(state);

    flow.merge(health).layer(TraceLayer::new_for_http())
}
