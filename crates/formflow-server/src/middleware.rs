//! Request middleware

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::app::AppState;

/// Record the duration of every request, labelled by route template
pub async fn request_metrics_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = req.method().to_string();

    let start = Instant::now();
    let response = next.run(req).await;

    state
        .metrics()
        .record_request_duration(&route, &method, start.elapsed().as_secs_f64());

    response
}
