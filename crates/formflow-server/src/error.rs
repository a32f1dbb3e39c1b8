//! HTTP error mapping for the step controller

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use formflow_core::Error;

/// Error returned by route handlers
///
/// Lookup failures become 404s with a short message; everything else is
/// logged and reported as a generic 500 without a `Set-Cookie` header.
#[derive(Debug)]
pub struct AppError(pub Error);

impl From<Error> for AppError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self.0 {
            Error::FormNotFound(_) => "Form not found",
            Error::StepNotFound { .. } => "Step not found",
            other => {
                error!(error = %other, "Request failed");
                "Something went wrong"
            }
        };

        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}
