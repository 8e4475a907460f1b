//! Error types for request identifier assignment.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use http::header::InvalidHeaderName;

/// Errors raised while building an [`Assigner`](crate::Assigner) or reading
/// the identifier back out of a request.
///
/// Assignment itself has no failure path: once an assigner is built, every
/// request gets an identifier.
#[derive(Debug, thiserror::Error)]
pub enum RequestIdError {
    #[error("invalid request id header name {name:?}")]
    InvalidHeaderName {
        name: String,
        #[source]
        source: InvalidHeaderName,
    },

    #[error("request id missing from request extensions; is the assigner mounted?")]
    Missing,
}

impl IntoResponse for RequestIdError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request id unavailable");
        (StatusCode::INTERNAL_SERVER_ERROR, "request id unavailable").into_response()
    }
}
