//! Span builder helpers for request-id instrumentation.

/// Create the per-request span every downstream log line is nested under.
///
/// Usage: `let span = request_span!(request_id, source, method, uri);`
///
/// `status` is recorded once the response is available.
#[macro_export]
macro_rules! request_span {
    ($request_id:expr, $source:expr, $method:expr, $uri:expr) => {
        tracing::info_span!(
            "request",
            request_id = %$request_id,
            id_source = %$source,
            method = %$method,
            uri = %$uri,
            status = tracing::field::Empty,
        )
    };
}
