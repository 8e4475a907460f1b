//! Axum HTTP server: router, listener, graceful shutdown.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::assign::Assigner;
use crate::config::AppConfig;
use crate::extract::RequestId;

/// Build the application router with the assigner mounted on every route.
///
/// The assigner wraps the trace layer so request/response logging happens
/// inside the request span.
pub fn router(assigner: Assigner) -> Router {
    let app = Router::new()
        .route("/", get(handle_echo))
        .route("/health", get(handle_health))
        .layer(
            TraceLayer::new_for_http()
                .on_request(())
                .on_response(|response: &Response, latency: Duration, _span: &tracing::Span| {
                    tracing::info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis() as u64,
                        "Request complete"
                    );
                }),
        );

    assigner.layer(app)
}

/// Build and run the HTTP server.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let assigner = Assigner::from_config(&config.request_id)?;
    let listen_addr = config.server.listen_address.clone();

    let app = router(assigner);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(address = %listen_addr, "reqid-echo listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("reqid-echo shut down gracefully");
    Ok(())
}

/// GET / — report the identifier assigned to this request.
async fn handle_echo(request_id: RequestId) -> Response {
    tracing::info!("Echoing request id");
    let body = serde_json::json!({ "request_id": request_id.as_str() });
    (StatusCode::OK, Json(body)).into_response()
}

/// Health check endpoint.
async fn handle_health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Wait for SIGINT (Ctrl+C) for graceful shutdown.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
