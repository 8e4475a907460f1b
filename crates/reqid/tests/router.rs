use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use reqid::{Assigner, RequestId};
use tower::ServiceExt;

/// Router whose handler reports the attached id and counts invocations.
fn app(assigner: Assigner, hits: Arc<AtomicUsize>) -> Router {
    let router = Router::new().route(
        "/",
        get(move |request_id: RequestId| {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                request_id.into_inner()
            }
        }),
    );
    assigner.layer(router)
}

async fn send(app: Router, request: Request) -> (Response, String) {
    let response = app.oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, 64 * 1024).await.unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    (Response::from_parts(parts, Body::empty()), body)
}

fn get_request(headers: &[(&str, &str)]) -> Request {
    let mut builder = Request::builder().uri("/");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

fn header<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn test_generates_and_echoes_uuid() {
    let hits = Arc::new(AtomicUsize::new(0));
    let (response, body) = send(app(Assigner::new(), hits.clone()), get_request(&[])).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(uuid::Uuid::parse_str(&body).is_ok(), "not a uuid: {body}");
    assert_eq!(header(&response, "x-request-id"), Some(body.as_str()));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_incoming_header_is_used() {
    let hits = Arc::new(AtomicUsize::new(0));
    let (response, body) = send(
        app(Assigner::new(), hits.clone()),
        get_request(&[("X-Request-Id", "abc-123")]),
    )
    .await;

    assert_eq!(body, "abc-123");
    assert_eq!(header(&response, "x-request-id"), Some("abc-123"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_incoming_header_is_replaced() {
    let hits = Arc::new(AtomicUsize::new(0));
    let (response, body) = send(
        app(Assigner::new(), hits.clone()),
        get_request(&[("x-request-id", "")]),
    )
    .await;

    assert!(!body.is_empty());
    assert!(uuid::Uuid::parse_str(&body).is_ok());
    assert_eq!(header(&response, "x-request-id"), Some(body.as_str()));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_first_of_repeated_headers_wins() {
    let hits = Arc::new(AtomicUsize::new(0));
    let (response, body) = send(
        app(Assigner::new(), hits.clone()),
        get_request(&[("x-request-id", "id-1"), ("x-request-id", "id-2")]),
    )
    .await;

    assert_eq!(body, "id-1");
    let echoed: Vec<_> = response.headers().get_all("x-request-id").iter().collect();
    assert_eq!(echoed, vec!["id-1"]);
}

#[tokio::test]
async fn test_echo_can_be_disabled() {
    let hits = Arc::new(AtomicUsize::new(0));
    let assigner = Assigner::builder()
        .set_response_header(false)
        .build()
        .unwrap();
    let (response, body) = send(app(assigner, hits.clone()), get_request(&[])).await;

    assert!(!body.is_empty());
    assert!(response.headers().get("x-request-id").is_none());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_custom_header_name() {
    let hits = Arc::new(AtomicUsize::new(0));
    let assigner = Assigner::builder()
        .header_name("x-correlation-id")
        .build()
        .unwrap();
    let (response, body) = send(
        app(assigner, hits.clone()),
        get_request(&[("x-correlation-id", "corr-7"), ("x-request-id", "ignored")]),
    )
    .await;

    assert_eq!(body, "corr-7");
    assert_eq!(header(&response, "x-correlation-id"), Some("corr-7"));
    assert!(response.headers().get("x-request-id").is_none());
}

#[tokio::test]
async fn test_custom_generator() {
    let hits = Arc::new(AtomicUsize::new(0));
    let assigner = Assigner::builder()
        .generator(|_| Ok("fixed-id".to_string()))
        .build()
        .unwrap();
    let (response, body) = send(app(assigner, hits.clone()), get_request(&[])).await;

    assert_eq!(body, "fixed-id");
    assert_eq!(header(&response, "x-request-id"), Some("fixed-id"));
}

#[tokio::test]
async fn test_failing_generator_still_reaches_handler() {
    let hits = Arc::new(AtomicUsize::new(0));
    let assigner = Assigner::builder()
        .generator(|_| Err("generator exploded".into()))
        .build()
        .unwrap();
    let (response, body) = send(app(assigner, hits.clone()), get_request(&[])).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(uuid::Uuid::parse_str(&body).is_ok());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_handler_header_is_overwritten() {
    let router = Router::new().route(
        "/",
        get(|| async { ([("x-request-id", "set-by-handler")], "body") }),
    );
    let app = Assigner::new().layer(router);
    let (response, _) = send(app, get_request(&[("x-request-id", "abc-123")])).await;

    let echoed: Vec<_> = response.headers().get_all("x-request-id").iter().collect();
    assert_eq!(echoed, vec!["abc-123"]);
}

#[tokio::test]
async fn test_concurrent_requests_get_distinct_ids() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = app(Assigner::new(), hits.clone());

    let mut handles = Vec::new();
    for _ in 0..16 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            send(app, get_request(&[])).await.1
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 16);
    assert_eq!(hits.load(Ordering::SeqCst), 16);
}

#[tokio::test]
async fn test_extractor_without_assigner_is_server_error() {
    let app = Router::new().route("/", get(|id: RequestId| async move { id.into_inner() }));
    let (response, _) = send(app, get_request(&[])).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_echo_server_routes() {
    let app = reqid::server::router(Assigner::new());

    let (response, body) = send(app.clone(), get_request(&[("x-request-id", "echo-1")])).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["request_id"], "echo-1");
    assert_eq!(header(&response, "x-request-id"), Some("echo-1"));

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (response, body) = send(app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body, "ok");
    assert!(response.headers().get("x-request-id").is_some());
}

#[tokio::test]
async fn test_non_ascii_incoming_header_round_trips() {
    let hits = Arc::new(AtomicUsize::new(0));
    let request = Request::builder()
        .uri("/")
        .header(
            "x-request-id",
            axum::http::HeaderValue::from_bytes(b"req-\xe9t\xe9").unwrap(),
        )
        .body(Body::empty())
        .unwrap();
    let (response, body) = send(app(Assigner::new(), hits.clone()), request).await;

    assert_eq!(body, "req-\u{e9}t\u{e9}");
    assert_eq!(
        response.headers()["x-request-id"].as_bytes(),
        b"req-\xe9t\xe9"
    );
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
