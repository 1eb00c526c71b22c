use axum::Router;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use crawlhub_core::app::AppState;
use crawlhub_core::http;
use serde_json::{Value, json};
use tower::ServiceExt;

fn build_router() -> Router {
    let state = AppState::bootstrap(None);
    http::router(state)
}

#[tokio::test]
async fn healthz_reports_ok() {
    let router = build_router();
    let response = router
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn async_playground_job_returns_job_id_promptly() {
    let router = build_router();
    let body = json!({
        "input": "hello",
        "async": true,
    });
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/playground/jobs")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(parsed.get("jobId").is_some());
}

#[tokio::test]
async fn rejects_a_crawl_request_for_an_invalid_domain() {
    let router = build_router();
    let body = json!({
        "webhook": { "url": "https://hooks.example.com/cb" },
    });
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/crawl/not a domain")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
