use super::test_support::{body_text, get as get_request, test_config, test_router};
use super::*;
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN};
use axum::http::Request;
use axum::body::Body;
use tower::ServiceExt;

#[tokio::test]
async fn healthz_returns_ok_with_empty_body() {
    let (router, _) = test_router();
    let response = router.oneshot(get_request("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.is_empty());
}

#[tokio::test]
async fn unknown_api_path_is_not_found() {
    let (router, _) = test_router();
    let response = router.oneshot(get_request("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cors_allows_any_origin_by_default() {
    let (router, _) = test_router();
    let request = Request::builder()
        .uri("/healthz")
        .header(ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn cors_echoes_configured_origin_only() {
    let mut config = test_config();
    config.cors_origins = vec!["http://ui.test".into()];
    let router = api_routes(crate::state::test_helpers::test_app_state(), &config);

    let allowed = Request::builder()
        .uri("/healthz")
        .header(ORIGIN, "http://ui.test")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(allowed).await.unwrap();
    assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "http://ui.test");

    let other = Request::builder()
        .uri("/healthz")
        .header(ORIGIN, "http://evil.test")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(other).await.unwrap();
    assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn upload_body_limit_is_enforced() {
    let mut config = test_config();
    config.upload_max_bytes = 64;
    let router = api_routes(crate::state::test_helpers::test_app_state(), &config);

    let big = vec![b'x'; 4096];
    let response = router
        .oneshot(super::test_support::file_upload("/upload_instruments", "book.csv", &big))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
