//! Router-level tests driven through `tower::ServiceExt::oneshot`.
//!
//! The happy path needs a local Chromium install, so it is `#[ignore]`d;
//! everything in front of the browser call is exercised with a scripted
//! resource sampler.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use render_gateway::AppState;
use render_gateway::api::routes::create_router;
use render_gateway::config::{BrowserSettings, Config};
use render_gateway::gate::{ResourceGate, ResourceSample, ResourceSampler};

struct FixedSampler(ResourceSample);

impl ResourceSampler for FixedSampler {
    fn sample(&self) -> ResourceSample {
        self.0
    }
}

fn healthy() -> ResourceSample {
    ResourceSample {
        available_memory_mb: 2048,
        cpu_percent: 12.0,
    }
}

fn scarce() -> ResourceSample {
    ResourceSample {
        available_memory_mb: 120,
        cpu_percent: 97.0,
    }
}

fn test_state(sample: ResourceSample, resource_timeout: Duration) -> AppState {
    AppState {
        config: Arc::new(Config {
            server_addr: "127.0.0.1:0".parse().unwrap(),
            resource_timeout,
            browser: BrowserSettings {
                user_data_dir: PathBuf::from("./data"),
            },
        }),
        gate: Arc::new(ResourceGate::with_sampler(Box::new(FixedSampler(sample)))),
    }
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_reports_healthy() {
    let app = create_router(test_state(healthy(), Duration::from_secs(60)));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("healthy"));
}

#[tokio::test]
async fn get_without_url_is_rejected() {
    let app = create_router(test_state(healthy(), Duration::from_secs(60)));

    let response = app
        .oneshot(Request::builder().uri("/fetch").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_string(response).await;
    assert!(body.contains("URL parameter is required."));
}

#[tokio::test]
async fn get_with_empty_url_is_rejected() {
    let app = create_router(test_state(healthy(), Duration::from_secs(60)));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/fetch?url=")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_without_url_is_rejected() {
    let app = create_router(test_state(healthy(), Duration::from_secs(60)));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/fetch")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"proxy": "socks5://10.0.0.1:1080"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_string(response).await;
    assert!(body.contains("URL parameter is required."));
}

#[tokio::test]
async fn unsupported_method_is_rejected() {
    let app = create_router(test_state(healthy(), Duration::from_secs(60)));

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/fetch")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn sustained_scarcity_times_out_with_503() {
    // Zero timeout keeps the test fast; the first failed poll is terminal.
    let app = create_router(test_state(scarce(), Duration::ZERO));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/fetch?url=http://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_string(response).await;
    assert!(body.contains("Timeout waiting for resources."));
}

#[tokio::test]
#[ignore = "requires a local Chromium install"]
async fn fetch_renders_real_page() {
    let app = create_router(test_state(healthy(), Duration::from_secs(60)));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/fetch?url=https://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    let payload: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(!payload["html"].as_str().unwrap().is_empty());
    assert_eq!(payload["captchaDetected"], false);
    assert!(payload["time"].as_f64().unwrap() >= 0.0);
}
