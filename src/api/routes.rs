use axum::{
    routing::get,
    Router,
    extract::{Json, Query, State},
};
use tower_http::cors::{CorsLayer, Any};
use tokio::time::Instant;
use tracing::{error, info};

use crate::error::{Result, AppError};
use crate::api::models::{FetchParams, FetchResponse, HealthResponse};
use crate::browser;
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/fetch", get(fetch_via_query).post(fetch_via_json))
        .route("/health", get(health))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn fetch_via_query(
    State(state): State<AppState>,
    Query(params): Query<FetchParams>,
) -> Result<Json<FetchResponse>> {
    process_fetch(&state, params).await
}

async fn fetch_via_json(
    State(state): State<AppState>,
    Json(params): Json<FetchParams>,
) -> Result<Json<FetchResponse>> {
    process_fetch(&state, params).await
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

async fn process_fetch(state: &AppState, params: FetchParams) -> Result<Json<FetchResponse>> {
    // Elapsed time reported to the caller includes any admission wait.
    let start_time = Instant::now();

    let url = params
        .url
        .filter(|url| !url.is_empty())
        .ok_or(AppError::MissingUrl)?;

    info!(
        url = %url,
        proxy = ?params.proxy,
        in_flight = state.gate.in_flight(),
        "Received fetch request"
    );

    if !state.gate.wait_for_admission(state.config.resource_timeout).await {
        return Err(AppError::ResourceTimeout);
    }

    let capture = {
        let _guard = state.gate.track();
        browser::fetch_page(&state.config.browser, &url, params.proxy.as_deref()).await
    };
    let capture = capture.map_err(|err| {
        error!(url = %url, "Error fetching page: {}", err);
        err
    })?;

    let time = start_time.elapsed().as_secs_f64();
    info!(
        url = %url,
        captcha_detected = capture.captcha_detected,
        elapsed_seconds = time,
        "Fetch complete"
    );

    Ok(Json(FetchResponse {
        html: capture.html,
        captcha_detected: capture.captcha_detected,
        time,
    }))
}
