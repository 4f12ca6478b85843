// Each integration test file is a separate binary; helpers not used in every
// binary would otherwise trigger dead_code warnings from clippy.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, Response, StatusCode},
    routing,
    Router,
};
use http_body_util::BodyExt;
use httpmock::MockServer;
use serde_json::Value;
use tower::ServiceExt;

use echoscrape::{handlers, pipeline::Scraper, state::AppState};

/// Build the application router with a scraper that may reach the local
/// mock server.
pub fn create_test_app() -> Router {
    app_with(Scraper::new(reqwest::Client::new()).allow_loopback(true))
}

/// Build the application router with the production loopback guard.
pub fn create_guarded_app() -> Router {
    app_with(Scraper::new(reqwest::Client::new()))
}

fn app_with(scraper: Scraper) -> Router {
    Router::new()
        .route("/", routing::get(handlers::index))
        .route("/_/health", routing::get(handlers::health_check))
        .route("/*target", routing::get(handlers::metadata::get_metadata))
        .with_state(AppState { scraper })
}

/// Request path that asks the service to scrape `path` on the mock server,
/// written without a scheme the way users usually type it.
pub fn target_path(server: &MockServer, path: &str) -> String {
    format!("/{}{}", server.address(), path)
}

// ── Request helpers ──────────────────────────────────────────────────────────

pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = get_response(app, uri).await;
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub async fn get_response(app: Router, uri: &str) -> Response<Body> {
    let req = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::HOST, "echoscrape.test")
        .body(Body::empty())
        .unwrap();
    app.oneshot(req).await.unwrap()
}
