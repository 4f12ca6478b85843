pub mod metadata;

use axum::{http::header::HOST, http::HeaderMap, Json};
use serde_json::{json, Value};

pub const SOURCE_URL: &str = "https://github.com/tijnjh/echoscrape";

/// GET /
pub async fn index(headers: HeaderMap) -> Json<Value> {
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");

    Json(json!({
        "instruction": format!("Go to http://{host}/{{your-url}}"),
        "echoscrape": {
            "source": SOURCE_URL,
        },
    }))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "echoscrape",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
