use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Access to {0} is not allowed")]
    ForbiddenTarget(String),

    #[error("Could not resolve host {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch URL: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Unexpected status code: {code}")]
    UnexpectedStatus { code: u16 },

    #[error("Failed to parse document: {0}")]
    Parse(String),

    #[error("Response body exceeds {limit} bytes")]
    ResponseTooLarge { limit: usize },

    #[error("oEmbed lookup failed: {0}")]
    Oembed(String),

    #[error("No favicon found")]
    NoFavicon,

    #[error("Internal server error")]
    Internal,
}

impl ScrapeError {
    pub fn status(&self) -> StatusCode {
        match self {
            ScrapeError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            ScrapeError::ForbiddenTarget(_) => StatusCode::FORBIDDEN,
            ScrapeError::Fetch(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            ScrapeError::Resolve { .. }
            | ScrapeError::Fetch(_)
            | ScrapeError::UnexpectedStatus { .. }
            | ScrapeError::ResponseTooLarge { .. }
            | ScrapeError::Oembed(_) => StatusCode::BAD_GATEWAY,
            ScrapeError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ScrapeError::NoFavicon => StatusCode::NOT_FOUND,
            ScrapeError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ScrapeError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::info!(error = %self, "Request rejected");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;
