use axum::extract::{OriginalUri, State};
use axum::http::Uri;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;

use crate::error::{ScrapeError, ScrapeResult};
use crate::state::AppState;

/// Query flag that switches the endpoint to favicon-redirect mode.
pub const FAVICON_FLAG: &str = "favicon";

// ── Handler ────────────────────────────────────────────────────────────────

/// GET /{url}
///
/// Returns the page's metadata with unknown fields omitted. With `?favicon`
/// it redirects to the page's favicon instead. Any other query parameters
/// belong to the target URL. The path is taken as sent, percent-escapes
/// included, so `%3F` stays part of the target's path.
pub async fn get_metadata(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> ScrapeResult<Response> {
    let (favicon_only, target) = target_from_uri(&uri);

    tracing::info!(target = %target, favicon_only, "Metadata request");

    if favicon_only {
        let favicon = state
            .scraper
            .favicon(&target)
            .await?
            .ok_or(ScrapeError::NoFavicon)?;
        return Ok(Redirect::temporary(favicon.as_str()).into_response());
    }

    let metadata = state.scraper.metadata(&target).await?;
    Ok(Json(metadata).into_response())
}

// ── Query handling ─────────────────────────────────────────────────────────

/// The raw target URL carried by `uri`, and whether the favicon flag was set.
fn target_from_uri(uri: &Uri) -> (bool, String) {
    let (favicon_only, forwarded) = split_query(uri.query());
    (favicon_only, with_query(uri.path(), forwarded.as_deref()))
}

/// Split the inbound query into the favicon flag and whatever is left for
/// the target URL.
fn split_query(query: Option<&str>) -> (bool, Option<String>) {
    let Some(query) = query else {
        return (false, None);
    };

    let mut favicon_only = false;
    let mut forwarded = Vec::new();

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let key = pair.split_once('=').map_or(pair, |(k, _)| k);
        if key == FAVICON_FLAG {
            favicon_only = true;
        } else {
            forwarded.push(pair);
        }
    }

    let forwarded = (!forwarded.is_empty()).then(|| forwarded.join("&"));
    (favicon_only, forwarded)
}

fn with_query(target: &str, query: Option<&str>) -> String {
    let target = target.strip_prefix('/').unwrap_or(target);
    match query {
        Some(query) => format!("{target}?{query}"),
        None => target.to_string(),
    }
}

// ── Unit tests ─────────────────────────────────────────────────────────────
