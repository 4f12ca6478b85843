use reqwest::Client;
use serde_json::{Map, Value};
use url::Url;

use super::document::Document;
use super::target;
use crate::error::{ScrapeError, ScrapeResult};

pub const DISCOVERY_SELECTOR: &str = r#"link[rel="alternate"][type="application/json+oembed"]"#;

/// The oEmbed discovery `href`, exactly as written in the page.
pub fn discover(doc: &Document) -> Option<String> {
    doc.find(DISCOVERY_SELECTOR).attr("href")
}

/// Resolve `href` against the page URL. Absolute hrefs pass through
/// unchanged; loopback hosts are refused unless `allow_loopback`. Hosts
/// that only resolve to loopback are caught by [`resolve`].
pub fn endpoint(href: &str, page: &Url, allow_loopback: bool) -> ScrapeResult<Url> {
    let href = href.trim();
    if href.is_empty() {
        return Err(ScrapeError::Oembed(
            "discovery link has an empty href".into(),
        ));
    }

    let url = page
        .join(href)
        .map_err(|e| ScrapeError::Oembed(format!("invalid endpoint '{href}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ScrapeError::Oembed(format!(
            "unsupported endpoint scheme '{}'",
            url.scheme()
        )));
    }

    if !allow_loopback && target::is_loopback(&url) {
        return Err(ScrapeError::Oembed(format!(
            "endpoint host {} is not allowed",
            url.host_str().unwrap_or_default()
        )));
    }

    Ok(url)
}

/// Look up the page's oEmbed data. `Ok(None)` when the page advertises no
/// endpoint, in which case nothing is fetched.
pub async fn resolve(
    client: &Client,
    href: Option<String>,
    page: &Url,
    allow_loopback: bool,
) -> ScrapeResult<Option<Map<String, Value>>> {
    let Some(href) = href else {
        tracing::info!("Website doesn't seem to have oEmbed, skipping");
        return Ok(None);
    };

    tracing::info!(href = %href, "Detected oEmbed");
    let url = endpoint(&href, page, allow_loopback)?;
    if !allow_loopback {
        target::ensure_resolves_public(&url)
            .await
            .map_err(|e| ScrapeError::Oembed(format!("endpoint {url} rejected: {e}")))?;
    }
    fetch(client, &url).await.map(Some)
}

/// GET `url` and decode the body as a JSON object of any shape.
pub async fn fetch(client: &Client, url: &Url) -> ScrapeResult<Map<String, Value>> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| ScrapeError::Oembed(format!("request to {url} failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ScrapeError::Oembed(format!(
            "{url} returned status {}",
            status.as_u16()
        )));
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| ScrapeError::Oembed(format!("invalid JSON from {url}: {e}")))?;

    match body {
        Value::Object(map) => Ok(map),
        other => Err(ScrapeError::Oembed(format!(
            "expected a JSON object from {url}, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
