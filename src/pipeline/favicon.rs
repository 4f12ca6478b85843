use reqwest::Client;
use url::Url;

use super::document::Document;
use crate::error::ScrapeResult;

/// Icon link hints in precedence order.
pub const ICON_SELECTORS: [&str; 3] = [
    r#"link[rel="icon"]"#,
    r#"link[rel="shortcut icon"]"#,
    r#"link[rel="apple-touch-icon"]"#,
];

/// The first non-empty icon `href` the document declares.
pub fn declared_icon(doc: &Document) -> Option<String> {
    ICON_SELECTORS
        .iter()
        .find_map(|selector| doc.find(selector).attr("href").filter(|h| !h.is_empty()))
}

/// `{page path}/favicon.ico` on the page's origin.
pub fn well_known_url(page: &Url) -> Url {
    let mut url = page.clone();
    let path = format!("{}/favicon.ico", page.path().trim_end_matches('/'));
    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);
    url
}

/// Resolve the favicon: a declared icon wins, otherwise check the
/// well-known path with HEAD. A non-2xx answer is `Ok(None)`; a transport
/// failure is an error for the caller to downgrade.
pub async fn resolve(
    client: &Client,
    declared: Option<String>,
    page: &Url,
) -> ScrapeResult<Option<String>> {
    if let Some(href) = declared {
        tracing::info!(favicon = %href, "Favicon found in HTML");
        return Ok(Some(href));
    }

    check_well_known(client, well_known_url(page)).await
}

async fn check_well_known(client: &Client, url: Url) -> ScrapeResult<Option<String>> {
    let response = client.head(url.clone()).send().await?;

    if response.status().is_success() {
        tracing::info!(favicon = %url, "Fetched well-known favicon");
        Ok(Some(url.to_string()))
    } else {
        tracing::info!(url = %url, status = response.status().as_u16(), "No favicon found");
        Ok(None)
    }
}
