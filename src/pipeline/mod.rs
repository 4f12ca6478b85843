//! Single-page metadata pipeline: validate the target, fetch and parse it,
//! extract fields, resolve the favicon and oEmbed data, prune what is absent.

pub mod document;
pub mod favicon;
pub mod fetch;
pub mod oembed;
pub mod sanitize;
pub mod target;

use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{Metadata, OpenGraph, TwitterCard};

use document::Document;

pub const USER_AGENT: &str =
    "Mozilla/5.0 (compatible; echoscrape/1.0; +https://github.com/tijnjh/echoscrape)";

/// Runs the metadata pipeline. Cheap to clone; clones share the HTTP
/// connection pool and nothing else.
#[derive(Clone)]
pub struct Scraper {
    client: Client,
    max_body_bytes: usize,
    allow_loopback: bool,
}

/// A fetched page.
struct Page {
    url: Url,
    html: String,
}

/// Everything read from the document. Built in one synchronous pass so the
/// parsed tree never lives across an await.
struct Extracted {
    metadata: Metadata,
    icon_href: Option<String>,
    oembed_href: Option<String>,
}

impl Scraper {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            max_body_bytes: crate::config::DEFAULT_MAX_BODY_BYTES,
            allow_loopback: false,
        }
    }

    pub fn from_config(config: &Config) -> ScrapeResult<Self> {
        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                tracing::error!(error = ?e, "Failed to build HTTP client");
                ScrapeError::Internal
            })?;

        Ok(Self::new(client).with_max_body_bytes(config.max_body_bytes))
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Disable the loopback guard. Only for pointing the pipeline at a
    /// local mock server in tests.
    pub fn allow_loopback(mut self, allow: bool) -> Self {
        self.allow_loopback = allow;
        self
    }

    pub async fn validate(&self, raw: &str) -> ScrapeResult<Url> {
        if self.allow_loopback {
            target::normalize(raw)
        } else {
            target::validate_target(raw).await
        }
    }

    /// Full metadata for `raw`, pruned of absent fields.
    ///
    /// Validation and page fetch failures abort; favicon and oEmbed failures
    /// are logged and leave their field absent.
    pub async fn metadata(&self, raw: &str) -> ScrapeResult<Value> {
        let page = self.load(raw).await?;
        let extracted = {
            let document = Document::parse(&page.html);
            extract(&document)
        };

        let (favicon, oembed) = tokio::join!(
            favicon::resolve(&self.client, extracted.icon_href, &page.url),
            oembed::resolve(
                &self.client,
                extracted.oembed_href,
                &page.url,
                self.allow_loopback
            ),
        );

        let mut metadata = extracted.metadata;
        metadata.favicon = favicon.unwrap_or_else(|e| {
            tracing::warn!(error = %e, url = %page.url, "Failed to get favicon");
            None
        });
        metadata.oembed = match oembed {
            Ok(map) => map.map(Value::Object),
            Err(e) => {
                tracing::warn!(error = %e, url = %page.url, "Failed to get oEmbed");
                None
            }
        };

        let mut value = serde_json::to_value(&metadata).map_err(|e| {
            tracing::error!(error = ?e, "Failed to serialize metadata");
            ScrapeError::Internal
        })?;
        sanitize::sanitize(&mut value);

        tracing::info!(url = %page.url, "Responding with metadata");
        Ok(value)
    }

    /// Just the favicon for `raw`, resolved to an absolute URL. Skips every
    /// other lookup, oEmbed included.
    pub async fn favicon(&self, raw: &str) -> ScrapeResult<Option<Url>> {
        let page = self.load(raw).await?;
        let declared = {
            let document = Document::parse(&page.html);
            favicon::declared_icon(&document)
        };

        let favicon = favicon::resolve(&self.client, declared, &page.url)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, url = %page.url, "Failed to get favicon");
                None
            });

        Ok(favicon.and_then(|href| match page.url.join(&href) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(error = %e, href = %href, "Favicon href is not a valid URL");
                None
            }
        }))
    }

    async fn load(&self, raw: &str) -> ScrapeResult<Page> {
        let url = self.validate(raw).await?;
        tracing::info!(url = %url, "Scraping");
        let html = fetch::fetch_html(&self.client, &url, self.max_body_bytes).await?;
        Ok(Page { url, html })
    }
}

fn extract(doc: &Document) -> Extracted {
    Extracted {
        metadata: extract_metadata(doc),
        icon_href: favicon::declared_icon(doc),
        oembed_href: oembed::discover(doc),
    }
}

/// Every field that comes straight from a selector. `favicon` and `oembed`
/// are left for their resolvers.
pub fn extract_metadata(doc: &Document) -> Metadata {
    Metadata {
        title: doc.find("title").text(),
        description: meta_name(doc, "description"),
        favicon: None,
        theme_color: meta_name(doc, "theme-color"),
        og: OpenGraph {
            title: meta_property(doc, "og:title"),
            description: meta_property(doc, "og:description"),
            image: meta_property(doc, "og:image"),
            image_alt: meta_property(doc, "og:image:alt"),
            image_width: meta_property(doc, "og:image:width"),
            image_height: meta_property(doc, "og:image:height"),
            url: meta_property(doc, "og:url"),
            kind: meta_property(doc, "og:type"),
            site_name: meta_property(doc, "og:site_name"),
        },
        twitter: TwitterCard {
            title: meta_name(doc, "twitter:title"),
            description: meta_name(doc, "twitter:description"),
            image: meta_name(doc, "twitter:image"),
            site: meta_name(doc, "twitter:site"),
            card: meta_name(doc, "twitter:card"),
        },
        oembed: None,
    }
}

fn meta_name(doc: &Document, name: &str) -> Option<String> {
    doc.find(&format!(r#"meta[name="{name}"]"#)).attr("content")
}

fn meta_property(doc: &Document, property: &str) -> Option<String> {
    doc.find(&format!(r#"meta[property="{property}"]"#)).attr("content")
}
