use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata returned by `GET /{url}`.
///
/// Serializes every unknown field as `null`; the pipeline prunes those (and
/// groups left empty) before the value leaves the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub favicon: Option<String>,
    pub theme_color: Option<String>,
    pub og: OpenGraph,
    pub twitter: TwitterCard,
    pub oembed: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenGraph {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub image_alt: Option<String>,
    pub image_width: Option<String>,
    pub image_height: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub site_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TwitterCard {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub site: Option<String>,
    pub card: Option<String>,
}
