//! Remote content feed
//!
//! Topic content is published as static JSON documents, one per class and
//! language, at `{base}/data/<language>/class-<N>.json`. Each document is a
//! JSON array of raw topic objects. The feed is read-only and fetched at most
//! once per hydration attempt; there is no retry.

use crate::profile::Language;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Source of raw topic records for a class.
///
/// Records are returned undecoded so that one malformed entry can be
/// dropped without failing the whole document.
#[async_trait]
pub trait ContentFeed: Send + Sync {
    async fn fetch_class(&self, class: &str, language: Language) -> Result<Vec<serde_json::Value>>;
}

/// Content feed served over HTTP
pub struct HttpContentFeed {
    base_url: String,
    client: Client,
}

impl HttpContentFeed {
    /// Create a feed client rooted at `base_url`.
    ///
    /// `timeout` bounds each request at the transport level.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Document URL for a class and language
    pub fn class_url(&self, class: &str, language: Language) -> String {
        format!(
            "{}/data/{}/class-{}.json",
            self.base_url,
            language.feed_segment(),
            class
        )
    }
}

#[async_trait]
impl ContentFeed for HttpContentFeed {
    async fn fetch_class(&self, class: &str, language: Language) -> Result<Vec<serde_json::Value>> {
        let url = self.class_url(class, language);
        tracing::debug!("Fetching class content from {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Error::FeedStatus {
                status: response.status().as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        match serde_json::from_slice::<serde_json::Value>(&body)? {
            serde_json::Value::Array(records) => Ok(records),
            other => Err(Error::Feed(format!(
                "expected a JSON array from {}, got {}",
                url,
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
