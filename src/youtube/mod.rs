use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub mod captions;
pub mod data_api;
pub mod error;
pub mod fetch;

pub use captions::WatchPageCaptions;
pub use data_api::DataApiClient;
pub use error::CaptionError;
pub use fetch::HttpPageFetcher;

use crate::config::YoutubeConfig;
use crate::Result;

/// Opaque channel identifier understood by the listing API.
///
/// Only the resolver and the remote clients construct these; callers receive
/// them from [`crate::ResolverRegistry::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a single video (alphanumeric plus `_` and `-`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Validate the character set of a raw identifier
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        raw.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            .then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One timed caption fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionFragment {
    pub text: String,

    /// Start offset in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

impl CaptionFragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            start: 0.0,
            duration: 0.0,
        }
    }
}

/// One page of the channel video listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoPage {
    pub video_ids: Vec<VideoId>,
    pub next_page_token: Option<String>,
}

/// Search for channels by free-text term
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelSearch: Send + Sync {
    /// Return raw channel identifiers of the matches, best match first
    async fn search_channels(&self, term: &str, max_results: u32) -> Result<Vec<String>>;
}

/// Paged listing of a channel's videos
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoListing: Send + Sync {
    async fn list_page(
        &self,
        channel: &ChannelId,
        page_token: Option<String>,
        max_results: u32,
    ) -> Result<VideoPage>;
}

/// Caption track retrieval for a single video
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Fetch the first available track among `languages`, in preference order
    async fn fetch_captions(
        &self,
        video: &VideoId,
        languages: &[String],
    ) -> Result<Vec<CaptionFragment>>;
}

/// Raw text fetch, used by the scrape fallback
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Build the HTTP client shared by every outbound call
pub fn build_http_client(config: &YoutubeConfig) -> Result<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        reqwest::header::HeaderValue::from_static("en-US"),
    );

    let client = reqwest::Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?;

    Ok(client)
}
