use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{ChannelId, ChannelSearch, VideoId, VideoListing, VideoPage};
use crate::Result;

/// Order applied to the channel video listing
const LISTING_ORDER: &str = "date";

/// YouTube Data API v3 client for channel search and video listing
pub struct DataApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,

    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,

    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "channelId")]
    channel_id: Option<String>,

    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: u16,
    message: String,
}

impl DataApiClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Call the `/search` endpoint and decode the shared response shape
    async fn search(&self, params: &[(&str, &str)]) -> Result<SearchResponse> {
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("key", self.api_key.as_str()), ("part", "id")])
            .query(params)
            .send()
            .await
            .context("Failed to call YouTube search API")?;

        let status = response.status();
        let body: SearchResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse YouTube search response (HTTP {})", status))?;

        if let Some(error) = body.error {
            anyhow::bail!("YouTube API error: {} ({})", error.message, error.code);
        }
        if !status.is_success() {
            anyhow::bail!("YouTube API returned HTTP {}", status);
        }

        Ok(body)
    }
}

#[async_trait]
impl ChannelSearch for DataApiClient {
    async fn search_channels(&self, term: &str, max_results: u32) -> Result<Vec<String>> {
        tracing::debug!("Searching channels for term: {}", term);

        let max_results = max_results.to_string();
        let body = self
            .search(&[("q", term), ("type", "channel"), ("maxResults", max_results.as_str())])
            .await?;

        Ok(body
            .items
            .into_iter()
            .filter_map(|item| item.id.channel_id)
            .collect())
    }
}

#[async_trait]
impl VideoListing for DataApiClient {
    async fn list_page(
        &self,
        channel: &ChannelId,
        page_token: Option<String>,
        max_results: u32,
    ) -> Result<VideoPage> {
        tracing::debug!(
            "Listing videos for channel {} (page token: {:?})",
            channel,
            page_token
        );

        let max_results = max_results.to_string();
        let mut params = vec![
            ("channelId", channel.as_str()),
            ("type", "video"),
            ("order", LISTING_ORDER),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token.as_deref() {
            params.push(("pageToken", token));
        }

        let body = self.search(&params).await?;

        let video_ids = body
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .filter_map(|raw| {
                let parsed = VideoId::parse(&raw);
                if parsed.is_none() {
                    tracing::debug!("Ignoring malformed video id from listing: {}", raw);
                }
                parsed
            })
            .collect();

        Ok(VideoPage {
            video_ids,
            next_page_token: body.next_page_token.filter(|token| !token.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_video_page() {
        let json = r#"{
            "kind": "youtube#searchListResponse",
            "nextPageToken": "CDIQAA",
            "items": [
                {"id": {"kind": "youtube#video", "videoId": "aaaaaaaaaaa"}},
                {"id": {"kind": "youtube#video", "videoId": "bbbbbbbbbbb"}}
            ]
        }"#;

        let body: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.next_page_token.as_deref(), Some("CDIQAA"));
        assert_eq!(body.items.len(), 2);
        assert_eq!(body.items[1].id.video_id.as_deref(), Some("bbbbbbbbbbb"));
    }

    #[test]
    fn test_decode_channel_search() {
        let json = r#"{"items": [{"id": {"kind": "youtube#channel", "channelId": "UCabc"}}]}"#;

        let body: SearchResponse = serde_json::from_str(json).unwrap();
        assert!(body.next_page_token.is_none());
        assert_eq!(body.items[0].id.channel_id.as_deref(), Some("UCabc"));
    }

    #[test]
    fn test_decode_api_error() {
        let json = r#"{"error": {"code": 403, "message": "quotaExceeded", "errors": []}}"#;

        let body: SearchResponse = serde_json::from_str(json).unwrap();
        assert!(body.items.is_empty());
        let error = body.error.unwrap();
        assert_eq!(error.code, 403);
        assert_eq!(error.message, "quotaExceeded");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = DataApiClient::new(Client::new(), "https://example.com/v3/", "key");
        assert_eq!(client.base_url, "https://example.com/v3");
    }
}
