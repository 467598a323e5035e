use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;

use super::PageFetcher;
use crate::Result;

/// Plain GET fetcher returning the response body as text
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        tracing::debug!("Fetching page: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to fetch {}: HTTP {}", url, response.status());
        }

        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read body of {}", url))?;

        Ok(text)
    }
}
