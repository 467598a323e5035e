use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;
use std::sync::LazyLock;

use super::{ResolveStrategy, Resolution};
use crate::utils::{dedup_preserving_order, validate_url};
use crate::youtube::{PageFetcher, VideoId};
use crate::Result;

const VIDEOS_SUFFIX: &str = "/videos";

static WATCH_LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"watch\?v=([a-zA-Z0-9_-]{11})").expect("watch link pattern should compile")
});

/// Legacy fallback: scrape watch links from the channel's `/videos` page.
///
/// This never produces a channel identifier. It yields video identifiers
/// directly, so the listing API is skipped for references it handles.
pub struct ScrapeStrategy {
    fetcher: Arc<dyn PageFetcher>,
}

impl ScrapeStrategy {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

/// URL of the page scanned for a given channel reference, without query or fragment
pub fn videos_page_url(reference: &str) -> String {
    let reference = reference.trim();
    let base = match validate_url(reference) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => reference.to_string(),
    };
    let base = base.trim_end_matches('/');
    if base.ends_with(VIDEOS_SUFFIX) {
        base.to_string()
    } else {
        format!("{}{}", base, VIDEOS_SUFFIX)
    }
}

/// Unique video identifiers linked from raw page text, in first-seen order
pub fn scan_video_ids(text: &str) -> Vec<VideoId> {
    let ids = WATCH_LINK_REGEX
        .captures_iter(text)
        .filter_map(|captures| VideoId::parse(&captures[1]));
    dedup_preserving_order(ids)
}

#[async_trait]
impl ResolveStrategy for ScrapeStrategy {
    fn supports_reference(&self, reference: &str) -> bool {
        validate_url(reference).is_ok()
    }

    async fn resolve(&self, reference: &str) -> Result<Resolution> {
        let url = videos_page_url(reference);
        tracing::info!("Scraping video links from {}", url);

        let text = self.fetcher.fetch_text(&url).await?;
        let ids = scan_video_ids(&text);
        if ids.is_empty() {
            anyhow::bail!("no video links found on {}", url);
        }

        tracing::debug!("Scraped {} video ids from {}", ids.len(), url);
        Ok(Resolution::Videos(ids))
    }

    fn strategy_name(&self) -> &'static str {
        "page scrape"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::MockPageFetcher;

    #[test]
    fn test_videos_page_url() {
        assert_eq!(videos_page_url("https://youtube.com/c/x"), "https://youtube.com/c/x/videos");
        assert_eq!(videos_page_url("https://youtube.com/c/x/"), "https://youtube.com/c/x/videos");
        assert_eq!(videos_page_url("https://youtube.com/c/x/videos"), "https://youtube.com/c/x/videos");
        assert_eq!(videos_page_url("https://youtube.com/c/x?si=1"), "https://youtube.com/c/x/videos");
        assert_eq!(
            videos_page_url("https://www.youtube.com/user/legacy/#top"),
            "https://www.youtube.com/user/legacy/videos"
        );
    }

    #[test]
    fn test_scan_video_ids_dedups_in_order() {
        let html = r#"
            <a href="/watch?v=bbbbbbbbbbb">two</a>
            <a href="/watch?v=aaaaaaaaaaa">one</a>
            <a href="/watch?v=bbbbbbbbbbb&t=10">two again</a>
            <a href="/watch?v=short">too short</a>
        "#;

        let ids: Vec<String> = scan_video_ids(html).iter().map(|id| id.to_string()).collect();
        assert_eq!(ids, vec!["bbbbbbbbbbb", "aaaaaaaaaaa"]);
    }

    #[test]
    fn test_supports_only_http_urls() {
        let strategy = ScrapeStrategy::new(Arc::new(MockPageFetcher::new()));
        assert!(strategy.supports_reference("https://www.youtube.com/c/legacy"));
        assert!(!strategy.supports_reference("not a url"));
        assert!(!strategy.supports_reference("ftp://example.com/channel"));
    }

    #[tokio::test]
    async fn test_page_without_links_fails() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch_text()
            .returning(|_| Ok("<html></html>".to_string()));

        let strategy = ScrapeStrategy::new(Arc::new(fetcher));
        assert!(strategy.resolve("https://www.youtube.com/c/empty").await.is_err());
    }
}
