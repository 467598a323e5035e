use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::ListingConfig;
use crate::youtube::{ChannelId, VideoId, VideoListing, VideoPage};
use crate::{Result, ScribeError};

/// Pages through a channel's videos until the cap is reached or the listing ends
pub struct VideoLister {
    listing: Arc<dyn VideoListing>,
    page_size: u32,
    max_retries: u32,
    retry_backoff: Duration,
}

impl VideoLister {
    pub fn new(listing: Arc<dyn VideoListing>, config: &ListingConfig) -> Self {
        Self {
            listing,
            page_size: config.page_size,
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// List up to roughly `cap` unique video ids for a channel.
    ///
    /// The cap is checked after each whole page, so the result can exceed it by
    /// less than one page. Callers that need an exact bound truncate.
    pub async fn list_videos(
        &self,
        channel: &ChannelId,
        cap: usize,
    ) -> std::result::Result<Vec<VideoId>, ScribeError> {
        if cap == 0 {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        let mut seen = HashSet::new();
        let mut used_tokens = HashSet::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .fetch_page(channel, page_token.take())
                .await
                .map_err(|e| ScribeError::Listing {
                    channel: channel.to_string(),
                    cause: format!("{:#}", e),
                })?;
            pages += 1;

            for id in page.video_ids {
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }

            match page.next_page_token {
                Some(token) if ids.len() < cap => {
                    // A token handed out twice means the cursor is not advancing.
                    if !used_tokens.insert(token.clone()) {
                        tracing::warn!(
                            "Listing for channel {} repeated page token {}, stopping",
                            channel,
                            token
                        );
                        break;
                    }
                    page_token = Some(token);
                }
                _ => break,
            }
        }

        tracing::info!(
            "Listed {} videos for channel {} across {} page(s)",
            ids.len(),
            channel,
            pages
        );

        Ok(ids)
    }

    /// Fetch one page, retrying with exponential backoff
    async fn fetch_page(&self, channel: &ChannelId, page_token: Option<String>) -> Result<VideoPage> {
        let mut attempt = 0u32;
        let mut backoff = self.retry_backoff;

        loop {
            match self
                .listing
                .list_page(channel, page_token.clone(), self.page_size)
                .await
            {
                Ok(page) => return Ok(page),
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        "Listing page for {} failed (attempt {}/{}), retrying in {:?}: {:#}",
                        channel,
                        attempt,
                        self.max_retries + 1,
                        backoff,
                        e
                    );
                    sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                }
                Err(e) => {
                    return Err(e.context(format!("giving up after {} attempt(s)", attempt + 1)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::MockVideoListing;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config(max_retries: u32) -> ListingConfig {
        ListingConfig {
            page_size: 50,
            max_retries,
            retry_backoff_ms: 0,
        }
    }

    fn id(n: usize) -> VideoId {
        VideoId::parse(&format!("v{:03}", n)).unwrap()
    }

    /// Listing with `total` videos served in pages of 50, tokens "p1", "p2", ...
    fn paged_listing(total: usize) -> MockVideoListing {
        let mut listing = MockVideoListing::new();
        listing.expect_list_page().returning(move |_, token, page_size| {
            let page_index: usize = token
                .as_deref()
                .map(|t| t.trim_start_matches('p').parse().unwrap())
                .unwrap_or(0);
            let page_size = page_size as usize;
            let start = page_index * page_size;
            let end = (start + page_size).min(total);
            Ok(VideoPage {
                video_ids: (start..end).map(id).collect(),
                next_page_token: (end < total).then(|| format!("p{}", page_index + 1)),
            })
        });
        listing
    }

    fn lister(listing: MockVideoListing, max_retries: u32) -> VideoLister {
        VideoLister::new(Arc::new(listing), &config(max_retries))
    }

    #[tokio::test]
    async fn test_stops_after_page_reaching_cap() {
        let lister = lister(paged_listing(200), 0);
        let channel = ChannelId::new("UC1");

        assert_eq!(lister.list_videos(&channel, 50).await.unwrap().len(), 50);
        assert_eq!(lister.list_videos(&channel, 60).await.unwrap().len(), 100);
        assert_eq!(lister.list_videos(&channel, 150).await.unwrap().len(), 150);
    }

    #[tokio::test]
    async fn test_cap_overshoot_is_bounded_by_one_page() {
        let lister = lister(paged_listing(500), 0);
        let channel = ChannelId::new("UC1");

        for cap in [1usize, 2, 10, 49, 51, 99, 101, 249] {
            let ids = lister.list_videos(&channel, cap).await.unwrap();
            let bound = cap.div_ceil(50) * 50;
            assert!(ids.len() >= cap, "cap {} returned {}", cap, ids.len());
            assert!(ids.len() <= bound, "cap {} returned {}", cap, ids.len());
        }
    }

    #[tokio::test]
    async fn test_listing_shorter_than_cap() {
        let lister = lister(paged_listing(5), 0);
        let ids = lister.list_videos(&ChannelId::new("UC1"), 100).await.unwrap();
        assert_eq!(ids, (0..5).map(id).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_zero_cap_makes_no_call() {
        let mut listing = MockVideoListing::new();
        listing.expect_list_page().never();

        let lister = lister(listing, 0);
        assert!(lister.list_videos(&ChannelId::new("UC1"), 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicates_across_pages_are_dropped() {
        let mut listing = MockVideoListing::new();
        listing.expect_list_page().returning(|_, token, _| {
            Ok(match token.as_deref() {
                None => VideoPage {
                    video_ids: vec![id(1), id(2)],
                    next_page_token: Some("next".to_string()),
                },
                Some(_) => VideoPage {
                    video_ids: vec![id(2), id(3)],
                    next_page_token: None,
                },
            })
        });

        let lister = lister(listing, 0);
        let ids = lister.list_videos(&ChannelId::new("UC1"), 10).await.unwrap();
        assert_eq!(ids, vec![id(1), id(2), id(3)]);
    }

    #[tokio::test]
    async fn test_stuck_cursor_terminates() {
        let mut listing = MockVideoListing::new();
        listing.expect_list_page().times(2).returning(|_, _, _| {
            Ok(VideoPage {
                video_ids: vec![id(1)],
                next_page_token: Some("same".to_string()),
            })
        });

        let lister = lister(listing, 0);
        let ids = lister.list_videos(&ChannelId::new("UC1"), 10).await.unwrap();
        assert_eq!(ids, vec![id(1)]);
    }

    #[tokio::test]
    async fn test_sparse_pages_do_not_end_listing() {
        let mut listing = MockVideoListing::new();
        listing.expect_list_page().times(4).returning(|_, token, _| {
            Ok(match token.as_deref() {
                None => VideoPage {
                    video_ids: vec![id(1)],
                    next_page_token: Some("p1".to_string()),
                },
                Some("p1") => VideoPage {
                    video_ids: Vec::new(),
                    next_page_token: Some("p2".to_string()),
                },
                Some("p2") => VideoPage {
                    video_ids: vec![id(1)],
                    next_page_token: Some("p3".to_string()),
                },
                Some(_) => VideoPage {
                    video_ids: vec![id(2)],
                    next_page_token: None,
                },
            })
        });

        let lister = lister(listing, 0);
        let ids = lister.list_videos(&ChannelId::new("UC1"), 10).await.unwrap();
        assert_eq!(ids, vec![id(1), id(2)]);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut listing = MockVideoListing::new();
        listing.expect_list_page().returning(move |_, _, _| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(anyhow::anyhow!("connection reset"))
            } else {
                Ok(VideoPage {
                    video_ids: vec![id(1)],
                    next_page_token: None,
                })
            }
        });

        let lister = lister(listing, 2);
        let ids = lister.list_videos(&ChannelId::new("UC1"), 10).await.unwrap();
        assert_eq!(ids, vec![id(1)]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhausted_retries_is_listing_failure() {
        let mut listing = MockVideoListing::new();
        listing
            .expect_list_page()
            .times(3)
            .returning(|_, _, _| Err(anyhow::anyhow!("quota exceeded")));

        let lister = lister(listing, 2);
        let err = lister.list_videos(&ChannelId::new("UC9"), 10).await.unwrap_err();
        match err {
            ScribeError::Listing { channel, cause } => {
                assert_eq!(channel, "UC9");
                assert!(cause.contains("quota exceeded"));
                assert!(cause.contains("3 attempt"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
