use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::listing::VideoLister;
use crate::resolver::{Resolution, ResolverRegistry};
use crate::utils::{extract_domain, normalize_reference, video_url};
use crate::youtube::{
    build_http_client, CaptionFragment, CaptionSource, ChannelSearch, DataApiClient,
    HttpPageFetcher, PageFetcher, VideoId, VideoListing, WatchPageCaptions,
};
use crate::ScribeError;

pub mod collector;

pub use collector::TranscriptCollector;

/// Transcript of one video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    /// Short URL of the video
    pub video_url: String,

    /// Caption fragments joined by single spaces
    pub transcript: String,
}

impl TranscriptRecord {
    pub fn from_fragments(id: &VideoId, fragments: &[CaptionFragment]) -> Self {
        let transcript = fragments
            .iter()
            .map(|fragment| fragment.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            video_url: video_url(id),
            transcript,
        }
    }
}

/// Bounds applied to one collection run
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionPolicy {
    /// Only the first `max_videos` identifiers are processed
    pub max_videos: usize,

    /// Wait between consecutive caption fetches
    pub request_delay: Duration,

    /// Abort once this many fetches fail in a row; 0 never aborts
    pub max_consecutive_failures: u32,
}

impl Default for CollectionPolicy {
    fn default() -> Self {
        Config::default().collection_policy()
    }
}

/// Why the collection loop stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every identifier was attempted
    #[default]
    Exhausted,

    /// The consecutive-failure threshold was reached
    TooManyFailures,
}

/// Result of a collection run
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionReport {
    /// Collected transcripts, in input order
    pub records: Vec<TranscriptRecord>,

    /// Fetch attempts made
    pub attempted: usize,

    /// Attempts that failed and were skipped
    pub failed: usize,

    pub stop_reason: StopReason,
}

impl CollectionReport {
    pub fn was_aborted(&self) -> bool {
        self.stop_reason == StopReason::TooManyFailures
    }

    pub fn into_records(self) -> Vec<TranscriptRecord> {
        self.records
    }
}

/// Resolve → list → collect, for one channel reference at a time
pub struct ChannelPipeline {
    resolver: ResolverRegistry,
    lister: VideoLister,
    collector: TranscriptCollector,
    policy: CollectionPolicy,
}

impl ChannelPipeline {
    pub fn new(
        resolver: ResolverRegistry,
        lister: VideoLister,
        collector: TranscriptCollector,
        policy: CollectionPolicy,
    ) -> Self {
        Self {
            resolver,
            lister,
            collector,
            policy,
        }
    }

    /// Wire the real YouTube clients from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.youtube.api_key.is_empty() {
            tracing::warn!("No YouTube API key configured; channel search and listing will fail");
        }

        let client = build_http_client(&config.youtube)?;

        let data_api = Arc::new(DataApiClient::new(
            client.clone(),
            config.youtube.api_base_url.clone(),
            config.youtube.api_key.clone(),
        ));
        let search: Arc<dyn ChannelSearch> = data_api.clone();
        let listing: Arc<dyn VideoListing> = data_api;

        let scrape_fetcher = config
            .resolver
            .scrape_fallback
            .then(|| Arc::new(HttpPageFetcher::new(client.clone())) as Arc<dyn PageFetcher>);

        let captions: Arc<dyn CaptionSource> = Arc::new(WatchPageCaptions::new(client));

        let resolver = ResolverRegistry::with_defaults(search, scrape_fetcher);
        tracing::debug!("Resolution strategies: {:?}", resolver.list_strategies());

        Ok(Self::new(
            resolver,
            VideoLister::new(listing, &config.listing),
            TranscriptCollector::new(captions, config.youtube.caption_languages.clone()),
            config.collection_policy(),
        ))
    }

    /// Default policy applied by [`ChannelPipeline::run`]
    pub fn policy(&self) -> &CollectionPolicy {
        &self.policy
    }

    /// Run the full pipeline with the configured policy
    pub async fn run(&self, reference: &str) -> std::result::Result<CollectionReport, ScribeError> {
        self.run_with_policy(reference, &self.policy).await
    }

    /// Run the full pipeline with an explicit policy
    pub async fn run_with_policy(
        &self,
        reference: &str,
        policy: &CollectionPolicy,
    ) -> std::result::Result<CollectionReport, ScribeError> {
        let reference =
            normalize_reference(reference).map_err(|e| ScribeError::InvalidRequest(e.to_string()))?;

        tracing::info!(
            "Collecting transcripts for {} ({})",
            reference,
            extract_domain(&reference).unwrap_or_else(|| "no domain".to_string())
        );

        let mut ids = match self.resolver.resolve(&reference).await? {
            Resolution::Channel(channel) => {
                tracing::info!("Resolved channel id {}", channel);
                self.lister.list_videos(&channel, policy.max_videos).await?
            }
            Resolution::Videos(ids) => {
                tracing::info!("Using {} scraped video ids, skipping listing", ids.len());
                ids
            }
        };
        ids.truncate(policy.max_videos);

        Ok(self.collector.collect(&ids, policy).await)
    }
}
