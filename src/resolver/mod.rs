use async_trait::async_trait;
use std::sync::Arc;

pub mod direct;
pub mod handle;
pub mod scrape;

use crate::youtube::{ChannelId, ChannelSearch, PageFetcher, VideoId};
use crate::{Result, ScribeError};

/// Outcome of resolving a channel reference
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A channel identifier to hand to the listing collector
    Channel(ChannelId),

    /// Video identifiers scraped straight from the channel page, bypassing listing
    Videos(Vec<VideoId>),
}

/// One way of turning a channel reference into a [`Resolution`]
#[async_trait]
pub trait ResolveStrategy: Send + Sync {
    /// Check if this strategy recognizes the reference
    fn supports_reference(&self, reference: &str) -> bool;

    /// Resolve a reference this strategy supports
    async fn resolve(&self, reference: &str) -> Result<Resolution>;

    /// Name used in logs
    fn strategy_name(&self) -> &'static str;
}

/// Ordered set of resolution strategies; the first one that supports a reference wins
pub struct ResolverRegistry {
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl ResolverRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Registry with the direct-id and handle strategies, plus the scrape fallback when a fetcher is given
    pub fn with_defaults(
        search: Arc<dyn ChannelSearch>,
        scrape_fetcher: Option<Arc<dyn PageFetcher>>,
    ) -> Self {
        let mut registry = Self::new();

        registry.register(Box::new(direct::DirectIdStrategy::new()));
        registry.register(Box::new(handle::HandleStrategy::new(search)));
        if let Some(fetcher) = scrape_fetcher {
            registry.register(Box::new(scrape::ScrapeStrategy::new(fetcher)));
        }

        registry
    }

    /// Register a strategy at the lowest priority
    pub fn register(&mut self, strategy: Box<dyn ResolveStrategy>) {
        self.strategies.push(strategy);
    }

    /// Find the highest-priority strategy that supports the reference
    pub fn find_strategy(&self, reference: &str) -> Option<&dyn ResolveStrategy> {
        self.strategies
            .iter()
            .find(|strategy| strategy.supports_reference(reference))
            .map(|boxed| boxed.as_ref())
    }

    /// List registered strategies in priority order
    pub fn list_strategies(&self) -> Vec<&'static str> {
        self.strategies
            .iter()
            .map(|strategy| strategy.strategy_name())
            .collect()
    }

    /// Resolve a reference, converting every failure into [`ScribeError::Resolution`]
    pub async fn resolve(&self, reference: &str) -> std::result::Result<Resolution, ScribeError> {
        let strategy = self
            .find_strategy(reference)
            .ok_or_else(|| ScribeError::resolution(reference, "unrecognized channel reference"))?;

        tracing::debug!("Resolving '{}' with {} strategy", reference, strategy.strategy_name());

        strategy
            .resolve(reference)
            .await
            .map_err(|e| ScribeError::resolution(reference, format!("{:#}", e)))
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Cut a path segment at the first URL delimiter
pub(crate) fn segment_end(rest: &str) -> &str {
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    &rest[..end]
}
