use async_trait::async_trait;
use std::sync::Arc;

use super::{segment_end, ResolveStrategy, Resolution};
use crate::youtube::{ChannelId, ChannelSearch};
use crate::Result;

/// Resolves `@handle` references with a single channel search
pub struct HandleStrategy {
    search: Arc<dyn ChannelSearch>,
}

impl HandleStrategy {
    pub fn new(search: Arc<dyn ChannelSearch>) -> Self {
        Self { search }
    }
}

/// Extract the handle after `@`, percent-decoded, without the `@`
pub fn extract_handle(reference: &str) -> Option<String> {
    let start = reference.find('@')? + 1;
    let raw = segment_end(&reference[start..]);
    if raw.is_empty() {
        return None;
    }

    let handle = urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    Some(handle)
}

#[async_trait]
impl ResolveStrategy for HandleStrategy {
    fn supports_reference(&self, reference: &str) -> bool {
        extract_handle(reference).is_some()
    }

    async fn resolve(&self, reference: &str) -> Result<Resolution> {
        let handle = extract_handle(reference)
            .ok_or_else(|| anyhow::anyhow!("no @handle in reference"))?;

        tracing::info!("Looking up channel for handle @{}", handle);

        let matches = self.search.search_channels(&handle, 1).await?;
        let id = matches
            .into_iter()
            .find(|id| !id.is_empty())
            .ok_or_else(|| anyhow::anyhow!("no channel found for handle @{}", handle))?;

        Ok(Resolution::Channel(ChannelId::new(id)))
    }

    fn strategy_name(&self) -> &'static str {
        "handle search"
    }
}
