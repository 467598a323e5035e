use async_trait::async_trait;

use super::{segment_end, ResolveStrategy, Resolution};
use crate::youtube::ChannelId;
use crate::Result;

const CHANNEL_MARKER: &str = "/channel/";

/// Reads the identifier straight out of a `/channel/<id>` URL; never calls out
pub struct DirectIdStrategy;

impl DirectIdStrategy {
    pub fn new() -> Self {
        Self
    }
}

/// Extract `<id>` from the first `/channel/<id>` segment of a reference
pub fn extract_channel_id(reference: &str) -> Option<&str> {
    let start = reference.find(CHANNEL_MARKER)? + CHANNEL_MARKER.len();
    let id = segment_end(&reference[start..]);
    (!id.is_empty()).then_some(id)
}

#[async_trait]
impl ResolveStrategy for DirectIdStrategy {
    fn supports_reference(&self, reference: &str) -> bool {
        extract_channel_id(reference).is_some()
    }

    async fn resolve(&self, reference: &str) -> Result<Resolution> {
        let id = extract_channel_id(reference)
            .ok_or_else(|| anyhow::anyhow!("no /channel/<id> segment in reference"))?;

        Ok(Resolution::Channel(ChannelId::new(id)))
    }

    fn strategy_name(&self) -> &'static str {
        "channel id"
    }
}

impl Default for DirectIdStrategy {
    fn default() -> Self {
        Self::new()
    }
}
