use std::sync::Arc;
use tokio::time::sleep;

use super::{CollectionPolicy, CollectionReport, StopReason, TranscriptRecord};
use crate::youtube::{CaptionSource, VideoId};
use crate::ScribeError;

/// Sequential, paced caption collection over a list of videos
pub struct TranscriptCollector {
    captions: Arc<dyn CaptionSource>,
    languages: Vec<String>,
}

impl TranscriptCollector {
    pub fn new(captions: Arc<dyn CaptionSource>, languages: Vec<String>) -> Self {
        Self { captions, languages }
    }

    /// Fetch one transcript per video, in order, under `policy`.
    ///
    /// Failed videos are skipped. A run of `max_consecutive_failures` failures
    /// stops the loop; whatever was collected before is still returned.
    pub async fn collect(&self, ids: &[VideoId], policy: &CollectionPolicy) -> CollectionReport {
        let ids = &ids[..ids.len().min(policy.max_videos)];

        let mut report = CollectionReport::default();
        let mut consecutive_failures = 0u32;

        for (index, id) in ids.iter().enumerate() {
            if index > 0 && !policy.request_delay.is_zero() {
                sleep(policy.request_delay).await;
            }

            report.attempted += 1;
            match self.fetch_one(id).await {
                Ok(record) => {
                    consecutive_failures = 0;
                    report.records.push(record);
                }
                Err(err) => {
                    report.failed += 1;
                    consecutive_failures += 1;
                    tracing::warn!("Skipping video {}: {}", id, err);

                    if policy.max_consecutive_failures > 0
                        && consecutive_failures >= policy.max_consecutive_failures
                    {
                        tracing::warn!(
                            "Stopping after {} consecutive caption failures ({} of {} videos not attempted)",
                            consecutive_failures,
                            ids.len() - index - 1,
                            ids.len()
                        );
                        report.stop_reason = StopReason::TooManyFailures;
                        break;
                    }
                }
            }
        }

        tracing::info!(
            "Collected {} transcripts ({} attempted, {} failed)",
            report.records.len(),
            report.attempted,
            report.failed
        );

        report
    }

    async fn fetch_one(&self, id: &VideoId) -> Result<TranscriptRecord, ScribeError> {
        let fragments = self
            .captions
            .fetch_captions(id, &self.languages)
            .await
            .map_err(|e| ScribeError::Caption {
                video: id.to_string(),
                cause: format!("{:#}", e),
            })?;

        Ok(TranscriptRecord::from_fragments(id, &fragments))
    }
}
