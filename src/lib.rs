//! Channel Scribe - collect caption transcripts for the videos of a YouTube channel
//!
//! This library resolves a channel URL to a channel identifier, lists a bounded
//! number of that channel's videos, and fetches one caption track per video,
//! exposing the result over HTTP or through the command line.

pub mod cli;
pub mod config;
pub mod listing;
pub mod output;
pub mod resolver;
pub mod server;
pub mod transcribe;
pub mod utils;
pub mod youtube;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use resolver::{Resolution, ResolverRegistry};
pub use transcribe::{ChannelPipeline, CollectionPolicy, CollectionReport, TranscriptRecord};
pub use youtube::{ChannelId, VideoId};

/// Result type used by the remote clients
pub type Result<T> = anyhow::Result<T>;

/// Error types surfaced at the pipeline boundary
#[derive(thiserror::Error, Debug)]
pub enum ScribeError {
    #[error("Could not resolve channel from '{reference}': {cause}")]
    Resolution { reference: String, cause: String },

    #[error("Video listing failed for channel {channel}: {cause}")]
    Listing { channel: String, cause: String },

    #[error("Caption fetch failed for video {video}: {cause}")]
    Caption { video: String, cause: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScribeError {
    pub(crate) fn resolution(reference: &str, cause: impl std::fmt::Display) -> Self {
        ScribeError::Resolution {
            reference: reference.to_string(),
            cause: cause.to_string(),
        }
    }
}
