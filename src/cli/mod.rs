use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "channel-scribe",
    about = "Channel Scribe - Collect caption transcripts for the videos of a YouTube channel",
    version,
    long_about = "Resolves a YouTube channel URL (channel id, @handle, or a scraped channel page), lists a bounded number of its videos and fetches one caption track per video. Runs as an HTTP service or as a one-shot command."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to ./config.yaml, then the user config directory)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service
    Serve {
        /// Address to bind (overrides server.host)
        #[arg(long, value_name = "HOST")]
        host: Option<String>,

        /// Port to listen on (overrides server.port)
        #[arg(short, long, env = "PORT", value_name = "PORT")]
        port: Option<u16>,
    },

    /// Collect transcripts for one channel and print them
    Fetch {
        /// Channel URL (/channel/<id>, /@handle, or any channel page with --scrape)
        #[arg(value_name = "CHANNEL_URL")]
        channel_url: String,

        /// Maximum number of videos to fetch
        #[arg(long, value_name = "COUNT")]
        max_videos: Option<usize>,

        /// Delay between caption fetches in milliseconds
        #[arg(long, value_name = "MS")]
        delay_ms: Option<u64>,

        /// Stop after this many consecutive failures (0 never stops)
        #[arg(long, value_name = "COUNT")]
        max_failures: Option<u32>,

        /// Enable the page-scrape fallback for unrecognized URLs
        #[arg(long)]
        scrape: bool,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Show or initialize the configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Write a default configuration file
        #[arg(long)]
        init: bool,
    },
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// JSON array of {video_url, transcript}
    Json,
    /// Plain text, one block per video
    Text,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_fetch() {
        let cli = Cli::parse_from([
            "channel-scribe",
            "fetch",
            "https://youtube.com/@x",
            "--max-videos",
            "5",
            "--scrape",
            "-f",
            "text",
        ]);

        match cli.command {
            Commands::Fetch {
                channel_url,
                max_videos,
                scrape,
                format,
                ..
            } => {
                assert_eq!(channel_url, "https://youtube.com/@x");
                assert_eq!(max_videos, Some(5));
                assert!(scrape);
                assert_eq!(format.to_string(), "text");
            }
            _ => panic!("expected fetch"),
        }
    }
}
