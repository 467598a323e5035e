use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use channel_scribe::cli::{Cli, Commands};
use channel_scribe::config::Config;
use channel_scribe::server::{self, AppState};
use channel_scribe::{output, ChannelPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    // Written before loading so an explicit --config path may not exist yet.
    if let Commands::Config { init: true, .. } = cli.command {
        let path = Config::default().save(cli.config.as_deref()).await?;
        println!("Default configuration written to: {}", path.display());
    }

    let mut config = Config::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
                .parse()
                .context("Invalid bind address")?;

            let pipeline = ChannelPipeline::from_config(&config)?;
            tracing::info!(
                "Starting channel-scribe (max videos: {}, delay: {}ms, failure threshold: {})",
                config.collection.max_videos,
                config.collection.request_delay_ms,
                config.collection.max_consecutive_failures
            );

            server::serve(AppState::new(pipeline), addr).await?;
        }
        Commands::Fetch {
            channel_url,
            max_videos,
            delay_ms,
            max_failures,
            scrape,
            output,
            format,
        } => {
            if let Some(max_videos) = max_videos {
                config.collection.max_videos = max_videos;
            }
            if let Some(delay_ms) = delay_ms {
                config.collection.request_delay_ms = delay_ms;
            }
            if let Some(max_failures) = max_failures {
                config.collection.max_consecutive_failures = max_failures;
            }
            if scrape {
                config.resolver.scrape_fallback = true;
            }
            config.validate()?;

            let pipeline = ChannelPipeline::from_config(&config)?;

            tracing::info!("Starting transcript collection for: {}", channel_url);
            let report = pipeline.run(&channel_url).await?;

            if report.was_aborted() {
                eprintln!(
                    "Stopped early after {} consecutive failures; result is partial",
                    config.collection.max_consecutive_failures
                );
            }

            match output {
                Some(path) => {
                    output::save_to_file(&report, &path, &format).await?;
                    println!(
                        "Saved {} transcripts to: {}",
                        report.records.len(),
                        path.display()
                    );
                }
                None => {
                    output::print_to_console(&report, &format)?;
                }
            }
        }
        Commands::Config { show, init } => {
            if show || !init {
                config.display();
            }
        }
    }

    Ok(())
}

/// Logs go to stderr so `fetch` output on stdout stays machine-readable
fn init_tracing(verbose: bool, quiet: bool) {
    let default_directive = if verbose {
        "channel_scribe=debug,tower_http=debug"
    } else if quiet {
        "channel_scribe=warn"
    } else {
        "channel_scribe=info,tower_http=info"
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
