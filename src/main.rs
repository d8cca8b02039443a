//! Kast server entry point.

use anyhow::Result;
use clap::Parser;
use kast::config::Settings;
use kast::pipeline::Pipeline;
use kast::server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Kast - Podcast Content Pipeline
///
/// Serves the extraction/cleaning/generation pipeline over HTTP.
#[derive(Parser, Debug)]
#[command(name = "kast")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Host to bind to (overrides configuration)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides configuration)
    #[arg(short, long)]
    port: Option<u16>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load and validate configuration before anything else
    let settings = match &args.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    init_logging(&settings, args.verbose);

    let host = args
        .host
        .clone()
        .unwrap_or_else(|| settings.server.host.clone());
    let port = args.port.unwrap_or(settings.server.port);

    let pipeline = Pipeline::new(settings)?;
    server::run_server(&host, port, pipeline).await?;

    Ok(())
}

/// Initialize tracing from the configured level and format.
///
/// `RUST_LOG` overrides the configured level; the verbose flag overrides
/// both.
fn init_logging(settings: &Settings, verbose: u8) {
    let level = match verbose {
        0 => settings.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("kast={}", level)),
    );

    let registry = tracing_subscriber::registry().with(filter);

    if settings.logging.format == "compact" {
        registry
            .with(tracing_subscriber::fmt::layer().compact().with_target(false))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}
