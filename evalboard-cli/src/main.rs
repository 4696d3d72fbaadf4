//! evalboard: terminal dashboard for browsing ML evaluation logs.
//!
//! Opens an interactive TUI over a log folder, or prints a plain-text
//! report with `--no-tui`.

mod report;
mod tui;

use anyhow::Context;
use clap::Parser;
use evalboard_core::Metadata;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Browse the dashboards of an evaluation log folder
#[derive(Parser, Debug)]
#[command(name = "evalboard", version, about, long_about = None)]
struct Cli {
    /// Log folder containing metadata.json and one directory per dashboard
    log_folder: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print a plain-text report instead of starting the TUI
    #[arg(long)]
    no_tui: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // Stderr would corrupt the alternate screen, so it is only used in report mode.
    let stderr_layer = cli.no_tui.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(EnvFilter::new(filter))
    });

    let log_dir = directories::ProjectDirs::from("dev", "evalboard", "evalboard")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "evalboard.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new(if cli.verbose > 0 { filter } else { "debug" }));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let log_folder = cli
        .log_folder
        .canonicalize()
        .with_context(|| format!("Log folder not found: {}", cli.log_folder.display()))?;

    let config = evalboard_core::load_config(Some(&log_folder), cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    let metadata = Metadata::load(&log_folder)
        .with_context(|| format!("Cannot open log folder {}", log_folder.display()))?;

    tracing::info!(
        log_folder = %log_folder.display(),
        models = metadata.model_args.len(),
        features = metadata.feature_args.len(),
        "Starting evalboard"
    );

    if cli.no_tui {
        report::print(&log_folder, &config, metadata)
    } else {
        tui::run(log_folder, config, metadata).await
    }
}
