pub mod config;
pub mod correlate;
pub mod probe;
pub mod report;

use crate::config::ProbeConfig;
use crate::probe::ProbeHandle;
use crate::report::{run_report_sink, LatencyStats, ReportHook};
use color_eyre::{eyre::eyre, Result};
use tokio::sync::mpsc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = ProbeConfig::load_or_default();
    info!("Starting latency probe with config: {:?}", config);

    let (report_sender, report_receiver) = mpsc::channel(1000);

    let _probe_handle = ProbeHandle::spawn(Some(config.settings()), report_sender)
        .map_err(|e| eyre!("Failed to spawn probe: {}", e))?;

    let hook: Option<Box<dyn ReportHook>> = if config.stats {
        info!("Statistics hook enabled");
        Some(Box::new(LatencyStats::new()))
    } else {
        None
    };

    // Runs until the probe task drops its sender
    run_report_sink(report_receiver, hook).await;

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
