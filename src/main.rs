//! # Referee Link
//!
//! Serial link between a competition referee system and an onboard robot
//! controller.
//!
//! The binary opens the referee serial port, runs the link task (capture,
//! parse, refresh, compose, transmit) and logs link status transitions until
//! interrupted.

use anyhow::Result;
use tracing::info;
use tracing_subscriber;

use referee_link::config::Config;
use referee_link::link::RefereeLink;
use referee_link::referee::protocol::LinkStatus;
use referee_link::serial::RefereeSerial;

/// Main entry point for the referee link application
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration (first argument, or built-in defaults)
///    - Open the referee serial port
///
/// 2. **Main Loop**
///    - The link task drives capture, parse, refresh and transmit
///    - A watcher task logs every link status transition
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if:
/// - The configuration file cannot be loaded
/// - No referee serial device can be opened
/// - The transport faults while the link runs
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    info!("Referee link v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let port = RefereeSerial::open(&config.serial)?;
    info!("Referee serial port opened at: {}", port.device_path());

    let (link, mut handle) = RefereeLink::new(port, &config)?;

    // Surface every offline/online transition without touching raw telemetry.
    let watcher = tokio::spawn(async move {
        let mut last_status = LinkStatus::Offline;
        while handle.changed().await {
            let status = handle.state().status;
            if status != last_status {
                info!("Referee link status: {:?}", status);
                last_status = status;
            }
        }
    });

    info!("Press Ctrl+C to exit");

    tokio::select! {
        result = link.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    watcher.abort();
    Ok(())
}
