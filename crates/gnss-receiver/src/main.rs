//! GNSS Monitor - Main Entry Point
//!
//! Usage: `gnss-monitor [config.toml]`. Prints one JSON line per fix, with the
//! fix time also given as Unix seconds.

use anyhow::Context;
use gnss_receiver::{init_logging, GnssDevice, PowerSaveMode, ReceiverConfig, SerialPortTransport};
use std::path::PathBuf;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = ReceiverConfig::load(config_path.as_deref()).context("Failed to load receiver config")?;

    init_logging(&config.log_level)?;

    info!("=== GNSS Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let transport = SerialPortTransport::new(&config.port);
    let (mut device, mut reader) = GnssDevice::open(&config, transport)
        .with_context(|| format!("Failed to open GNSS module on {}", config.port))?;

    device
        .set_power_save(PowerSaveMode::FullOn)
        .context("Failed to wake GNSS module")?;

    reader.on_fix(|fix| match serde_json::to_value(fix) {
        Ok(mut json) => {
            json["unix_time"] = fix.unix_timestamp().into();
            println!("{}", json);
        }
        Err(e) => warn!("Failed to serialize fix: {}", e),
    });

    let stats = reader
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!(
        "Shutting down: {} sentences, {} fixes, {} rejected",
        stats.sentences, stats.fixes, stats.rejected
    );
    drop(device);

    Ok(())
}
