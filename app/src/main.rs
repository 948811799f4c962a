//! hygrolog polling daemon
//!
//! Reads the configured sensors in a sequential burst cycle, renders the
//! values to the console and appends them to per-day CSV logs.

use anyhow::{bail, Result};
use chrono::Local;
use std::time::Duration;

mod config;
mod export;
mod render;
mod sensors;

use config::AppConfig;
use export::CsvExporter;
use sensors::build_sensors;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    tracing::info!("╔══════════════════════════════════╗");
    tracing::info!("║   hygrolog climate logger 0.1.0  ║");
    tracing::info!("╚══════════════════════════════════╝");

    let config = AppConfig::load()?;
    config.validate()?;
    if !config.config_path.as_os_str().is_empty() {
        tracing::info!("configuration loaded from {:?}", config.config_path);
    }

    let mut sensors = build_sensors(&config);
    if sensors.is_empty() {
        bail!(
            "no sensors available; add a [[sensors]] section (see `hygrolog-cli config` for an example)"
        );
    }

    let exporter = config
        .export_csv
        .then(|| CsvExporter::new(&config.data_directory));
    if let Some(exporter) = &exporter {
        tracing::info!("CSV export enabled to {:?}", exporter.directory());
    }

    let burst_interval = Duration::from_millis(config.burst_interval_ms);
    let cycle_interval = Duration::from_secs(config.cycle_interval_secs);

    tracing::info!(
        "polling {} sensor(s) every {:?} ({} samples per burst)",
        sensors.len(),
        cycle_interval,
        config.burst_count
    );
    tracing::info!("Press Ctrl+C to stop");

    loop {
        for sensor in &mut sensors {
            sensor.run_burst(config.burst_count, burst_interval).await;

            match render::render_sensor(sensor, &config.display) {
                Ok(text) => print!("{text}"),
                Err(e) => tracing::error!(sensor = sensor.name(), "render failed: {e}"),
            }

            if let Some(exporter) = &exporter {
                if let Err(e) = exporter.append(sensor, &config.display, Local::now()) {
                    tracing::error!(sensor = sensor.name(), "CSV export failed: {e:#}");
                }
            }

            sensor.reset_bursts();
        }

        tokio::select! {
            _ = tokio::time::sleep(cycle_interval) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                break;
            }
        }
    }

    tracing::info!("hygrolog shutdown complete");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hygrolog=debug,hygrolog_hal=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .init();
}
