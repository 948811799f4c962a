//! CSV export
//!
//! One file per sensor per day, named `YYYY-MM-DD_<sensor>.csv`. The
//! header row is written only when a day's file is first created; every
//! poll cycle appends one row: a timestamp column followed by one column
//! per channel (burst average when samples exist, otherwise the current
//! value) at fixed two-decimal precision.

use crate::config::DisplayConfig;
use crate::sensors::Sensor;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct CsvExporter {
    directory: PathBuf,
}

impl CsvExporter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Append one row for this poll cycle, creating the day's file (and
    /// its header) if needed. Returns the file written to.
    pub fn append(
        &self,
        sensor: &Sensor,
        display: &DisplayConfig,
        now: DateTime<Local>,
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.directory)
            .with_context(|| format!("creating {:?}", self.directory))?;

        let file_name = format!("{}_{}.csv", now.format("%Y-%m-%d"), sensor.name());
        let path = self.directory.join(file_name);
        let is_new = !path.exists();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening {path:?}"))?;

        if is_new {
            tracing::info!("creating CSV log {path:?}");
            writeln!(file, "{}", header_row(sensor, display)?)?;
        }

        writeln!(file, "{}", value_row(sensor, display, now)?)?;
        Ok(path)
    }
}

/// `timestamp,Temperature[°C],Relative Humidity[%],...`
fn header_row(sensor: &Sensor, display: &DisplayConfig) -> Result<String> {
    let mut columns = vec!["timestamp".to_string()];
    for measurement in sensor.measurements() {
        let unit = measurement.resolve_unit(Some(display.unit_for(measurement.quantity())))?;
        columns.push(format!(
            "{}[{}]",
            measurement.quantity().name(),
            unit.symbol()
        ));
    }
    Ok(columns.join(","))
}

fn value_row(sensor: &Sensor, display: &DisplayConfig, now: DateTime<Local>) -> Result<String> {
    let mut columns = vec![now.format("%H:%M:%S").to_string()];

    for measurement in sensor.measurements() {
        let unit = display.unit_for(measurement.quantity());
        let value = if measurement.burst_len() > 0 {
            measurement.average_burst(Some(unit))?
        } else {
            measurement.value(Some(unit))?.0
        };
        columns.push(format!("{value:.2}"));
    }

    Ok(columns.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::testing::FakeDriver;
    use chrono::TimeZone;
    use std::time::Duration;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "hygrolog-export-{tag}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    async fn sampled_sensor() -> Sensor {
        let driver = FakeDriver {
            values: vec![21.5, 48.25],
            fail: false,
        };
        let mut sensor = Sensor::new(Box::new(driver), Some("attic".to_string()));
        sensor.run_burst(3, Duration::ZERO).await;
        sensor
    }

    #[tokio::test]
    async fn header_written_once_rows_appended() {
        let dir = scratch_dir("append");
        let exporter = CsvExporter::new(&dir);
        let sensor = sampled_sensor().await;
        let display = DisplayConfig::default();
        let noon = Local.with_ymd_and_hms(2026, 8, 26, 12, 0, 0).unwrap();
        let later = Local.with_ymd_and_hms(2026, 8, 26, 12, 5, 0).unwrap();

        let path = exporter.append(&sensor, &display, noon).unwrap();
        exporter.append(&sensor, &display, later).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "2026-08-26_attic.csv"
        );

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp,Temperature[°C],Relative Humidity[%]");
        assert_eq!(lines[1], "12:00:00,21.50,48.25");
        assert_eq!(lines[2], "12:05:00,21.50,48.25");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn new_day_gets_a_new_file() {
        let dir = scratch_dir("rollover");
        let exporter = CsvExporter::new(&dir);
        let sensor = sampled_sensor().await;
        let display = DisplayConfig::default();

        let day1 = Local.with_ymd_and_hms(2026, 8, 26, 23, 59, 0).unwrap();
        let day2 = Local.with_ymd_and_hms(2026, 8, 27, 0, 4, 0).unwrap();

        let p1 = exporter.append(&sensor, &display, day1).unwrap();
        let p2 = exporter.append(&sensor, &display, day2).unwrap();
        assert_ne!(p1, p2);

        // Both files carry their own header.
        for p in [&p1, &p2] {
            let content = std::fs::read_to_string(p).unwrap();
            assert!(content.starts_with("timestamp,"));
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn empty_burst_falls_back_to_current_value() {
        let dir = scratch_dir("fallback");
        let exporter = CsvExporter::new(&dir);
        let mut sensor = sampled_sensor().await;
        sensor.reset_bursts();
        let display = DisplayConfig::default();
        let noon = Local.with_ymd_and_hms(2026, 8, 26, 12, 0, 0).unwrap();

        let path = exporter.append(&sensor, &display, noon).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.lines().nth(1).unwrap().ends_with("21.50,48.25"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
