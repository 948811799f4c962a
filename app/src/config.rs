// Application configuration

use anyhow::{bail, Result};
use hygrolog_core::{Quantity, Unit, UnitFamily};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory CSV logs are written to
    #[serde(default = "default_data_dir")]
    pub data_directory: String,

    /// Seconds between poll cycles
    #[serde(default = "default_cycle_interval")]
    pub cycle_interval_secs: u64,

    /// Samples taken per burst
    #[serde(default = "default_burst_count")]
    pub burst_count: u32,

    /// Milliseconds between samples within a burst
    #[serde(default = "default_burst_interval")]
    pub burst_interval_ms: u64,

    /// Append a CSV row every cycle
    #[serde(default = "default_true")]
    pub export_csv: bool,

    /// Sea-level reference pressure for the BME280 altitude channel (hPa)
    #[serde(default = "default_sea_level")]
    pub sea_level_pressure_hpa: f64,

    /// Display units per quantity family
    #[serde(default)]
    pub display: DisplayConfig,

    /// Sensors to poll
    #[serde(default)]
    pub sensors: Vec<SensorConfig>,

    /// Path this config was loaded from (for reference)
    #[serde(skip)]
    pub config_path: PathBuf,
}

/// Which unit each quantity family is rendered and exported in.
/// Values in the CSV and on the console use these; the measurement core
/// keeps storing canonical units regardless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_temperature_unit")]
    pub temperature: Unit,
    #[serde(default = "default_humidity_unit")]
    pub humidity: Unit,
    #[serde(default = "default_pressure_unit")]
    pub pressure: Unit,
    #[serde(default = "default_distance_unit")]
    pub distance: Unit,
    #[serde(default = "default_time_unit")]
    pub time: Unit,
}

impl DisplayConfig {
    /// The configured display unit for a quantity.
    pub fn unit_for(&self, quantity: Quantity) -> Unit {
        match quantity.family() {
            UnitFamily::Temperature => self.temperature,
            UnitFamily::RelativeHumidity => self.humidity,
            UnitFamily::Pressure => self.pressure,
            UnitFamily::Distance => self.distance,
            UnitFamily::Time => self.time,
        }
    }
}

/// One configured sensor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    pub kind: SensorKind,

    /// GPIO pin (DHT11/DHT22)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<u32>,

    /// I2C bus path (SHTC3/BME280)
    #[serde(default = "default_i2c_bus")]
    pub bus: String,

    /// I2C address override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<u8>,

    /// Name used in output and CSV files; defaults to the driver name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensorKind {
    Dht11,
    Dht22,
    Shtc3,
    Bme280,
}

fn default_data_dir() -> String {
    "/var/lib/hygrolog/data".to_string()
}
fn default_cycle_interval() -> u64 {
    300
}
fn default_burst_count() -> u32 {
    5
}
fn default_burst_interval() -> u64 {
    2000
}
fn default_true() -> bool {
    true
}
fn default_sea_level() -> f64 {
    1013.25
}
fn default_i2c_bus() -> String {
    "/dev/i2c-1".to_string()
}
fn default_temperature_unit() -> Unit {
    Unit::Celsius
}
fn default_humidity_unit() -> Unit {
    Unit::Percent
}
fn default_pressure_unit() -> Unit {
    Unit::Hectopascal
}
fn default_distance_unit() -> Unit {
    Unit::Meter
}
fn default_time_unit() -> Unit {
    Unit::Second
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature_unit(),
            humidity: default_humidity_unit(),
            pressure: default_pressure_unit(),
            distance: default_distance_unit(),
            time: default_time_unit(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_dir(),
            cycle_interval_secs: default_cycle_interval(),
            burst_count: default_burst_count(),
            burst_interval_ms: default_burst_interval(),
            export_csv: true,
            sea_level_pressure_hpa: default_sea_level(),
            display: DisplayConfig::default(),
            sensors: Vec::new(),
            config_path: PathBuf::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from standard paths
    pub fn load() -> Result<Self> {
        let config_paths = [
            PathBuf::from("/etc/hygrolog/config.toml"),
            dirs::config_dir()
                .map(|p| p.join("hygrolog/config.toml"))
                .unwrap_or_default(),
            PathBuf::from("./config.toml"),
        ];

        for path in &config_paths {
            if path.exists() {
                return Self::load_from(path);
            }
        }

        tracing::warn!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: AppConfig = toml::from_str(&content)?;
        config.config_path = path.clone();
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the polling loop cannot honor. The
    /// measurement core assumes validated input, so the checks live here
    /// at the boundary.
    pub fn validate(&self) -> Result<()> {
        if self.burst_count == 0 {
            bail!("burst_count must be at least 1");
        }
        if self.burst_interval_ms == 0 {
            bail!("burst_interval_ms must be positive");
        }
        if self.cycle_interval_secs == 0 {
            bail!("cycle_interval_secs must be positive");
        }
        if self.sea_level_pressure_hpa <= 0.0 {
            bail!("sea_level_pressure_hpa must be positive");
        }
        for sensor in &self.sensors {
            if matches!(sensor.kind, SensorKind::Dht11 | SensorKind::Dht22) && sensor.pin.is_none()
            {
                bail!("{:?} sensor requires a GPIO pin", sensor.kind);
            }
        }
        Ok(())
    }

    /// Generate example configuration
    pub fn example() -> String {
        let config = Self {
            sensors: vec![
                SensorConfig {
                    kind: SensorKind::Dht22,
                    pin: Some(17),
                    bus: default_i2c_bus(),
                    address: None,
                    label: Some("attic".to_string()),
                },
                SensorConfig {
                    kind: SensorKind::Bme280,
                    pin: None,
                    bus: default_i2c_bus(),
                    address: None,
                    label: None,
                },
            ],
            ..Default::default()
        };

        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Helper for getting config directories
mod dirs {
    use std::path::PathBuf;

    pub fn config_dir() -> Option<PathBuf> {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_burst_count_is_rejected() {
        let config = AppConfig {
            burst_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn dht_without_pin_is_rejected() {
        let config = AppConfig {
            sensors: vec![SensorConfig {
                kind: SensorKind::Dht22,
                pin: None,
                bus: default_i2c_bus(),
                address: None,
                label: None,
            }],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn display_units_parse_from_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [display]
            temperature = "fahrenheit"
            pressure = "millimeters-of-mercury"
            "#,
        )
        .unwrap();

        assert_eq!(config.display.unit_for(Quantity::Temperature), Unit::Fahrenheit);
        assert_eq!(
            config.display.unit_for(Quantity::Pressure),
            Unit::MillimetersOfMercury
        );
        // Untouched families keep their canonical default.
        assert_eq!(config.display.unit_for(Quantity::Altitude), Unit::Meter);
    }

    #[test]
    fn example_config_round_trips() {
        let example = AppConfig::example();
        let parsed: AppConfig = toml::from_str(&example).unwrap();
        parsed.validate().unwrap();
        assert_eq!(parsed.sensors.len(), 2);
        assert_eq!(parsed.sensors[0].kind, SensorKind::Dht22);
    }
}
