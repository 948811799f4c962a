//! Sensor registry and burst polling
//!
//! A [`Sensor`] is a driver plus one [`Measurement`] per channel; the
//! polling loop drives it through burst cycles and the renderer/exporter
//! read the measurements back out.

use crate::config::{AppConfig, SensorConfig, SensorKind};
use anyhow::{Context, Result};
use hygrolog_core::Measurement;
use hygrolog_hal::{
    bme280,
    dht::{Dht, DhtKind},
    i2c::I2cBus,
    Bme280, SensorDriver, Shtc3,
};
use std::time::Duration;

/// One polled device: a hardware driver and the per-channel measurement
/// state it feeds.
pub struct Sensor {
    name: String,
    driver: Box<dyn SensorDriver>,
    measurements: Vec<Measurement>,
}

impl Sensor {
    pub fn new(driver: Box<dyn SensorDriver>, label: Option<String>) -> Self {
        let measurements = driver
            .channels()
            .iter()
            .map(|&q| Measurement::new(q))
            .collect();
        let name = label.unwrap_or_else(|| driver.name().to_string());

        Self {
            name,
            driver,
            measurements,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// Read the device once and record the values. Transient failures
    /// are logged and skipped; the next cycle retries.
    fn sample_into(&mut self, burst: bool) {
        match self.driver.sample() {
            Ok(values) => {
                for (measurement, value) in self.measurements.iter_mut().zip(values) {
                    measurement.set_value(value, burst);
                }
            }
            Err(e) => {
                tracing::warn!(sensor = %self.name, "read failed: {e}");
            }
        }
    }

    /// One burst cycle: `count` burst samples paced at `interval` (never
    /// faster than the hardware allows), then a final sample recorded as
    /// the current value.
    pub async fn run_burst(&mut self, count: u32, interval: Duration) {
        let pause = interval.max(self.driver.min_interval());

        for _ in 0..count {
            self.sample_into(true);
            tokio::time::sleep(pause).await;
        }
        self.sample_into(false);
    }

    /// Clear all burst buffers for the next cycle.
    pub fn reset_bursts(&mut self) {
        for measurement in &mut self.measurements {
            measurement.reset_burst();
        }
    }
}

/// Construct sensors from the configuration. Devices that fail to
/// initialize are logged and left out rather than aborting the rest.
pub fn build_sensors(config: &AppConfig) -> Vec<Sensor> {
    let mut sensors = Vec::new();

    for sensor_config in &config.sensors {
        match build_driver(sensor_config, config.sea_level_pressure_hpa) {
            Ok(driver) => {
                tracing::info!(
                    "initialized {} ({} channels)",
                    driver.name(),
                    driver.channels().len()
                );
                sensors.push(Sensor::new(driver, sensor_config.label.clone()));
            }
            Err(e) => {
                tracing::error!("failed to initialize {:?}: {e:#}", sensor_config.kind);
            }
        }
    }

    sensors
}

fn build_driver(config: &SensorConfig, sea_level_hpa: f64) -> Result<Box<dyn SensorDriver>> {
    let driver: Box<dyn SensorDriver> = match config.kind {
        SensorKind::Dht11 | SensorKind::Dht22 => {
            let pin = config.pin.context("GPIO pin required")?;
            let kind = if config.kind == SensorKind::Dht11 {
                DhtKind::Dht11
            } else {
                DhtKind::Dht22
            };
            Box::new(Dht::new(kind, pin)?)
        }
        SensorKind::Shtc3 => {
            let bus = I2cBus::open(&config.bus)?;
            Box::new(Shtc3::new(bus)?)
        }
        SensorKind::Bme280 => {
            let bus = I2cBus::open(&config.bus)?;
            let address = config.address.unwrap_or(bme280::BME280_ADDRESS);
            let mut driver = Bme280::new(bus, address)?;
            driver.set_sea_level_pressure(sea_level_hpa);
            Box::new(driver)
        }
    };

    Ok(driver)
}

#[cfg(test)]
pub(crate) mod testing {
    use hygrolog_core::Quantity;
    use hygrolog_hal::{HalError, SensorDriver};
    use std::time::Duration;

    /// Scripted driver for exercising the polling path without hardware.
    pub struct FakeDriver {
        pub values: Vec<f64>,
        pub fail: bool,
    }

    impl SensorDriver for FakeDriver {
        fn name(&self) -> &str {
            "FAKE"
        }

        fn min_interval(&self) -> Duration {
            Duration::ZERO
        }

        fn channels(&self) -> &'static [Quantity] {
            &[Quantity::Temperature, Quantity::RelativeHumidity]
        }

        fn sample(&mut self) -> Result<Vec<f64>, HalError> {
            if self.fail {
                return Err(HalError::Timeout);
            }
            Ok(self.values.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeDriver;
    use super::*;
    use hygrolog_core::Quantity;

    #[tokio::test]
    async fn burst_cycle_fills_buffers_then_sets_current_value() {
        let driver = FakeDriver {
            values: vec![21.5, 48.0],
            fail: false,
        };
        let mut sensor = Sensor::new(Box::new(driver), Some("office".to_string()));

        assert_eq!(sensor.name(), "office");
        sensor.run_burst(3, Duration::ZERO).await;

        for m in sensor.measurements() {
            assert_eq!(m.burst_len(), 3);
            assert!(m.has_value());
        }
        let temp = &sensor.measurements()[0];
        assert_eq!(temp.quantity(), Quantity::Temperature);
        assert_eq!(temp.value(None).unwrap().0, 21.5);
        assert_eq!(temp.average_burst(None).unwrap(), 21.5);

        sensor.reset_bursts();
        for m in sensor.measurements() {
            assert_eq!(m.burst_len(), 0);
            // Current values survive the reset.
            assert!(m.has_value());
        }
    }

    #[tokio::test]
    async fn failed_reads_leave_measurements_untouched() {
        let driver = FakeDriver {
            values: vec![],
            fail: true,
        };
        let mut sensor = Sensor::new(Box::new(driver), None);

        sensor.run_burst(2, Duration::ZERO).await;

        assert_eq!(sensor.name(), "FAKE");
        for m in sensor.measurements() {
            assert_eq!(m.burst_len(), 0);
            assert!(!m.has_value());
        }
    }
}
