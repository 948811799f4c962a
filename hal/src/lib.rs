//! hygrolog hardware layer
//!
//! Bus access and sensor drivers for the climate logger.
//!
//! # Modules
//!
//! - [`gpio`] - sysfs GPIO with pulse-width sampling for single-wire sensors
//! - [`i2c`] - Linux i2c-dev bus access
//! - [`dht`] - DHT11/DHT22 single-wire temperature/humidity sensors
//! - [`shtc3`] - Sensirion SHTC3 temperature/humidity sensor
//! - [`bme280`] - Bosch BME280 temperature/humidity/pressure sensor
//!
//! Every driver implements [`SensorDriver`] and reports values in the
//! canonical unit of each channel's quantity (Celsius, Percent,
//! Hectopascal, Meter), ready to feed into `hygrolog_core::Measurement`.
//! All bus access is synchronous and blocking; pacing between reads is
//! the polling loop's job.

use hygrolog_core::Quantity;
use std::time::Duration;

#[cfg(feature = "gpio")]
pub mod gpio;

#[cfg(feature = "i2c")]
pub mod i2c;

#[cfg(feature = "gpio")]
pub mod dht;

#[cfg(feature = "i2c")]
pub mod bme280;
#[cfg(feature = "i2c")]
pub mod shtc3;

// Re-exports for convenience
#[cfg(feature = "i2c")]
pub use bme280::Bme280;
#[cfg(feature = "gpio")]
pub use dht::{Dht, DhtKind};
#[cfg(feature = "gpio")]
pub use gpio::{Level, SysfsGpio};
#[cfg(feature = "i2c")]
pub use i2c::I2cBus;
#[cfg(feature = "i2c")]
pub use shtc3::Shtc3;

/// HAL error types
#[derive(Debug, thiserror::Error)]
pub enum HalError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bus error: {0}")]
    Bus(String),

    #[error("device not present: {0}")]
    NotPresent(String),

    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    Checksum { expected: u8, actual: u8 },

    #[error("timed out waiting for sensor response")]
    Timeout,

    #[error("invalid sensor data: {0}")]
    InvalidData(String),

    #[error("not supported on this platform")]
    Unsupported,
}

/// A hardware sensor with one or more measurement channels.
///
/// `sample` performs one blocking read of the device and returns one
/// canonical-unit value per entry of `channels`, in the same order.
/// Transient failures (bus glitches, bad checksums) surface as errors;
/// retrying is the caller's policy.
pub trait SensorDriver: Send {
    /// Driver name, used for logging and CSV file naming.
    fn name(&self) -> &str;

    /// Minimum interval the hardware needs between reads.
    fn min_interval(&self) -> Duration;

    /// The quantities this sensor reports, in sample order.
    fn channels(&self) -> &'static [Quantity];

    /// Read the device once. The result is parallel to `channels`.
    fn sample(&mut self) -> Result<Vec<f64>, HalError>;
}
