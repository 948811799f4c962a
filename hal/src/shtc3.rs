//! Sensirion SHTC3 temperature/humidity sensor
//!
//! Command-based I2C device at a fixed address. The sensor sleeps
//! between readings; every sample is wake → measure → read → sleep.
//! Words on the wire carry a CRC-8 each (polynomial 0x31, init 0xFF).
//!
//! The measure command used here returns the temperature word first;
//! the driver reports channels in that same order.

use crate::i2c::I2cBus;
use crate::{HalError, SensorDriver};
use hygrolog_core::Quantity;
use std::time::Duration;

pub const SHTC3_ADDRESS: u8 = 0x70;

const CHANNELS: &[Quantity] = &[Quantity::Temperature, Quantity::RelativeHumidity];

const CMD_WAKEUP: u16 = 0x3517;
const CMD_SLEEP: u16 = 0xB098;
/// Normal mode, clock stretching disabled, temperature first.
const CMD_MEASURE: u16 = 0x7866;
const CMD_READ_ID: u16 = 0xEFC8;

/// Wake-up time per datasheet (240 µs, rounded up).
const WAKEUP_DELAY: Duration = Duration::from_micros(300);
/// Normal-mode measurement duration (max 12.1 ms).
const MEASURE_DELAY: Duration = Duration::from_millis(15);

/// SHTC3 driver
pub struct Shtc3 {
    bus: I2cBus,
}

impl Shtc3 {
    /// Open the sensor and verify its ID register.
    pub fn new(bus: I2cBus) -> Result<Self, HalError> {
        let sensor = Self { bus };

        sensor.bus.write_command(SHTC3_ADDRESS, CMD_WAKEUP)?;
        std::thread::sleep(WAKEUP_DELAY);

        sensor.bus.write_command(SHTC3_ADDRESS, CMD_READ_ID)?;
        let mut buf = [0u8; 3];
        sensor.bus.read(&mut buf)?;
        check_crc(&buf[0..2], buf[2])?;

        let id = u16::from_be_bytes([buf[0], buf[1]]);
        if id & 0x083F != 0x0807 {
            return Err(HalError::NotPresent(format!(
                "device at {SHTC3_ADDRESS:#04x} is not an SHTC3 (id {id:#06x})"
            )));
        }

        sensor.bus.write_command(SHTC3_ADDRESS, CMD_SLEEP)?;
        Ok(sensor)
    }
}

impl SensorDriver for Shtc3 {
    fn name(&self) -> &str {
        "SHTC3"
    }

    fn min_interval(&self) -> Duration {
        Duration::from_millis(100)
    }

    fn channels(&self) -> &'static [Quantity] {
        CHANNELS
    }

    fn sample(&mut self) -> Result<Vec<f64>, HalError> {
        self.bus.write_command(SHTC3_ADDRESS, CMD_WAKEUP)?;
        std::thread::sleep(WAKEUP_DELAY);

        self.bus.write_command(SHTC3_ADDRESS, CMD_MEASURE)?;
        std::thread::sleep(MEASURE_DELAY);

        let mut buf = [0u8; 6];
        let read = self.bus.read(&mut buf);

        // Put the sensor back to sleep even when the read failed.
        let _ = self.bus.write_command(SHTC3_ADDRESS, CMD_SLEEP);
        read?;

        check_crc(&buf[0..2], buf[2])?;
        check_crc(&buf[3..5], buf[5])?;

        let raw_t = u16::from_be_bytes([buf[0], buf[1]]);
        let raw_rh = u16::from_be_bytes([buf[3], buf[4]]);
        let (temperature, humidity) = convert_raw(raw_t, raw_rh);
        Ok(vec![temperature, humidity])
    }
}

/// Datasheet conversion from raw 16-bit readings.
fn convert_raw(raw_t: u16, raw_rh: u16) -> (f64, f64) {
    let temperature = -45.0 + 175.0 * raw_t as f64 / 65536.0;
    let humidity = 100.0 * raw_rh as f64 / 65536.0;
    (temperature, humidity)
}

/// Sensirion CRC-8: polynomial 0x31, init 0xFF, no reflection.
fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}

fn check_crc(data: &[u8], expected: u8) -> Result<(), HalError> {
    let actual = crc8(data);
    if actual != expected {
        return Err(HalError::Checksum { expected, actual });
    }
    Ok(())
}
