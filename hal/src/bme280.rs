//! Bosch BME280 temperature/humidity/pressure sensor
//!
//! Register-based I2C device. Raw ADC readings are meaningless without
//! the per-part calibration words burned into NVM, so the driver reads
//! those once at start-up and applies Bosch's double-precision
//! compensation formulas on every sample.
//!
//! Besides the three measured quantities, the driver derives altitude
//! from the pressure reading against a configurable sea-level reference.

use crate::i2c::I2cBus;
use crate::{HalError, SensorDriver};
use hygrolog_core::Quantity;
use std::time::Duration;

pub const BME280_ADDRESS: u8 = 0x76;

const CHANNELS: &[Quantity] = &[
    Quantity::Temperature,
    Quantity::RelativeHumidity,
    Quantity::Pressure,
    Quantity::Altitude,
];

const REG_CHIP_ID: u8 = 0xD0;
const REG_CALIB_TP: u8 = 0x88;
const REG_CALIB_H: u8 = 0xE1;
const REG_CTRL_HUM: u8 = 0xF2;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_CONFIG: u8 = 0xF5;
const REG_DATA: u8 = 0xF7;

const CHIP_ID: u8 = 0x60;
/// Humidity oversampling x1
const CTRL_HUM_X1: u8 = 0x01;
/// Temperature/pressure oversampling x1, normal mode
const CTRL_MEAS_X1_NORMAL: u8 = 0x27;
/// 0.5 ms standby, IIR filter off
const CONFIG_DEFAULT: u8 = 0x00;

/// Standard sea-level pressure in hPa
pub const STANDARD_SEA_LEVEL_HPA: f64 = 1013.25;

/// Factory calibration words.
#[derive(Debug, Clone, Copy)]
struct Calibration {
    t1: u16,
    t2: i16,
    t3: i16,
    p1: u16,
    p2: i16,
    p3: i16,
    p4: i16,
    p5: i16,
    p6: i16,
    p7: i16,
    p8: i16,
    p9: i16,
    h1: u8,
    h2: i16,
    h3: u8,
    h4: i16,
    h5: i16,
    h6: i8,
}

impl Calibration {
    /// Assemble from the two calibration register blocks (0x88..0xA1 and
    /// 0xE1..0xE7). The humidity words H4/H5 are 12-bit values sharing a
    /// nibble register.
    fn parse(tp: &[u8; 26], h: &[u8; 7]) -> Self {
        let le16 = |lo: u8, hi: u8| i16::from_le_bytes([lo, hi]);

        Self {
            t1: u16::from_le_bytes([tp[0], tp[1]]),
            t2: le16(tp[2], tp[3]),
            t3: le16(tp[4], tp[5]),
            p1: u16::from_le_bytes([tp[6], tp[7]]),
            p2: le16(tp[8], tp[9]),
            p3: le16(tp[10], tp[11]),
            p4: le16(tp[12], tp[13]),
            p5: le16(tp[14], tp[15]),
            p6: le16(tp[16], tp[17]),
            p7: le16(tp[18], tp[19]),
            p8: le16(tp[20], tp[21]),
            p9: le16(tp[22], tp[23]),
            h1: tp[25],
            h2: le16(h[0], h[1]),
            h3: h[2],
            h4: ((h[3] as i8 as i16) << 4) | (h[4] & 0x0F) as i16,
            h5: ((h[5] as i8 as i16) << 4) | (h[4] >> 4) as i16,
            h6: h[6] as i8,
        }
    }

    /// Temperature compensation; returns (°C, t_fine). The intermediate
    /// `t_fine` feeds the pressure and humidity formulas.
    fn compensate_temperature(&self, adc_t: f64) -> (f64, f64) {
        let var1 = (adc_t / 16384.0 - self.t1 as f64 / 1024.0) * self.t2 as f64;
        let var2 = (adc_t / 131072.0 - self.t1 as f64 / 8192.0).powi(2) * self.t3 as f64;
        let t_fine = var1 + var2;
        (t_fine / 5120.0, t_fine)
    }

    /// Pressure compensation in Pascal.
    fn compensate_pressure(&self, adc_p: f64, t_fine: f64) -> Result<f64, HalError> {
        let mut var1 = t_fine / 2.0 - 64000.0;
        let mut var2 = var1 * var1 * self.p6 as f64 / 32768.0;
        var2 += var1 * self.p5 as f64 * 2.0;
        var2 = var2 / 4.0 + self.p4 as f64 * 65536.0;
        var1 = (self.p3 as f64 * var1 * var1 / 524288.0 + self.p2 as f64 * var1) / 524288.0;
        var1 = (1.0 + var1 / 32768.0) * self.p1 as f64;

        if var1 == 0.0 {
            return Err(HalError::InvalidData(
                "pressure compensation would divide by zero".to_string(),
            ));
        }

        let mut p = 1048576.0 - adc_p;
        p = (p - var2 / 4096.0) * 6250.0 / var1;
        var1 = self.p9 as f64 * p * p / 2147483648.0;
        var2 = p * self.p8 as f64 / 32768.0;
        Ok(p + (var1 + var2 + self.p7 as f64) / 16.0)
    }

    /// Humidity compensation in %RH, clamped to the physical range.
    fn compensate_humidity(&self, adc_h: f64, t_fine: f64) -> f64 {
        let var_h = t_fine - 76800.0;
        let var_h = (adc_h - (self.h4 as f64 * 64.0 + self.h5 as f64 / 16384.0 * var_h))
            * (self.h2 as f64 / 65536.0
                * (1.0
                    + self.h6 as f64 / 67108864.0
                        * var_h
                        * (1.0 + self.h3 as f64 / 67108864.0 * var_h)));
        let var_h = var_h * (1.0 - self.h1 as f64 * var_h / 524288.0);
        var_h.clamp(0.0, 100.0)
    }
}

/// BME280 driver
pub struct Bme280 {
    bus: I2cBus,
    address: u8,
    calibration: Calibration,
    sea_level_hpa: f64,
}

impl Bme280 {
    /// Probe the chip, read its calibration and put it in normal mode.
    pub fn new(bus: I2cBus, address: u8) -> Result<Self, HalError> {
        let id = bus.read_register(address, REG_CHIP_ID)?;
        if id != CHIP_ID {
            return Err(HalError::NotPresent(format!(
                "device at {address:#04x} is not a BME280 (chip id {id:#04x})"
            )));
        }

        let mut tp = [0u8; 26];
        bus.read_registers(address, REG_CALIB_TP, &mut tp)?;
        let mut h = [0u8; 7];
        bus.read_registers(address, REG_CALIB_H, &mut h)?;
        let calibration = Calibration::parse(&tp, &h);

        // ctrl_hum must be written before ctrl_meas to take effect.
        bus.write_register(address, REG_CTRL_HUM, CTRL_HUM_X1)?;
        bus.write_register(address, REG_CTRL_MEAS, CTRL_MEAS_X1_NORMAL)?;
        bus.write_register(address, REG_CONFIG, CONFIG_DEFAULT)?;

        Ok(Self {
            bus,
            address,
            calibration,
            sea_level_hpa: STANDARD_SEA_LEVEL_HPA,
        })
    }

    /// Set the sea-level reference pressure (hPa) used for the altitude
    /// channel.
    pub fn set_sea_level_pressure(&mut self, hpa: f64) {
        self.sea_level_hpa = hpa;
    }
}

impl SensorDriver for Bme280 {
    fn name(&self) -> &str {
        "BME280"
    }

    fn min_interval(&self) -> Duration {
        Duration::from_millis(100)
    }

    fn channels(&self) -> &'static [Quantity] {
        CHANNELS
    }

    fn sample(&mut self) -> Result<Vec<f64>, HalError> {
        let mut buf = [0u8; 8];
        self.bus.read_registers(self.address, REG_DATA, &mut buf)?;

        let adc_p = ((buf[0] as u32) << 12 | (buf[1] as u32) << 4 | (buf[2] as u32) >> 4) as f64;
        let adc_t = ((buf[3] as u32) << 12 | (buf[4] as u32) << 4 | (buf[5] as u32) >> 4) as f64;
        let adc_h = ((buf[6] as u32) << 8 | buf[7] as u32) as f64;

        let (temperature, t_fine) = self.calibration.compensate_temperature(adc_t);
        let pressure_hpa = self.calibration.compensate_pressure(adc_p, t_fine)? / 100.0;
        let humidity = self.calibration.compensate_humidity(adc_h, t_fine);
        let altitude = altitude_from_pressure(pressure_hpa, self.sea_level_hpa);

        Ok(vec![temperature, humidity, pressure_hpa, altitude])
    }
}

/// International barometric formula: altitude in meters for a pressure
/// reading against the sea-level reference (both hPa).
fn altitude_from_pressure(pressure_hpa: f64, sea_level_hpa: f64) -> f64 {
    44330.0 * (1.0 - (pressure_hpa / sea_level_hpa).powf(1.0 / 5.255))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Calibration values from the Bosch datasheet worked example.
    fn datasheet_calibration() -> Calibration {
        Calibration {
            t1: 27504,
            t2: 26435,
            t3: -1000,
            p1: 36477,
            p2: -10685,
            p3: 3024,
            p4: 2855,
            p5: 140,
            p6: -7,
            p7: 15500,
            p8: -14600,
            p9: 6000,
            h1: 75,
            h2: 362,
            h3: 0,
            h4: 315,
            h5: 50,
            h6: 30,
        }
    }

    #[test]
    fn temperature_matches_datasheet_example() {
        let cal = datasheet_calibration();
        let (t, _) = cal.compensate_temperature(519888.0);
        assert!((t - 25.08).abs() < 0.01, "got {t}");
    }

    #[test]
    fn pressure_matches_datasheet_example() {
        let cal = datasheet_calibration();
        let (_, t_fine) = cal.compensate_temperature(519888.0);
        let p = cal.compensate_pressure(415148.0, t_fine).unwrap();
        assert!((p - 100653.27).abs() < 0.5, "got {p}");
    }

    #[test]
    fn humidity_stays_in_physical_range() {
        let cal = datasheet_calibration();
        let (_, t_fine) = cal.compensate_temperature(519888.0);
        for adc_h in [0.0, 20000.0, 40000.0, 65535.0] {
            let h = cal.compensate_humidity(adc_h, t_fine);
            assert!((0.0..=100.0).contains(&h), "adc {adc_h} gave {h}");
        }
    }

    #[test]
    fn calibration_parsing_handles_signs_and_nibbles() {
        let mut tp = [0u8; 26];
        tp[0..2].copy_from_slice(&27504u16.to_le_bytes());
        tp[2..4].copy_from_slice(&26435i16.to_le_bytes());
        tp[4..6].copy_from_slice(&(-1000i16).to_le_bytes());
        tp[6..8].copy_from_slice(&36477u16.to_le_bytes());
        tp[8..10].copy_from_slice(&(-10685i16).to_le_bytes());
        tp[25] = 75;

        // h4 = 0x13A (314), h5 = 0x2C (44), packed into a shared nibble.
        let h = [
            362u16.to_le_bytes()[0],
            362u16.to_le_bytes()[1],
            0,
            0x13,
            0xCA,
            0x02,
            30,
        ];

        let cal = Calibration::parse(&tp, &h);
        assert_eq!(cal.t1, 27504);
        assert_eq!(cal.t2, 26435);
        assert_eq!(cal.t3, -1000);
        assert_eq!(cal.p1, 36477);
        assert_eq!(cal.p2, -10685);
        assert_eq!(cal.h1, 75);
        assert_eq!(cal.h2, 362);
        assert_eq!(cal.h4, (0x13 << 4) | 0x0A);
        assert_eq!(cal.h5, (0x02 << 4) | 0x0C);
        assert_eq!(cal.h6, 30);
    }

    #[test]
    fn altitude_is_zero_at_the_reference_pressure() {
        assert_eq!(altitude_from_pressure(1013.25, 1013.25), 0.0);

        // Lower pressure means higher altitude; ~900 hPa is roughly 1 km up.
        let alt = altitude_from_pressure(898.75, 1013.25);
        assert!((alt - 1000.0).abs() < 25.0, "got {alt}");

        let below = altitude_from_pressure(1030.0, 1013.25);
        assert!(below < 0.0);
    }
}
