//! DHT11/DHT22 single-wire temperature and humidity sensors
//!
//! Both sensors speak the same one-wire protocol: the host holds the
//! data line low to request a reading, the sensor answers with a 40-bit
//! frame (humidity word, temperature word, checksum byte) encoded in
//! pulse widths. Only the payload interpretation differs between the
//! two parts.

use crate::gpio::{Direction, Level, SysfsGpio};
use crate::{HalError, SensorDriver};
use hygrolog_core::Quantity;
use std::time::Duration;

const CHANNELS: &[Quantity] = &[Quantity::Temperature, Quantity::RelativeHumidity];

/// Start signal: host pulls the line low this long.
const START_LOW: Duration = Duration::from_millis(18);
/// Line release before switching to input.
const START_HIGH: Duration = Duration::from_micros(30);
/// A high pulse longer than this is a 1-bit (nominal: 26-28 µs for 0,
/// 70 µs for 1).
const BIT_THRESHOLD: Duration = Duration::from_micros(50);
/// Per-edge timeout while clocking the frame in.
const EDGE_TIMEOUT: Duration = Duration::from_millis(2);

/// Which part is on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhtKind {
    Dht11,
    Dht22,
}

impl DhtKind {
    fn name(&self) -> &'static str {
        match self {
            DhtKind::Dht11 => "DHT11",
            DhtKind::Dht22 => "DHT22",
        }
    }

    /// Datasheet minimum between reads. The DHT22 needs the longer gap.
    fn min_interval(&self) -> Duration {
        match self {
            DhtKind::Dht11 => Duration::from_secs(1),
            DhtKind::Dht22 => Duration::from_secs(2),
        }
    }
}

/// DHT11/DHT22 driver on a sysfs GPIO pin.
pub struct Dht {
    kind: DhtKind,
    pin: SysfsGpio,
}

impl Dht {
    pub fn new(kind: DhtKind, pin: u32) -> Result<Self, HalError> {
        let pin = SysfsGpio::export(pin)?;
        Ok(Self { kind, pin })
    }

    /// Clock one 40-bit frame off the wire.
    fn read_frame(&self) -> Result<[u8; 5], HalError> {
        // Host start signal, then hand the line to the sensor.
        self.pin.set_direction(Direction::Output)?;
        self.pin.write(Level::Low)?;
        std::thread::sleep(START_LOW);
        self.pin.write(Level::High)?;
        std::thread::sleep(START_HIGH);
        self.pin.set_direction(Direction::Input)?;

        // Sensor response: ~80 µs low, ~80 µs high.
        self.pin.wait_while(Level::High, EDGE_TIMEOUT)?;
        self.pin.wait_while(Level::Low, EDGE_TIMEOUT)?;
        self.pin.wait_while(Level::High, EDGE_TIMEOUT)?;

        let mut data = [0u8; 5];
        for bit in 0..40 {
            // ~50 µs low gap, then the width of the high pulse carries
            // the bit value.
            self.pin.wait_while(Level::Low, EDGE_TIMEOUT)?;
            let high = self.pin.wait_while(Level::High, EDGE_TIMEOUT)?;
            if high > BIT_THRESHOLD {
                data[bit / 8] |= 0x80 >> (bit % 8);
            }
        }

        Ok(data)
    }
}

impl SensorDriver for Dht {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn min_interval(&self) -> Duration {
        self.kind.min_interval()
    }

    fn channels(&self) -> &'static [Quantity] {
        CHANNELS
    }

    fn sample(&mut self) -> Result<Vec<f64>, HalError> {
        let frame = self.read_frame()?;
        let (temperature, humidity) = decode_frame(self.kind, frame)?;
        Ok(vec![temperature, humidity])
    }
}

/// Decode a checksummed 40-bit frame into (temperature °C, humidity %).
fn decode_frame(kind: DhtKind, data: [u8; 5]) -> Result<(f64, f64), HalError> {
    let expected = data[0]
        .wrapping_add(data[1])
        .wrapping_add(data[2])
        .wrapping_add(data[3]);
    if expected != data[4] {
        return Err(HalError::Checksum {
            expected,
            actual: data[4],
        });
    }

    let (temperature, humidity) = match kind {
        DhtKind::Dht11 => {
            // Integral byte plus tenths byte per word.
            let humidity = data[0] as f64 + data[1] as f64 * 0.1;
            let temperature = data[2] as f64 + data[3] as f64 * 0.1;
            (temperature, humidity)
        }
        DhtKind::Dht22 => {
            // 16-bit tenths; temperature carries a sign bit.
            let humidity = u16::from_be_bytes([data[0], data[1]]) as f64 / 10.0;
            let raw_t = u16::from_be_bytes([data[2] & 0x7F, data[3]]) as f64 / 10.0;
            let temperature = if data[2] & 0x80 != 0 { -raw_t } else { raw_t };
            (temperature, humidity)
        }
    };

    // A frame that passes its checksum can still be garbage after a
    // marginal pulse; reject the physically impossible ones.
    if !(0.0..=100.0).contains(&humidity) {
        return Err(HalError::InvalidData(format!(
            "humidity reading out of range: {humidity}%"
        )));
    }

    Ok((temperature, humidity))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(b0: u8, b1: u8, b2: u8, b3: u8) -> [u8; 5] {
        let sum = b0.wrapping_add(b1).wrapping_add(b2).wrapping_add(b3);
        [b0, b1, b2, b3, sum]
    }

    #[test]
    fn dht22_decodes_tenths() {
        // 65.2 %RH, 26.3 °C
        let (t, h) = decode_frame(DhtKind::Dht22, frame(0x02, 0x8C, 0x01, 0x07)).unwrap();
        assert!((h - 65.2).abs() < 1e-9);
        assert!((t - 26.3).abs() < 1e-9);
    }

    #[test]
    fn dht22_sign_bit_means_negative() {
        // 40.0 %RH, -10.1 °C
        let (t, h) = decode_frame(DhtKind::Dht22, frame(0x01, 0x90, 0x80, 0x65)).unwrap();
        assert!((h - 40.0).abs() < 1e-9);
        assert!((t + 10.1).abs() < 1e-9);
    }

    #[test]
    fn dht11_decodes_integral_bytes() {
        // 55 %RH, 24 °C
        let (t, h) = decode_frame(DhtKind::Dht11, frame(55, 0, 24, 0)).unwrap();
        assert_eq!(h, 55.0);
        assert_eq!(t, 24.0);
    }

    #[test]
    fn checksum_mismatch_is_rejected() {
        let err = decode_frame(DhtKind::Dht22, [0x02, 0x8C, 0x01, 0x07, 0x00]).unwrap_err();
        assert!(matches!(
            err,
            HalError::Checksum {
                expected: 0x96,
                actual: 0x00
            }
        ));
    }

    #[test]
    fn impossible_humidity_is_rejected() {
        // 101.0 %RH passes the checksum but not the plausibility check.
        let err = decode_frame(DhtKind::Dht22, frame(0x03, 0xF2, 0x01, 0x00)).unwrap_err();
        assert!(matches!(err, HalError::InvalidData(_)));
    }

    #[test]
    fn intervals_match_the_datasheets() {
        assert_eq!(DhtKind::Dht11.min_interval(), Duration::from_secs(1));
        assert_eq!(DhtKind::Dht22.min_interval(), Duration::from_secs(2));
    }
}
