//! Sysfs GPIO access
//!
//! Just enough GPIO to bit-bang single-wire sensors: export a pin, flip
//! its direction at runtime, and sample pulse widths with a busy-wait.

use crate::HalError;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};

/// GPIO direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// GPIO pin state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(val: bool) -> Self {
        if val {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Sysfs GPIO pin
pub struct SysfsGpio {
    pin: u32,
    exported: bool,
}

impl SysfsGpio {
    const GPIO_PATH: &'static str = "/sys/class/gpio";

    /// Export a GPIO pin. Exporting an already-exported pin is fine.
    pub fn export(pin: u32) -> Result<Self, HalError> {
        let pin_path = format!("{}/gpio{}", Self::GPIO_PATH, pin);
        if Path::new(&pin_path).exists() {
            return Ok(Self {
                pin,
                exported: true,
            });
        }

        let mut file = OpenOptions::new()
            .write(true)
            .open(format!("{}/export", Self::GPIO_PATH))?;
        file.write_all(pin.to_string().as_bytes())?;

        // Sysfs needs a moment to create the pin directory.
        std::thread::sleep(Duration::from_millis(50));

        Ok(Self {
            pin,
            exported: true,
        })
    }

    /// Unexport the pin
    pub fn unexport(&mut self) -> Result<(), HalError> {
        if !self.exported {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .write(true)
            .open(format!("{}/unexport", Self::GPIO_PATH))?;
        file.write_all(self.pin.to_string().as_bytes())?;
        self.exported = false;
        Ok(())
    }

    fn attribute_path(&self, attr: &str) -> String {
        format!("{}/gpio{}/{}", Self::GPIO_PATH, self.pin, attr)
    }

    /// Set direction
    pub fn set_direction(&self, direction: Direction) -> Result<(), HalError> {
        let mut file = OpenOptions::new()
            .write(true)
            .open(self.attribute_path("direction"))?;

        let dir_str = match direction {
            Direction::Input => "in",
            Direction::Output => "out",
        };
        file.write_all(dir_str.as_bytes())?;
        Ok(())
    }

    /// Read the pin level
    pub fn read(&self) -> Result<Level, HalError> {
        let mut file = File::open(self.attribute_path("value"))?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)?;

        match buf.trim() {
            "0" => Ok(Level::Low),
            "1" => Ok(Level::High),
            other => Err(HalError::Bus(format!("invalid GPIO value: {other}"))),
        }
    }

    /// Drive the pin
    pub fn write(&self, level: Level) -> Result<(), HalError> {
        let mut file = OpenOptions::new()
            .write(true)
            .open(self.attribute_path("value"))?;

        let value = match level {
            Level::Low => "0",
            Level::High => "1",
        };
        file.write_all(value.as_bytes())?;
        Ok(())
    }

    /// Busy-wait while the pin stays at `level`, returning how long it
    /// did. Errors with [`HalError::Timeout`] if the level never changes
    /// within `timeout`.
    ///
    /// Sysfs reads cost on the order of microseconds, which is coarse for
    /// DHT pulse timing; the decoder thresholds are chosen with that
    /// jitter in mind.
    pub fn wait_while(&self, level: Level, timeout: Duration) -> Result<Duration, HalError> {
        let start = Instant::now();
        while self.read()? == level {
            if start.elapsed() > timeout {
                return Err(HalError::Timeout);
            }
        }
        Ok(start.elapsed())
    }
}

impl Drop for SysfsGpio {
    fn drop(&mut self) {
        let _ = self.unexport();
    }
}
