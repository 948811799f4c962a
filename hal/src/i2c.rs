//! Linux i2c-dev bus access
//!
//! Thin wrapper around `/dev/i2c-*`: slave selection via ioctl, raw and
//! register-addressed reads/writes, plus a bus scan helper.

use crate::HalError;
use std::fs::{File, OpenOptions};

#[cfg(target_os = "linux")]
use std::io::{Read, Write};
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

// From linux/i2c-dev.h
#[cfg(target_os = "linux")]
const I2C_SLAVE: libc::c_ulong = 0x0703;

/// An open i2c-dev bus
pub struct I2cBus {
    path: String,
    file: File,
}

impl I2cBus {
    /// Open an I2C bus device, e.g. `/dev/i2c-1`.
    pub fn open(path: &str) -> Result<Self, HalError> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;

        Ok(Self {
            path: path.to_string(),
            file,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Select the slave device subsequent reads/writes talk to.
    #[cfg(target_os = "linux")]
    pub fn set_slave(&self, addr: u8) -> Result<(), HalError> {
        let ret = unsafe { libc::ioctl(self.file.as_raw_fd(), I2C_SLAVE, addr as libc::c_ulong) };
        if ret < 0 {
            return Err(HalError::Bus(format!(
                "failed to select I2C slave {addr:#04x} on {}",
                self.path
            )));
        }
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    pub fn set_slave(&self, _addr: u8) -> Result<(), HalError> {
        Err(HalError::Unsupported)
    }

    /// Read bytes from the selected slave.
    #[cfg(target_os = "linux")]
    pub fn read(&self, buf: &mut [u8]) -> Result<(), HalError> {
        (&self.file).read_exact(buf)?;
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    pub fn read(&self, _buf: &mut [u8]) -> Result<(), HalError> {
        Err(HalError::Unsupported)
    }

    /// Write bytes to the selected slave.
    #[cfg(target_os = "linux")]
    pub fn write(&self, buf: &[u8]) -> Result<(), HalError> {
        (&self.file).write_all(buf)?;
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    pub fn write(&self, _buf: &[u8]) -> Result<(), HalError> {
        Err(HalError::Unsupported)
    }

    /// Read one register
    pub fn read_register(&self, addr: u8, reg: u8) -> Result<u8, HalError> {
        let mut buf = [0u8; 1];
        self.read_registers(addr, reg, &mut buf)?;
        Ok(buf[0])
    }

    /// Write one register
    pub fn write_register(&self, addr: u8, reg: u8, value: u8) -> Result<(), HalError> {
        self.set_slave(addr)?;
        self.write(&[reg, value])
    }

    /// Read consecutive registers starting at `reg`
    pub fn read_registers(&self, addr: u8, reg: u8, buf: &mut [u8]) -> Result<(), HalError> {
        self.set_slave(addr)?;
        self.write(&[reg])?;
        self.read(buf)
    }

    /// Write a big-endian 16-bit command word (Sensirion-style devices).
    pub fn write_command(&self, addr: u8, command: u16) -> Result<(), HalError> {
        self.set_slave(addr)?;
        self.write(&command.to_be_bytes())
    }
}

/// Scan an I2C bus for responding devices.
pub fn scan_bus(path: &str) -> Result<Vec<u8>, HalError> {
    let bus = I2cBus::open(path)?;
    let mut found = Vec::new();

    // Usable 7-bit address range
    for addr in 0x03..=0x77 {
        if bus.set_slave(addr).is_ok() {
            let mut buf = [0u8; 1];
            if bus.read(&mut buf).is_ok() {
                found.push(addr);
                tracing::debug!("found I2C device at {addr:#04x} on {path}");
            }
        }
    }

    Ok(found)
}
