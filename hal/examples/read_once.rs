//! Read every detectable I2C climate sensor once and print the values.
//!
//! Run on the target board with: `cargo run --example read_once`

use hygrolog_core::convert;
use hygrolog_hal::{bme280, i2c::I2cBus, Bme280, SensorDriver, Shtc3};

fn main() {
    let bus_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/i2c-1".to_string());

    let mut drivers: Vec<Box<dyn SensorDriver>> = Vec::new();

    match I2cBus::open(&bus_path).and_then(Shtc3::new) {
        Ok(driver) => drivers.push(Box::new(driver)),
        Err(e) => eprintln!("SHTC3 not available: {e}"),
    }

    match I2cBus::open(&bus_path).and_then(|bus| Bme280::new(bus, bme280::BME280_ADDRESS)) {
        Ok(driver) => drivers.push(Box::new(driver)),
        Err(e) => eprintln!("BME280 not available: {e}"),
    }

    if drivers.is_empty() {
        eprintln!("no sensors found on {bus_path}");
        std::process::exit(1);
    }

    for driver in &mut drivers {
        match driver.sample() {
            Ok(values) => {
                println!("{}:", driver.name());
                for (quantity, value) in driver.channels().iter().zip(values) {
                    let (v, unit) = convert(value, *quantity, None).expect("canonical identity");
                    println!("  {:<18} {v:.2} {}", quantity.name(), unit.symbol());
                }
            }
            Err(e) => eprintln!("{} read failed: {e}", driver.name()),
        }
    }
}
