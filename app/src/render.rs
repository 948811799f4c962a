//! Console renderer
//!
//! Colorized human-readable output for poll cycles. The palette is a
//! lookup table keyed by quantity; the measurement core stays free of
//! display concerns.

use crate::config::DisplayConfig;
use crate::sensors::Sensor;
use hygrolog_core::{Quantity, Result as UnitResult};
use std::fmt::Write;

const RESET: &str = "\x1b[0m";

/// ANSI palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colour {
    Red,
    Green,
    Yellow,
    Blue,
    Cyan,
    Orange,
    Grey,
}

impl Colour {
    fn code(&self) -> &'static str {
        match self {
            Colour::Red => "\x1b[91m",
            Colour::Green => "\x1b[92m",
            Colour::Yellow => "\x1b[93m",
            Colour::Blue => "\x1b[94m",
            Colour::Cyan => "\x1b[96m",
            Colour::Orange => "\x1b[38;5;208m",
            Colour::Grey => "\x1b[38;5;245m",
        }
    }

    pub fn paint(&self, text: &str) -> String {
        format!("{}{}{}", self.code(), text, RESET)
    }
}

/// Display colour per quantity.
pub fn colour_for(quantity: Quantity) -> Colour {
    match quantity {
        Quantity::Temperature => Colour::Orange,
        Quantity::RelativeHumidity => Colour::Blue,
        Quantity::Pressure => Colour::Green,
        Quantity::Distance | Quantity::Altitude => Colour::Cyan,
        Quantity::Time => Colour::Yellow,
    }
}

/// Render one sensor's current state: a header, one line per channel in
/// its display unit, and the burst average where samples exist.
pub fn render_sensor(sensor: &Sensor, display: &DisplayConfig) -> UnitResult<String> {
    let mut out = String::new();

    let header = format!("── {} ", sensor.name());
    let _ = writeln!(out, "{}{}", Colour::Grey.paint(&header), "─".repeat(50usize.saturating_sub(header.chars().count())));

    for measurement in sensor.measurements() {
        let unit = display.unit_for(measurement.quantity());
        let line = measurement.describe(Some(unit))?;
        let colour = colour_for(measurement.quantity());
        let _ = writeln!(out, "{}", colour.paint(&line));

        if measurement.burst_len() > 0 {
            let avg = measurement.average_burst(Some(unit))?;
            let _ = writeln!(
                out,
                "{}",
                Colour::Grey.paint(&format!(
                    "    burst avg: {avg:.2} {} over {} samples",
                    unit.symbol(),
                    measurement.burst_len()
                ))
            );
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DisplayConfig;
    use crate::sensors::testing::FakeDriver;
    use crate::sensors::Sensor;
    use hygrolog_core::Unit;
    use std::time::Duration;

    #[tokio::test]
    async fn renders_values_in_display_units() {
        let driver = FakeDriver {
            values: vec![25.0, 50.0],
            fail: false,
        };
        let mut sensor = Sensor::new(Box::new(driver), None);
        sensor.run_burst(2, Duration::ZERO).await;

        let display = DisplayConfig {
            temperature: Unit::Fahrenheit,
            ..DisplayConfig::default()
        };

        let out = render_sensor(&sensor, &display).unwrap();
        assert!(out.contains("FAKE"));
        assert!(out.contains("77.00"), "expected Fahrenheit value in:\n{out}");
        assert!(out.contains("[°F"));
        assert!(out.contains("over 2 samples"));
        // ANSI colouring is applied.
        assert!(out.contains("\x1b[38;5;208m"));
    }

    #[test]
    fn palette_covers_every_quantity() {
        for quantity in Quantity::ALL {
            // Just ensure the lookup is total; the mapping itself is taste.
            let _ = colour_for(quantity).code();
        }
    }
}
