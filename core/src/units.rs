//! Quantity families, units and conversion
//!
//! Every quantity family has one fixed canonical unit; all conversion
//! factors are defined relative to it. Conversions are exact algebraic
//! transforms, so converting to a unit and back reproduces the original
//! value within floating-point tolerance.

use crate::{Result, UnitError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A set of mutually convertible units. Conversion across families is
/// always an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitFamily {
    Temperature,
    RelativeHumidity,
    Pressure,
    Distance,
    Time,
}

/// Physical quantity measured by a sensor channel.
///
/// Altitude is its own quantity (it gets its own column and colour) but
/// shares the distance unit family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Quantity {
    Temperature,
    RelativeHumidity,
    Pressure,
    Distance,
    Altitude,
    Time,
}

impl Quantity {
    pub const ALL: [Quantity; 6] = [
        Quantity::Temperature,
        Quantity::RelativeHumidity,
        Quantity::Pressure,
        Quantity::Distance,
        Quantity::Altitude,
        Quantity::Time,
    ];

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Quantity::Temperature => "Temperature",
            Quantity::RelativeHumidity => "Relative Humidity",
            Quantity::Pressure => "Pressure",
            Quantity::Distance => "Distance",
            Quantity::Altitude => "Altitude",
            Quantity::Time => "Time",
        }
    }

    /// Short symbol used in compact output
    pub fn symbol(&self) -> &'static str {
        match self {
            Quantity::Temperature => "T",
            Quantity::RelativeHumidity => "RH",
            Quantity::Pressure => "P",
            Quantity::Distance => "D",
            Quantity::Altitude => "Alt",
            Quantity::Time => "t",
        }
    }

    pub fn family(&self) -> UnitFamily {
        match self {
            Quantity::Temperature => UnitFamily::Temperature,
            Quantity::RelativeHumidity => UnitFamily::RelativeHumidity,
            Quantity::Pressure => UnitFamily::Pressure,
            Quantity::Distance | Quantity::Altitude => UnitFamily::Distance,
            Quantity::Time => UnitFamily::Time,
        }
    }

    /// The fixed reference unit of this quantity's family. Sensor drivers
    /// produce values in this unit and the burst buffer stores them in it.
    pub fn canonical(&self) -> Unit {
        self.family().canonical()
    }

    /// All units this quantity can be converted to.
    pub fn supported_units(&self) -> &'static [Unit] {
        self.family().units()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Quantity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "temperature" | "temp" => Ok(Quantity::Temperature),
            "relative-humidity" | "humidity" | "rh" => Ok(Quantity::RelativeHumidity),
            "pressure" => Ok(Quantity::Pressure),
            "distance" => Ok(Quantity::Distance),
            "altitude" => Ok(Quantity::Altitude),
            "time" => Ok(Quantity::Time),
            other => Err(format!("unknown quantity: {other}")),
        }
    }
}

impl UnitFamily {
    pub fn canonical(&self) -> Unit {
        match self {
            UnitFamily::Temperature => Unit::Celsius,
            UnitFamily::RelativeHumidity => Unit::Percent,
            UnitFamily::Pressure => Unit::Hectopascal,
            UnitFamily::Distance => Unit::Meter,
            UnitFamily::Time => Unit::Second,
        }
    }

    pub fn units(&self) -> &'static [Unit] {
        match self {
            UnitFamily::Temperature => &[Unit::Celsius, Unit::Fahrenheit, Unit::Kelvin],
            UnitFamily::RelativeHumidity => &[Unit::Percent],
            UnitFamily::Pressure => &[
                Unit::Hectopascal,
                Unit::Pascal,
                Unit::Kilopascal,
                Unit::MillimetersOfMercury,
                Unit::InchesOfMercury,
                Unit::Bar,
                Unit::Atmosphere,
                Unit::Psi,
            ],
            UnitFamily::Distance => &[
                Unit::Meter,
                Unit::Kilometer,
                Unit::Centimeter,
                Unit::Millimeter,
                Unit::Inch,
                Unit::Foot,
                Unit::Yard,
            ],
            UnitFamily::Time => &[
                Unit::Second,
                Unit::Microsecond,
                Unit::Millisecond,
                Unit::Minute,
                Unit::Hour,
                Unit::Day,
            ],
        }
    }
}

/// A unit of measure. Belongs to exactly one [`UnitFamily`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Unit {
    // Temperature
    Celsius,
    Fahrenheit,
    Kelvin,
    // Relative humidity
    Percent,
    // Pressure
    Pascal,
    Hectopascal,
    Kilopascal,
    MillimetersOfMercury,
    InchesOfMercury,
    Bar,
    Atmosphere,
    Psi,
    // Distance
    Meter,
    Kilometer,
    Centimeter,
    Millimeter,
    Inch,
    Foot,
    Yard,
    // Time
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
}

impl Unit {
    pub fn name(&self) -> &'static str {
        match self {
            Unit::Celsius => "Celsius",
            Unit::Fahrenheit => "Fahrenheit",
            Unit::Kelvin => "Kelvin",
            Unit::Percent => "Percent",
            Unit::Pascal => "Pascal",
            Unit::Hectopascal => "Hectopascal",
            Unit::Kilopascal => "Kilopascal",
            Unit::MillimetersOfMercury => "Millimeters of Mercury",
            Unit::InchesOfMercury => "Inches of Mercury",
            Unit::Bar => "Bar",
            Unit::Atmosphere => "Atmosphere",
            Unit::Psi => "Pounds per Square Inch",
            Unit::Meter => "Meter",
            Unit::Kilometer => "Kilometer",
            Unit::Centimeter => "Centimeter",
            Unit::Millimeter => "Millimeter",
            Unit::Inch => "Inch",
            Unit::Foot => "Foot",
            Unit::Yard => "Yard",
            Unit::Microsecond => "Microsecond",
            Unit::Millisecond => "Millisecond",
            Unit::Second => "Second",
            Unit::Minute => "Minute",
            Unit::Hour => "Hour",
            Unit::Day => "Day",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Celsius => "°C",
            Unit::Fahrenheit => "°F",
            Unit::Kelvin => "K",
            Unit::Percent => "%",
            Unit::Pascal => "Pa",
            Unit::Hectopascal => "hPa",
            Unit::Kilopascal => "kPa",
            Unit::MillimetersOfMercury => "mmHg",
            Unit::InchesOfMercury => "inHg",
            Unit::Bar => "bar",
            Unit::Atmosphere => "atm",
            Unit::Psi => "psi",
            Unit::Meter => "m",
            Unit::Kilometer => "km",
            Unit::Centimeter => "cm",
            Unit::Millimeter => "mm",
            Unit::Inch => "in",
            Unit::Foot => "ft",
            Unit::Yard => "yd",
            Unit::Microsecond => "µs",
            Unit::Millisecond => "ms",
            Unit::Second => "s",
            Unit::Minute => "min",
            Unit::Hour => "h",
            Unit::Day => "d",
        }
    }

    pub fn family(&self) -> UnitFamily {
        match self {
            Unit::Celsius | Unit::Fahrenheit | Unit::Kelvin => UnitFamily::Temperature,
            Unit::Percent => UnitFamily::RelativeHumidity,
            Unit::Pascal
            | Unit::Hectopascal
            | Unit::Kilopascal
            | Unit::MillimetersOfMercury
            | Unit::InchesOfMercury
            | Unit::Bar
            | Unit::Atmosphere
            | Unit::Psi => UnitFamily::Pressure,
            Unit::Meter
            | Unit::Kilometer
            | Unit::Centimeter
            | Unit::Millimeter
            | Unit::Inch
            | Unit::Foot
            | Unit::Yard => UnitFamily::Distance,
            Unit::Microsecond
            | Unit::Millisecond
            | Unit::Second
            | Unit::Minute
            | Unit::Hour
            | Unit::Day => UnitFamily::Time,
        }
    }

    /// Affine transform from the family's canonical unit to this unit:
    /// `value_in_unit = value_canonical * scale + offset`. Only the
    /// temperature family has non-zero offsets.
    fn scale_offset(&self) -> (f64, f64) {
        match self {
            // Temperature, canonical Celsius
            Unit::Celsius => (1.0, 0.0),
            Unit::Fahrenheit => (9.0 / 5.0, 32.0),
            Unit::Kelvin => (1.0, 273.15),
            // Relative humidity, canonical Percent
            Unit::Percent => (1.0, 0.0),
            // Pressure, canonical Hectopascal
            Unit::Hectopascal => (1.0, 0.0),
            Unit::Pascal => (100.0, 0.0),
            Unit::Kilopascal => (0.1, 0.0),
            Unit::MillimetersOfMercury => (1.0 / 1.33322, 0.0),
            Unit::InchesOfMercury => (1.0 / 33.8639, 0.0),
            Unit::Bar => (1.0 / 1000.0, 0.0),
            Unit::Atmosphere => (1.0 / 1013.25, 0.0),
            Unit::Psi => (1.0 / 68.9476, 0.0),
            // Distance, canonical Meter
            Unit::Meter => (1.0, 0.0),
            Unit::Kilometer => (1.0 / 1000.0, 0.0),
            Unit::Centimeter => (100.0, 0.0),
            Unit::Millimeter => (1000.0, 0.0),
            Unit::Inch => (39.3701, 0.0),
            Unit::Foot => (3.28084, 0.0),
            Unit::Yard => (1.09361, 0.0),
            // Time, canonical Second
            Unit::Second => (1.0, 0.0),
            Unit::Microsecond => (1_000_000.0, 0.0),
            Unit::Millisecond => (1000.0, 0.0),
            Unit::Minute => (1.0 / 60.0, 0.0),
            Unit::Hour => (1.0 / 3600.0, 0.0),
            Unit::Day => (1.0 / 86400.0, 0.0),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "celsius" | "c" | "°c" => Ok(Unit::Celsius),
            "fahrenheit" | "f" | "°f" => Ok(Unit::Fahrenheit),
            "kelvin" | "k" => Ok(Unit::Kelvin),
            "percent" | "%" => Ok(Unit::Percent),
            "pascal" | "pa" => Ok(Unit::Pascal),
            "hectopascal" | "hpa" => Ok(Unit::Hectopascal),
            "kilopascal" | "kpa" => Ok(Unit::Kilopascal),
            "millimeters-of-mercury" | "mmhg" => Ok(Unit::MillimetersOfMercury),
            "inches-of-mercury" | "inhg" => Ok(Unit::InchesOfMercury),
            "bar" => Ok(Unit::Bar),
            "atmosphere" | "atm" => Ok(Unit::Atmosphere),
            "psi" => Ok(Unit::Psi),
            "meter" | "m" => Ok(Unit::Meter),
            "kilometer" | "km" => Ok(Unit::Kilometer),
            "centimeter" | "cm" => Ok(Unit::Centimeter),
            "millimeter" | "mm" => Ok(Unit::Millimeter),
            "inch" | "in" => Ok(Unit::Inch),
            "foot" | "ft" => Ok(Unit::Foot),
            "yard" | "yd" => Ok(Unit::Yard),
            "microsecond" | "us" | "µs" => Ok(Unit::Microsecond),
            "millisecond" | "ms" => Ok(Unit::Millisecond),
            "second" | "s" => Ok(Unit::Second),
            "minute" | "min" => Ok(Unit::Minute),
            "hour" | "h" => Ok(Unit::Hour),
            "day" | "d" => Ok(Unit::Day),
            other => Err(format!("unknown unit: {other}")),
        }
    }
}

/// Convert a canonical-unit value of `quantity` to `target`.
///
/// `None` (or the canonical unit itself) is the identity and returns the
/// value paired with the canonical unit. A target outside the quantity's
/// family fails with [`UnitError::UnsupportedUnit`] naming the offending
/// unit and the supported set.
pub fn convert(value: f64, quantity: Quantity, target: Option<Unit>) -> Result<(f64, Unit)> {
    let target = match target {
        None => return Ok((value, quantity.canonical())),
        Some(unit) => unit,
    };

    if target.family() != quantity.family() {
        return Err(UnitError::UnsupportedUnit {
            quantity,
            unit: target,
            supported: quantity.supported_units(),
        });
    }

    let (scale, offset) = target.scale_offset();
    Ok((value * scale + offset, target))
}

/// Convert a value expressed in `source` back to the canonical unit of
/// `quantity`. Exact inverse of [`convert`].
pub fn to_canonical(value: f64, quantity: Quantity, source: Unit) -> Result<f64> {
    if source.family() != quantity.family() {
        return Err(UnitError::UnsupportedUnit {
            quantity,
            unit: source,
            supported: quantity.supported_units(),
        });
    }

    let (scale, offset) = source.scale_offset();
    Ok((value - offset) / scale)
}

pub(crate) fn unit_list(units: &[Unit]) -> String {
    units
        .iter()
        .map(|u| u.name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, rel_tol: f64) {
        let scale = a.abs().max(b.abs()).max(1.0);
        assert!(
            (a - b).abs() <= rel_tol * scale,
            "expected {a} ≈ {b} (tolerance {rel_tol})"
        );
    }

    #[test]
    fn identity_when_target_omitted() {
        let (v, u) = convert(25.0, Quantity::Temperature, None).unwrap();
        assert_eq!(v, 25.0);
        assert_eq!(u, Unit::Celsius);
    }

    #[test]
    fn identity_when_target_is_canonical() {
        let (v, u) = convert(1013.25, Quantity::Pressure, Some(Unit::Hectopascal)).unwrap();
        assert_eq!(v, 1013.25);
        assert_eq!(u, Unit::Hectopascal);
    }

    #[test]
    fn temperature_reference_points() {
        let (f, _) = convert(25.0, Quantity::Temperature, Some(Unit::Fahrenheit)).unwrap();
        assert_close(f, 77.0, 1e-9);
        let (k, _) = convert(25.0, Quantity::Temperature, Some(Unit::Kelvin)).unwrap();
        assert_close(k, 298.15, 1e-9);
        let (f0, _) = convert(-40.0, Quantity::Temperature, Some(Unit::Fahrenheit)).unwrap();
        assert_close(f0, -40.0, 1e-9);
    }

    #[test]
    fn pressure_reference_points() {
        let (pa, u) = convert(1013.25, Quantity::Pressure, Some(Unit::Pascal)).unwrap();
        assert_close(pa, 101_325.0, 1e-9);
        assert_eq!(u, Unit::Pascal);

        let (atm, _) = convert(1013.25, Quantity::Pressure, Some(Unit::Atmosphere)).unwrap();
        assert_close(atm, 1.0, 1e-2);

        let (mmhg, _) =
            convert(1013.25, Quantity::Pressure, Some(Unit::MillimetersOfMercury)).unwrap();
        assert_close(mmhg, 760.0, 1e-3);

        let (inhg, _) = convert(1013.25, Quantity::Pressure, Some(Unit::InchesOfMercury)).unwrap();
        assert_close(inhg, 29.92, 1e-3);

        let (bar, _) = convert(1013.25, Quantity::Pressure, Some(Unit::Bar)).unwrap();
        assert_close(bar, 1.01325, 1e-9);

        let (zero, _) = convert(0.0, Quantity::Pressure, Some(Unit::Pascal)).unwrap();
        assert_eq!(zero, 0.0);
    }

    #[test]
    fn round_trip_every_supported_unit() {
        let probes = [-40.0, -1.0, 0.0, 0.5, 25.0, 1013.25, 86_400.0];

        for quantity in Quantity::ALL {
            // Affine transforms lose a little more precision than pure scaling.
            let tol = match quantity.family() {
                UnitFamily::Temperature => 1e-6,
                _ => 1e-9,
            };

            for &unit in quantity.supported_units() {
                for &v in &probes {
                    let (converted, result_unit) = convert(v, quantity, Some(unit)).unwrap();
                    assert_eq!(result_unit, unit);
                    let back = to_canonical(converted, quantity, unit).unwrap();
                    assert_close(back, v, tol);
                }
            }
        }
    }

    #[test]
    fn humidity_supports_only_percent() {
        let err = convert(50.0, Quantity::RelativeHumidity, Some(Unit::Celsius)).unwrap_err();
        match err {
            UnitError::UnsupportedUnit {
                quantity,
                unit,
                supported,
            } => {
                assert_eq!(quantity, Quantity::RelativeHumidity);
                assert_eq!(unit, Unit::Celsius);
                assert_eq!(supported, &[Unit::Percent]);
            }
        }
    }

    #[test]
    fn cross_family_conversion_is_an_error() {
        let err = convert(21.5, Quantity::Temperature, Some(Unit::Meter)).unwrap_err();
        assert!(matches!(err, UnitError::UnsupportedUnit { .. }));
        assert!(err.to_string().contains("Meter"));
        assert!(err.to_string().contains("Celsius"));

        // The inverse direction must refuse as well.
        assert!(to_canonical(21.5, Quantity::Temperature, Unit::Meter).is_err());
    }

    #[test]
    fn altitude_uses_the_distance_family() {
        assert_eq!(Quantity::Altitude.canonical(), Unit::Meter);
        let (ft, _) = convert(100.0, Quantity::Altitude, Some(Unit::Foot)).unwrap();
        assert_close(ft, 328.084, 1e-9);
    }

    #[test]
    fn time_reference_points() {
        let (min, _) = convert(90.0, Quantity::Time, Some(Unit::Minute)).unwrap();
        assert_close(min, 1.5, 1e-9);
        let (us, _) = convert(0.25, Quantity::Time, Some(Unit::Microsecond)).unwrap();
        assert_close(us, 250_000.0, 1e-9);
        let (d, _) = convert(86_400.0, Quantity::Time, Some(Unit::Day)).unwrap();
        assert_close(d, 1.0, 1e-9);
    }

    #[test]
    fn unit_names_parse_back() {
        assert_eq!("fahrenheit".parse::<Unit>().unwrap(), Unit::Fahrenheit);
        assert_eq!("hPa".parse::<Unit>().unwrap(), Unit::Hectopascal);
        assert_eq!("mmHg".parse::<Unit>().unwrap(), Unit::MillimetersOfMercury);
        assert!("furlong".parse::<Unit>().is_err());

        assert_eq!("humidity".parse::<Quantity>().unwrap(), Quantity::RelativeHumidity);
        assert_eq!("altitude".parse::<Quantity>().unwrap(), Quantity::Altitude);
    }
}
