//! hygrolog measurement core
//!
//! Unit conversion and measurement aggregation, independent of any
//! sensor hardware.
//!
//! # Modules
//!
//! - [`units`] - quantity families, units and conversion between them
//! - [`measure`] - per-channel value holder with burst aggregation
//!
//! All values handed to this crate are expected in the canonical unit of
//! their quantity family (Celsius, Percent, Hectopascal, Meter, Second);
//! conversion to a display unit happens at read time only.

pub mod measure;
pub mod units;

pub use measure::Measurement;
pub use units::{convert, to_canonical, Quantity, Unit, UnitFamily};

/// Error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnitError {
    #[error(
        "conversion to {unit} is not supported for {quantity}; supported units are [{}]",
        units::unit_list(.supported)
    )]
    UnsupportedUnit {
        quantity: Quantity,
        unit: Unit,
        supported: &'static [Unit],
    },
}

pub type Result<T> = std::result::Result<T, UnitError>;
