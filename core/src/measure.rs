//! Per-channel measurement state
//!
//! A [`Measurement`] holds the live value and the burst buffer for one
//! physical channel of a sensor. All stored scalars are in the canonical
//! unit of the channel's quantity; display conversion happens on read so
//! rounding error never compounds in the buffer.

use crate::units::{convert, Quantity, Unit};
use crate::{Result, UnitError};

/// Value holder for one sensor channel.
///
/// The unit family is fixed at construction. The current value and the
/// burst buffer are independent pieces of state: `set_value(_, false)`
/// overwrites the former, `set_value(_, true)` appends to the latter, and
/// [`reset_burst`](Measurement::reset_burst) clears only the buffer.
#[derive(Debug, Clone)]
pub struct Measurement {
    quantity: Quantity,
    value: Option<f64>,
    burst: Vec<f64>,
}

impl Measurement {
    pub fn new(quantity: Quantity) -> Self {
        Self {
            quantity,
            value: None,
            burst: Vec::new(),
        }
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Record a reading, already in canonical units.
    ///
    /// Out-of-range sensor noise is accepted as-is; plausibility checks
    /// belong to the driver layer.
    pub fn set_value(&mut self, raw: f64, burst: bool) {
        if burst {
            self.burst.push(raw);
        } else {
            self.value = Some(raw);
        }
    }

    /// Whether a non-burst reading has been recorded yet. An unset
    /// measurement still reads as zero; callers that need to tell "no
    /// data" from "zero" check here.
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Current value converted to `target` (canonical if `None`).
    pub fn value(&self, target: Option<Unit>) -> Result<(f64, Unit)> {
        convert(self.value.unwrap_or(0.0), self.quantity, target)
    }

    /// The burst buffer mapped through conversion. Empty buffer yields an
    /// empty vector, not an error.
    pub fn burst_values(&self, target: Option<Unit>) -> Result<Vec<(f64, Unit)>> {
        self.burst
            .iter()
            .map(|&v| convert(v, self.quantity, target))
            .collect()
    }

    pub fn burst_len(&self) -> usize {
        self.burst.len()
    }

    /// Arithmetic mean of the burst buffer after conversion; 0.0 when the
    /// buffer is empty.
    pub fn average_burst(&self, target: Option<Unit>) -> Result<f64> {
        if self.burst.is_empty() {
            return Ok(0.0);
        }

        let mut sum = 0.0;
        for &v in &self.burst {
            let (converted, _) = convert(v, self.quantity, target)?;
            sum += converted;
        }
        Ok(sum / self.burst.len() as f64)
    }

    /// Clear the burst buffer. Idempotent.
    pub fn reset_burst(&mut self) {
        self.burst.clear();
    }

    /// Resolve the display unit this measurement would use for `target`,
    /// without converting anything.
    pub fn resolve_unit(&self, target: Option<Unit>) -> Result<Unit> {
        match target {
            None => Ok(self.quantity.canonical()),
            Some(unit) if unit.family() == self.quantity.family() => Ok(unit),
            Some(unit) => Err(UnitError::UnsupportedUnit {
                quantity: self.quantity,
                unit,
                supported: self.quantity.supported_units(),
            }),
        }
    }

    /// Fixed-width display line, e.g. `Temperature          :      25.00  [°C]`.
    pub fn describe(&self, target: Option<Unit>) -> Result<String> {
        let (value, unit) = self.value(target)?;
        Ok(format!(
            "{:<20} : {:>10.2}  [{:<4}]",
            self.quantity.name(),
            value,
            unit.symbol()
        ))
    }
}
