use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EvalError;

/// Fractional digits kept for non-integral results.
const DECIMAL_PLACES: i32 = 10;

/// Evaluation result.
///
/// Mathematically whole values collapse to `Integer`; everything else is a
/// `Decimal` rounded to ten fractional digits. Serializes as
/// `{"kind": "integer" | "decimal", "value": ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Numeric {
    Integer(i64),
    Decimal(f64),
}

impl Numeric {
    /// Normalize a raw arithmetic result into the public shape.
    ///
    /// Non-finite input is an internal fault, not a user-input error —
    /// the zero-divisor guards run before any division, so infinities only
    /// appear through overflow.
    pub fn from_f64(raw: f64) -> Result<Self, EvalError> {
        if !raw.is_finite() {
            return Err(EvalError::Internal(format!("non-finite result: {raw}")));
        }
        // Whole values skip the scaling round-trip; anything with a
        // fractional part is small enough (< 2^53) that `raw * scale`
        // cannot overflow.
        let rounded = if raw.fract() == 0.0 {
            raw
        } else {
            let scale = 10f64.powi(DECIMAL_PLACES);
            (raw * scale).round() / scale
        };
        if rounded.fract() == 0.0 {
            // The cast saturates at the i64 boundary, so require an exact
            // round-trip and reject the saturated endpoint itself.
            let as_int = rounded as i64;
            if as_int != i64::MAX && as_int as f64 == rounded {
                return Ok(Numeric::Integer(as_int));
            }
        }
        Ok(Numeric::Decimal(rounded))
    }

    #[inline]
    pub fn as_f64(&self) -> f64 {
        match self {
            Numeric::Integer(n) => *n as f64,
            Numeric::Decimal(f) => *f,
        }
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Integer(n) => write!(f, "{n}"),
            Numeric::Decimal(v) => write!(f, "{v}"),
        }
    }
}
