//! Elapsed-time computation and duration bounds
//!
//! Durations are whole seconds. Sub-second gaps and negative gaps caused by
//! clock skew both come out as zero.

use crate::error::{Result, SkillTimeError};

/// Whole seconds between two epoch-millisecond timestamps, clamped at zero
pub fn elapsed_secs(start_ms: i64, end_ms: i64) -> u64 {
    if end_ms <= start_ms {
        return 0;
    }
    end_ms.abs_diff(start_ms) / 1000
}

/// Inclusive range of accepted durations, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationBounds {
    pub lower: f64,
    pub upper: f64,
}

impl Default for DurationBounds {
    fn default() -> Self {
        Self {
            lower: 0.0,
            upper: f64::INFINITY,
        }
    }
}

impl DurationBounds {
    /// Create bounds, rejecting `lower > upper` and NaN
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(SkillTimeError::InvalidBounds { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    /// Whether a whole-second duration is accepted
    pub fn accepts(&self, duration_secs: u64) -> bool {
        self.contains(duration_secs as f64)
    }
}
