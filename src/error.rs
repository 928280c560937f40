//! Error taxonomy for the evolution core.
//!
//! Every variant here is a programmer error, not a recoverable runtime
//! condition — the core does no I/O. `BadRange` and `BadInputLength` are
//! caller bugs (bad percentages, mismatched input vectors); `InvariantViolation`
//! signals a corrupted genome or registry and should be treated as fatal
//! rather than repaired (spec.md §7).

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum NeatError {
    #[error("percentage {percent} is out of the valid range [0, 100]")]
    BadRange { percent: i64 },

    #[error("propagate expected {expected} inputs, got {got}")]
    BadInputLength { expected: usize, got: usize },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, NeatError>;

/// Validate that `percent` is a legal mutation-gate percentage.
pub(crate) fn check_percent(percent: u32) -> Result<()> {
    if percent > 100 {
        return Err(NeatError::BadRange {
            percent: percent as i64,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_percent() {
        assert!(check_percent(101).is_err());
    }

    #[test]
    fn accepts_boundary_percents() {
        assert!(check_percent(0).is_ok());
        assert!(check_percent(100).is_ok());
    }
}
