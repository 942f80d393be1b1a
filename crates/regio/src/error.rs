//! Region error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during region operations.
///
/// [`ArenaError::Exhausted`] is the only outcome caused by resource
/// pressure. The other variants report bad input to formatted construction
/// and slice configuration. Broken invariants (zero element size, a
/// mis-nested sub-region pop) are panics, not errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The region cannot satisfy the request within its remaining bound.
    Exhausted {
        /// Number of bytes requested, excluding alignment padding.
        requested: usize,
        /// Number of bytes that were available when the request was made.
        available: usize,
    },
    /// A `Display` implementation failed, or rendered a different number
    /// of bytes than it measured.
    Format,
    /// A configuration value was rejected by validation.
    InvalidConfig {
        /// Why the configuration was rejected.
        reason: String,
    },
}

impl ArenaError {
    /// Whether this error is region exhaustion.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted {
                requested,
                available,
            } => {
                write!(
                    f,
                    "region exhausted: requested {requested} bytes, available {available} bytes"
                )
            }
            Self::Format => write!(f, "formatting into region failed"),
            Self::InvalidConfig { reason } => write!(f, "invalid config: {reason}"),
        }
    }
}

impl Error for ArenaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_display_names_both_sizes() {
        let err = ArenaError::Exhausted {
            requested: 17,
            available: 16,
        };
        assert_eq!(
            err.to_string(),
            "region exhausted: requested 17 bytes, available 16 bytes"
        );
        assert!(err.is_exhausted());
    }

    #[test]
    fn invalid_config_is_not_exhaustion() {
        let err = ArenaError::InvalidConfig {
            reason: "initial must be > 0".into(),
        };
        assert!(!err.is_exhausted());
        assert_eq!(err.to_string(), "invalid config: initial must be > 0");
    }
}
