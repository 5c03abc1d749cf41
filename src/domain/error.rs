// ============================================================
// Layer 3 — Error Kinds
// ============================================================
// Every failure in the core falls into one of three buckets:
//
//   InvalidArgument       — a ratio, probability or count is out of
//                           range, or a class count does not match
//   PreconditionViolation — an internal invariant would break
//                           (bad confusion row, index out of bounds,
//                           overlapping partitions)
//   ResourceUnavailable   — a backing file is missing or unreadable
//
// All checks run before any label is touched, so a rejected
// configuration leaves the store exactly as it was loaded.
//
// Reference: Rust Book §9 (Recoverable Errors with Result)
//            thiserror crate documentation

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NoiseError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("resource unavailable: '{resource}' ({reason})")]
    ResourceUnavailable { resource: String, reason: String },
}

impl NoiseError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::PreconditionViolation(msg.into())
    }

    pub fn unavailable(resource: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::ResourceUnavailable {
            resource: resource.to_string(),
            reason:   reason.to_string(),
        }
    }
}

pub type NoiseResult<T> = Result<T, NoiseError>;

/// Reject anything that is not a finite value in [0, 1].
/// NaN fails the range check on its own.
pub fn ensure_probability(name: &str, value: f64) -> NoiseResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(NoiseError::invalid(format!(
            "{name} must lie in [0, 1], got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_bounds() {
        assert!(ensure_probability("p", 0.0).is_ok());
        assert!(ensure_probability("p", 1.0).is_ok());
        assert!(ensure_probability("p", -0.01).is_err());
        assert!(ensure_probability("p", 1.5).is_err());
        assert!(ensure_probability("p", f64::NAN).is_err());
    }

    #[test]
    fn test_error_messages_name_the_kind() {
        let e = NoiseError::unavailable("data/mnist", "missing");
        assert_eq!(e.to_string(), "resource unavailable: 'data/mnist' (missing)");
        let e = NoiseError::invalid("count too large");
        assert!(e.to_string().starts_with("invalid argument"));
    }
}
