//! Error types for DPOL lifting

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DpolError {
    #[error("invalid modulus {modulus}: {reason}")]
    InvalidModulus { modulus: u32, reason: String },

    #[error("lifting invariant violated at step {step}: {detail}")]
    InvariantViolation { step: usize, detail: String },

    #[error("dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: String,
        actual: String,
    },

    #[error("insufficient precision: {available} digits available, {required} required")]
    PrecisionInsufficient { required: usize, available: usize },

    #[error("carry escaped the last of {precision} slices")]
    PrecisionOverflow { precision: usize },

    #[error("solution does not satisfy A·X = B (row {row}, column {col})")]
    VerificationFailed { row: usize, col: usize },
}

impl DpolError {
    pub(crate) fn dims(
        context: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    ) -> Self {
        DpolError::DimensionMismatch {
            context,
            expected: format!("{}x{}", expected.0, expected.1),
            actual: format!("{}x{}", actual.0, actual.1),
        }
    }
}

pub type Result<T> = std::result::Result<T, DpolError>;
