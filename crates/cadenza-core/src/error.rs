//! Error types for cadenza

use thiserror::Error;

/// Structural precondition violations.
///
/// Everything else in the core is total: unknown identifiers fall back to a
/// default and out-of-range numbers are clamped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CadenzaError {
    #[error("Groove template must have at least one grid division")]
    EmptyGroove,
    #[error("Groove table `{table}` has {actual} entries, expected {expected}")]
    GrooveTableLength {
        table: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Groove table `{table}` holds {value}, scales must be positive")]
    GrooveScale { table: &'static str, value: f32 },
}

pub type Result<T> = std::result::Result<T, CadenzaError>;
