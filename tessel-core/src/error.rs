//! Structured error types for the tessel crates.

use thiserror::Error;

/// Unified error type for all tessel operations.
#[derive(Debug, Error)]
pub enum TesselError {
    /// Inputs that do not fit together: mismatched lengths, bad indices,
    /// invalid permutation settings, asymmetric weights where symmetry is
    /// required.
    #[error("configuration error: {0}")]
    Config(String),

    /// Values that make a statistic undefined (islands, non-finite values,
    /// zero variance).
    #[error("data error: {0}")]
    Data(String),

    /// Invalid input (empty slices, out-of-range arguments)
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience alias used throughout the tessel crates.
pub type Result<T> = std::result::Result<T, TesselError>;

/// Fail with [`TesselError::Data`] if any value is NaN or infinite.
pub fn ensure_finite(values: &[f64], what: &str) -> Result<()> {
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(TesselError::Data(format!(
            "{} contains a non-finite value at index {} ({})",
            what, i, values[i]
        )));
    }
    Ok(())
}
