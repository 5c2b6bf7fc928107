//! Descriptive helpers shared by the spatial statistics.

use tessel_core::{Result, TesselError};

/// Arithmetic mean.
pub fn mean(data: &[f64]) -> Result<f64> {
    if data.is_empty() {
        return Err(TesselError::InvalidInput("mean: data must not be empty".into()));
    }
    Ok(data.iter().sum::<f64>() / data.len() as f64)
}

/// Median (average of the two middle values for even lengths).
pub fn median(data: &[f64]) -> Result<f64> {
    if data.is_empty() {
        return Err(TesselError::InvalidInput("median: data must not be empty".into()));
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    Ok(if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    })
}

/// Binary labels from a continuous attribute: `true` ("high") where the
/// value is strictly above the median.
///
/// # Errors
///
/// Returns an error for empty or non-finite input.
pub fn median_split(values: &[f64]) -> Result<Vec<bool>> {
    tessel_core::ensure_finite(values, "values")?;
    let m = median(values)?;
    Ok(values.iter().map(|&v| v > m).collect())
}

/// Mean-centered copy of `values` and its sum of squares.
///
/// # Errors
///
/// Returns [`TesselError::Data`] when the values are constant, since every
/// autocorrelation statistic divides by the sum of squared deviations.
pub(crate) fn deviations(values: &[f64]) -> Result<(Vec<f64>, f64)> {
    let m = mean(values)?;
    let z: Vec<f64> = values.iter().map(|&v| v - m).collect();
    let sum_sq: f64 = z.iter().map(|d| d * d).sum();
    // Rounding in the mean leaves residuals of order n·ε·|v| on constant data.
    let magnitude: f64 = values.iter().map(|v| v * v).sum();
    let tolerance = (values.len() as f64 * f64::EPSILON).powi(2) * magnitude;
    if sum_sq <= tolerance {
        return Err(TesselError::Data(
            "zero variance in values; the statistic is undefined".into(),
        ));
    }
    Ok((z, sum_sq))
}
