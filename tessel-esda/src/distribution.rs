//! Normal-approximation helpers for the analytical moments of the global
//! statistics.

/// Error function via Abramowitz & Stegun 7.1.26 (max error ~1.5e-7).
pub fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    sign * (1.0 - poly * (-x * x).exp())
}

/// Standard normal CDF.
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / core::f64::consts::SQRT_2))
}

/// Two-sided p-value of a standard normal z-score.
pub fn p_from_z(z: f64) -> f64 {
    (2.0 * (1.0 - normal_cdf(z.abs()))).clamp(0.0, 1.0)
}

/// Variance, z-score and two-sided p-value of a statistic under an
/// analytical null.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnalyticalMoments {
    pub variance: f64,
    pub z_score: f64,
    pub p_value: f64,
}

impl AnalyticalMoments {
    /// `None` when the variance is not finite and positive (too few units for
    /// the formula, or a degenerate weights structure).
    pub fn new(observed: f64, expected: f64, variance: f64) -> Option<Self> {
        if !variance.is_finite() || variance <= 0.0 {
            return None;
        }
        let z_score = (observed - expected) / variance.sqrt();
        Some(Self {
            variance,
            z_score,
            p_value: p_from_z(z_score),
        })
    }
}
