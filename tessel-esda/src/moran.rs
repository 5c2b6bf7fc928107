//! Global Moran's I.
//!
//! `I = (n / S0) · Σ_i Σ_j w_ij z_i z_j / Σ_i z_i²` with `z` the mean-centered
//! values. Under spatial randomness `E[I] = -1 / (n - 1)`; larger values
//! indicate clustering of similar values, smaller values indicate
//! alternation. Weights are used as given; row-standardize them first for the
//! usual interpretation of `I` as the slope of the Moran scatterplot.

use tessel_core::{Result, Summarizable};
use tessel_weights::SpatialWeights;

use crate::descriptive::deviations;
use crate::distribution::AnalyticalMoments;
use crate::permutation::{permutation_test, PermutationConfig, PermutationTest};

/// Moran's I with analytical and permutation inference.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoranTest {
    pub i: f64,
    /// `-1 / (n - 1)`.
    pub expected: f64,
    /// Moments under the normality assumption.
    pub normality: Option<AnalyticalMoments>,
    /// Moments under randomization (kurtosis-adjusted); needs `n >= 4`.
    pub randomization: Option<AnalyticalMoments>,
    pub permutation: PermutationTest,
}

impl Summarizable for MoranTest {
    fn summary(&self) -> String {
        format!(
            "Moran's I={:.4}, E[I]={:.4}, p_sim={:.4}",
            self.i, self.expected, self.permutation.p_value
        )
    }
}

/// Sum over links of `w_ij z_i z_j`.
pub(crate) fn cross_product(w: &SpatialWeights, z: &[f64]) -> f64 {
    (0..w.n())
        .map(|i| z[i] * w.row(i).iter().map(|&(j, wij)| wij * z[j]).sum::<f64>())
        .sum()
}

/// Moran's I statistic alone. `w` is used as given; pass
/// [`SpatialWeights::row_standardized`] weights for the conventional
/// statistic.
///
/// # Errors
///
/// - [`TesselError::Config`](tessel_core::TesselError::Config) on length
///   mismatch.
/// - [`TesselError::Data`](tessel_core::TesselError::Data) for islands,
///   non-finite or constant values.
pub fn morans_i(values: &[f64], w: &SpatialWeights) -> Result<f64> {
    w.validate_values(values)?;
    let (z, sum_sq) = deviations(values)?;
    Ok(w.n() as f64 / w.s0() * cross_product(w, &z) / sum_sq)
}

/// Moran's I with normality, randomization and permutation inference.
///
/// No transform is applied to `w`: the analytical moments use the `S0`, `S1`
/// and `S2` of the weights exactly as passed. Row-standardize first for the
/// conventional test.
///
/// # Errors
///
/// Same as [`morans_i`], plus configuration errors.
pub fn moran_test(values: &[f64], w: &SpatialWeights, config: &PermutationConfig) -> Result<MoranTest> {
    w.validate_values(values)?;
    config.validate()?;
    let (z, sum_sq) = deviations(values)?;

    let n = w.n() as f64;
    let s0 = w.s0();
    // Σ z² is invariant under permutation, so the scale is shared by all trials.
    let scale = n / (s0 * sum_sq);
    let permutation = permutation_test(&z, config, |perm: &[f64]| scale * cross_product(w, perm))?;
    let i = permutation.observed;
    let expected = -1.0 / (n - 1.0);

    let s1 = w.s1();
    let s2 = w.s2();
    let s02 = s0 * s0;
    let ei2 = expected * expected;

    let var_norm = (n * n * s1 - n * s2 + 3.0 * s02) / ((n * n - 1.0) * s02) - ei2;

    let randomization = if w.n() >= 4 {
        let m2 = sum_sq / n;
        let m4 = z.iter().map(|d| d.powi(4)).sum::<f64>() / n;
        let b2 = m4 / (m2 * m2);
        let a = n * ((n * n - 3.0 * n + 3.0) * s1 - n * s2 + 3.0 * s02);
        let b = b2 * ((n * n - n) * s1 - 2.0 * n * s2 + 6.0 * s02);
        let var_rand = (a - b) / ((n - 1.0) * (n - 2.0) * (n - 3.0) * s02) - ei2;
        AnalyticalMoments::new(i, expected, var_rand)
    } else {
        None
    };

    Ok(MoranTest {
        i,
        expected,
        normality: AnalyticalMoments::new(i, expected, var_norm),
        randomization,
        permutation,
    })
}
