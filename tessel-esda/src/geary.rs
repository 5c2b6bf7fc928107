//! Geary's C.
//!
//! `C = (n - 1) Σ_i Σ_j w_ij (x_i - x_j)² / (2 S0 Σ_i z_i²)`. Values below 1
//! indicate positive autocorrelation, above 1 negative.

use tessel_core::{Result, Summarizable};
use tessel_weights::SpatialWeights;

use crate::descriptive::deviations;
use crate::distribution::AnalyticalMoments;
use crate::permutation::{permutation_test, PermutationConfig, PermutationTest};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GearyTest {
    pub c: f64,
    /// Always 1.
    pub expected: f64,
    pub normality: Option<AnalyticalMoments>,
    pub permutation: PermutationTest,
}

impl Summarizable for GearyTest {
    fn summary(&self) -> String {
        format!(
            "Geary's C={:.4}, E[C]={:.1}, p_sim={:.4}",
            self.c, self.expected, self.permutation.p_value
        )
    }
}

fn squared_differences(w: &SpatialWeights, z: &[f64]) -> f64 {
    (0..w.n())
        .map(|i| {
            w.row(i)
                .iter()
                .map(|&(j, wij)| wij * (z[i] - z[j]).powi(2))
                .sum::<f64>()
        })
        .sum()
}

/// # Errors
///
/// Same preconditions as [`crate::moran::morans_i`].
pub fn gearys_c(values: &[f64], w: &SpatialWeights) -> Result<f64> {
    w.validate_values(values)?;
    let (z, sum_sq) = deviations(values)?;
    let n = w.n() as f64;
    Ok((n - 1.0) * squared_differences(w, &z) / (2.0 * w.s0() * sum_sq))
}

/// Geary's C with its normal approximation and a permutation test.
///
/// # Errors
///
/// Same as [`gearys_c`], plus configuration errors.
pub fn geary_test(values: &[f64], w: &SpatialWeights, config: &PermutationConfig) -> Result<GearyTest> {
    w.validate_values(values)?;
    config.validate()?;
    let (z, sum_sq) = deviations(values)?;

    let n = w.n() as f64;
    let s0 = w.s0();
    let scale = (n - 1.0) / (2.0 * s0 * sum_sq);
    let permutation = permutation_test(&z, config, |perm: &[f64]| {
        scale * squared_differences(w, perm)
    })?;
    let c = permutation.observed;

    let variance =
        ((2.0 * w.s1() + w.s2()) * (n - 1.0) - 4.0 * s0 * s0) / (2.0 * (n + 1.0) * s0 * s0);

    Ok(GearyTest {
        c,
        expected: 1.0,
        normality: AnalyticalMoments::new(c, 1.0, variance),
        permutation,
    })
}
