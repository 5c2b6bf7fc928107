//! Getis–Ord General G for non-negative values.
//!
//! `G = Σ_i Σ_{j≠i} w_ij x_i x_j / Σ_i Σ_{j≠i} x_i x_j`. A G above its
//! expectation `S0 / (n (n - 1))` points to clustering of high values, below
//! it to clustering of low values.

use tessel_core::{Result, Summarizable, TesselError};
use tessel_weights::SpatialWeights;

use crate::distribution::AnalyticalMoments;
use crate::moran::cross_product;
use crate::permutation::{permutation_test, PermutationConfig, PermutationTest};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GetisOrdTest {
    pub g: f64,
    /// `S0 / (n (n - 1))`.
    pub expected: f64,
    /// Moments under randomization; needs `n >= 4`.
    pub randomization: Option<AnalyticalMoments>,
    pub permutation: PermutationTest,
}

impl Summarizable for GetisOrdTest {
    fn summary(&self) -> String {
        format!(
            "General G={:.6}, E[G]={:.6}, p_sim={:.4}",
            self.g, self.expected, self.permutation.p_value
        )
    }
}

/// Validate the values and return the denominator `(Σx)² - Σx²`.
fn denominator(values: &[f64], w: &SpatialWeights) -> Result<f64> {
    w.validate_values(values)?;
    if let Some(i) = values.iter().position(|&v| v < 0.0) {
        return Err(TesselError::Data(format!(
            "General G needs non-negative values, value {} at index {}",
            values[i], i
        )));
    }
    let sum: f64 = values.iter().sum();
    let sum_sq: f64 = values.iter().map(|v| v * v).sum();
    let den = sum * sum - sum_sq;
    if den <= 0.0 {
        return Err(TesselError::Data(
            "General G is undefined with fewer than two non-zero values".into(),
        ));
    }
    Ok(den)
}

/// # Errors
///
/// Same preconditions as [`crate::moran::morans_i`]; additionally
/// [`TesselError::Data`] for negative values or fewer than two non-zero
/// values.
pub fn general_g(values: &[f64], w: &SpatialWeights) -> Result<f64> {
    let den = denominator(values, w)?;
    Ok(cross_product(w, values) / den)
}

/// General G with randomization moments and a permutation test.
///
/// # Errors
///
/// Same as [`general_g`], plus configuration errors.
pub fn getis_ord_test(
    values: &[f64],
    w: &SpatialWeights,
    config: &PermutationConfig,
) -> Result<GetisOrdTest> {
    let den = denominator(values, w)?;
    config.validate()?;
    let permutation = permutation_test(values, config, |perm: &[f64]| cross_product(w, perm) / den)?;
    let g = permutation.observed;

    let n = w.n() as f64;
    let s0 = w.s0();
    let expected = s0 / (n * (n - 1.0));

    let randomization = if w.n() >= 4 {
        let s1 = w.s1();
        let s2 = w.s2();
        let s02 = s0 * s0;
        let m1: f64 = values.iter().sum();
        let m2: f64 = values.iter().map(|v| v.powi(2)).sum();
        let m3: f64 = values.iter().map(|v| v.powi(3)).sum();
        let m4: f64 = values.iter().map(|v| v.powi(4)).sum();

        let b0 = (n * n - 3.0 * n + 3.0) * s1 - n * s2 + 3.0 * s02;
        let b1 = -((n * n - n) * s1 - 2.0 * n * s2 + 6.0 * s02);
        let b2 = -(2.0 * n * s1 - (n + 3.0) * s2 + 6.0 * s02);
        let b3 = 4.0 * (n - 1.0) * s1 - 2.0 * (n + 1.0) * s2 + 8.0 * s02;
        let b4 = s1 - s2 + s02;

        let num = b0 * m2 * m2 + b1 * m4 + b2 * m1 * m1 * m2 + b3 * m1 * m3 + b4 * m1.powi(4);
        let eg2 = num / (den * den * n * (n - 1.0) * (n - 2.0) * (n - 3.0));
        AnalyticalMoments::new(g, expected, eg2 - expected * expected)
    } else {
        None
    };

    Ok(GetisOrdTest {
        g,
        expected,
        randomization,
        permutation,
    })
}
