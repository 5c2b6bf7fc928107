//! Local Moran's I (LISA).
//!
//! `I_i = (n - 1) · z_i · Σ_j w_ij z_j / Σ_k z_k²`. Each unit gets its own
//! null distribution by conditional permutation: the focal value stays put
//! and its neighbor slots are refilled with values drawn without replacement
//! from the other `n - 1` units.
//!
//! Weights are used as given. With row-standardized weights the lag is the
//! neighbor average of the deviations, which is the usual LISA setup.

use rand::Rng;
use tessel_core::{Result, Summarizable};
use tessel_weights::SpatialWeights;

use crate::descriptive::deviations;
use crate::permutation::{PermutationConfig, PermutationTest};

/// Position of a unit in the Moran scatterplot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Quadrant {
    /// High value surrounded by high values.
    HighHigh,
    /// Low value surrounded by high values.
    LowHigh,
    /// Low value surrounded by low values.
    LowLow,
    /// High value surrounded by low values.
    HighLow,
}

impl Quadrant {
    /// Quadrant from a unit's deviation and the lag of deviations. Zero counts
    /// as low.
    pub fn classify(z: f64, lag: f64) -> Self {
        match (z > 0.0, lag > 0.0) {
            (true, true) => Quadrant::HighHigh,
            (false, true) => Quadrant::LowHigh,
            (false, false) => Quadrant::LowLow,
            (true, false) => Quadrant::HighLow,
        }
    }

    /// Conventional quadrant number (1 = HH, 2 = LH, 3 = LL, 4 = HL).
    pub fn number(&self) -> u8 {
        match self {
            Quadrant::HighHigh => 1,
            Quadrant::LowHigh => 2,
            Quadrant::LowLow => 3,
            Quadrant::HighLow => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quadrant::HighHigh => "HH",
            Quadrant::LowHigh => "LH",
            Quadrant::LowLow => "LL",
            Quadrant::HighLow => "HL",
        }
    }
}

/// Per-unit local Moran statistics.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalMoran {
    /// `I_i` per unit.
    pub values: Vec<f64>,
    /// Spatial lag of the deviations, `Σ_j w_ij z_j`.
    pub lags: Vec<f64>,
    pub quadrants: Vec<Quadrant>,
    /// Conditional permutation test per unit.
    pub tests: Vec<PermutationTest>,
}

impl LocalMoran {
    pub fn n(&self) -> usize {
        self.values.len()
    }

    pub fn p_values(&self) -> Vec<f64> {
        self.tests.iter().map(|t| t.p_value).collect()
    }

    /// Quadrant of every unit with `p <= alpha`, `None` elsewhere.
    pub fn clusters(&self, alpha: f64) -> Vec<Option<Quadrant>> {
        self.quadrants
            .iter()
            .zip(&self.tests)
            .map(|(&q, t)| (t.p_value <= alpha).then_some(q))
            .collect()
    }

    pub fn significant_count(&self, alpha: f64) -> usize {
        self.tests.iter().filter(|t| t.p_value <= alpha).count()
    }
}

impl Summarizable for LocalMoran {
    fn summary(&self) -> String {
        let mut counts = [0usize; 4];
        for q in self.clusters(0.05).into_iter().flatten() {
            counts[q.number() as usize - 1] += 1;
        }
        format!(
            "LISA over {} units: {} significant at 0.05 (HH={}, LH={}, LL={}, HL={})",
            self.n(),
            self.significant_count(0.05),
            counts[0],
            counts[1],
            counts[2],
            counts[3],
        )
    }
}

/// Local Moran values only, without inference.
///
/// # Errors
///
/// Same preconditions as [`crate::moran::morans_i`].
pub fn local_morans_i(values: &[f64], w: &SpatialWeights) -> Result<Vec<f64>> {
    w.validate_values(values)?;
    let (z, sum_sq) = deviations(values)?;
    let lags = w.lag(&z)?;
    let scale = (w.n() as f64 - 1.0) / sum_sq;
    Ok(z.iter().zip(&lags).map(|(zi, li)| scale * zi * li).collect())
}

/// Draw the conditional null distribution of unit `focal`.
///
/// `arena` holds every unit index; it is reset so that the focal index sits
/// in the last slot and each trial partially shuffles the first `k` of the
/// remaining `n - 1` slots.
fn conditional_null(
    focal: usize,
    z: &[f64],
    w: &SpatialWeights,
    scale: f64,
    config: &PermutationConfig,
    arena: &mut [usize],
) -> Vec<f64> {
    let n = z.len();
    for (slot, idx) in arena.iter_mut().enumerate() {
        *idx = slot;
    }
    arena.swap(focal, n - 1);

    let row = w.row(focal);
    let k = row.len();
    let mut rng = config.streams().stream(focal as u64);
    let zi = z[focal];

    (0..config.n_permutations)
        .map(|_| {
            for m in 0..k {
                let r = rng.gen_range(m..n - 1);
                arena.swap(m, r);
            }
            let lag: f64 = row
                .iter()
                .zip(&arena[..k])
                .map(|(&(_, wij), &j)| wij * z[j])
                .sum();
            scale * zi * lag
        })
        .collect()
}

/// Local Moran's I with a conditional permutation test per unit. `w` is
/// not transformed; row-standardize it first for the conventional LISA.
///
/// # Errors
///
/// Same preconditions as [`crate::moran::morans_i`], plus configuration
/// errors.
pub fn local_moran(values: &[f64], w: &SpatialWeights, config: &PermutationConfig) -> Result<LocalMoran> {
    w.validate_values(values)?;
    config.validate()?;
    let (z, sum_sq) = deviations(values)?;
    let lags = w.lag(&z)?;
    let n = w.n();
    let scale = (n as f64 - 1.0) / sum_sq;
    let observed: Vec<f64> = z.iter().zip(&lags).map(|(zi, li)| scale * zi * li).collect();

    log::debug!(
        "local Moran: {} units, {} conditional permutations each",
        n,
        config.n_permutations
    );

    let unit = |arena: &mut Vec<usize>, i: usize| {
        let sim = conditional_null(i, &z, w, scale, config, arena);
        PermutationTest::new(observed[i], sim, config.alternative)
    };

    #[cfg(feature = "parallel")]
    let tests: Vec<PermutationTest> = {
        use rayon::prelude::*;
        (0..n)
            .into_par_iter()
            .map_init(|| vec![0usize; n], unit)
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let tests: Vec<PermutationTest> = {
        let mut arena = vec![0usize; n];
        (0..n).map(|i| unit(&mut arena, i)).collect()
    };

    let quadrants = z
        .iter()
        .zip(&lags)
        .map(|(&zi, &li)| Quadrant::classify(zi, li))
        .collect();

    Ok(LocalMoran {
        values: observed,
        lags,
        quadrants,
        tests,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moran::morans_i;
    use tessel_core::TesselError;
    use tessel_weights::{lattice, Contiguity};

    fn hotspot_5x5() -> Vec<f64> {
        // High block in the top-left corner, low elsewhere with mild noise.
        let mut v: Vec<f64> = (0..25).map(|i| ((i * 7) % 5) as f64).collect();
        for &i in &[0, 1, 5, 6] {
            v[i] = 50.0;
        }
        v
    }

    #[test]
    fn quadrant_classification() {
        assert_eq!(Quadrant::classify(1.0, 2.0), Quadrant::HighHigh);
        assert_eq!(Quadrant::classify(-1.0, 2.0), Quadrant::LowHigh);
        assert_eq!(Quadrant::classify(-1.0, -2.0), Quadrant::LowLow);
        assert_eq!(Quadrant::classify(1.0, -2.0), Quadrant::HighLow);
        assert_eq!(Quadrant::classify(0.0, 0.0), Quadrant::LowLow);
        assert_eq!(Quadrant::HighLow.number(), 4);
        assert_eq!(Quadrant::LowHigh.label(), "LH");
    }

    #[test]
    fn local_sum_matches_global() {
        let w = lattice(5, 5, Contiguity::Queen).unwrap().row_standardized();
        let values = hotspot_5x5();
        let local = local_morans_i(&values, &w).unwrap();
        let n = 25.0;
        let from_local = n / (w.s0() * (n - 1.0)) * local.iter().sum::<f64>();
        let global = morans_i(&values, &w).unwrap();
        assert!((from_local - global).abs() < 1e-10);
    }

    #[test]
    fn lag_follows_given_weights() {
        let binary = lattice(3, 3, Contiguity::Rook).unwrap();
        let row = binary.row_standardized();
        let values = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0, 5.0];
        let config = PermutationConfig::default().with_permutations(9);
        let z: Vec<f64> = values.iter().map(|v| v - 4.0).collect();
        // Center cell: neighbors 1, 3, 5, 7.
        let neighbor_sum = z[1] + z[3] + z[5] + z[7];
        let a = local_moran(&values, &binary, &config).unwrap();
        let b = local_moran(&values, &row, &config).unwrap();
        assert!((a.lags[4] - neighbor_sum).abs() < 1e-12);
        assert!((b.lags[4] - neighbor_sum / 4.0).abs() < 1e-12);
        assert!((a.values[4] - 4.0 * b.values[4]).abs() < 1e-12);
    }

    #[test]
    fn hotspot_is_high_high_and_significant() {
        let w = lattice(5, 5, Contiguity::Queen).unwrap().row_standardized();
        let config = PermutationConfig::default().with_seed(3);
        let lisa = local_moran(&hotspot_5x5(), &w, &config).unwrap();
        assert_eq!(lisa.n(), 25);
        // Unit 0's neighbors 1, 5, 6 are all in the hot block.
        assert_eq!(lisa.quadrants[0], Quadrant::HighHigh);
        assert!(lisa.values[0] > 0.0);
        assert!(lisa.tests[0].p_value < 0.05, "p={}", lisa.tests[0].p_value);
        assert_eq!(lisa.clusters(0.05)[0], Some(Quadrant::HighHigh));
        assert!(lisa.significant_count(0.05) >= 1);
        for t in &lisa.tests {
            assert_eq!(t.simulated.len(), 999);
            assert!(t.p_value > 0.0 && t.p_value <= 1.0);
        }
    }

    #[test]
    fn conditional_draws_exclude_focal() {
        // Star: unit 0 is linked to everyone. If the focal value leaked into
        // the draws, the simulated lag would vary; with it excluded every
        // trial sees all other units exactly once.
        let n = 6;
        let neighbors = (0..n)
            .map(|i| if i == 0 { (1..n).collect() } else { vec![0] })
            .collect();
        let w = SpatialWeights::from_neighbors(neighbors).unwrap();
        let values = [10.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let config = PermutationConfig::default().with_permutations(50);
        let lisa = local_moran(&values, &w, &config).unwrap();
        let t = &lisa.tests[0];
        for &s in &t.simulated {
            assert!((s - t.observed).abs() < 1e-9);
        }
    }

    #[test]
    fn deterministic_per_seed() {
        let w = lattice(4, 4, Contiguity::Rook).unwrap().row_standardized();
        let values: Vec<f64> = (0..16).map(|i| ((i * 5) % 16) as f64).collect();
        let config = PermutationConfig::default().with_permutations(200).with_seed(99);
        let a = local_moran(&values, &w, &config).unwrap();
        let b = local_moran(&values, &w, &config).unwrap();
        assert_eq!(a, b);
        let c = local_moran(&values, &w, &config.with_seed(100)).unwrap();
        assert_ne!(a.tests[0].simulated, c.tests[0].simulated);
    }

    #[test]
    fn rejects_islands_and_constant() {
        let w = SpatialWeights::from_neighbors(vec![vec![1], vec![0, 2], vec![1], vec![]]).unwrap();
        let config = PermutationConfig::default();
        assert!(matches!(
            local_moran(&[1.0, 2.0, 3.0, 4.0], &w, &config),
            Err(TesselError::Data(_))
        ));
        let (reduced, kept) = w.drop_islands();
        assert_eq!(kept, vec![0, 1, 2]);
        assert!(local_moran(&[1.0, 2.0, 3.0], &reduced, &config).is_ok());

        let grid = lattice(3, 3, Contiguity::Rook).unwrap();
        assert!(matches!(
            local_moran(&[1.0; 9], &grid, &config),
            Err(TesselError::Data(_))
        ));
    }
}
