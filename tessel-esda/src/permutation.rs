//! Permutation inference.
//!
//! A statistic is recomputed on `n_permutations` random relabelings of the
//! values while the weights stay fixed. Trial `t` shuffles a fresh copy of the
//! values with random stream `t` of [`PermutationConfig::seed`], so the
//! simulated distribution depends only on the inputs and the seed, never on
//! evaluation order (the `parallel` feature gives identical results).
//!
//! ```
//! use tessel_esda::permutation::{permutation_test, PermutationConfig};
//!
//! // Sum of the first half: large when high values sit in front.
//! let stat = |v: &[f64]| v[..3].iter().sum::<f64>();
//! let config = PermutationConfig::default().with_permutations(199);
//! let values = [6.0, 5.0, 4.0, 3.0, 2.0, 1.0];
//! let test = permutation_test(&values, &config, stat).unwrap();
//! assert_eq!(test.simulated.len(), 199);
//! assert!(test.p_value > 0.0 && test.p_value <= 1.0);
//! ```

use rand::seq::SliceRandom;
use tessel_core::{Result, Scored, StreamSeed, Summarizable, TesselError};

/// Which tail of the simulated distribution counts as extreme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Alternative {
    /// Simulated values `>=` the observed value.
    Greater,
    /// Simulated values `<=` the observed value.
    Less,
    /// The smaller of the upper-tail count and its complement.
    TwoSided,
}

/// Settings shared by every permutation test.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PermutationConfig {
    /// Number of random relabelings (default: 999).
    pub n_permutations: usize,
    /// Seed of the random streams (default: 42).
    pub seed: u64,
    /// Tail convention for the pseudo p-value (default: two-sided).
    pub alternative: Alternative,
}

impl Default for PermutationConfig {
    fn default() -> Self {
        Self {
            n_permutations: 999,
            seed: 42,
            alternative: Alternative::TwoSided,
        }
    }
}

impl PermutationConfig {
    pub fn with_permutations(mut self, n_permutations: usize) -> Self {
        self.n_permutations = n_permutations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_alternative(mut self, alternative: Alternative) -> Self {
        self.alternative = alternative;
        self
    }

    /// # Errors
    ///
    /// Returns [`TesselError::Config`] if `n_permutations` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.n_permutations == 0 {
            return Err(TesselError::Config(
                "n_permutations must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn streams(&self) -> StreamSeed {
        StreamSeed::new(self.seed)
    }
}

/// Observed statistic together with its simulated null distribution.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PermutationTest {
    pub observed: f64,
    /// One value per trial, ordered by trial index.
    pub simulated: Vec<f64>,
    /// Mean of `simulated`.
    pub mean: f64,
    /// Population variance of `simulated`.
    pub variance: f64,
    /// `(observed - mean) / sqrt(variance)`; `None` when the simulated values
    /// are all equal.
    pub z_score: Option<f64>,
    /// `(extreme + 1) / (n_permutations + 1)`.
    pub p_value: f64,
    pub alternative: Alternative,
}

impl PermutationTest {
    /// Summarize a simulated distribution. `simulated` must be non-empty.
    pub fn new(observed: f64, simulated: Vec<f64>, alternative: Alternative) -> Self {
        let n = simulated.len() as f64;
        let mean = simulated.iter().sum::<f64>() / n;
        let variance = simulated.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        let z_score = if variance > 0.0 {
            Some((observed - mean) / variance.sqrt())
        } else {
            None
        };
        let p_value = pseudo_p_value(observed, &simulated, alternative);
        Self {
            observed,
            simulated,
            mean,
            variance,
            z_score,
            p_value,
            alternative,
        }
    }

    pub fn n_permutations(&self) -> usize {
        self.simulated.len()
    }
}

impl Scored for PermutationTest {
    fn score(&self) -> f64 {
        self.p_value
    }
}

impl Summarizable for PermutationTest {
    fn summary(&self) -> String {
        format!(
            "observed={:.4}, sim mean={:.4}, sim var={:.6}, p_sim={:.4} ({} permutations)",
            self.observed,
            self.mean,
            self.variance,
            self.p_value,
            self.simulated.len(),
        )
    }
}

/// Empirical p-value `(extreme + 1) / (N + 1)` of `observed` against
/// `simulated`. With [`Alternative::TwoSided`], `extreme` is the number of
/// simulated values `>= observed`, or the number below it if that is smaller.
pub fn pseudo_p_value(observed: f64, simulated: &[f64], alternative: Alternative) -> f64 {
    let n = simulated.len();
    let at_or_above = simulated.iter().filter(|&&s| s >= observed).count();
    let extreme = match alternative {
        Alternative::Greater => at_or_above,
        Alternative::Less => simulated.iter().filter(|&&s| s <= observed).count(),
        Alternative::TwoSided => at_or_above.min(n - at_or_above),
    };
    (extreme as f64 + 1.0) / (n as f64 + 1.0)
}

/// Evaluate `statistic` on `config.n_permutations` shuffles of `values`.
/// Output is ordered by trial index.
///
/// # Errors
///
/// Returns an error if the configuration is invalid.
pub fn simulate<T, S, F>(values: &[T], config: &PermutationConfig, statistic: F) -> Result<Vec<S>>
where
    T: Clone + Send + Sync,
    S: Send,
    F: Fn(&[T]) -> S + Sync,
{
    config.validate()?;
    let streams = config.streams();
    log::debug!(
        "simulating {} permutations over {} units (seed {})",
        config.n_permutations,
        values.len(),
        config.seed
    );

    let trial = |buf: &mut Vec<T>, t: usize| {
        buf.clone_from_slice(values);
        buf.shuffle(&mut streams.stream(t as u64));
        statistic(buf.as_slice())
    };

    #[cfg(feature = "parallel")]
    let out: Vec<S> = {
        use rayon::prelude::*;
        (0..config.n_permutations)
            .into_par_iter()
            .map_init(|| values.to_vec(), trial)
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let out: Vec<S> = {
        let mut buf = values.to_vec();
        (0..config.n_permutations)
            .map(|t| trial(&mut buf, t))
            .collect()
    };
    log::debug!("finished {} permutations", config.n_permutations);
    Ok(out)
}

/// Observed value of `statistic` on `values` plus its permutation null.
///
/// # Errors
///
/// Returns an error if the configuration is invalid.
pub fn permutation_test<T, F>(
    values: &[T],
    config: &PermutationConfig,
    statistic: F,
) -> Result<PermutationTest>
where
    T: Clone + Send + Sync,
    F: Fn(&[T]) -> f64 + Sync,
{
    let observed = statistic(values);
    let simulated = simulate(values, config, &statistic)?;
    Ok(PermutationTest::new(observed, simulated, config.alternative))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn p_value_in_unit_interval(
            sim in proptest::collection::vec(-100.0..100.0f64, 1..200),
            obs in -150.0..150.0f64,
        ) {
            for alt in [Alternative::Greater, Alternative::Less, Alternative::TwoSided] {
                let p = pseudo_p_value(obs, &sim, alt);
                prop_assert!(p > 0.0 && p <= 1.0);
            }
        }

        #[test]
        fn p_value_monotone_in_upper_tail(
            sim in proptest::collection::vec(-100.0..100.0f64, 1..200),
            a in -150.0..150.0f64,
            b in -150.0..150.0f64,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(
                pseudo_p_value(hi, &sim, Alternative::Greater)
                    <= pseudo_p_value(lo, &sim, Alternative::Greater)
            );
        }
    }
}
