//! Join-count statistics for binary labels.
//!
//! Every undirected link between neighbors is a join. A join is BB when both
//! units are labelled `true` ("black"/high), WW when both are `false`, and BW
//! otherwise. Clustering of high values shows up as an excess of BB joins;
//! alternation shows up as an excess of BW joins.

use tessel_core::{Result, Summarizable, TesselError};
use tessel_weights::SpatialWeights;

use crate::permutation::{simulate, PermutationConfig, PermutationTest};

/// Join counts over all undirected links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JoinCounts {
    pub bb: usize,
    pub ww: usize,
    pub bw: usize,
    /// Number of undirected links; always `bb + ww + bw`.
    pub total: usize,
}

impl Summarizable for JoinCounts {
    fn summary(&self) -> String {
        format!(
            "joins={}, BB={}, WW={}, BW={}",
            self.total, self.bb, self.ww, self.bw
        )
    }
}

/// Join counts with permutation tests of the BB and BW counts.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JoinCountTest {
    pub counts: JoinCounts,
    /// Number of units labelled `true`.
    pub n_black: usize,
    pub bb: PermutationTest,
    pub bw: PermutationTest,
}

impl Summarizable for JoinCountTest {
    fn summary(&self) -> String {
        format!(
            "{}, p_sim(BB)={:.4}, p_sim(BW)={:.4}",
            self.counts.summary(),
            self.bb.p_value,
            self.bw.p_value
        )
    }
}

fn validate(labels: &[bool], w: &SpatialWeights) -> Result<SpatialWeights> {
    w.check_len(labels.len())?;
    if labels.len() < 2 {
        return Err(TesselError::InvalidInput(format!(
            "join counts need at least 2 units, got {}",
            labels.len()
        )));
    }
    let binary = w.binary();
    if !binary.is_symmetric() {
        return Err(TesselError::Config(
            "join counts require a symmetric neighbor structure; symmetrize the weights first"
                .into(),
        ));
    }
    binary.ensure_no_islands()?;
    Ok(binary)
}

fn count(labels: &[bool], w: &SpatialWeights) -> JoinCounts {
    let mut counts = JoinCounts {
        bb: 0,
        ww: 0,
        bw: 0,
        total: 0,
    };
    for i in 0..w.n() {
        for j in w.neighbors(i).filter(|&j| j > i) {
            match (labels[i], labels[j]) {
                (true, true) => counts.bb += 1,
                (false, false) => counts.ww += 1,
                _ => counts.bw += 1,
            }
        }
    }
    counts.total = w.n_joins();
    counts
}

/// Count BB, WW and BW joins. Any link counts as one join regardless of its
/// weight.
///
/// # Errors
///
/// - [`TesselError::Config`] if lengths differ or the neighbor structure is
///   not symmetric.
/// - [`TesselError::Data`] if some unit has no neighbors.
pub fn join_counts(labels: &[bool], w: &SpatialWeights) -> Result<JoinCounts> {
    let binary = validate(labels, w)?;
    Ok(count(labels, &binary))
}

/// Join counts with conditional permutation tests: the labels are shuffled
/// across units (so the number of `true` units is preserved) and BB and BW are
/// recounted on every trial. Both tests use the same permutations.
///
/// # Errors
///
/// Same as [`join_counts`], plus configuration errors.
pub fn join_counts_test(
    labels: &[bool],
    w: &SpatialWeights,
    config: &PermutationConfig,
) -> Result<JoinCountTest> {
    let binary = validate(labels, w)?;
    let counts = count(labels, &binary);
    let simulated = simulate(labels, config, |perm: &[bool]| count(perm, &binary))?;

    let (sim_bb, sim_bw): (Vec<f64>, Vec<f64>) = simulated
        .iter()
        .map(|c| (c.bb as f64, c.bw as f64))
        .unzip();

    Ok(JoinCountTest {
        counts,
        n_black: labels.iter().filter(|&&b| b).count(),
        bb: PermutationTest::new(counts.bb as f64, sim_bb, config.alternative),
        bw: PermutationTest::new(counts.bw as f64, sim_bw, config.alternative),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permutation::Alternative;
    use tessel_weights::{lattice, Contiguity};

    fn checkerboard(rows: usize, cols: usize) -> Vec<bool> {
        (0..rows * cols).map(|i| (i / cols + i % cols) % 2 == 0).collect()
    }

    #[test]
    fn checkerboard_rook_has_no_like_joins() {
        let w = lattice(9, 9, Contiguity::Rook).unwrap();
        let c = join_counts(&checkerboard(9, 9), &w).unwrap();
        assert_eq!(c.bb, 0);
        assert_eq!(c.ww, 0);
        assert_eq!(c.bw, 144);
        assert_eq!(c.total, 144);
    }

    #[test]
    fn checkerboard_queen() {
        let w = lattice(9, 9, Contiguity::Queen).unwrap();
        let c = join_counts(&checkerboard(9, 9), &w).unwrap();
        // Edge joins all alternate; diagonal joins always match.
        assert_eq!(c.total, 272);
        assert_eq!(c.bw, 144);
        assert_eq!(c.bb + c.ww, 128);
        assert_eq!(c.bb + c.ww + c.bw, c.total);
        assert_eq!(c.bb, 64);
        assert_eq!(c.ww, 64);
    }

    #[test]
    fn clustered_labels_have_significant_bb() {
        let w = lattice(6, 6, Contiguity::Rook).unwrap();
        // Left half black.
        let labels: Vec<bool> = (0..36).map(|i| i % 6 < 3).collect();
        let config = PermutationConfig::default()
            .with_alternative(Alternative::Greater)
            .with_seed(11);
        let t = join_counts_test(&labels, &w, &config).unwrap();
        assert_eq!(t.n_black, 18);
        // Rows of 3 black cells: 2 joins each * 6 rows + 5 vertical * 3 columns.
        assert_eq!(t.counts.bb, 27);
        assert!(t.bb.p_value < 0.01, "p={}", t.bb.p_value);
        assert!(t.bb.observed > t.bb.mean);
        assert_eq!(t.bb.n_permutations(), 999);
    }

    #[test]
    fn rejects_asymmetric_and_islands() {
        let asym = SpatialWeights::from_neighbors(vec![vec![1], vec![2], vec![0]]).unwrap();
        assert!(matches!(
            join_counts(&[true, false, true], &asym),
            Err(TesselError::Config(_))
        ));
        let island = SpatialWeights::from_neighbors(vec![vec![1], vec![0], vec![]]).unwrap();
        assert!(matches!(
            join_counts(&[true, false, true], &island),
            Err(TesselError::Data(_))
        ));
        let w = lattice(2, 2, Contiguity::Rook).unwrap();
        assert!(matches!(
            join_counts(&[true, false], &w),
            Err(TesselError::Config(_))
        ));
    }

    #[test]
    fn weights_are_ignored() {
        let w = lattice(3, 3, Contiguity::Queen).unwrap();
        let labels = checkerboard(3, 3);
        let a = join_counts(&labels, &w).unwrap();
        let b = join_counts(&labels, &w.row_standardized()).unwrap();
        assert_eq!(a, b);
    }
}
