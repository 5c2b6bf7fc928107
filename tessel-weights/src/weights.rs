//! Sparse spatial weights.
//!
//! A [`SpatialWeights`] maps every unit `i` to its neighbors `j` and the
//! interaction weight `w_ij`. Construction validates the structure once so the
//! statistics can index it freely: neighbor indices are in range, there are no
//! self-loops or duplicate links, and every weight is finite and positive.

use tessel_core::{ensure_finite, Result, TesselError};

/// How the weights of a [`SpatialWeights`] were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Transform {
    /// Every link has weight 1.
    Binary,
    /// Weights in each row sum to 1.
    Row,
    /// Weights supplied by the caller.
    Custom,
}

/// Sparse neighbor structure with weights.
///
/// With the `serde` feature, deserialization runs the same checks as the
/// constructors and also verifies that the weights agree with the
/// [`Transform`] tag.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpatialWeights {
    n_units: usize,
    /// `neighbors[i]` holds `(j, w_ij)` sorted by `j`.
    neighbors: Vec<Vec<(usize, f64)>>,
    transform: Transform,
}

impl SpatialWeights {
    /// Binary weights from neighbor lists (e.g. polygon contiguity computed
    /// elsewhere).
    ///
    /// # Errors
    ///
    /// Returns [`TesselError::Config`] for out-of-range indices, self-loops or
    /// duplicate neighbors.
    pub fn from_neighbors(neighbors: Vec<Vec<usize>>) -> Result<Self> {
        let weighted = neighbors
            .into_iter()
            .map(|row| row.into_iter().map(|j| (j, 1.0)).collect())
            .collect();
        Self::build(weighted, Transform::Binary)
    }

    /// Weights from explicit `(neighbor, weight)` lists.
    ///
    /// # Errors
    ///
    /// Same structural checks as [`from_neighbors`](Self::from_neighbors);
    /// additionally returns [`TesselError::Data`] for non-finite or
    /// non-positive weights.
    pub fn from_weighted(neighbors: Vec<Vec<(usize, f64)>>) -> Result<Self> {
        Self::build(neighbors, Transform::Custom)
    }

    fn build(mut neighbors: Vec<Vec<(usize, f64)>>, transform: Transform) -> Result<Self> {
        let n = neighbors.len();
        for (i, row) in neighbors.iter_mut().enumerate() {
            row.sort_by_key(|&(j, _)| j);
            for (k, &(j, w)) in row.iter().enumerate() {
                if j >= n {
                    return Err(TesselError::Config(format!(
                        "unit {} lists neighbor {} but there are only {} units",
                        i, j, n
                    )));
                }
                if j == i {
                    return Err(TesselError::Config(format!("unit {} lists itself as a neighbor", i)));
                }
                if k > 0 && row[k - 1].0 == j {
                    return Err(TesselError::Config(format!(
                        "unit {} lists neighbor {} more than once",
                        i, j
                    )));
                }
                if !w.is_finite() || w <= 0.0 {
                    return Err(TesselError::Data(format!(
                        "weight w[{}][{}] = {} must be finite and positive",
                        i, j, w
                    )));
                }
            }
        }
        Ok(Self {
            n_units: n,
            neighbors,
            transform,
        })
    }

    /// Rebuild from serialized parts, rejecting anything the constructors
    /// would reject.
    #[cfg(feature = "serde")]
    fn from_parts(
        n_units: usize,
        neighbors: Vec<Vec<(usize, f64)>>,
        transform: Transform,
    ) -> Result<Self> {
        if n_units != neighbors.len() {
            return Err(TesselError::Config(format!(
                "n_units is {} but there are {} neighbor rows",
                n_units,
                neighbors.len()
            )));
        }
        let w = Self::build(neighbors, transform)?;
        for (i, row) in w.neighbors.iter().enumerate() {
            match transform {
                Transform::Binary if row.iter().any(|&(_, wij)| wij != 1.0) => {
                    return Err(TesselError::Data(format!(
                        "row {} of binary weights has a weight other than 1",
                        i
                    )));
                }
                Transform::Row if !row.is_empty() => {
                    let total: f64 = row.iter().map(|&(_, wij)| wij).sum();
                    if (total - 1.0).abs() > 1e-9 {
                        return Err(TesselError::Data(format!(
                            "row {} of row-standardized weights sums to {}",
                            i, total
                        )));
                    }
                }
                _ => {}
            }
        }
        Ok(w)
    }

    /// Number of units.
    pub fn n(&self) -> usize {
        self.n_units
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Neighbors of unit `i` with their weights, sorted by neighbor index.
    pub fn row(&self, i: usize) -> &[(usize, f64)] {
        &self.neighbors[i]
    }

    /// Neighbor indices of unit `i`.
    pub fn neighbors(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.neighbors[i].iter().map(|&(j, _)| j)
    }

    /// Weights of unit `i`, aligned with [`neighbors`](Self::neighbors).
    pub fn weights(&self, i: usize) -> impl Iterator<Item = f64> + '_ {
        self.neighbors[i].iter().map(|&(_, w)| w)
    }

    /// `w_ij`, or 0 when `j` is not a neighbor of `i`.
    pub fn weight(&self, i: usize, j: usize) -> f64 {
        self.neighbors[i]
            .binary_search_by_key(&j, |&(k, _)| k)
            .map(|pos| self.neighbors[i][pos].1)
            .unwrap_or(0.0)
    }

    /// Number of neighbors of unit `i`.
    pub fn cardinality(&self, i: usize) -> usize {
        self.neighbors[i].len()
    }

    /// Number of directed links (`Σ_i cardinality(i)`).
    pub fn n_links(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum()
    }

    /// Number of undirected joins; meaningful for symmetric structures.
    pub fn n_joins(&self) -> usize {
        self.n_links() / 2
    }

    /// Units without any neighbor.
    pub fn islands(&self) -> Vec<usize> {
        (0..self.n_units)
            .filter(|&i| self.neighbors[i].is_empty())
            .collect()
    }

    /// `true` if every link `i -> j` has a reverse link `j -> i` of equal weight.
    pub fn is_symmetric(&self) -> bool {
        (0..self.n_units).all(|i| {
            self.neighbors[i]
                .iter()
                .all(|&(j, w)| (self.weight(j, i) - w).abs() <= 1e-12 * w.max(1.0))
        })
    }

    /// Sum of all weights.
    pub fn s0(&self) -> f64 {
        self.neighbors.iter().flatten().map(|&(_, w)| w).sum()
    }

    /// `S1 = ½ Σ_i Σ_j (w_ij + w_ji)²`.
    pub fn s1(&self) -> f64 {
        let mut s = 0.0;
        for i in 0..self.n_units {
            for &(j, w) in &self.neighbors[i] {
                let w_ji = self.weight(j, i);
                if w_ji > 0.0 {
                    // Visited once from each side.
                    s += 0.5 * (w + w_ji).powi(2);
                } else {
                    s += w * w;
                }
            }
        }
        s
    }

    /// `S2 = Σ_i (w_i. + w_.i)²`.
    pub fn s2(&self) -> f64 {
        let mut row = vec![0.0; self.n_units];
        let mut col = vec![0.0; self.n_units];
        for i in 0..self.n_units {
            for &(j, w) in &self.neighbors[i] {
                row[i] += w;
                col[j] += w;
            }
        }
        row.iter().zip(&col).map(|(r, c)| (r + c).powi(2)).sum()
    }

    /// Row-standardized copy: weights from each unit sum to 1. Islands stay
    /// empty.
    pub fn row_standardized(&self) -> Self {
        let neighbors = self
            .neighbors
            .iter()
            .map(|row| {
                let total: f64 = row.iter().map(|&(_, w)| w).sum();
                row.iter().map(|&(j, w)| (j, w / total)).collect()
            })
            .collect();
        Self {
            n_units: self.n_units,
            neighbors,
            transform: Transform::Row,
        }
    }

    /// Binary copy: every link gets weight 1.
    pub fn binary(&self) -> Self {
        let neighbors = self
            .neighbors
            .iter()
            .map(|row| row.iter().map(|&(j, _)| (j, 1.0)).collect())
            .collect();
        Self {
            n_units: self.n_units,
            neighbors,
            transform: Transform::Binary,
        }
    }

    /// Add the missing reverse link for every one-directional link, copying
    /// its weight.
    pub fn symmetrize(&self) -> Self {
        let mut neighbors = self.neighbors.clone();
        for i in 0..self.n_units {
            for &(j, w) in &self.neighbors[i] {
                if self.weight(j, i) == 0.0 && !neighbors[j].iter().any(|&(k, _)| k == i) {
                    neighbors[j].push((i, w));
                }
            }
        }
        for row in &mut neighbors {
            row.sort_by_key(|&(j, _)| j);
        }
        // Added links break the row sums.
        let transform = match self.transform {
            Transform::Row => Transform::Custom,
            other => other,
        };
        Self {
            n_units: self.n_units,
            neighbors,
            transform,
        }
    }

    /// Restrict to the units in `keep`, renumbered in the order given. Links
    /// to dropped units are removed; row-standardized weights are
    /// re-standardized over the remaining neighbors.
    ///
    /// # Errors
    ///
    /// Returns [`TesselError::Config`] for out-of-range or repeated indices.
    pub fn subset(&self, keep: &[usize]) -> Result<Self> {
        let mut new_index = vec![usize::MAX; self.n_units];
        for (new, &old) in keep.iter().enumerate() {
            if old >= self.n_units {
                return Err(TesselError::Config(format!(
                    "subset index {} out of range for {} units",
                    old, self.n_units
                )));
            }
            if new_index[old] != usize::MAX {
                return Err(TesselError::Config(format!("subset index {} repeated", old)));
            }
            new_index[old] = new;
        }

        Ok(self.restrict(keep, &new_index))
    }

    /// `new_index[old]` is the position of `old` in `keep`, or `usize::MAX`.
    fn restrict(&self, keep: &[usize], new_index: &[usize]) -> Self {
        let neighbors: Vec<Vec<(usize, f64)>> = keep
            .iter()
            .map(|&old| {
                let mut row: Vec<(usize, f64)> = self.neighbors[old]
                    .iter()
                    .filter(|&&(j, _)| new_index[j] != usize::MAX)
                    .map(|&(j, w)| (new_index[j], w))
                    .collect();
                row.sort_by_key(|&(j, _)| j);
                row
            })
            .collect();

        let subset = Self {
            n_units: keep.len(),
            neighbors,
            transform: self.transform,
        };
        match self.transform {
            Transform::Row => subset.row_standardized(),
            _ => subset,
        }
    }

    /// Drop every island. Returns the reduced weights and, for each remaining
    /// unit, its index in `self`. Dropping units can create new islands; call
    /// again if that matters.
    pub fn drop_islands(&self) -> (Self, Vec<usize>) {
        let keep: Vec<usize> = (0..self.n_units)
            .filter(|&i| !self.neighbors[i].is_empty())
            .collect();
        let dropped = self.n_units - keep.len();
        if dropped > 0 {
            log::warn!("dropping {} island(s) out of {} units", dropped, self.n_units);
        }
        let mut new_index = vec![usize::MAX; self.n_units];
        for (new, &old) in keep.iter().enumerate() {
            new_index[old] = new;
        }
        let reduced = self.restrict(&keep, &new_index);
        (reduced, keep)
    }

    /// Spatial lag `Σ_j w_ij x_j` for every unit.
    ///
    /// # Errors
    ///
    /// Returns [`TesselError::Config`] if `values.len() != self.n()`.
    pub fn lag(&self, values: &[f64]) -> Result<Vec<f64>> {
        self.check_len(values.len())?;
        Ok(self.lag_unchecked(values))
    }

    fn lag_unchecked(&self, values: &[f64]) -> Vec<f64> {
        self.neighbors
            .iter()
            .map(|row| row.iter().map(|&(j, w)| w * values[j]).sum())
            .collect()
    }

    /// Fail with [`TesselError::Config`] unless `len` matches the unit count.
    pub fn check_len(&self, len: usize) -> Result<()> {
        if len != self.n_units {
            return Err(TesselError::Config(format!(
                "values length ({}) does not match weights size ({})",
                len, self.n_units
            )));
        }
        Ok(())
    }

    /// Fail with [`TesselError::Data`] if any unit has no neighbors.
    pub fn ensure_no_islands(&self) -> Result<()> {
        let islands = self.islands();
        if !islands.is_empty() {
            let shown: Vec<String> = islands.iter().take(10).map(|i| i.to_string()).collect();
            return Err(TesselError::Data(format!(
                "{} unit(s) have no neighbors (first: {}); drop them before testing",
                islands.len(),
                shown.join(", ")
            )));
        }
        Ok(())
    }

    /// Common precondition of every statistic: matching length, finite
    /// values, at least 3 units, no islands.
    pub fn validate_values(&self, values: &[f64]) -> Result<()> {
        self.check_len(values.len())?;
        if self.n_units < 3 {
            return Err(TesselError::InvalidInput(format!(
                "need at least 3 units, got {}",
                self.n_units
            )));
        }
        ensure_finite(values, "values")?;
        self.ensure_no_islands()
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for SpatialWeights {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        struct Parts {
            n_units: usize,
            neighbors: Vec<Vec<(usize, f64)>>,
            transform: Transform,
        }

        let parts = Parts::deserialize(deserializer)?;
        Self::from_parts(parts.n_units, parts.neighbors, parts.transform)
            .map_err(serde::de::Error::custom)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_weights() -> impl Strategy<Value = SpatialWeights> {
        (2..20usize).prop_flat_map(|n| {
            proptest::collection::vec(proptest::collection::btree_set(0..n, 0..n), n).prop_map(
                move |rows| {
                    let neighbors = rows
                        .into_iter()
                        .enumerate()
                        .map(|(i, set)| set.into_iter().filter(|&j| j != i).collect())
                        .collect();
                    SpatialWeights::from_neighbors(neighbors).unwrap()
                },
            )
        })
    }

    proptest! {
        #[test]
        fn row_sums_are_one_or_zero(w in arb_weights()) {
            let r = w.row_standardized();
            for i in 0..r.n() {
                let total: f64 = r.weights(i).sum();
                if w.cardinality(i) == 0 {
                    prop_assert_eq!(total, 0.0);
                } else {
                    prop_assert!((total - 1.0).abs() < 1e-9);
                }
            }
        }

        #[test]
        fn symmetrize_is_symmetric(w in arb_weights()) {
            prop_assert!(w.symmetrize().is_symmetric());
        }
    }
}
