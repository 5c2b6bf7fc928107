//! Weights builders for geometry-free inputs: regular lattices and point
//! sets. Polygon contiguity is computed elsewhere and handed over through
//! [`SpatialWeights::from_neighbors`].

use tessel_core::{Result, TesselError};

use crate::SpatialWeights;

/// A 2-D point (projected coordinates).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Contiguity rule for lattices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Contiguity {
    /// Cells sharing an edge.
    Rook,
    /// Cells sharing an edge or a corner.
    Queen,
}

/// Binary contiguity weights for a `rows × cols` grid in row-major order
/// (cell `(r, c)` has index `r * cols + c`).
///
/// # Errors
///
/// Returns an error if the grid has fewer than 2 cells.
pub fn lattice(rows: usize, cols: usize, contiguity: Contiguity) -> Result<SpatialWeights> {
    if rows * cols < 2 {
        return Err(TesselError::InvalidInput(format!(
            "lattice needs at least 2 cells, got {}x{}",
            rows, cols
        )));
    }

    let offsets: &[(isize, isize)] = match contiguity {
        Contiguity::Rook => &[(-1, 0), (0, -1), (0, 1), (1, 0)],
        Contiguity::Queen => &[
            (-1, -1),
            (-1, 0),
            (-1, 1),
            (0, -1),
            (0, 1),
            (1, -1),
            (1, 0),
            (1, 1),
        ],
    };

    let mut neighbors = Vec::with_capacity(rows * cols);
    for r in 0..rows as isize {
        for c in 0..cols as isize {
            let row: Vec<usize> = offsets
                .iter()
                .map(|&(dr, dc)| (r + dr, c + dc))
                .filter(|&(nr, nc)| nr >= 0 && nc >= 0 && nr < rows as isize && nc < cols as isize)
                .map(|(nr, nc)| nr as usize * cols + nc as usize)
                .collect();
            neighbors.push(row);
        }
    }
    SpatialWeights::from_neighbors(neighbors)
}

fn check_points(points: &[Point]) -> Result<()> {
    if let Some(i) = points
        .iter()
        .position(|p| !p.x.is_finite() || !p.y.is_finite())
    {
        return Err(TesselError::Data(format!("point {} has non-finite coordinates", i)));
    }
    Ok(())
}

/// k-nearest-neighbor weights (binary, generally asymmetric; see
/// [`SpatialWeights::symmetrize`]). Ties are broken by index.
///
/// # Errors
///
/// Returns an error if `k` is 0 or `k >= points.len()`.
pub fn knn(points: &[Point], k: usize) -> Result<SpatialWeights> {
    let n = points.len();
    if k == 0 {
        return Err(TesselError::Config("k must be >= 1".into()));
    }
    if k >= n {
        return Err(TesselError::Config(format!(
            "k ({}) must be less than number of points ({})",
            k, n
        )));
    }
    check_points(points)?;

    let neighbors = (0..n)
        .map(|i| {
            let mut dists: Vec<(usize, f64)> = (0..n)
                .filter(|&j| j != i)
                .map(|j| (j, points[i].distance(&points[j])))
                .collect();
            dists.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
            dists.truncate(k);
            dists.into_iter().map(|(j, _)| j).collect()
        })
        .collect();
    SpatialWeights::from_neighbors(neighbors)
}

/// Binary weights linking every pair of points at distance `<= threshold`.
/// The result is symmetric; points farther than `threshold` from everything
/// become islands.
///
/// # Errors
///
/// Returns an error if `threshold` is not finite and positive.
pub fn distance_band(points: &[Point], threshold: f64) -> Result<SpatialWeights> {
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(TesselError::Config(format!(
            "distance threshold must be finite and positive, got {}",
            threshold
        )));
    }
    check_points(points)?;

    let n = points.len();
    let mut neighbors = vec![Vec::new(); n];
    for i in 0..n {
        for j in (i + 1)..n {
            if points[i].distance(&points[j]) <= threshold {
                neighbors[i].push(j);
                neighbors[j].push(i);
            }
        }
    }
    SpatialWeights::from_neighbors(neighbors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rook_lattice_counts() {
        let w = lattice(3, 3, Contiguity::Rook).unwrap();
        assert_eq!(w.n(), 9);
        assert_eq!(w.cardinality(0), 2);
        assert_eq!(w.cardinality(1), 3);
        assert_eq!(w.cardinality(4), 4);
        // 2 * 3 * 2 undirected edges.
        assert_eq!(w.n_links() / 2, 12);
        assert!(w.is_symmetric());
    }

    #[test]
    fn queen_lattice_counts() {
        let w = lattice(9, 9, Contiguity::Queen).unwrap();
        assert_eq!(w.cardinality(0), 3);
        assert_eq!(w.cardinality(40), 8);
        // 72 horizontal + 72 vertical + 128 diagonal.
        assert_eq!(w.n_links() / 2, 272);
        assert!(w.is_symmetric());
        assert!(w.islands().is_empty());
    }

    #[test]
    fn lattice_rejects_single_cell() {
        assert!(lattice(1, 1, Contiguity::Rook).is_err());
        let line = lattice(1, 4, Contiguity::Queen).unwrap();
        assert_eq!(line.neighbors(1).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn knn_picks_closest() {
        let pts: Vec<Point> = (0..5).map(|i| Point::new(i as f64, 0.0)).collect();
        let w = knn(&pts, 2).unwrap();
        for i in 0..w.n() {
            assert_eq!(w.cardinality(i), 2);
        }
        assert_eq!(w.neighbors(0).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(w.neighbors(2).collect::<Vec<_>>(), vec![1, 3]);
        // 0 -> 2 but 2 does not pick 0.
        assert!(!w.is_symmetric());
        assert!(w.symmetrize().is_symmetric());
    }

    #[test]
    fn knn_invalid_k() {
        let pts = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        assert!(knn(&pts, 0).is_err());
        assert!(knn(&pts, 2).is_err());
    }

    #[test]
    fn distance_band_links_within_threshold() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(10.0, 0.0),
        ];
        let w = distance_band(&pts, 1.0).unwrap();
        assert_eq!(w.neighbors(1).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(w.islands(), vec![3]);
        assert!(w.is_symmetric());
        assert!(distance_band(&pts, 0.0).is_err());
        assert!(distance_band(&[Point::new(f64::NAN, 0.0)], 1.0).is_err());
    }
}
