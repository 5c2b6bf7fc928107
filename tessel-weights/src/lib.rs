//! Spatial weights for the tessel crates.
//!
//! - [`SpatialWeights`] — validated sparse neighbor structure with binary,
//!   row-standardized or custom weights, spatial lag and the `S0`/`S1`/`S2`
//!   sums used by the analytical moments
//! - [`lattice`], [`knn`], [`distance_band`] — builders for grids and point sets
//!
//! ```
//! use tessel_weights::{lattice, Contiguity};
//!
//! let w = lattice(3, 3, Contiguity::Rook).unwrap().row_standardized();
//! let lag = w.lag(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]).unwrap();
//! assert_eq!(lag[4], 5.0);
//! ```

pub mod builders;
pub mod weights;

pub use builders::{distance_band, knn, lattice, Contiguity, Point};
pub use weights::{SpatialWeights, Transform};
