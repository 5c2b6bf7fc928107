//! Exploratory spatial data analysis for the tessel crates.
//!
//! Every statistic is tested against a permutation null: values are
//! relabeled across units while the weights stay fixed, and the observed
//! statistic is ranked within the simulated distribution.
//!
//! - **Join counts** — [`join_counts`], [`join_counts_test`] for binary labels
//! - **Moran's I** — [`morans_i`], [`moran_test`] with analytical and
//!   permutation inference
//! - **Local Moran** — [`local_moran`] with conditional permutation and
//!   scatterplot quadrants
//! - **Geary's C** and **Getis–Ord General G** — [`geary_test`], [`getis_ord_test`]
//! - **Permutation engine** — [`PermutationConfig`], [`permutation_test`],
//!   [`pseudo_p_value`]
//!
//! # Quick start
//!
//! ```
//! use tessel_esda::{moran_test, PermutationConfig};
//! use tessel_weights::{lattice, Contiguity};
//!
//! let w = lattice(4, 4, Contiguity::Rook).unwrap().row_standardized();
//! let values = [
//!     10.0, 10.0, 9.0, 9.0, 10.0, 10.0, 9.0, 9.0,
//!     1.0, 1.0, 2.0, 2.0, 1.0, 1.0, 2.0, 2.0,
//! ];
//! let test = moran_test(&values, &w, &PermutationConfig::default()).unwrap();
//! assert!(test.i > test.expected);
//! assert!(test.permutation.p_value < 0.05);
//! ```

pub mod descriptive;
pub mod distribution;
pub mod geary;
pub mod getis_ord;
pub mod join_counts;
pub mod local_moran;
pub mod moran;
pub mod permutation;

pub use descriptive::{mean, median, median_split};
pub use distribution::AnalyticalMoments;
pub use geary::{geary_test, gearys_c, GearyTest};
pub use getis_ord::{general_g, getis_ord_test, GetisOrdTest};
pub use join_counts::{join_counts, join_counts_test, JoinCountTest, JoinCounts};
pub use local_moran::{local_moran, local_morans_i, LocalMoran, Quadrant};
pub use moran::{moran_test, morans_i, MoranTest};
pub use permutation::{
    permutation_test, pseudo_p_value, simulate, Alternative, PermutationConfig, PermutationTest,
};
