//! Shared primitives for the tessel spatial-analysis crates.
//!
//! - **Error types** — [`TesselError`] and [`Result`] for structured error handling
//! - **Traits** — [`Scored`] and [`Summarizable`] for result reporting
//! - **Randomness** — [`StreamSeed`], per-index ChaCha streams for
//!   reproducible permutation tests

pub mod error;
pub mod rng;
pub mod traits;

pub use error::{ensure_finite, Result, TesselError};
pub use rng::StreamSeed;
pub use traits::*;
