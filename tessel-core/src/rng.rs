//! Seedable random streams for permutation inference.
//!
//! Every permutation trial (or every focal unit of a local statistic) draws
//! from its own ChaCha stream selected by index. A run is therefore fully
//! determined by `(seed, index)` and does not depend on the order in which
//! trials are evaluated, which keeps sequential and parallel runs identical.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Factory for independent, reproducible random streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamSeed {
    seed: u64,
}

impl StreamSeed {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generator for stream `index`.
    pub fn stream(&self, index: u64) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(index);
        rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn same_stream_same_draws() {
        let s = StreamSeed::new(7);
        let mut r1 = s.stream(3);
        let mut r2 = s.stream(3);
        let a: Vec<u64> = (0..8).map(|_| r1.gen()).collect();
        let b: Vec<u64> = (0..8).map(|_| r2.gen()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn streams_differ() {
        let s = StreamSeed::new(7);
        let a: u64 = s.stream(0).gen();
        let b: u64 = s.stream(1).gen();
        assert_ne!(a, b);
        let c: u64 = StreamSeed::new(8).stream(0).gen();
        assert_ne!(a, c);
    }
}
