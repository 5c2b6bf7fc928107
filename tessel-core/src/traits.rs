//! Core trait definitions shared by the tessel crates.

/// A type that carries a numeric score (statistic value, p-value, ...).
pub trait Scored {
    /// The score value.
    fn score(&self) -> f64;
}

/// A type that can produce a summary of its contents.
pub trait Summarizable {
    /// A one-line summary suitable for display.
    fn summary(&self) -> String;
}
