//! Seedable randomness sources

/// A PRNG handle that can be reset to a deterministic state
pub trait Seedable: Send + Sync {
    fn seed(&self, seed: u64);
}
