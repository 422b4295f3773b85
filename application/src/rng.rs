//! Shared, seedable PRNG handles
//!
//! A [`Team`](crate::team::Team) owns two handles: a general one (tie-break
//! picks, reasoner choices) and a numeric one (sampling). Both implement
//! [`Seedable`] so a reasoning run can be made reproducible.

use crate::ports::seed::Seedable;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub struct SharedRng {
    name: &'static str,
    rng: Mutex<StdRng>,
}

impl SharedRng {
    pub fn from_entropy(name: &'static str) -> Self {
        Self {
            name,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(name: &'static str, seed: u64) -> Self {
        Self {
            name,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run `f` with exclusive access to the generator
    pub fn with_rng<T>(&self, f: impl FnOnce(&mut dyn RngCore) -> T) -> T {
        let mut guard = self.lock();
        f(&mut *guard)
    }

    pub fn next_u64(&self) -> u64 {
        self.lock().next_u64()
    }

    /// Uniform float in `[0, 1)`
    pub fn next_f64(&self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    // A panic while holding the lock leaves the generator usable.
    fn lock(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Seedable for SharedRng {
    fn seed(&self, seed: u64) {
        *self.lock() = StdRng::seed_from_u64(seed);
    }
}

impl std::fmt::Debug for SharedRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRng").field("name", &self.name).finish()
    }
}
