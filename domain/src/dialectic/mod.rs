//! Thesis / antithesis / synthesis exchange
//!
//! [`DialecticalSequence`] is what one reasoning-loop iteration produces.

pub mod sequence;

pub use sequence::{DialecticalSequence, SequenceStatus};
