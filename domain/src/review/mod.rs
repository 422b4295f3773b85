//! Peer review vocabulary

pub mod outcome;

pub use outcome::{PeerReviewOutcome, ReviewStatus, WorkProduct, blend_quality};
