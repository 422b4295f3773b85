//! Peer review adapters

mod auto_approve;

pub use auto_approve::AutoApprovePeerReview;
