//! EDRR workflow concepts
//!
//! The four-phase workflow (Expand → Differentiate → Refine → Retrospect)
//! and the role rotation that picks a lead agent ("Primus") for each phase.

pub mod phase;
pub mod role;
pub mod role_assignor;

pub use phase::Phase;
pub use role::Role;
pub use role_assignor::RoleAssignor;
