//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: domain-level errors
//! - [`text`]: small text helpers used by consensus and delegation

pub mod error;
pub mod text;
