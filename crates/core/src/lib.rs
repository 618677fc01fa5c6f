//! `warden-core` — shared primitives for the authorization gate.
//!
//! This crate contains **pure** building blocks (no HTTP, no storage).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::UserId;
