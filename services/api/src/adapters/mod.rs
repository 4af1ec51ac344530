//! services/api/src/adapters/mod.rs
//!
//! Declares the concrete implementations of the core service ports.

pub mod analysis;
pub mod passthrough;
pub mod store;
