//! Outbound adapters implementing the driven ports.
//!
//! - [`persistence`]: PostgreSQL via Diesel and `diesel-async`.
//! - [`memory`]: process-local stores used when no database is configured.
//! - [`gemini`]: HTTP completion source for the AI operations.
//! - [`tokens`]: bearer credential signing and verification.

pub mod gemini;
pub mod memory;
pub mod persistence;
pub mod tokens;
