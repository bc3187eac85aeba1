//! In-process adapters for running without PostgreSQL.
//!
//! Used when no database URL is configured and by integration tests. They
//! implement the same ports, including the atomic reservation, so the
//! domain behaves identically on either backend.

mod metered_operation_repository;
mod user_repository;

pub use metered_operation_repository::InMemoryMeteredOperationRepository;
pub use user_repository::InMemoryUserRepository;
