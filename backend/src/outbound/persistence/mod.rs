//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL through `diesel-async` and a `bb8` pool.
//!
//! - Repository implementations only translate between rows and domain
//!   types. Quota policy lives in the domain; the store only provides the
//!   atomic count-and-insert it needs.
//! - Row structs (`models.rs`) and table definitions (`schema.rs`) are
//!   internal and never reach the domain.
//! - Database failures are mapped to the ports' typed errors.
//!
//! # Example
//!
//! ```rust,no_run
//! use careline::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/careline")).await?;
//! let users = DieselUserRepository::new(pool);
//! # let _ = users;
//! # Ok(())
//! # }
//! ```

mod diesel_basic_error_mapping;
mod diesel_metered_operation_repository;
mod diesel_user_repository;
mod models;
mod pool;
mod schema;

pub use diesel_metered_operation_repository::DieselMeteredOperationRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
