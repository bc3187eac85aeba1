//! Careline backend: metered access control for AI-assisted healthcare
//! operations.
//!
//! Layout follows the hexagonal split: [`domain`] holds the types, services,
//! and ports; [`inbound`] adapts HTTP onto the driving ports; [`outbound`]
//! implements the driven ports against PostgreSQL, memory, Gemini, and JWT.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
