//! Actix middleware: trace-id propagation with the request span, and
//! per-client rate limiting for the AI routes.

pub mod rate_limit;
pub mod trace;

pub use rate_limit::ClientRateLimit;
pub use trace::Trace;
