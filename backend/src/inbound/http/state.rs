//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{IdentityVerifier, MembershipCommand, MeteredAiCommand, UsageQuery};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub identity: Arc<dyn IdentityVerifier>,
    pub metered_ai: Arc<dyn MeteredAiCommand>,
    pub usage: Arc<dyn UsageQuery>,
    pub membership: Arc<dyn MembershipCommand>,
}

impl HttpState {
    /// Bundle the driving ports.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use careline::domain::ports::{
    ///     IdentityVerifier, MembershipCommand, MeteredAiCommand, UsageQuery,
    /// };
    /// use careline::inbound::http::state::HttpState;
    ///
    /// fn wire(
    ///     identity: Arc<dyn IdentityVerifier>,
    ///     metered_ai: Arc<dyn MeteredAiCommand>,
    ///     usage: Arc<dyn UsageQuery>,
    ///     membership: Arc<dyn MembershipCommand>,
    /// ) -> HttpState {
    ///     HttpState::new(identity, metered_ai, usage, membership)
    /// }
    /// ```
    pub fn new(
        identity: Arc<dyn IdentityVerifier>,
        metered_ai: Arc<dyn MeteredAiCommand>,
        usage: Arc<dyn UsageQuery>,
        membership: Arc<dyn MembershipCommand>,
    ) -> Self {
        Self {
            identity,
            metered_ai,
            usage,
            membership,
        }
    }
}
