//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use zeroize::Zeroizing;

use careline::domain::QuotaPolicy;
use careline::middleware::ClientRateLimit;
use careline::outbound::persistence::DbPool;

use super::settings::{AiSettings, ResolvedSettings};

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) jwt_secret: Zeroizing<Vec<u8>>,
    pub(crate) token_ttl: chrono::Duration,
    pub(crate) quota_policy: QuotaPolicy,
    pub(crate) ai: Option<AiSettings>,
    pub(crate) ai_rate_limit: ClientRateLimit,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Construct a server configuration from resolved settings.
    ///
    /// The database URL is not consumed here; the caller builds the pool and
    /// attaches it with [`ServerConfig::with_db_pool`].
    #[must_use]
    pub fn from_settings(settings: ResolvedSettings) -> Self {
        Self {
            bind_addr: settings.bind_addr,
            jwt_secret: settings.jwt_secret,
            token_ttl: settings.token_ttl,
            quota_policy: QuotaPolicy::new(settings.free_tier_monthly_limit),
            ai: settings.ai,
            ai_rate_limit: settings
                .ai_rate_limit
                .and_then(|limit| ClientRateLimit::new(limit.burst, limit.replenish_every))
                .unwrap_or_default(),
            clock: Arc::new(DefaultClock),
            db_pool: None,
        }
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// Without one the server keeps users and operation records in memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
