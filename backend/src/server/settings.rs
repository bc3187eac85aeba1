//! Process settings loaded once at startup via OrthoConfig.
//!
//! Sources, lowest precedence first: configuration file, `CARELINE_*`
//! environment variables, command-line flags. Components receive the
//! resolved values at construction and never read the environment again.

use std::fmt;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use careline::domain::DEFAULT_FREE_TIER_LIMIT;
use careline::outbound::gemini::{DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;
const DEFAULT_AI_TIMEOUT_SECS: u64 = 20;
const DEFAULT_AI_RATE_LIMIT_BURST: u32 = 10;
const DEFAULT_AI_RATE_LIMIT_REPLENISH_SECS: u64 = 6;
const DEVELOPMENT_JWT_SECRET: &str = "careline-development-secret-do-not-deploy";
const JWT_SECRET_MIN_LEN: usize = 32;

/// Build mode deciding how strictly secrets are validated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Missing secrets fall back to development values with a warning.
    Debug,
    /// Missing or weak secrets abort startup.
    Release,
}

impl BuildMode {
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }
}

/// Errors raised while resolving settings.
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(String),
    #[error("invalid bind address '{value}': {message}")]
    BindAddr { value: String, message: String },
    #[error("invalid AI endpoint '{value}': {message}")]
    AiEndpoint { value: String, message: String },
    #[error("CARELINE_AI_RATE_LIMIT_REPLENISH_SECS must be positive while the limit is enabled")]
    RateLimitInterval,
    #[error("CARELINE_JWT_SECRET is required in release builds")]
    MissingJwtSecret,
    #[error("CARELINE_JWT_SECRET too short: need >= {min_len} bytes, got {length}")]
    WeakJwtSecret { length: usize, min_len: usize },
}

/// Raw settings as read from the configuration sources.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CARELINE")]
pub struct ServerSettings {
    /// Socket address to listen on.
    #[ortho_config(default = DEFAULT_BIND_ADDR.to_owned())]
    pub bind_addr: String,
    /// PostgreSQL URL; in-memory stores are used when absent.
    pub database_url: Option<String>,
    /// HS256 signing secret for bearer credentials.
    pub jwt_secret: Option<String>,
    /// Lifetime of issued credentials, in seconds.
    pub token_ttl_secs: Option<u64>,
    /// Gemini API key; the local fallback answers when absent.
    pub ai_api_key: Option<String>,
    pub ai_endpoint: Option<String>,
    pub ai_model: Option<String>,
    /// Upper bound on one AI call, in seconds.
    pub ai_timeout_secs: Option<u64>,
    /// Monthly allowance per metered kind for free members.
    pub free_tier_monthly_limit: Option<u32>,
    /// AI requests one client may send at once; `0` disables the limit.
    pub ai_rate_limit_burst: Option<u32>,
    /// Seconds for one spent AI request to be restored to a client.
    pub ai_rate_limit_replenish_secs: Option<u64>,
}

impl ServerSettings {
    /// Settings with nothing configured beyond the default bind address.
    #[cfg(test)]
    pub(crate) fn unconfigured() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_owned(),
            database_url: None,
            jwt_secret: None,
            token_ttl_secs: None,
            ai_api_key: None,
            ai_endpoint: None,
            ai_model: None,
            ai_timeout_secs: None,
            free_tier_monthly_limit: None,
            ai_rate_limit_burst: None,
            ai_rate_limit_replenish_secs: None,
        }
    }
}

impl fmt::Debug for ServerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |secret: &Option<String>| secret.as_ref().map(|_| "<redacted>");
        f.debug_struct("ServerSettings")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("jwt_secret", &redact(&self.jwt_secret))
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("ai_api_key", &redact(&self.ai_api_key))
            .field("ai_endpoint", &self.ai_endpoint)
            .field("ai_model", &self.ai_model)
            .field("ai_timeout_secs", &self.ai_timeout_secs)
            .field("free_tier_monthly_limit", &self.free_tier_monthly_limit)
            .field("ai_rate_limit_burst", &self.ai_rate_limit_burst)
            .field("ai_rate_limit_replenish_secs", &self.ai_rate_limit_replenish_secs)
            .finish()
    }
}

/// Settings with defaults applied and secrets validated.
pub struct ResolvedSettings {
    pub bind_addr: SocketAddr,
    pub database_url: Option<Zeroizing<String>>,
    pub jwt_secret: Zeroizing<Vec<u8>>,
    /// Whether the development secret stands in for a configured one.
    pub jwt_secret_is_default: bool,
    pub token_ttl: chrono::Duration,
    pub ai: Option<AiSettings>,
    pub free_tier_monthly_limit: u32,
    /// Per-client AI request limit; `None` when disabled.
    pub ai_rate_limit: Option<RateLimitSettings>,
}

/// Burst and replenish interval of the per-client AI request limit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RateLimitSettings {
    pub burst: NonZeroU32,
    pub replenish_every: Duration,
}

/// Gemini connection settings, present only when a key is configured.
pub struct AiSettings {
    pub api_key: Zeroizing<String>,
    pub endpoint: Url,
    pub model: String,
    pub timeout: Duration,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|raw| !raw.trim().is_empty())
}

impl ServerSettings {
    /// Load from the process arguments, environment, and configuration file.
    pub fn load_from_process() -> Result<Self, SettingsError> {
        Self::load().map_err(|err| SettingsError::Load(err.to_string()))
    }

    /// Apply defaults and validate for `mode`.
    pub fn resolve(self, mode: BuildMode) -> Result<ResolvedSettings, SettingsError> {
        let bind_addr = self
            .bind_addr
            .trim()
            .parse::<SocketAddr>()
            .map_err(|err| SettingsError::BindAddr {
                message: err.to_string(),
                value: self.bind_addr.clone(),
            })?;

        let (jwt_secret, jwt_secret_is_default) = match non_blank(self.jwt_secret) {
            Some(secret) => {
                let secret = Zeroizing::new(secret.into_bytes());
                if mode == BuildMode::Release && secret.len() < JWT_SECRET_MIN_LEN {
                    return Err(SettingsError::WeakJwtSecret {
                        length: secret.len(),
                        min_len: JWT_SECRET_MIN_LEN,
                    });
                }
                (secret, false)
            }
            None if mode == BuildMode::Release => return Err(SettingsError::MissingJwtSecret),
            None => (
                Zeroizing::new(DEVELOPMENT_JWT_SECRET.as_bytes().to_vec()),
                true,
            ),
        };

        let ttl_secs = self.token_ttl_secs.unwrap_or(DEFAULT_TOKEN_TTL_SECS);
        let token_ttl = chrono::Duration::seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX));

        let ai = match non_blank(self.ai_api_key) {
            Some(key) => {
                let endpoint_raw = self
                    .ai_endpoint
                    .unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.to_owned());
                let endpoint =
                    Url::parse(&endpoint_raw).map_err(|err| SettingsError::AiEndpoint {
                        message: err.to_string(),
                        value: endpoint_raw.clone(),
                    })?;
                Some(AiSettings {
                    api_key: Zeroizing::new(key),
                    endpoint,
                    model: non_blank(self.ai_model)
                        .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_owned()),
                    timeout: Duration::from_secs(
                        self.ai_timeout_secs.unwrap_or(DEFAULT_AI_TIMEOUT_SECS),
                    ),
                })
            }
            None => None,
        };

        let ai_rate_limit = match NonZeroU32::new(
            self.ai_rate_limit_burst
                .unwrap_or(DEFAULT_AI_RATE_LIMIT_BURST),
        ) {
            Some(burst) => {
                let secs = self
                    .ai_rate_limit_replenish_secs
                    .unwrap_or(DEFAULT_AI_RATE_LIMIT_REPLENISH_SECS);
                if secs == 0 {
                    return Err(SettingsError::RateLimitInterval);
                }
                Some(RateLimitSettings {
                    burst,
                    replenish_every: Duration::from_secs(secs),
                })
            }
            None => None,
        };

        Ok(ResolvedSettings {
            bind_addr,
            database_url: non_blank(self.database_url).map(Zeroizing::new),
            jwt_secret,
            jwt_secret_is_default,
            token_ttl,
            ai,
            free_tier_monthly_limit: self
                .free_tier_monthly_limit
                .unwrap_or(DEFAULT_FREE_TIER_LIMIT),
            ai_rate_limit,
        })
    }
}
