//! Builders for the HTTP state from configured adapters.

use std::sync::Arc;

use actix_web::web;
use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use careline::domain::ports::{
    AccessTokenCodec, AiCompletionError, AiCompletionSource, CompletionRequest,
    MeteredOperationRepository, UnconfiguredAiSource, UserRepository,
};
use careline::domain::{
    BearerIdentityVerifier, MembershipService, MeteredAiService, QuotaPolicy, UsageService,
};
use careline::inbound::http::state::HttpState;
use careline::outbound::gemini::{GeminiHttpSource, GeminiSetupError};
use careline::outbound::memory::{InMemoryMeteredOperationRepository, InMemoryUserRepository};
use careline::outbound::persistence::{DieselMeteredOperationRepository, DieselUserRepository};
use careline::outbound::tokens::JwtAccessTokenCodec;

use super::ServerConfig;
use super::settings::AiSettings;

/// AI source selected at startup.
pub(super) enum ConfiguredAiSource {
    Gemini(GeminiHttpSource),
    Unconfigured(UnconfiguredAiSource),
}

#[async_trait]
impl AiCompletionSource for ConfiguredAiSource {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AiCompletionError> {
        match self {
            Self::Gemini(source) => source.complete(request).await,
            Self::Unconfigured(source) => source.complete(request).await,
        }
    }
}

/// Choose the Gemini adapter when a key is configured.
pub(super) fn build_ai_source(
    settings: Option<&AiSettings>,
) -> Result<ConfiguredAiSource, GeminiSetupError> {
    match settings {
        Some(ai) => {
            info!(model = %ai.model, endpoint = %ai.endpoint, "using Gemini AI provider");
            GeminiHttpSource::new(&ai.endpoint, &ai.model, ai.api_key.clone(), ai.timeout)
                .map(ConfiguredAiSource::Gemini)
        }
        None => {
            info!("no AI provider key configured; serving local fallback results");
            Ok(ConfiguredAiSource::Unconfigured(UnconfiguredAiSource))
        }
    }
}

/// Shared collaborators that do not depend on the storage backend.
struct Collaborators<C, A> {
    codec: Arc<C>,
    ai: Arc<A>,
    policy: QuotaPolicy,
    clock: Arc<dyn Clock>,
}

fn assemble<C, U, O, A>(
    collaborators: Collaborators<C, A>,
    users: Arc<U>,
    operations: Arc<O>,
) -> HttpState
where
    C: AccessTokenCodec + 'static,
    U: UserRepository + 'static,
    O: MeteredOperationRepository + 'static,
    A: AiCompletionSource + 'static,
{
    let Collaborators {
        codec,
        ai,
        policy,
        clock,
    } = collaborators;
    HttpState::new(
        Arc::new(BearerIdentityVerifier::new(
            codec,
            Arc::clone(&users),
            Arc::clone(&clock),
        )),
        Arc::new(MeteredAiService::new(
            Arc::clone(&operations),
            ai,
            policy,
            Arc::clone(&clock),
        )),
        Arc::new(UsageService::new(operations, policy, clock)),
        Arc::new(MembershipService::new(users)),
    )
}

/// Build the shared HTTP state.
///
/// Uses the Diesel repositories when a pool is configured, otherwise the
/// in-memory stores.
///
/// # Errors
/// Returns [`std::io::Error`] when the AI HTTP client cannot be built.
pub(super) fn build_http_state(config: &ServerConfig) -> std::io::Result<web::Data<HttpState>> {
    let ai = build_ai_source(config.ai.as_ref())
        .map_err(|err| std::io::Error::other(format!("AI provider setup failed: {err}")))?;
    let collaborators = Collaborators {
        codec: Arc::new(JwtAccessTokenCodec::new(&config.jwt_secret, config.token_ttl)),
        ai: Arc::new(ai),
        policy: config.quota_policy,
        clock: Arc::clone(&config.clock),
    };

    let state = match &config.db_pool {
        Some(pool) => assemble(
            collaborators,
            Arc::new(DieselUserRepository::new(pool.clone())),
            Arc::new(DieselMeteredOperationRepository::new(pool.clone())),
        ),
        None => {
            info!("no database configured; using in-memory stores");
            assemble(
                collaborators,
                Arc::new(InMemoryUserRepository::default()),
                Arc::new(InMemoryMeteredOperationRepository::default()),
            )
        }
    };
    Ok(web::Data::new(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use careline::domain::{ErrorCode, MembershipTier, Role, User, UserId};
    use mockable::DefaultClock;
    use rstest::rstest;
    use zeroize::Zeroizing;

    use crate::server::settings::{BuildMode, ServerSettings};

    fn in_memory_config() -> ServerConfig {
        let settings = ServerSettings {
            bind_addr: "127.0.0.1:0".to_owned(),
            jwt_secret: Some("state-builder-secret".to_owned()),
            free_tier_monthly_limit: Some(2),
            ..ServerSettings::unconfigured()
        };
        ServerConfig::from_settings(settings.resolve(BuildMode::Debug).expect("resolves"))
    }

    #[rstest]
    fn missing_key_selects_unconfigured_source() {
        let source = build_ai_source(None).expect("builds");
        assert!(matches!(source, ConfiguredAiSource::Unconfigured(_)));
    }

    #[rstest]
    fn configured_key_selects_gemini() {
        let settings = AiSettings {
            api_key: Zeroizing::new("key".to_owned()),
            endpoint: "https://ai.example.test/v1beta".parse().expect("url"),
            model: "test-model".to_owned(),
            timeout: Duration::from_secs(1),
        };
        let source = build_ai_source(Some(&settings)).expect("builds");
        assert!(matches!(source, ConfiguredAiSource::Gemini(_)));
    }

    #[rstest]
    #[tokio::test]
    async fn unconfigured_source_reports_unconfigured() {
        let source = ConfiguredAiSource::Unconfigured(UnconfiguredAiSource);
        let err = source
            .complete(&CompletionRequest {
                prompt: "hello".to_owned(),
                image_url: None,
            })
            .await
            .expect_err("unconfigured");
        assert!(matches!(err, AiCompletionError::Unconfigured));
    }

    #[rstest]
    #[tokio::test]
    async fn in_memory_state_rejects_unknown_subjects() {
        let config = in_memory_config();
        let state = build_http_state(&config).expect("state builds");
        let codec = JwtAccessTokenCodec::new(&config.jwt_secret, config.token_ttl);
        let stranger = User::builder(UserId::random(), Role::Patient)
            .email("stranger@example.test")
            .membership(MembershipTier::Free)
            .build();
        let now = DefaultClock.utc();
        let token = codec.issue(stranger.id(), now).expect("token");

        let err = state
            .identity
            .verify(Some(token.as_str()))
            .await
            .expect_err("store is empty");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }
}
