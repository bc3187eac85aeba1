//! Full HTTP stack over in-memory adapters.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use zeroize::Zeroizing;

use crate::Trace;
use crate::domain::ports::{AccessTokenCodec, UserRepository};
use crate::domain::{
    BearerIdentityVerifier, MembershipService, MeteredAiService, QuotaPolicy, UsageService, User,
};
use crate::inbound::http::api_scope;
use crate::inbound::http::state::HttpState;
use crate::outbound::memory::{InMemoryMeteredOperationRepository, InMemoryUserRepository};
use crate::outbound::tokens::JwtAccessTokenCodec;

use super::{MutableClock, ScriptedAiSource};

/// Signing secret shared by the harness codec and tests that mint tokens.
pub const TEST_JWT_SECRET: &[u8] = b"careline-test-secret";

/// Wires the real services to in-memory stores, a scripted AI source, and a
/// controllable clock.
pub struct TestHarness {
    pub users: Arc<InMemoryUserRepository>,
    pub operations: Arc<InMemoryMeteredOperationRepository>,
    pub ai: Arc<ScriptedAiSource>,
    pub clock: Arc<MutableClock>,
    codec: Arc<JwtAccessTokenCodec>,
    policy: QuotaPolicy,
}

impl TestHarness {
    pub fn new(ai: ScriptedAiSource, now: DateTime<Utc>) -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::default()),
            operations: Arc::new(InMemoryMeteredOperationRepository::default()),
            ai: Arc::new(ai),
            clock: Arc::new(MutableClock::new(now)),
            codec: Arc::new(JwtAccessTokenCodec::new(
                &Zeroizing::new(TEST_JWT_SECRET.to_vec()),
                Duration::days(30),
            )),
            policy: QuotaPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_free_tier_limit(mut self, limit: u32) -> Self {
        self.policy = QuotaPolicy::new(limit);
        self
    }

    /// Store `user` so credentials naming it resolve.
    pub async fn register(&self, user: User) -> User {
        if let Err(err) = self.users.upsert(&user).await {
            panic!("registering test user failed: {err}");
        }
        user
    }

    /// `Authorization` header value for `user`, issued at the clock's now.
    pub fn bearer_for(&self, user: &User) -> String {
        match self.codec.issue(user.id(), self.clock.utc()) {
            Ok(token) => format!("Bearer {token}"),
            Err(err) => panic!("issuing test token failed: {err}"),
        }
    }

    pub fn http_state(&self) -> HttpState {
        let clock: Arc<dyn Clock> = self.clock.clone();
        HttpState::new(
            Arc::new(BearerIdentityVerifier::new(
                Arc::clone(&self.codec),
                Arc::clone(&self.users),
                Arc::clone(&clock),
            )),
            Arc::new(MeteredAiService::new(
                Arc::clone(&self.operations),
                Arc::clone(&self.ai),
                self.policy,
                Arc::clone(&clock),
            )),
            Arc::new(UsageService::new(
                Arc::clone(&self.operations),
                self.policy,
                clock,
            )),
            Arc::new(MembershipService::new(Arc::clone(&self.users))),
        )
    }

    /// App with the trace middleware and the versioned API scope.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(web::Data::new(self.http_state()))
            .wrap(Trace)
            .service(api_scope())
    }
}
