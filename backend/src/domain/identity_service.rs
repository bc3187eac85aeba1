//! Bearer credential verification backed by the user repository.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::debug;

use crate::domain::persistence_error_mapping::map_user_repository_error;
use crate::domain::ports::{AccessTokenCodec, IdentityVerifier, UserRepository};
use crate::domain::{AccessDenial, Error, User};

/// Verifies the credential signature and expiry, then loads the subject.
#[derive(Clone)]
pub struct BearerIdentityVerifier<C, R> {
    codec: Arc<C>,
    users: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<C, R> BearerIdentityVerifier<C, R> {
    pub fn new(codec: Arc<C>, users: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            codec,
            users,
            clock,
        }
    }
}

#[async_trait]
impl<C, R> IdentityVerifier for BearerIdentityVerifier<C, R>
where
    C: AccessTokenCodec + 'static,
    R: UserRepository + 'static,
{
    async fn verify<'a>(&self, credential: Option<&'a str>) -> Result<User, Error> {
        let token = credential
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AccessDenial::Unauthenticated)?;

        let claims = self
            .codec
            .verify(token, self.clock.utc())
            .map_err(|err| {
                debug!(error = %err, "bearer credential rejected");
                AccessDenial::InvalidCredential
            })?;

        self.users
            .find_by_id(&claims.subject)
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(|| AccessDenial::UnknownSubject.into())
    }
}
