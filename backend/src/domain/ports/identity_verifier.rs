//! Driving port resolving a bearer credential to a stored user.
//!
//! Inbound adapters hand over the raw credential (or its absence) and receive
//! either the resolved user or an `unauthorized` domain error.

use async_trait::async_trait;

use crate::domain::{Error, User};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `credential` and load its subject.
    async fn verify<'a>(&self, credential: Option<&'a str>) -> Result<User, Error>;
}
