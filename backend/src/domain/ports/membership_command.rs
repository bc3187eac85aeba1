//! Driving port for administrative user mutations.

use async_trait::async_trait;

use crate::domain::{Error, MembershipTier, User, UserId};

#[async_trait]
pub trait MembershipCommand: Send + Sync {
    /// Change `target`'s membership tier. `actor` must be an administrator.
    async fn set_membership(
        &self,
        actor: &User,
        target: &UserId,
        membership: MembershipTier,
    ) -> Result<User, Error>;

    /// Set or clear `target`'s verification flag. `actor` must be an
    /// administrator.
    async fn set_verification(
        &self,
        actor: &User,
        target: &UserId,
        is_verified: bool,
    ) -> Result<User, Error>;
}
