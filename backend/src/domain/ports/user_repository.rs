//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{MembershipTier, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Point lookup by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Insert or replace a user record.
    async fn upsert(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Change the membership tier; `None` when no such user exists.
    async fn set_membership(
        &self,
        id: &UserId,
        membership: MembershipTier,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Change the verification flag; `None` when no such user exists.
    async fn set_verification(
        &self,
        id: &UserId,
        is_verified: bool,
    ) -> Result<Option<User>, UserPersistenceError>;
}
