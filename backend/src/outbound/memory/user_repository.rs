//! `UserRepository` over a map guarded by an async mutex.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{MembershipTier, User, UserId};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    /// Repository pre-populated with `users`.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: Mutex::new(
                users
                    .into_iter()
                    .map(|user| (user.id().clone(), user))
                    .collect(),
            ),
        }
    }

    async fn update(
        &self,
        id: &UserId,
        change: impl FnOnce(User) -> User + Send,
    ) -> Option<User> {
        let mut users = self.users.lock().await;
        let current = users.remove(id)?;
        let updated = change(current);
        users.insert(id.clone(), updated.clone());
        Some(updated)
    }
}

fn rebuild(user: User) -> crate::domain::UserBuilder {
    User::builder(user.id().clone(), user.role())
        .email(user.email())
        .full_name(user.full_name())
        .membership(user.membership())
        .verified(user.is_verified())
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.users.lock().await.get(id).cloned())
    }

    async fn upsert(&self, user: &User) -> Result<(), UserPersistenceError> {
        self.users
            .lock()
            .await
            .insert(user.id().clone(), user.clone());
        Ok(())
    }

    async fn set_membership(
        &self,
        id: &UserId,
        membership: MembershipTier,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .update(id, |user| rebuild(user).membership(membership).build())
            .await)
    }

    async fn set_verification(
        &self,
        id: &UserId,
        is_verified: bool,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .update(id, |user| rebuild(user).verified(is_verified).build())
            .await)
    }
}
