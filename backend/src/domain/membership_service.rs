//! Administrative membership and verification changes.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::persistence_error_mapping::map_user_repository_error;
use crate::domain::ports::{MembershipCommand, UserRepository};
use crate::domain::{ADMIN_ROLES, Error, MembershipTier, User, UserId};

#[derive(Clone)]
pub struct MembershipService<R> {
    users: Arc<R>,
}

impl<R> MembershipService<R> {
    pub fn new(users: Arc<R>) -> Self {
        Self { users }
    }
}

fn found(user: Option<User>) -> Result<User, Error> {
    user.ok_or_else(|| Error::not_found("User not found"))
}

#[async_trait]
impl<R> MembershipCommand for MembershipService<R>
where
    R: UserRepository + 'static,
{
    async fn set_membership(
        &self,
        actor: &User,
        target: &UserId,
        membership: MembershipTier,
    ) -> Result<User, Error> {
        ADMIN_ROLES.check(actor)?;
        let updated = self
            .users
            .set_membership(target, membership)
            .await
            .map_err(map_user_repository_error)
            .and_then(found)?;
        info!(
            actor = %actor.id(),
            target = %target,
            membership = %membership,
            "membership changed"
        );
        Ok(updated)
    }

    async fn set_verification(
        &self,
        actor: &User,
        target: &UserId,
        is_verified: bool,
    ) -> Result<User, Error> {
        ADMIN_ROLES.check(actor)?;
        let updated = self
            .users
            .set_verification(target, is_verified)
            .await
            .map_err(map_user_repository_error)
            .and_then(found)?;
        info!(actor = %actor.id(), target = %target, is_verified, "verification changed");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::Role;
    use crate::domain::ports::MockUserRepository;
    use rstest::rstest;

    fn admin() -> User {
        User::builder(UserId::random(), Role::Admin).build()
    }

    #[rstest]
    #[case(Role::Patient)]
    #[case(Role::Doctor)]
    #[tokio::test]
    async fn non_admins_are_forbidden(#[case] role: Role) {
        let mut users = MockUserRepository::new();
        users.expect_set_membership().never();
        let service = MembershipService::new(Arc::new(users));
        let actor = User::builder(UserId::random(), role).build();

        let err = service
            .set_membership(&actor, &UserId::random(), MembershipTier::Premium)
            .await
            .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn upgrades_existing_user() {
        let target = UserId::random();
        let upgraded = User::builder(target.clone(), Role::Patient)
            .membership(MembershipTier::Premium)
            .build();
        let returned = upgraded.clone();
        let mut users = MockUserRepository::new();
        users
            .expect_set_membership()
            .withf(|_, membership| *membership == MembershipTier::Premium)
            .times(1)
            .return_once(move |_, _| Ok(Some(returned)));
        let service = MembershipService::new(Arc::new(users));

        let user = service
            .set_membership(&admin(), &target, MembershipTier::Premium)
            .await
            .expect("updated");
        assert_eq!(user, upgraded);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_user_is_not_found() {
        let mut users = MockUserRepository::new();
        users
            .expect_set_verification()
            .return_once(|_, _| Ok(None));
        let service = MembershipService::new(Arc::new(users));

        let err = service
            .set_verification(&admin(), &UserId::random(), true)
            .await
            .expect_err("not found");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
