//! PostgreSQL-backed `UserRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{MembershipTier, User, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{UserRow, UserWriteRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed user repository.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    map_basic_pool_error(error, UserPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    map_basic_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

fn to_domain(row: Option<UserRow>) -> Result<Option<User>, UserPersistenceError> {
    row.map(|row| {
        User::try_from(row)
            .map_err(|message| UserPersistenceError::query(format!("corrupt user row: {message}")))
    })
    .transpose()
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        to_domain(row)
    }

    async fn upsert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = UserWriteRow::from(user);
        diesel::insert_into(users::table)
            .values(&row)
            .on_conflict(users::id)
            .do_update()
            .set((
                users::email.eq(excluded(users::email)),
                users::full_name.eq(excluded(users::full_name)),
                users::role.eq(excluded(users::role)),
                users::membership_type.eq(excluded(users::membership_type)),
                users::is_verified.eq(excluded(users::is_verified)),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn set_membership(
        &self,
        id: &UserId,
        membership: MembershipTier,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::update(users::table.find(id.as_uuid()))
            .set((
                users::membership_type.eq(membership.as_str()),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        to_domain(row)
    }

    async fn set_verification(
        &self,
        id: &UserId,
        is_verified: bool,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::update(users::table.find(id.as_uuid()))
            .set((
                users::is_verified.eq(is_verified),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        to_domain(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn checkout_failures_are_connection_errors() {
        let err = map_pool_error(PoolError::checkout("pool exhausted"));
        assert_eq!(err, UserPersistenceError::connection("pool exhausted"));
    }

    #[rstest]
    fn missing_rows_map_to_none() {
        assert_eq!(to_domain(None), Ok(None));
    }
}
