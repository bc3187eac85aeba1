//! PostgreSQL-backed `MeteredOperationRepository`.
//!
//! `reserve` serialises concurrent admissions for the same `(user, kind)`
//! with a transaction-scoped advisory lock, then counts and conditionally
//! inserts inside that transaction. Different users and kinds never contend.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::Text;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde_json::Value;

use crate::domain::ports::{
    HistoryPage, HistoryQuery, MeteredOperationRepository, OperationPersistenceError,
    ReservationOutcome,
};
use crate::domain::{
    MeteredOperationRecord, NewMeteredOperation, OperationId, OperationKind, OperationStatus,
    QuotaPeriod, UserId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{MeteredOperationRow, NewMeteredOperationRow};
use super::pool::{DbPool, PoolError};
use super::schema::metered_operations;

const ADVISORY_LOCK_SQL: &str = "SELECT pg_advisory_xact_lock(hashtextextended($1, 0))";

/// Diesel-backed metered operation store.
#[derive(Clone)]
pub struct DieselMeteredOperationRepository {
    pool: DbPool,
}

impl DieselMeteredOperationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> OperationPersistenceError {
    map_basic_pool_error(error, OperationPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> OperationPersistenceError {
    map_basic_diesel_error(
        error,
        OperationPersistenceError::query,
        OperationPersistenceError::connection,
    )
}

/// Key for the advisory lock guarding one user's allowance of one kind.
fn reservation_lock_key(user_id: &UserId, kind: OperationKind) -> String {
    format!("metered:{user_id}:{kind}")
}

fn saturating_count(count: i64) -> u32 {
    u32::try_from(count.max(0)).unwrap_or(u32::MAX)
}

async fn count_rows(
    conn: &mut AsyncPgConnection,
    user_id: &UserId,
    kind: OperationKind,
    period: &QuotaPeriod,
) -> Result<u32, diesel::result::Error> {
    let count: i64 = metered_operations::table
        .filter(metered_operations::user_id.eq(user_id.as_uuid()))
        .filter(metered_operations::kind.eq(kind.as_str()))
        .filter(metered_operations::created_at.ge(period.start()))
        .filter(metered_operations::created_at.lt(period.end()))
        .count()
        .get_result(conn)
        .await?;
    Ok(saturating_count(count))
}

fn history_scope(query: &HistoryQuery) -> metered_operations::BoxedQuery<'static, Pg> {
    let mut scoped = metered_operations::table
        .filter(metered_operations::user_id.eq(*query.user_id.as_uuid()))
        .into_boxed();
    if let Some(kind) = query.kind {
        scoped = scoped.filter(metered_operations::kind.eq(kind.as_str()));
    }
    scoped
}

#[async_trait]
impl MeteredOperationRepository for DieselMeteredOperationRepository {
    async fn count_in_period(
        &self,
        user_id: &UserId,
        kind: OperationKind,
        period: &QuotaPeriod,
    ) -> Result<u32, OperationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        count_rows(&mut conn, user_id, kind, period)
            .await
            .map_err(map_diesel_error)
    }

    async fn reserve(
        &self,
        operation: &NewMeteredOperation,
        period: &QuotaPeriod,
        limit: u32,
    ) -> Result<ReservationOutcome, OperationPersistenceError> {
        let lock_key = reservation_lock_key(&operation.user_id, operation.kind);
        let row = NewMeteredOperationRow::from(operation);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                sql_query(ADVISORY_LOCK_SQL)
                    .bind::<Text, _>(&lock_key)
                    .execute(conn)
                    .await?;

                let usage = count_rows(conn, &operation.user_id, operation.kind, period).await?;
                if usage >= limit {
                    return Ok(ReservationOutcome::Exhausted { usage });
                }

                diesel::insert_into(metered_operations::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                Ok(ReservationOutcome::Reserved { usage: usage + 1 })
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn insert(
        &self,
        operation: &NewMeteredOperation,
    ) -> Result<(), OperationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(metered_operations::table)
            .values(&NewMeteredOperationRow::from(operation))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn complete(
        &self,
        id: &OperationId,
        result: &Value,
    ) -> Result<(), OperationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(metered_operations::table.find(id.as_uuid()))
            .set((
                metered_operations::status.eq(OperationStatus::Completed.as_str()),
                metered_operations::result.eq(Some(result.clone())),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(OperationPersistenceError::query(format!(
                "operation {id} not found"
            )));
        }
        Ok(())
    }

    async fn history(
        &self,
        query: &HistoryQuery,
    ) -> Result<HistoryPage, OperationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = history_scope(query)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);
        let rows: Vec<MeteredOperationRow> = history_scope(query)
            .order((
                metered_operations::created_at.desc(),
                metered_operations::id.desc(),
            ))
            .offset(offset)
            .limit(i64::from(query.limit))
            .select(MeteredOperationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let records = rows
            .into_iter()
            .map(|row| {
                MeteredOperationRecord::try_from(row).map_err(|message| {
                    OperationPersistenceError::query(format!("corrupt operation row: {message}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(HistoryPage {
            records,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn lock_keys_separate_users_and_kinds() {
        let user = UserId::random();
        let other = UserId::random();
        assert_ne!(
            reservation_lock_key(&user, OperationKind::Diagnosis),
            reservation_lock_key(&user, OperationKind::DrugAnalysis)
        );
        assert_ne!(
            reservation_lock_key(&user, OperationKind::Diagnosis),
            reservation_lock_key(&other, OperationKind::Diagnosis)
        );
    }

    #[rstest]
    #[case(-1, 0)]
    #[case(7, 7)]
    #[case(i64::MAX, u32::MAX)]
    fn counts_saturate_into_u32(#[case] raw: i64, #[case] expected: u32) {
        assert_eq!(saturating_count(raw), expected);
    }
}
