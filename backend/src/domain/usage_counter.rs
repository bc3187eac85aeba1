//! Monthly usage counting against the shared operation store.

use std::sync::Arc;

use crate::domain::persistence_error_mapping::map_operation_store_error;
use crate::domain::ports::MeteredOperationRepository;
use crate::domain::{Error, OperationKind, QuotaPeriod, UserId};

/// Counts a user's records of one kind inside a calendar-month period.
/// Observes a snapshot; it never reserves anything.
pub struct UsageCounter<R> {
    operations: Arc<R>,
}

impl<R> Clone for UsageCounter<R> {
    fn clone(&self) -> Self {
        Self {
            operations: Arc::clone(&self.operations),
        }
    }
}

impl<R> UsageCounter<R>
where
    R: MeteredOperationRepository,
{
    pub fn new(operations: Arc<R>) -> Self {
        Self { operations }
    }

    /// Count records in an already computed period.
    ///
    /// A failed read is a hard error: enforcement cannot default to either
    /// allow or deny without a real count.
    pub async fn count_in(
        &self,
        user_id: &UserId,
        kind: OperationKind,
        period: &QuotaPeriod,
    ) -> Result<u32, Error> {
        self.operations
            .count_in_period(user_id, kind, period)
            .await
            .map_err(map_operation_store_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{MockMeteredOperationRepository, OperationPersistenceError};
    use chrono::{TimeZone, Utc};
    use mockall::predicate::eq;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn counts_inside_the_calendar_month() {
        let now = Utc
            .with_ymd_and_hms(2025, 2, 14, 12, 0, 0)
            .single()
            .expect("valid instant");
        let expected_period = QuotaPeriod::containing(now).expect("period");
        let user_id = UserId::random();
        let mut repo = MockMeteredOperationRepository::new();
        repo.expect_count_in_period()
            .with(eq(user_id.clone()), eq(OperationKind::Diagnosis), eq(expected_period))
            .times(1)
            .return_once(|_, _, _| Ok(2));

        let counter = UsageCounter::new(Arc::new(repo));
        let count = counter
            .count_in(&user_id, OperationKind::Diagnosis, &expected_period)
            .await
            .expect("count");
        assert_eq!(count, 2);
    }

    #[rstest]
    #[tokio::test]
    async fn read_failures_are_surfaced() {
        let mut repo = MockMeteredOperationRepository::new();
        repo.expect_count_in_period()
            .return_once(|_, _, _| Err(OperationPersistenceError::connection("down")));

        let counter = UsageCounter::new(Arc::new(repo));
        let period = QuotaPeriod::containing(Utc::now()).expect("period");
        let err = counter
            .count_in(&UserId::random(), OperationKind::DrugAnalysis, &period)
            .await
            .expect_err("read failure");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
