//! Read-side service reporting a user's own usage and history.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::persistence_error_mapping::map_operation_store_error;
use crate::domain::ports::{
    HistoryListing, HistoryQuery, HistoryRequest, KindUsage, MeteredOperationRepository,
    UsageQuery, UsageStats,
};
use crate::domain::{Error, OperationKind, QuotaPeriod, QuotaPolicy, UsageCounter, User};

#[derive(Clone)]
pub struct UsageService<R> {
    operations: Arc<R>,
    counter: UsageCounter<R>,
    policy: QuotaPolicy,
    clock: Arc<dyn Clock>,
}

impl<R> UsageService<R>
where
    R: MeteredOperationRepository,
{
    pub fn new(operations: Arc<R>, policy: QuotaPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            counter: UsageCounter::new(Arc::clone(&operations)),
            operations,
            policy,
            clock,
        }
    }
}

#[async_trait]
impl<R> UsageQuery for UsageService<R>
where
    R: MeteredOperationRepository + 'static,
{
    async fn usage_stats(&self, user: &User) -> Result<UsageStats, Error> {
        let period = QuotaPeriod::containing(self.clock.utc())?;
        let (diagnoses, drug_analyses) = tokio::try_join!(
            self.counter
                .count_in(user.id(), OperationKind::Diagnosis, &period),
            self.counter
                .count_in(user.id(), OperationKind::DrugAnalysis, &period),
        )?;

        let limit = self.policy.limit_for(user);
        let usage = |used: u32| KindUsage {
            used,
            limit: limit.as_option(),
            remaining: limit.remaining(used),
        };
        Ok(UsageStats {
            membership: user.membership(),
            current_month: period.label(),
            diagnosis: usage(diagnoses),
            drug_analysis: usage(drug_analyses),
        })
    }

    async fn history(
        &self,
        user: &User,
        request: HistoryRequest,
    ) -> Result<HistoryListing, Error> {
        let (page, limit) = request.normalised();
        let query = HistoryQuery {
            user_id: user.id().clone(),
            kind: request.kind,
            offset: u64::from(page - 1) * u64::from(limit),
            limit,
        };
        let found = self
            .operations
            .history(&query)
            .await
            .map_err(map_operation_store_error)?;
        Ok(HistoryListing {
            records: found.records,
            page,
            limit,
            total: found.total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{HistoryPage, MockMeteredOperationRepository};
    use crate::domain::{MembershipTier, Role, UserId};
    use crate::test_support::MutableClock;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn clock() -> Arc<dyn Clock> {
        let now = Utc
            .with_ymd_and_hms(2025, 3, 9, 8, 30, 0)
            .single()
            .expect("valid instant");
        Arc::new(MutableClock::new(now))
    }

    fn service(repo: MockMeteredOperationRepository) -> UsageService<MockMeteredOperationRepository> {
        UsageService::new(Arc::new(repo), QuotaPolicy::new(3), clock())
    }

    #[rstest]
    #[tokio::test]
    async fn free_tier_stats_report_remaining_allowance() {
        let mut repo = MockMeteredOperationRepository::new();
        repo.expect_count_in_period()
            .times(2)
            .returning(|_, kind, _| {
                Ok(match kind {
                    OperationKind::Diagnosis => 2,
                    OperationKind::DrugAnalysis => 5,
                })
            });
        let user = User::builder(UserId::random(), Role::Patient).build();

        let stats = service(repo).usage_stats(&user).await.expect("stats");
        assert_eq!(stats.current_month, "2025-03");
        assert_eq!(stats.membership, MembershipTier::Free);
        assert_eq!(
            stats.diagnosis,
            KindUsage {
                used: 2,
                limit: Some(3),
                remaining: Some(1)
            }
        );
        assert_eq!(stats.drug_analysis.remaining, Some(0));
    }

    #[rstest]
    #[tokio::test]
    async fn premium_stats_have_no_limits() {
        let mut repo = MockMeteredOperationRepository::new();
        repo.expect_count_in_period().returning(|_, _, _| Ok(40));
        let user = User::builder(UserId::random(), Role::Doctor)
            .membership(MembershipTier::Premium)
            .build();

        let stats = service(repo).usage_stats(&user).await.expect("stats");
        assert_eq!(stats.diagnosis.limit, None);
        assert_eq!(stats.drug_analysis.remaining, None);
    }

    #[rstest]
    #[tokio::test]
    async fn stats_are_stable_without_new_operations() {
        let mut repo = MockMeteredOperationRepository::new();
        repo.expect_count_in_period().returning(|_, _, _| Ok(1));
        let service = service(repo);
        let user = User::builder(UserId::random(), Role::Patient).build();

        let first = service.usage_stats(&user).await.expect("first");
        let second = service.usage_stats(&user).await.expect("second");
        assert_eq!(first, second);
    }

    #[rstest]
    #[case(HistoryRequest::default(), 0, 10)]
    #[case(HistoryRequest { kind: None, page: Some(3), limit: Some(20) }, 40, 20)]
    #[case(HistoryRequest { kind: None, page: Some(2), limit: Some(0) }, 1, 1)]
    #[tokio::test]
    async fn history_pages_by_offset(
        #[case] request: HistoryRequest,
        #[case] offset: u64,
        #[case] limit: u32,
    ) {
        let mut repo = MockMeteredOperationRepository::new();
        repo.expect_history()
            .withf(move |query| query.offset == offset && query.limit == limit)
            .times(1)
            .return_once(|_| {
                Ok(HistoryPage {
                    records: Vec::new(),
                    total: 0,
                })
            });
        let user = User::builder(UserId::random(), Role::Patient).build();

        let listing = service(repo).history(&user, request).await.expect("history");
        assert_eq!(listing.limit, limit);
        assert_eq!(listing.total, 0);
    }
}
