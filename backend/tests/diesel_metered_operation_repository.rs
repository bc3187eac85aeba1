//! Reservation semantics of `DieselMeteredOperationRepository` against
//! embedded PostgreSQL.
//!
//! The advisory lock must serialise concurrent admissions so no more than
//! the allowance is ever inserted for one user and kind.

mod support;

use careline::domain::ports::{
    MeteredOperationRepository, ReservationOutcome, UserRepository,
};
use careline::domain::{
    MembershipTier, NewMeteredOperation, OperationId, OperationKind, QuotaPeriod, Role, User,
};
use careline::outbound::persistence::{
    DbPool, DieselMeteredOperationRepository, DieselUserRepository, PoolConfig,
};
use chrono::{DateTime, Duration, Utc};
use futures_util::future::join_all;
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use serde_json::json;
use tokio::runtime::Runtime;

use support::embedded_postgres::{
    handle_cluster_setup_failure, provision_database, shared_cluster,
};
use support::{member, mid_april};

struct TestContext {
    runtime: Runtime,
    repository: DieselMeteredOperationRepository,
    user: User,
    _database: TemporaryDatabase,
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster().map_err(|err| err.to_string())?;
    let database = provision_database(cluster)?;

    let config = PoolConfig::new(database.url())
        .with_max_size(8)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;

    let user = member(Role::Patient, MembershipTier::Free);
    runtime
        .block_on(DieselUserRepository::new(pool.clone()).upsert(&user))
        .map_err(|err| err.to_string())?;

    Ok(TestContext {
        runtime,
        repository: DieselMeteredOperationRepository::new(pool),
        user,
        _database: database,
    })
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn operation(user: &User, kind: OperationKind, created_at: DateTime<Utc>) -> NewMeteredOperation {
    NewMeteredOperation {
        id: OperationId::random(),
        user_id: user.id().clone(),
        kind,
        request: json!({ "input_text": "fever" }),
        created_at,
    }
}

fn april() -> QuotaPeriod {
    QuotaPeriod::containing(mid_april()).expect("valid period")
}

#[rstest]
#[case(3, 12)]
#[case(1, 6)]
fn concurrent_reservations_stop_at_the_limit(
    repo_context: Option<TestContext>,
    #[case] limit: u32,
    #[case] attempts: usize,
) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: concurrent_reservations_stop_at_the_limit skipped");
        return;
    };
    let period = april();

    let outcomes = context.runtime.block_on(async {
        let handles = (0..attempts).map(|_| {
            let repository = context.repository.clone();
            let candidate = operation(&context.user, OperationKind::Diagnosis, mid_april());
            tokio::spawn(async move { repository.reserve(&candidate, &period, limit).await })
        });
        join_all(handles).await
    });

    let mut reserved = 0;
    for outcome in outcomes {
        match outcome.expect("task joins").expect("reserve succeeds") {
            ReservationOutcome::Reserved { usage } => {
                assert!(usage <= limit, "usage {usage} exceeds {limit}");
                reserved += 1;
            }
            ReservationOutcome::Exhausted { usage } => assert_eq!(usage, limit),
        }
    }
    assert_eq!(reserved, limit);

    let stored = context
        .runtime
        .block_on(context.repository.count_in_period(
            context.user.id(),
            OperationKind::Diagnosis,
            &period,
        ))
        .expect("count succeeds");
    assert_eq!(stored, limit);
}

#[rstest]
fn exhausted_allowance_is_scoped_to_kind_and_period(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: exhausted_allowance_is_scoped_to_kind_and_period skipped");
        return;
    };
    let period = april();
    let repository = &context.repository;
    let user = &context.user;

    context.runtime.block_on(async {
        let march = operation(user, OperationKind::Diagnosis, mid_april() - Duration::days(30));
        repository.insert(&march).await.expect("insert succeeds");

        let first = operation(user, OperationKind::Diagnosis, mid_april());
        assert_eq!(
            repository.reserve(&first, &period, 1).await.expect("reserve"),
            ReservationOutcome::Reserved { usage: 1 }
        );

        let second = operation(user, OperationKind::Diagnosis, mid_april());
        assert_eq!(
            repository.reserve(&second, &period, 1).await.expect("reserve"),
            ReservationOutcome::Exhausted { usage: 1 }
        );

        let drug = operation(user, OperationKind::DrugAnalysis, mid_april());
        assert_eq!(
            repository.reserve(&drug, &period, 1).await.expect("reserve"),
            ReservationOutcome::Reserved { usage: 1 }
        );

        let diagnoses = repository
            .count_in_period(user.id(), OperationKind::Diagnosis, &period)
            .await
            .expect("count");
        assert_eq!(diagnoses, 1);
    });
}
