//! Concurrent admission never exceeds the monthly allowance.

mod support;

use actix_web::http::StatusCode;
use actix_web::test;
use careline::domain::{MembershipTier, Role};
use careline::test_support::{ScriptedAiSource, TestHarness};
use futures_util::future::join_all;
use rstest::rstest;

use support::{diagnosis_request, member, mid_april, send};

#[rstest]
#[case(3, 12)]
#[case(1, 5)]
#[actix_web::test]
async fn simultaneous_requests_are_admitted_up_to_the_limit(
    #[case] limit: u32,
    #[case] attempts: usize,
) {
    let harness = TestHarness::new(ScriptedAiSource::failing(), mid_april())
        .with_free_tier_limit(limit);
    let user = harness
        .register(member(Role::Patient, MembershipTier::Free))
        .await;
    let bearer = harness.bearer_for(&user);
    let app = test::init_service(harness.app()).await;

    let responses = join_all(
        (0..attempts).map(|_| send(&app, diagnosis_request(Some(&bearer), "fever, cough"))),
    )
    .await;

    let admitted = responses
        .iter()
        .filter(|(status, _)| *status == StatusCode::OK)
        .count();
    let refused = responses
        .iter()
        .filter(|(status, _)| *status == StatusCode::TOO_MANY_REQUESTS)
        .count();
    assert_eq!(admitted, limit as usize);
    assert_eq!(refused, attempts - limit as usize);
    assert_eq!(harness.operations.records().await.len(), limit as usize);
}
