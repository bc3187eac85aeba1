//! Tests for domain error construction and trace propagation.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn quota_error() -> Error {
    Error::quota_exceeded("Free usage limit exceeded")
        .with_details(json!({ "usageCount": 3, "limit": 3 }))
}

#[rstest]
#[case(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case(Error::unauthorized("no auth"), ErrorCode::Unauthorized)]
#[case(Error::forbidden("denied"), ErrorCode::Forbidden)]
#[case(Error::not_found("missing"), ErrorCode::NotFound)]
#[case(Error::quota_exceeded("spent"), ErrorCode::QuotaExceeded)]
#[case(Error::rate_limited("slow down"), ErrorCode::RateLimited)]
#[case(Error::service_unavailable("down"), ErrorCode::ServiceUnavailable)]
#[case(Error::internal("boom"), ErrorCode::InternalError)]
fn constructors_set_matching_code(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn new_returns_none_when_trace_id_out_of_scope() {
    let error = Error::internal("boom");
    assert!(error.trace_id().is_none());
}

#[rstest]
#[tokio::test]
async fn new_captures_trace_id_in_scope() {
    let trace_id: TraceId = TRACE_ID.parse().expect("valid UUID");
    let error = TraceId::scope(trace_id, async { Error::forbidden("nope") }).await;
    assert_eq!(error.trace_id(), Some(TRACE_ID));
}

#[rstest]
fn serialises_details_and_omits_missing_trace_id(quota_error: Error) {
    let value = serde_json::to_value(&quota_error).expect("serialise error");
    assert_eq!(value["code"], "quota_exceeded");
    assert_eq!(value["details"]["usageCount"], 3);
    assert!(value.get("traceId").is_none());
}

#[rstest]
fn deserialises_snake_case_trace_id_alias() {
    let error: Error = serde_json::from_value(json!({
        "code": "not_found",
        "message": "missing",
        "trace_id": TRACE_ID,
    }))
    .expect("deserialise error");
    assert_eq!(error.trace_id(), Some(TRACE_ID));
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
fn display_uses_message() {
    assert_eq!(Error::not_found("no such user").to_string(), "no such user");
}
