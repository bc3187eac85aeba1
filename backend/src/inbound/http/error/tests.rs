//! Tests for HTTP error mapping.

use super::*;
use crate::domain::AccessDenial;
use actix_web::body::to_bytes;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn internal_error() -> Error {
    Error::internal("connection string postgres://secret@db leaked")
        .with_trace_id(TRACE_ID)
        .with_details(json!({ "secret": "x" }))
}

async fn body_of(error: &Error) -> (StatusCode, Option<String>, Value) {
    let response = ResponseError::error_response(error);
    let status = response.status();
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .map(|value| value.to_str().expect("ascii header").to_owned());
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    let body = serde_json::from_slice(&bytes).expect("JSON body");
    (status, header, body)
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("no auth"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::quota_exceeded("spent"), StatusCode::TOO_MANY_REQUESTS)]
#[case(Error::rate_limited("slow down"), StatusCode::TOO_MANY_REQUESTS)]
#[case(Error::service_unavailable("down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] error: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), status);
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted(internal_error: Error) {
    let (status, header, body) = body_of(&internal_error).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header.as_deref(), Some(TRACE_ID));
    assert_eq!(
        body,
        json!({
            "success": false,
            "code": "internal_error",
            "message": "Internal server error",
            "data": null,
            "traceId": TRACE_ID,
        })
    );
}

#[rstest]
#[actix_web::test]
async fn quota_denials_carry_usage_in_data() {
    let error = Error::from(AccessDenial::QuotaExceeded { usage: 3, limit: 3 });
    let (status, _, body) = body_of(&error).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["code"], json!("quota_exceeded"));
    assert_eq!(body["data"], json!({ "usageCount": 3, "limit": 3 }));
}

#[rstest]
#[case(AccessDenial::Unauthenticated, "unauthenticated")]
#[case(AccessDenial::InvalidCredential, "invalid_credential")]
#[case(AccessDenial::UnknownSubject, "unknown_subject")]
#[actix_web::test]
async fn authentication_failures_keep_their_reason(
    #[case] denial: AccessDenial,
    #[case] reason: &str,
) {
    let (status, header, body) = body_of(&Error::from(denial)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(header.is_none());
    assert_eq!(body["data"]["reason"], json!(reason));
    assert!(body.get("traceId").is_none());
}
