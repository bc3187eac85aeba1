//! Shared helpers for the HTTP integration suites.
//!
//! Integration tests compile as separate crates, so request builders and
//! fixtures live here rather than being copied per file.

pub mod embedded_postgres;

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::test;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};

use careline::domain::{
    MembershipTier, MeteredOperationRecord, OperationId, OperationKind, OperationStatus, Role,
    User, UserId,
};

/// 2025-04-15 09:30 UTC, well inside a calendar month.
pub fn mid_april() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 15, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub fn member(role: Role, membership: MembershipTier) -> User {
    User::builder(UserId::random(), role)
        .email(format!("{role}-{}@example.test", UserId::random()))
        .full_name("Integration Member")
        .membership(membership)
        .verified(true)
        .build()
}

/// Completed diagnosis record for `user` at `created_at`.
pub fn prior_diagnosis(user: &User, created_at: DateTime<Utc>) -> MeteredOperationRecord {
    MeteredOperationRecord {
        id: OperationId::random(),
        user_id: user.id().clone(),
        kind: OperationKind::Diagnosis,
        status: OperationStatus::Completed,
        request: json!({ "input_text": "headache", "input_image": null }),
        result: Some(json!({ "condition": "Tension Headache" })),
        created_at,
    }
}

pub fn diagnosis_request(bearer: Option<&str>, input_text: &str) -> actix_http::Request {
    let mut request = test::TestRequest::post()
        .uri("/api/v1/ai/diagnose")
        .set_json(json!({ "input_text": input_text }));
    if let Some(bearer) = bearer {
        request = request.insert_header((AUTHORIZATION, bearer.to_owned()));
    }
    request.to_request()
}

pub fn drug_request(bearer: &str, drug_name: &str) -> actix_http::Request {
    test::TestRequest::post()
        .uri("/api/v1/ai/drug-analyze")
        .insert_header((AUTHORIZATION, bearer.to_owned()))
        .set_json(json!({ "drug_name": drug_name }))
        .to_request()
}

pub fn usage_request(bearer: &str) -> actix_http::Request {
    test::TestRequest::get()
        .uri("/api/v1/ai/usage-stats")
        .insert_header((AUTHORIZATION, bearer.to_owned()))
        .to_request()
}

/// Call `app` and decode the JSON body.
pub async fn send<S, B>(app: &S, request: actix_http::Request) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let response = test::call_service(app, request).await;
    let status = response.status();
    let body: Value = test::read_body_json(response).await;
    (status, body)
}
