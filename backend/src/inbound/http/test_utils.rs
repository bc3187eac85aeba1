//! Test helpers for inbound HTTP components.

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::domain::{MembershipTier, Role, User, UserId};

/// Mid-month instant used as the default clock reading.
pub fn mid_april() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2025, 4, 15, 9, 30, 0).single() {
        Some(instant) => instant,
        None => panic!("fixture instant is valid"),
    }
}

pub fn member(role: Role, membership: MembershipTier) -> User {
    User::builder(UserId::random(), role)
        .email("member@example.com")
        .full_name("Test Member")
        .membership(membership)
        .build()
}

/// Call the app and decode the JSON body.
pub async fn send<S>(app: &S, request: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response = test::call_service(app, request).await;
    let status = response.status();
    let body = test::read_body(response).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, value)
}
