//! Success envelope shared by every JSON endpoint.

use actix_web::HttpResponse;
use actix_web::http::header::CACHE_CONTROL;
use serde::Serialize;

/// Responses carry per-user data and must be revalidated before reuse.
pub(crate) const PRIVATE_NO_CACHE: &str = "private, no-cache, must-revalidate";

/// `{ success: true, message, data }`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: &'static str,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(message: &'static str, data: T) -> Self {
        Self {
            success: true,
            message,
            data,
        }
    }

    /// Render as `200 OK` with the private no-cache policy.
    pub fn into_response(self) -> HttpResponse {
        HttpResponse::Ok()
            .insert_header((CACHE_CONTROL, PRIVATE_NO_CACHE))
            .json(self)
    }
}
