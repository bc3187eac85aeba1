//! HTTP inbound adapter exposing REST endpoints.

pub mod admin;
pub mod ai;
pub mod auth;
pub mod envelope;
pub mod error;
pub mod health;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;

use actix_web::{Scope, web};

use crate::domain::Error;
use crate::middleware::ClientRateLimit;

/// Body and query rejections use the failure envelope like every other error.
fn extractor_error(err: impl std::fmt::Display) -> actix_web::Error {
    Error::invalid_request(err.to_string()).into()
}

/// The versioned API scope with every endpoint registered and no request
/// rate limit.
///
/// Requires `web::Data<HttpState>` on the enclosing app.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use careline::inbound::http::api_scope;
///
/// let app = App::new().service(api_scope());
/// ```
pub fn api_scope() -> Scope {
    api_scope_with(ClientRateLimit::disabled())
}

/// The versioned API scope with `ai_limit` guarding every `/ai` route.
pub fn api_scope_with(ai_limit: ClientRateLimit) -> Scope {
    let ai_routes = web::scope("/ai")
        .service(ai::create_diagnosis)
        .service(ai::create_drug_analysis)
        .service(ai::detect_fracture)
        .service(ai::detect_tablet)
        .service(ai::get_usage)
        .service(ai::get_history)
        .wrap(ai_limit);

    web::scope("/api/v1")
        .app_data(web::JsonConfig::default().error_handler(|err, _| extractor_error(err)))
        .app_data(web::QueryConfig::default().error_handler(|err, _| extractor_error(err)))
        .app_data(web::PathConfig::default().error_handler(|err, _| extractor_error(err)))
        .service(users::current_user)
        .service(ai_routes)
        .service(admin::update_membership)
        .service(admin::update_verification)
}
