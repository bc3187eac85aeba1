//! User profile handlers.
//!
//! ```text
//! GET /api/v1/users/me
//! ```

use actix_web::{HttpResponse, get};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::User;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::envelope::Envelope;
use crate::inbound::http::schemas::FailureSchema;

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    pub email: String,
    pub full_name: String,
    #[schema(example = "patient")]
    pub role: String,
    #[schema(example = "free")]
    pub membership_type: String,
    pub is_verified: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            email: user.email().to_owned(),
            full_name: user.full_name().to_owned(),
            role: user.role().as_str().to_owned(),
            membership_type: user.membership().as_str().to_owned(),
            is_verified: user.is_verified(),
        }
    }
}

/// Return the authenticated caller's profile.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use careline::inbound::http::users::current_user;
///
/// let app = App::new().service(current_user);
/// ```
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Missing or invalid credential", body = FailureSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(user: AuthenticatedUser) -> ApiResult<HttpResponse> {
    Ok(Envelope::ok("User retrieved successfully", UserProfile::from(&*user)).into_response())
}
