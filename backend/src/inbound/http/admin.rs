//! Administrative account handlers.
//!
//! ```text
//! PUT /api/v1/admin/users/{id}/membership    {"membershipType":"premium"}
//! PUT /api/v1/admin/users/{id}/verification  {"isVerified":true}
//! ```
//!
//! Only administrators may call these; the role check lives in the domain
//! service so it holds for every inbound adapter.

use actix_web::{HttpResponse, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::envelope::Envelope;
use crate::inbound::http::schemas::FailureSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::UserProfile;
use crate::inbound::http::validation::{parse_membership, parse_user_id};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MembershipBody {
    /// `free` or `premium`.
    #[schema(example = "premium")]
    pub membership_type: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationBody {
    pub is_verified: bool,
}

/// Change a user's membership tier.
#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/membership",
    params(("id" = String, Path, description = "Target user id")),
    request_body = MembershipBody,
    responses(
        (status = 200, description = "Membership updated", body = UserProfile),
        (status = 400, description = "Invalid request", body = FailureSchema),
        (status = 401, description = "Missing or invalid credential", body = FailureSchema),
        (status = 403, description = "Caller is not an administrator", body = FailureSchema),
        (status = 404, description = "No such user", body = FailureSchema)
    ),
    tags = ["admin"],
    operation_id = "updateMembership"
)]
#[put("/admin/users/{id}/membership")]
pub async fn update_membership(
    state: web::Data<HttpState>,
    actor: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<MembershipBody>,
) -> ApiResult<HttpResponse> {
    let target = parse_user_id(&path.into_inner(), "id")?;
    let membership = parse_membership(&payload.membership_type, "membershipType")?;
    let updated = state
        .membership
        .set_membership(&actor, &target, membership)
        .await?;
    Ok(Envelope::ok(
        "Membership updated successfully",
        UserProfile::from(&updated),
    )
    .into_response())
}

/// Set or clear a user's verification flag.
#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/verification",
    params(("id" = String, Path, description = "Target user id")),
    request_body = VerificationBody,
    responses(
        (status = 200, description = "Verification updated", body = UserProfile),
        (status = 400, description = "Invalid request", body = FailureSchema),
        (status = 401, description = "Missing or invalid credential", body = FailureSchema),
        (status = 403, description = "Caller is not an administrator", body = FailureSchema),
        (status = 404, description = "No such user", body = FailureSchema)
    ),
    tags = ["admin"],
    operation_id = "updateVerification"
)]
#[put("/admin/users/{id}/verification")]
pub async fn update_verification(
    state: web::Data<HttpState>,
    actor: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<VerificationBody>,
) -> ApiResult<HttpResponse> {
    let target = parse_user_id(&path.into_inner(), "id")?;
    let updated = state
        .membership
        .set_verification(&actor, &target, payload.is_verified)
        .await?;
    Ok(Envelope::ok(
        "Verification status updated successfully",
        UserProfile::from(&updated),
    )
    .into_response())
}
