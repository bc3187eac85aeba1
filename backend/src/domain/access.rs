//! Access-control outcomes and the role allow-list gate.
//!
//! Every metered request passes, in order, the identity check, the role gate,
//! and the quota decision. Each stage fails with an [`AccessDenial`] so the
//! reason stays distinguishable all the way to the adapter.

use serde_json::json;

use super::{Error, Role, User};

const QUOTA_EXCEEDED_MESSAGE: &str =
    "Free usage limit exceeded. Please upgrade to premium for unlimited access.";

/// Why a request was refused before reaching the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenial {
    /// No bearer credential accompanied the request.
    Unauthenticated,
    /// The credential failed signature, shape, or expiry checks.
    InvalidCredential,
    /// The credential is valid but names no stored user.
    UnknownSubject,
    /// The user's role is not on the route allow-list.
    Forbidden { role: Role },
    /// The user has exhausted the allowance for the current period.
    QuotaExceeded { usage: u32, limit: u32 },
}

impl AccessDenial {
    /// Stable reason code exposed in error details.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::InvalidCredential => "invalid_credential",
            Self::UnknownSubject => "unknown_subject",
            Self::Forbidden { .. } => "forbidden",
            Self::QuotaExceeded { .. } => "quota_exceeded",
        }
    }
}

impl From<AccessDenial> for Error {
    fn from(value: AccessDenial) -> Self {
        let reason = value.reason();
        match value {
            AccessDenial::Unauthenticated => Error::unauthorized("Access token required")
                .with_details(json!({ "reason": reason })),
            AccessDenial::InvalidCredential => Error::unauthorized("Invalid or expired token")
                .with_details(json!({ "reason": reason })),
            AccessDenial::UnknownSubject => {
                Error::unauthorized("Invalid token").with_details(json!({ "reason": reason }))
            }
            AccessDenial::Forbidden { role } => Error::forbidden("Insufficient permissions")
                .with_details(json!({ "reason": reason, "role": role.as_str() })),
            AccessDenial::QuotaExceeded { usage, limit } => {
                Error::quota_exceeded(QUOTA_EXCEEDED_MESSAGE)
                    .with_details(json!({ "usageCount": usage, "limit": limit }))
            }
        }
    }
}

/// Static allow-list of roles permitted on a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleGate {
    allowed: &'static [Role],
}

/// Roles allowed to use the AI endpoints.
pub const AI_ROLES: RoleGate = RoleGate::new(&[Role::Patient, Role::Doctor, Role::Admin]);

/// Roles allowed to administer other accounts.
pub const ADMIN_ROLES: RoleGate = RoleGate::new(&[Role::Admin]);

impl RoleGate {
    #[must_use]
    pub const fn new(allowed: &'static [Role]) -> Self {
        Self { allowed }
    }

    /// Pass the user through when their role is on the list.
    ///
    /// # Examples
    /// ```
    /// use careline::domain::{ADMIN_ROLES, Role, User, UserId};
    ///
    /// let doctor = User::builder(UserId::random(), Role::Doctor).build();
    /// assert!(ADMIN_ROLES.check(&doctor).is_err());
    /// ```
    pub fn check(&self, user: &User) -> Result<(), AccessDenial> {
        let role = user.role();
        if self.allowed.contains(&role) {
            Ok(())
        } else {
            Err(AccessDenial::Forbidden { role })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode, UserId};
    use rstest::rstest;

    fn user(role: Role) -> User {
        User::builder(UserId::random(), role).build()
    }

    #[rstest]
    #[case(Role::Patient, true)]
    #[case(Role::Doctor, true)]
    #[case(Role::Admin, true)]
    fn ai_gate_admits_all_clinical_roles(#[case] role: Role, #[case] allowed: bool) {
        assert_eq!(AI_ROLES.check(&user(role)).is_ok(), allowed);
    }

    #[rstest]
    #[case(Role::Patient)]
    #[case(Role::Doctor)]
    fn admin_gate_rejects_non_admins(#[case] role: Role) {
        assert_eq!(
            ADMIN_ROLES.check(&user(role)),
            Err(AccessDenial::Forbidden { role })
        );
    }

    #[rstest]
    #[case(AccessDenial::Unauthenticated, ErrorCode::Unauthorized)]
    #[case(AccessDenial::InvalidCredential, ErrorCode::Unauthorized)]
    #[case(AccessDenial::UnknownSubject, ErrorCode::Unauthorized)]
    #[case(AccessDenial::Forbidden { role: Role::Patient }, ErrorCode::Forbidden)]
    #[case(AccessDenial::QuotaExceeded { usage: 3, limit: 3 }, ErrorCode::QuotaExceeded)]
    fn denials_map_to_distinct_error_codes(
        #[case] denial: AccessDenial,
        #[case] expected: ErrorCode,
    ) {
        let error = Error::from(denial);
        assert_eq!(error.code(), expected);
    }

    #[rstest]
    fn quota_denial_carries_usage_payload() {
        let error = Error::from(AccessDenial::QuotaExceeded { usage: 3, limit: 3 });
        let details = error.details().expect("quota details");
        assert_eq!(details["usageCount"], 3);
        assert_eq!(details["limit"], 3);
    }

    #[rstest]
    fn authentication_denials_expose_reason() {
        let error = Error::from(AccessDenial::InvalidCredential);
        let details = error.details().expect("reason details");
        assert_eq!(details["reason"], "invalid_credential");
    }
}
