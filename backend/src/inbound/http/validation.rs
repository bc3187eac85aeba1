//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every rejection is an `invalid_request` error whose details name the
//! offending field and a stable code.

use serde_json::json;

use crate::domain::{
    AiRequestValidationError, Error, MembershipTier, OperationKind, UserId,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValidationCode {
    InvalidUuid,
    InvalidOperationKind,
    InvalidMembership,
}

impl ValidationCode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidUuid => "invalid_uuid",
            Self::InvalidOperationKind => "invalid_operation_kind",
            Self::InvalidMembership => "invalid_membership",
        }
    }
}

fn field_error(field: &str, message: String, code: &str, value: Option<&str>) -> Error {
    let details = match value {
        Some(value) => json!({ "field": field, "value": value, "code": code }),
        None => json!({ "field": field, "code": code }),
    };
    Error::invalid_request(message).with_details(details)
}

fn invalid_value(field: &str, message: String, code: ValidationCode, value: &str) -> Error {
    field_error(field, message, code.as_str(), Some(value))
}

impl From<AiRequestValidationError> for Error {
    fn from(err: AiRequestValidationError) -> Self {
        field_error(err.field(), err.to_string(), err.code(), None)
    }
}

pub(crate) fn parse_user_id(value: &str, field: &'static str) -> Result<UserId, Error> {
    UserId::new(value).map_err(|_| {
        invalid_value(
            field,
            format!("{field} must be a valid UUID"),
            ValidationCode::InvalidUuid,
            value,
        )
    })
}

/// Parse the optional `type` history filter.
pub(crate) fn parse_operation_kind(
    value: Option<&str>,
    field: &'static str,
) -> Result<Option<OperationKind>, Error> {
    value
        .map(|raw| {
            raw.parse::<OperationKind>().map_err(|_| {
                invalid_value(
                    field,
                    format!("{field} must be one of diagnosis, drug_analysis"),
                    ValidationCode::InvalidOperationKind,
                    raw,
                )
            })
        })
        .transpose()
}

pub(crate) fn parse_membership(value: &str, field: &'static str) -> Result<MembershipTier, Error> {
    value.parse::<MembershipTier>().map_err(|_| {
        invalid_value(
            field,
            format!("{field} must be one of free, premium"),
            ValidationCode::InvalidMembership,
            value,
        )
    })
}
