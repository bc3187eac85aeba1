//! Internal Diesel row structs.
//!
//! Rows never leave the persistence layer; each adapter converts them into
//! domain types and rejects unknown enumeration values instead of guessing.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    MeteredOperationRecord, NewMeteredOperation, OperationId, OperationKind, OperationStatus,
    User, UserId,
};

use super::schema::{metered_operations, users};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub membership_type: String,
    pub is_verified: bool,
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse().map_err(|err| format!("{err}"))?;
        let membership = row.membership_type.parse().map_err(|err| format!("{err}"))?;
        Ok(User::builder(UserId::from(row.id), role)
            .email(row.email)
            .full_name(row.full_name)
            .membership(membership)
            .verified(row.is_verified)
            .build())
    }
}

/// Insertable and update-on-conflict payload for `users`.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserWriteRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub full_name: &'a str,
    pub role: &'a str,
    pub membership_type: &'a str,
    pub is_verified: bool,
}

impl<'a> From<&'a User> for UserWriteRow<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            id: *user.id().as_uuid(),
            email: user.email(),
            full_name: user.full_name(),
            role: user.role().as_str(),
            membership_type: user.membership().as_str(),
            is_verified: user.is_verified(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = metered_operations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MeteredOperationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub status: String,
    pub request: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<MeteredOperationRow> for MeteredOperationRecord {
    type Error = String;

    fn try_from(row: MeteredOperationRow) -> Result<Self, Self::Error> {
        let kind: OperationKind = row.kind.parse().map_err(|err| format!("{err}"))?;
        let status: OperationStatus = row.status.parse().map_err(|err| format!("{err}"))?;
        Ok(Self {
            id: OperationId::from(row.id),
            user_id: UserId::from(row.user_id),
            kind,
            status,
            request: row.request,
            result: row.result,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = metered_operations)]
pub(crate) struct NewMeteredOperationRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: &'a str,
    pub status: &'a str,
    pub request: &'a serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a NewMeteredOperation> for NewMeteredOperationRow<'a> {
    fn from(operation: &'a NewMeteredOperation) -> Self {
        Self {
            id: *operation.id.as_uuid(),
            user_id: *operation.user_id.as_uuid(),
            kind: operation.kind.as_str(),
            status: OperationStatus::Pending.as_str(),
            request: &operation.request,
            created_at: operation.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MembershipTier, Role};
    use rstest::rstest;
    use serde_json::json;

    fn user_row(role: &str, membership: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_owned(),
            full_name: "Ada Lovelace".to_owned(),
            role: role.to_owned(),
            membership_type: membership.to_owned(),
            is_verified: true,
        }
    }

    #[rstest]
    fn user_rows_convert_to_domain_users() {
        let user = User::try_from(user_row("doctor", "premium")).expect("valid row");
        assert_eq!(user.role(), Role::Doctor);
        assert_eq!(user.membership(), MembershipTier::Premium);
        assert!(user.is_verified());
    }

    #[rstest]
    #[case("nurse", "free")]
    #[case("patient", "gold")]
    fn unknown_stored_values_are_rejected(#[case] role: &str, #[case] membership: &str) {
        assert!(User::try_from(user_row(role, membership)).is_err());
    }

    #[rstest]
    fn operation_rows_reject_unknown_kinds() {
        let row = MeteredOperationRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            kind: "x_ray".to_owned(),
            status: "pending".to_owned(),
            request: json!({}),
            result: None,
            created_at: Utc::now(),
        };
        let err = MeteredOperationRecord::try_from(row).expect_err("unknown kind");
        assert!(err.contains("x_ray"));
    }
}
