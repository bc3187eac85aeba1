//! Metered operation records counted against monthly quotas.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::UserId;

/// Metered operation kinds. Each kind has its own allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Diagnosis,
    DrugAnalysis,
}

impl OperationKind {
    pub const ALL: [Self; 2] = [Self::Diagnosis, Self::DrugAnalysis];

    /// Storage and query-string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Diagnosis => "diagnosis",
            Self::DrugAnalysis => "drug_analysis",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored or requested enumeration value is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {field} '{value}'")]
pub struct UnknownOperationValue {
    pub field: &'static str,
    pub value: String,
}

impl FromStr for OperationKind {
    type Err = UnknownOperationValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "diagnosis" => Ok(Self::Diagnosis),
            "drug_analysis" => Ok(Self::DrugAnalysis),
            other => Err(UnknownOperationValue {
                field: "operation kind",
                value: other.to_owned(),
            }),
        }
    }
}

/// Lifecycle of a record: reserved before the AI call, completed after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Pending,
    Completed,
}

impl OperationStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl FromStr for OperationStatus {
    type Err = UnknownOperationValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(UnknownOperationValue {
                field: "operation status",
                value: other.to_owned(),
            }),
        }
    }
}

/// Identifier of a metered operation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(Uuid);

impl OperationId {
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for OperationId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Record about to be reserved against a user's allowance.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeteredOperation {
    pub id: OperationId,
    pub user_id: UserId,
    pub kind: OperationKind,
    /// Sanitised request payload kept for the user's history.
    pub request: Value,
    /// Sole discriminator for the quota period.
    pub created_at: DateTime<Utc>,
}

/// Stored metered operation.
///
/// ## Invariants
/// - Exactly one record exists per admitted metered request.
/// - `created_at` never changes after reservation.
#[derive(Debug, Clone, PartialEq)]
pub struct MeteredOperationRecord {
    pub id: OperationId,
    pub user_id: UserId,
    pub kind: OperationKind,
    pub status: OperationStatus,
    pub request: Value,
    pub result: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl From<NewMeteredOperation> for MeteredOperationRecord {
    fn from(value: NewMeteredOperation) -> Self {
        let NewMeteredOperation {
            id,
            user_id,
            kind,
            request,
            created_at,
        } = value;
        Self {
            id,
            user_id,
            kind,
            status: OperationStatus::Pending,
            request,
            result: None,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(OperationKind::Diagnosis)]
    #[case(OperationKind::DrugAnalysis)]
    fn kind_parses_its_own_representation(#[case] kind: OperationKind) {
        assert_eq!(kind.as_str().parse::<OperationKind>(), Ok(kind));
    }

    #[rstest]
    fn kind_rejects_unmetered_names() {
        let err = "fracture".parse::<OperationKind>().expect_err("unmetered");
        assert_eq!(err.to_string(), "unknown operation kind 'fracture'");
    }

    #[rstest]
    fn new_record_starts_pending_without_result() {
        let record = MeteredOperationRecord::from(NewMeteredOperation {
            id: OperationId::random(),
            user_id: UserId::random(),
            kind: OperationKind::Diagnosis,
            request: serde_json::json!({ "input_text": "fever" }),
            created_at: Utc::now(),
        });
        assert_eq!(record.status, OperationStatus::Pending);
        assert!(record.result.is_none());
    }
}
