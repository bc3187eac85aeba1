//! User identity, role, and membership model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned when building user components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    UnknownRole { value: String },
    UnknownMembership { value: String },
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::UnknownRole { value } => {
                write!(f, "role must be one of patient, doctor, admin (got '{value}')")
            }
            Self::UnknownMembership { value } => {
                write!(f, "membership type must be free or premium (got '{value}')")
            }
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`UserId`].
    #[must_use]
    pub fn random() -> Self {
        Self::from(Uuid::new_v4())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for UserId {
    fn from(value: Uuid) -> Self {
        Self(value, value.to_string())
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Account role used for route authorisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

impl Role {
    /// Wire and storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Doctor => "doctor",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "patient" => Ok(Self::Patient),
            "doctor" => Ok(Self::Doctor),
            "admin" => Ok(Self::Admin),
            other => Err(UserValidationError::UnknownRole {
                value: other.to_owned(),
            }),
        }
    }
}

/// Paid membership tier controlling whether quotas apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipTier {
    #[default]
    Free,
    Premium,
}

impl MembershipTier {
    /// Wire and storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
        }
    }
}

impl fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipTier {
    type Err = UserValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "free" => Ok(Self::Free),
            "premium" => Ok(Self::Premium),
            other => Err(UserValidationError::UnknownMembership {
                value: other.to_owned(),
            }),
        }
    }
}

/// Application user as seen by access control.
///
/// ## Invariants
/// - `id` is a valid UUID.
/// - `role` and `membership` are closed enumerations; unknown stored values
///   are rejected by the persistence adapter rather than defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    email: String,
    full_name: String,
    role: Role,
    membership: MembershipTier,
    is_verified: bool,
}

impl User {
    /// Start building a user with the mandatory identity fields.
    ///
    /// # Examples
    /// ```
    /// use careline::domain::{MembershipTier, Role, User, UserId};
    ///
    /// let user = User::builder(UserId::random(), Role::Patient)
    ///     .email("pat@example.com")
    ///     .membership(MembershipTier::Premium)
    ///     .build();
    /// assert_eq!(user.membership(), MembershipTier::Premium);
    /// ```
    #[must_use]
    pub fn builder(id: UserId, role: Role) -> UserBuilder {
        UserBuilder {
            user: Self {
                id,
                email: String::new(),
                full_name: String::new(),
                role,
                membership: MembershipTier::Free,
                is_verified: false,
            },
        }
    }

    /// Stable user identifier.
    #[must_use]
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Contact email address.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Display name.
    #[must_use]
    pub fn full_name(&self) -> &str {
        self.full_name.as_str()
    }

    /// Account role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Membership tier.
    #[must_use]
    pub fn membership(&self) -> MembershipTier {
        self.membership
    }

    /// Whether an administrator has verified the account.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.is_verified
    }
}

/// Builder returned by [`User::builder`].
#[derive(Debug, Clone)]
pub struct UserBuilder {
    user: User,
}

impl UserBuilder {
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.user.email = email.into();
        self
    }

    #[must_use]
    pub fn full_name(mut self, full_name: impl Into<String>) -> Self {
        self.user.full_name = full_name.into();
        self
    }

    #[must_use]
    pub fn membership(mut self, membership: MembershipTier) -> Self {
        self.user.membership = membership;
        self
    }

    #[must_use]
    pub fn verified(mut self, is_verified: bool) -> Self {
        self.user.is_verified = is_verified;
        self
    }

    #[must_use]
    pub fn build(self) -> User {
        self.user
    }
}
