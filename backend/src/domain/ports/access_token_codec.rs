//! Port for signing and verifying bearer credentials.

use chrono::{DateTime, Utc};

use crate::domain::UserId;

use super::define_port_error;

/// Verified contents of a bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    pub subject: UserId,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

define_port_error! {
    /// Errors raised by credential codecs.
    pub enum AccessTokenError {
        /// The token is not a decodable credential.
        Malformed { message: String } => "access token malformed: {message}",
        /// The signature does not match the configured secret.
        InvalidSignature => "access token signature invalid",
        /// The token's expiry is in the past.
        Expired => "access token expired",
        /// The subject claim is not a valid user identifier.
        InvalidSubject { message: String } => "access token subject invalid: {message}",
        /// A token could not be produced.
        Encoding { message: String } => "access token could not be encoded: {message}",
    }
}

/// Credential codec. Time is passed in so expiry follows the injected clock.
#[cfg_attr(test, mockall::automock)]
pub trait AccessTokenCodec: Send + Sync {
    /// Sign a credential for `subject` issued at `issued_at`.
    fn issue(&self, subject: &UserId, issued_at: DateTime<Utc>)
    -> Result<String, AccessTokenError>;

    /// Verify signature and expiry against `now`.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, AccessTokenError>;
}
