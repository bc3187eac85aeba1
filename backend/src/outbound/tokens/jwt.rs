//! HS256 JSON Web Token implementation of `AccessTokenCodec`.
//!
//! Expiry is checked against the caller-supplied instant rather than the
//! system clock, so verification follows the injected `mockable::Clock`.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::domain::UserId;
use crate::domain::ports::{AccessClaims, AccessTokenCodec, AccessTokenError};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(alias = "userId")]
    sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,
    exp: i64,
}

/// Signs and verifies HS256 tokens with a shared secret.
pub struct JwtAccessTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtAccessTokenCodec {
    /// Codec for `secret`; issued tokens live for `ttl`.
    pub fn new(secret: &Zeroizing<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        validation.required_spec_claims.insert("exp".to_owned());
        validation
    }
}

/// Hex of the first eight bytes of the secret's SHA-256 digest. Safe to log.
///
/// # Examples
/// ```
/// use careline::outbound::tokens::secret_fingerprint;
///
/// let fingerprint = secret_fingerprint(b"development-secret");
/// assert_eq!(fingerprint.len(), 16);
/// ```
#[must_use]
pub fn secret_fingerprint(secret: &[u8]) -> String {
    let digest = Sha256::digest(secret);
    hex::encode(digest.get(..8).unwrap_or_default())
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>, AccessTokenError> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| AccessTokenError::malformed(format!("timestamp {seconds} out of range")))
}

impl AccessTokenCodec for JwtAccessTokenCodec {
    fn issue(
        &self,
        subject: &UserId,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AccessTokenError> {
        let claims = Claims {
            sub: subject.to_string(),
            iat: Some(issued_at.timestamp()),
            exp: (issued_at + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| AccessTokenError::encoding(err.to_string()))
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, AccessTokenError> {
        let data = decode::<Claims>(token, &self.decoding, &Self::validation()).map_err(|err| {
            match err.kind() {
                ErrorKind::InvalidSignature => AccessTokenError::invalid_signature(),
                ErrorKind::ExpiredSignature => AccessTokenError::expired(),
                _ => AccessTokenError::malformed(err.to_string()),
            }
        })?;
        let claims = data.claims;

        let expires_at = timestamp(claims.exp)?;
        if expires_at <= now {
            return Err(AccessTokenError::expired());
        }
        let subject = UserId::new(&claims.sub)
            .map_err(|err| AccessTokenError::invalid_subject(err.to_string()))?;
        let issued_at = claims.iat.map(timestamp).transpose()?;

        Ok(AccessClaims {
            subject,
            issued_at,
            expires_at,
        })
    }
}
