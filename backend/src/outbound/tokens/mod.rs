//! Bearer credential codecs.

mod jwt;

pub use jwt::{JwtAccessTokenCodec, secret_fingerprint};
