//! Best-effort decoding of a bearer token's expiry claim.
//!
//! The API issues JWTs. The application never verifies the signature (only
//! the API holds the key); it reads the `exp` claim so an expired credential
//! is treated as "no session" instead of failing on the next API call.
//! Tokens that cannot be read, or carry no `exp`, are accepted and left for
//! the API to judge.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

/// Why a token's claims could not be read.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Not three dot-separated segments.
    #[error("token is not a JWT")]
    NotJwt,
    /// A segment is not valid base64url.
    #[error("token segment is not base64url")]
    Encoding,
    /// Header or claims are not JSON of the expected shape.
    #[error("token claims are unreadable: {0}")]
    Claims(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidToken => Self::NotJwt,
            ErrorKind::Base64(_) => Self::Encoding,
            _ => Self::Claims(e.to_string()),
        }
    }
}

/// The registered claims the application looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    /// Expiry, seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<i64>,
    /// Issued-at, seconds since the Unix epoch.
    #[serde(default)]
    pub iat: Option<i64>,
}

/// Read claims only: no signature, expiry or audience checks.
static READ_ONLY: LazyLock<Validation> = LazyLock::new(|| {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
});

impl TokenClaims {
    /// Decode the claims of a JWT without verifying its signature.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a JWT or its header or claims
    /// cannot be decoded.
    pub fn decode(token: &str) -> Result<Self, TokenError> {
        let key = DecodingKey::from_secret(&[]);
        Ok(jsonwebtoken::decode::<Self>(token, &key, &READ_ONLY)?.claims)
    }

    /// Expiry as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Whether the token has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}

/// Whether `token` is known to be expired at `now`.
///
/// Undecodable tokens and tokens without `exp` are not considered expired.
#[must_use]
pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
    TokenClaims::decode(token).is_ok_and(|claims| claims.is_expired_at(now))
}
