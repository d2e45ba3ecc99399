//! One-shot signed tokens for the mail-driven flows (password reset and
//! registration confirmation). A token binds an email address to a purpose
//! and an expiry; verification distinguishes "expired" from "tampered or
//! malformed" so the user can be told which happened.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    PasswordReset,
    Registration,
}

impl TokenPurpose {
    fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::PasswordReset => "password_reset",
            TokenPurpose::Registration => "registration",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("token is invalid")]
    Invalid,
}

#[derive(Debug, Serialize, Deserialize)]
struct MailTokenClaims {
    /// Email address the flow was initiated for.
    sub: String,
    purpose: String,
    exp: i64,
    iat: i64,
}

/// Issue a signed token for `email`, valid for the configured reset window.
pub fn issue(email: &str, purpose: TokenPurpose) -> Result<String, TokenError> {
    let ttl = config::config().security.reset_token_expiry_minutes;
    issue_with_ttl(email, purpose, Duration::minutes(ttl as i64))
}

fn issue_with_ttl(email: &str, purpose: TokenPurpose, ttl: Duration) -> Result<String, TokenError> {
    let secret = &config::config().security.secret_key;
    if secret.is_empty() {
        return Err(TokenError::Invalid);
    }

    let now = Utc::now();
    let claims = MailTokenClaims {
        sub: email.to_string(),
        purpose: purpose.as_str().to_string(),
        exp: (now + ttl).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| TokenError::Invalid)
}

/// Verify a token and return the email it was issued for. The purpose must
/// match: a reset token can never complete a registration and vice versa.
pub fn verify(token: &str, purpose: TokenPurpose) -> Result<String, TokenError> {
    let secret = &config::config().security.secret_key;
    if secret.is_empty() {
        return Err(TokenError::Invalid);
    }

    let mut validation = Validation::default();
    validation.leeway = 0;

    let data = decode::<MailTokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })?;

    if data.claims.purpose != purpose.as_str() {
        return Err(TokenError::Invalid);
    }

    Ok(data.claims.sub)
}
