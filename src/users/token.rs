use hmac::{Hmac, Mac};
use jwt::{SignWithKey, VerifyWithKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::types::{ApiError, ValidationError};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
}

fn key(secret: &str) -> Result<Hmac<Sha256>, ApiError> {
    Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| ApiError::Internal)
}

/// Signs an HS256 token naming `user_id` as its subject.
pub fn issue(user_id: i32, secret: &str) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id.to_string(),
    };
    claims
        .sign_with_key(&key(secret)?)
        .map_err(|_| ApiError::Internal)
}

/// Returns the user id carried by a token signed with `secret`.
pub fn verify(token: &str, secret: &str) -> Result<i32, ApiError> {
    let invalid = || ApiError::Validation(ValidationError::from("token", "Invalid jwt token"));
    let claims: Claims = token.verify_with_key(&key(secret)?).map_err(|_| invalid())?;
    claims.sub.parse::<i32>().map_err(|_| invalid())
}
