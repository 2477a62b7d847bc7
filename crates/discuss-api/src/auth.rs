//! Bearer-token extractor.
//!
//! The token is handed to the identity gateway untouched; this module only
//! pulls it out of the `Authorization` header. A missing or malformed header
//! is treated exactly like a token the gateway rejects.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use discuss_core::Error;

use crate::error::ApiError;

/// The caller's opaque token, taken from `Authorization: Bearer <token>`.
pub struct BearerToken(pub String);

/// Extract the bearer token from `headers`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, Error> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or(Error::Unauthorized)
}

impl<S> FromRequestParts<S> for BearerToken
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    Ok(BearerToken(bearer_token(&parts.headers)?.to_owned()))
  }
}
