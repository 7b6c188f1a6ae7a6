//! Token authentication extractors and password hashing.
//!
//! Clients send `Authorization: Token <key>`, with a key obtained from
//! `POST /api-token-auth/`. [`CurrentUser`] resolves the key to a user;
//! [`AdminUser`] additionally requires administrator privilege.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use rand_core::OsRng;
use residence_core::{account::User, store::ResidenceStore};

use crate::{AppState, error::ApiError};

pub const NOT_PROVIDED: &str = "Authentication credentials were not provided.";
pub const INVALID_TOKEN: &str = "Invalid token.";
const NO_CREDENTIALS: &str = "Invalid token header. No credentials provided.";
const HAS_SPACES: &str = "Invalid token header. Token string should not contain spaces.";
const BAD_CHARACTERS: &str =
  "Invalid token header. Token string should not contain invalid characters.";

const KEYWORD: &str = "Token";

/// Pull the token key out of the `Authorization` header.
///
/// `Ok(None)` means the request carries no token credentials at all (no
/// header, or another scheme); malformed token headers are errors.
pub fn token_from_headers(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
  let Some(value) = headers.get(header::AUTHORIZATION) else {
    return Ok(None);
  };
  let value = value.to_str().map_err(|_| ApiError::Unauthorized(BAD_CHARACTERS))?;

  let mut parts = value.split_whitespace();
  match parts.next() {
    Some(scheme) if scheme.eq_ignore_ascii_case(KEYWORD) => {}
    _ => return Ok(None),
  }

  let key = parts.next().ok_or(ApiError::Unauthorized(NO_CREDENTIALS))?;
  if parts.next().is_some() {
    return Err(ApiError::Unauthorized(HAS_SPACES));
  }
  Ok(Some(key))
}

/// Present in a handler means the request carried a valid token.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: ResidenceStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let key = token_from_headers(&parts.headers)?
      .ok_or(ApiError::Unauthorized(NOT_PROVIDED))?
      .to_owned();

    let user = state
      .store
      .user_for_token(key)
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::Unauthorized(INVALID_TOKEN))?;

    Ok(CurrentUser(user))
  }
}

/// Like [`CurrentUser`], but rejects non-administrators with 403.
pub struct AdminUser(pub User);

impl<S> FromRequestParts<AppState<S>> for AdminUser
where
  S: ResidenceStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
    if !user.is_admin {
      tracing::debug!(username = %user.username, "write refused for non-admin");
      return Err(ApiError::Forbidden);
    }
    Ok(AdminUser(user))
  }
}

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// `true` if `password` matches the PHC string `hash`. Unparseable hashes
/// never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
  PasswordHash::new(hash)
    .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
    .unwrap_or(false)
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
  }

  #[test]
  fn token_keyword_is_case_insensitive() {
    assert_eq!(token_from_headers(&headers("Token abc123")).unwrap(), Some("abc123"));
    assert_eq!(token_from_headers(&headers("token abc123")).unwrap(), Some("abc123"));
  }

  #[test]
  fn other_schemes_count_as_no_credentials() {
    assert_eq!(token_from_headers(&HeaderMap::new()).unwrap(), None);
    assert_eq!(token_from_headers(&headers("Bearer abc")).unwrap(), None);
  }

  #[test]
  fn malformed_token_headers_are_rejected() {
    assert!(matches!(
      token_from_headers(&headers("Token")),
      Err(ApiError::Unauthorized(NO_CREDENTIALS))
    ));
    assert!(matches!(
      token_from_headers(&headers("Token a b")),
      Err(ApiError::Unauthorized(HAS_SPACES))
    ));
  }

  #[test]
  fn password_hash_verifies() {
    let hash = hash_password("adminpass").unwrap();
    assert!(verify_password("adminpass", &hash));
    assert!(!verify_password("wrong", &hash));
    assert!(!verify_password("adminpass", "not-a-phc-string"));
  }
}
