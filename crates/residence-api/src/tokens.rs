//! `POST /api-token-auth/`: exchange a username and password for a token.

use axum::{Json, extract::State};
use residence_core::{
  ValidationErrors,
  store::ResidenceStore,
  validation::{NON_FIELD, check_text},
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  auth::verify_password,
  error::ApiError,
  payload::{Payload, Write, required},
};

pub const BAD_CREDENTIALS: &str = "Unable to log in with provided credentials.";

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
  pub token:    String,
  pub user_id:  i64,
  pub username: String,
  pub is_admin: bool,
}

/// Returns the user's existing token, or a new one on first login.
pub async fn obtain<S>(
  State(state): State<AppState<S>>,
  payload: Result<Payload, ApiError>,
) -> Result<Json<TokenResponse>, ApiError>
where
  S: ResidenceStore + 'static,
{
  let mut body = payload?;

  let mut errors = ValidationErrors::new();
  let username: Option<String> =
    required(&mut errors, "username", body.field("username"), None, Write::Create);
  let password: Option<String> =
    required(&mut errors, "password", body.field("password"), None, Write::Create);
  if let Some(username) = &username {
    check_text(&mut errors, "username", username, None);
  }
  if let Some(password) = &password {
    check_text(&mut errors, "password", password, None);
  }
  let (Some(username), Some(password)) = (username, password) else {
    return Err(errors.into());
  };
  errors.into_result()?;

  let user = state
    .store
    .get_user_by_username(username.clone())
    .await
    .map_err(ApiError::store)?
    .filter(|user| verify_password(&password, &user.password_hash));
  let Some(user) = user else {
    tracing::warn!(%username, "failed login");
    return Err(ValidationErrors::single(NON_FIELD, BAD_CREDENTIALS).into());
  };

  let token = state.store.token_for_user(user.id).await.map_err(ApiError::store)?;
  Ok(Json(TokenResponse {
    token,
    user_id: user.id,
    username: user.username,
    is_admin: user.is_admin,
  }))
}
