//! `GET /admin/`: record counts for administrators.

use axum::{Json, extract::State};
use residence_core::store::{ResidenceStore, Summary};

use crate::{AppState, auth::AdminUser, error::ApiError};

pub async fn summary<S>(
  State(state): State<AppState<S>>,
  AdminUser(user): AdminUser,
) -> Result<Json<Summary>, ApiError>
where
  S: ResidenceStore + 'static,
{
  let summary = state.store.summary().await.map_err(ApiError::store)?;
  tracing::debug!(username = %user.username, ?summary, "admin summary");
  Ok(Json(summary))
}
