//! Handlers for `/api/residents/` endpoints.
//!
//! Resident listings are not cached. `notes` is accepted and returned as
//! plaintext; the store seals it at rest.

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use residence_core::{
  ValidationErrors,
  query::ListQuery,
  resident::{Resident, ResidentFields},
  store::ResidenceStore,
};

use crate::{
  AppState,
  auth::{AdminUser, CurrentUser},
  error::ApiError,
  payload::{Payload, RecordId, Write, optional, required},
};

fn resident_fields(
  mut body: Payload,
  current: Option<ResidentFields>,
  write: Write,
) -> Result<ResidentFields, ValidationErrors> {
  let mut errors = ValidationErrors::new();
  let current = current.as_ref();
  let e = &mut errors;

  let first_name = required(
    e,
    "first_name",
    body.field("first_name"),
    current.map(|c| c.first_name.clone()),
    write,
  );
  let last_name =
    required(e, "last_name", body.field("last_name"), current.map(|c| c.last_name.clone()), write);
  let email = required(e, "email", body.field("email"), current.map(|c| c.email.clone()), write);
  let check_in_date = required(
    e,
    "check_in_date",
    body.field("check_in_date"),
    current.map(|c| c.check_in_date),
    write,
  );

  let room = optional(e, "room", body.field("room"), current.and_then(|c| c.room));
  let check_out_date = optional(
    e,
    "check_out_date",
    body.field("check_out_date"),
    current.and_then(|c| c.check_out_date),
  );
  let notes = optional(e, "notes", body.field("notes"), current.and_then(|c| c.notes.clone()));

  match (first_name, last_name, email, check_in_date) {
    (Some(first_name), Some(last_name), Some(email), Some(check_in_date))
      if errors.is_empty() =>
    {
      Ok(ResidentFields {
        first_name,
        last_name,
        email,
        room,
        check_in_date,
        check_out_date,
        notes,
      })
    }
    _ => Err(errors),
  }
}

/// `GET /api/residents/`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Resident>>, ApiError>
where
  S: ResidenceStore + 'static,
{
  let query = ListQuery::parse(&Resident::LIST, &params)?;
  let residents = state.store.list_residents(query).await.map_err(ApiError::store)?;
  Ok(Json(residents))
}

/// `POST /api/residents/`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  payload: Result<Payload, ApiError>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ResidenceStore + 'static,
{
  let fields = resident_fields(payload?, None, Write::Create)?;
  let resident = state.store.create_resident(fields).await.map_err(ApiError::store)?;
  tracing::info!(id = resident.id, name = %resident.full_name(), "resident created");
  Ok((StatusCode::CREATED, Json(resident)))
}

/// `GET /api/residents/{id}/`
pub async fn retrieve<S>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  RecordId(id): RecordId,
) -> Result<Json<Resident>, ApiError>
where
  S: ResidenceStore + 'static,
{
  let resident = state
    .store
    .get_resident(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::NotFound)?;
  Ok(Json(resident))
}

/// `PUT /api/residents/{id}/`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  RecordId(id): RecordId,
  payload: Result<Payload, ApiError>,
) -> Result<Json<Resident>, ApiError>
where
  S: ResidenceStore + 'static,
{
  apply(&state, id, payload, Write::Replace).await
}

/// `PATCH /api/residents/{id}/`
pub async fn partial_update<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  RecordId(id): RecordId,
  payload: Result<Payload, ApiError>,
) -> Result<Json<Resident>, ApiError>
where
  S: ResidenceStore + 'static,
{
  apply(&state, id, payload, Write::Partial).await
}

async fn apply<S: ResidenceStore>(
  state: &AppState<S>,
  id: i64,
  payload: Result<Payload, ApiError>,
  write: Write,
) -> Result<Json<Resident>, ApiError> {
  let current = state
    .store
    .get_resident(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::NotFound)?;

  let fields = resident_fields(payload?, Some(current.fields()), write)?;
  let resident = state
    .store
    .update_resident(id, fields)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::NotFound)?;
  Ok(Json(resident))
}

/// `DELETE /api/residents/{id}/`
pub async fn destroy<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  RecordId(id): RecordId,
) -> Result<StatusCode, ApiError>
where
  S: ResidenceStore + 'static,
{
  if !state.store.delete_resident(id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound);
  }
  tracing::info!(id, "resident deleted");
  Ok(StatusCode::NO_CONTENT)
}
