//! Handlers for `/api/buildings/` endpoints.
//!
//! | Method   | Path                   | Notes                                   |
//! |----------|------------------------|-----------------------------------------|
//! | `GET`    | `/api/buildings/`      | `?name=`, `?address=`, `?search=`, `?ordering=`; cached |
//! | `POST`   | `/api/buildings/`      | Admin. Body: `{"name", "address"}`       |
//! | `GET`    | `/api/buildings/{id}/` | 404 if not found                        |
//! | `PUT`    | `/api/buildings/{id}/` | Admin                                   |
//! | `PATCH`  | `/api/buildings/{id}/` | Admin                                   |
//! | `DELETE` | `/api/buildings/{id}/` | Admin. Deletes the building's rooms too |

use axum::{
  Json,
  extract::{Query, RawQuery, State},
  http::{HeaderMap, StatusCode},
  response::{IntoResponse, Response},
};
use residence_core::{
  ValidationErrors,
  building::{Building, BuildingFields},
  query::ListQuery,
  store::ResidenceStore,
};

use crate::{
  AppState,
  auth::{AdminUser, CurrentUser},
  cache::{self, CachedList},
  error::ApiError,
  payload::{Payload, RecordId, Write, required},
};

/// Resolve a building body against the stored fields, if any.
fn building_fields(
  mut body: Payload,
  current: Option<BuildingFields>,
  write: Write,
) -> Result<BuildingFields, ValidationErrors> {
  let (name, address) = match current {
    Some(c) => (Some(c.name), Some(c.address)),
    None => (None, None),
  };

  let mut errors = ValidationErrors::new();
  let name = required(&mut errors, "name", body.field("name"), name, write);
  let address = required(&mut errors, "address", body.field("address"), address, write);

  match (name, address) {
    (Some(name), Some(address)) if errors.is_empty() => Ok(BuildingFields { name, address }),
    _ => Err(errors),
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /api/buildings/`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  RawQuery(raw): RawQuery,
  Query(params): Query<Vec<(String, String)>>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: ResidenceStore + 'static,
{
  let key = cache::key(raw.as_deref(), &headers);
  let epoch = state.cache.epoch(CachedList::Buildings);
  if let Some(body) = state.cache.get(CachedList::Buildings, epoch, &key).await {
    return Ok(cache::list_response(body));
  }

  let query = ListQuery::parse(&Building::LIST, &params)?;
  let buildings = state.store.list_buildings(query).await.map_err(ApiError::store)?;

  let body = cache::encode(&buildings)?;
  state.cache.insert(CachedList::Buildings, epoch, &key, body.clone()).await;
  Ok(cache::list_response(body))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /api/buildings/`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  payload: Result<Payload, ApiError>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ResidenceStore + 'static,
{
  let fields = building_fields(payload?, None, Write::Create)?;
  let building = state.store.create_building(fields).await.map_err(ApiError::store)?;

  state.cache.invalidate(CachedList::Buildings);
  tracing::info!(id = building.id, "building created");
  Ok((StatusCode::CREATED, Json(building)))
}

// ─── Retrieve ─────────────────────────────────────────────────────────────────

/// `GET /api/buildings/{id}/`
pub async fn retrieve<S>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  RecordId(id): RecordId,
) -> Result<Json<Building>, ApiError>
where
  S: ResidenceStore + 'static,
{
  let building = state
    .store
    .get_building(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::NotFound)?;
  Ok(Json(building))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /api/buildings/{id}/`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  RecordId(id): RecordId,
  payload: Result<Payload, ApiError>,
) -> Result<Json<Building>, ApiError>
where
  S: ResidenceStore + 'static,
{
  apply(&state, id, payload, Write::Replace).await
}

/// `PATCH /api/buildings/{id}/`
pub async fn partial_update<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  RecordId(id): RecordId,
  payload: Result<Payload, ApiError>,
) -> Result<Json<Building>, ApiError>
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
) -> Result<Json<Building>, ApiError> {
  let current = state
    .store
    .get_building(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::NotFound)?;

  // An unknown id is a 404 whatever the body holds.
  let fields = building_fields(payload?, Some(current.fields()), write)?;
  let building = state
    .store
    .update_building(id, fields)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::NotFound)?;

  state.cache.invalidate(CachedList::Buildings);
  Ok(Json(building))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /api/buildings/{id}/`
pub async fn destroy<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  RecordId(id): RecordId,
) -> Result<StatusCode, ApiError>
where
  S: ResidenceStore + 'static,
{
  if !state.store.delete_building(id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound);
  }

  // The building's rooms went with it.
  state.cache.invalidate(CachedList::Buildings);
  state.cache.invalidate(CachedList::Rooms);
  tracing::info!(id, "building deleted");
  Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
  use residence_core::validation::{NULL, REQUIRED};
  use serde_json::json;

  use super::*;

  fn body(value: serde_json::Value) -> Payload { Payload::from_value(value).unwrap() }

  #[test]
  fn create_requires_every_field() {
    let errors =
      building_fields(body(json!({ "name": "North" })), None, Write::Create).unwrap_err();
    assert_eq!(errors.get("address"), Some(&[REQUIRED.to_owned()][..]));
  }

  #[test]
  fn patch_keeps_absent_fields() {
    let current = BuildingFields { name: "North".into(), address: "1 Road".into() };
    let fields =
      building_fields(body(json!({ "address": "2 Road" })), Some(current), Write::Partial)
        .unwrap();
    assert_eq!(fields, BuildingFields { name: "North".into(), address: "2 Road".into() });
  }

  #[test]
  fn null_is_rejected_for_required_fields() {
    let current = BuildingFields { name: "North".into(), address: "1 Road".into() };
    let errors =
      building_fields(body(json!({ "name": null })), Some(current), Write::Partial).unwrap_err();
    assert_eq!(errors.get("name"), Some(&[NULL.to_owned()][..]));
  }
}
