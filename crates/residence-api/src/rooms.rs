//! Handlers for `/api/rooms/` endpoints.
//!
//! | Method   | Path               | Notes                                              |
//! |----------|--------------------|----------------------------------------------------|
//! | `GET`    | `/api/rooms/`      | `?building=`, `?room_number=`, `?capacity=`; cached |
//! | `POST`   | `/api/rooms/`      | Admin. Body: `{"building", "room_number", "capacity"}` |
//! | `GET`    | `/api/rooms/{id}/` | 404 if not found                                   |
//! | `PUT`    | `/api/rooms/{id}/` | Admin                                              |
//! | `PATCH`  | `/api/rooms/{id}/` | Admin                                              |
//! | `DELETE` | `/api/rooms/{id}/` | Admin. Residents of the room are left unassigned   |

use axum::{
  Json,
  extract::{Query, RawQuery, State},
  http::{HeaderMap, StatusCode},
  response::{IntoResponse, Response},
};
use residence_core::{
  ValidationErrors,
  room::{Room, RoomFields},
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

fn room_fields(
  mut body: Payload,
  current: Option<RoomFields>,
  write: Write,
) -> Result<RoomFields, ValidationErrors> {
  let (building, room_number, capacity) = match current {
    Some(c) => (Some(c.building), Some(c.room_number), Some(c.capacity)),
    None => (None, None, None),
  };

  let mut errors = ValidationErrors::new();
  let building = required(&mut errors, "building", body.field("building"), building, write);
  let room_number =
    required(&mut errors, "room_number", body.field("room_number"), room_number, write);
  let capacity = required(&mut errors, "capacity", body.field("capacity"), capacity, write);

  match (building, room_number, capacity) {
    (Some(building), Some(room_number), Some(capacity)) if errors.is_empty() => {
      Ok(RoomFields { building, room_number, capacity })
    }
    _ => Err(errors),
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /api/rooms/`
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
  let epoch = state.cache.epoch(CachedList::Rooms);
  if let Some(body) = state.cache.get(CachedList::Rooms, epoch, &key).await {
    return Ok(cache::list_response(body));
  }

  let query = ListQuery::parse(&Room::LIST, &params)?;
  let rooms = state.store.list_rooms(query).await.map_err(ApiError::store)?;

  let body = cache::encode(&rooms)?;
  state.cache.insert(CachedList::Rooms, epoch, &key, body.clone()).await;
  Ok(cache::list_response(body))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /api/rooms/`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  payload: Result<Payload, ApiError>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ResidenceStore + 'static,
{
  let fields = room_fields(payload?, None, Write::Create)?;
  let room = state.store.create_room(fields).await.map_err(ApiError::store)?;

  state.cache.invalidate(CachedList::Rooms);
  tracing::info!(id = room.id, "room created");
  Ok((StatusCode::CREATED, Json(room)))
}

// ─── Retrieve ─────────────────────────────────────────────────────────────────

/// `GET /api/rooms/{id}/`
pub async fn retrieve<S>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  RecordId(id): RecordId,
) -> Result<Json<Room>, ApiError>
where
  S: ResidenceStore + 'static,
{
  let room = state
    .store
    .get_room(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::NotFound)?;
  Ok(Json(room))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /api/rooms/{id}/`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  RecordId(id): RecordId,
  payload: Result<Payload, ApiError>,
) -> Result<Json<Room>, ApiError>
where
  S: ResidenceStore + 'static,
{
  apply(&state, id, payload, Write::Replace).await
}

/// `PATCH /api/rooms/{id}/`
pub async fn partial_update<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  RecordId(id): RecordId,
  payload: Result<Payload, ApiError>,
) -> Result<Json<Room>, ApiError>
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
) -> Result<Json<Room>, ApiError> {
  let current = state
    .store
    .get_room(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::NotFound)?;

  let fields = room_fields(payload?, Some(current.fields()), write)?;
  let room = state
    .store
    .update_room(id, fields)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::NotFound)?;

  state.cache.invalidate(CachedList::Rooms);
  Ok(Json(room))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /api/rooms/{id}/`
pub async fn destroy<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  RecordId(id): RecordId,
) -> Result<StatusCode, ApiError>
where
  S: ResidenceStore + 'static,
{
  if !state.store.delete_room(id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound);
  }

  state.cache.invalidate(CachedList::Rooms);
  tracing::info!(id, "room deleted");
  Ok(StatusCode::NO_CONTENT)
}
