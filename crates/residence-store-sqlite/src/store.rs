//! [`SqliteStore`]: the SQLite implementation of [`ResidenceStore`].

use std::{path::Path, sync::Arc};

use chrono::Utc;
use residence_core::{
  ValidationErrors,
  account::{DUPLICATE_USERNAME, NewUser, User, generate_token_key},
  building::{Building, BuildingFields},
  cipher::FieldCipher,
  query::ListQuery,
  resident::{DUPLICATE_EMAIL, Resident, ResidentFields},
  room::{Room, RoomFields, missing_reference},
  store::{ResidenceStore, Summary},
};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  Result,
  encode::{
    BUILDING_COLUMNS, RESIDENT_COLUMNS, ROOM_COLUMNS, RawResident, RawUser, USER_COLUMNS,
    building_from_row, encode_date, encode_dt, room_from_row,
  },
  schema::SCHEMA,
  sql,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A residence store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection and cipher are reference-counted.
/// All statements run on one connection thread, so the existence and
/// uniqueness checks done inside a single `call` cannot interleave with other
/// writes.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
  cipher:          Arc<FieldCipher>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  ///
  /// `cipher` seals and opens the encrypted resident columns; it must be
  /// built from the same master key on every open.
  pub async fn open(path: impl AsRef<Path>, cipher: FieldCipher) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, cipher: Arc::new(cipher) };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory(cipher: FieldCipher) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, cipher: Arc::new(cipher) };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  fn seal_notes(&self, notes: Option<&str>) -> Result<Option<String>> {
    Ok(notes.map(|n| self.cipher.seal(n)).transpose()?.map(|s| s.encode()))
  }
}

/// `true` if `table` has a row with primary key `id`.
fn row_exists(conn: &Connection, table: &'static str, id: i64) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        &format!("SELECT 1 FROM {table} WHERE id = ?1"),
        rusqlite::params![id],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

/// Checks that need stored data: room reference and email uniqueness.
/// `own_id` excludes the resident being updated from the email check.
fn resident_conflicts(
  conn: &Connection,
  own_id: Option<i64>,
  room: Option<i64>,
  email: &str,
) -> rusqlite::Result<ValidationErrors> {
  let mut errors = ValidationErrors::new();

  if let Some(room_id) = room
    && !row_exists(conn, "rooms", room_id)?
  {
    errors.add("room", missing_reference(room_id));
  }

  let taken = conn
    .query_row(
      "SELECT 1 FROM residents WHERE email = ?1 AND (?2 IS NULL OR id != ?2)",
      rusqlite::params![email, own_id],
      |_| Ok(()),
    )
    .optional()?
    .is_some();
  if taken {
    errors.add("email", DUPLICATE_EMAIL);
  }

  Ok(errors)
}

// ─── ResidenceStore impl ─────────────────────────────────────────────────────

impl ResidenceStore for SqliteStore {
  type Error = crate::Error;

  // ── Buildings ─────────────────────────────────────────────────────────────

  async fn list_buildings(&self, query: ListQuery) -> Result<Vec<Building>> {
    let select = sql::select(BUILDING_COLUMNS, "buildings", &query);

    let buildings = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&select.sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(select.params.iter()), building_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(buildings)
  }

  async fn get_building(&self, id: i64) -> Result<Option<Building>> {
    let building = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {BUILDING_COLUMNS} FROM buildings WHERE id = ?1"),
              rusqlite::params![id],
              building_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    Ok(building)
  }

  async fn create_building(&self, fields: BuildingFields) -> Result<Building> {
    fields.validate()?;

    let BuildingFields { name, address } = fields.clone();
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO buildings (name, address) VALUES (?1, ?2)",
          rusqlite::params![name, address],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    tracing::debug!(id, "building created");
    Ok(Building { id, name: fields.name, address: fields.address })
  }

  async fn update_building(&self, id: i64, fields: BuildingFields) -> Result<Option<Building>> {
    fields.validate()?;

    let BuildingFields { name, address } = fields.clone();
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE buildings SET name = ?1, address = ?2 WHERE id = ?3",
          rusqlite::params![name, address, id],
        )?)
      })
      .await?;

    Ok((changed > 0).then(|| Building { id, name: fields.name, address: fields.address }))
  }

  async fn delete_building(&self, id: i64) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM buildings WHERE id = ?1", rusqlite::params![id])?)
      })
      .await?;

    if deleted > 0 {
      tracing::debug!(id, "building deleted with its rooms");
    }
    Ok(deleted > 0)
  }

  // ── Rooms ─────────────────────────────────────────────────────────────────

  async fn list_rooms(&self, query: ListQuery) -> Result<Vec<Room>> {
    let select = sql::select(ROOM_COLUMNS, "rooms", &query);

    let rooms = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&select.sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(select.params.iter()), room_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rooms)
  }

  async fn get_room(&self, id: i64) -> Result<Option<Room>> {
    let room = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = ?1"),
              rusqlite::params![id],
              room_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    Ok(room)
  }

  async fn create_room(&self, fields: RoomFields) -> Result<Room> {
    fields.validate()?;

    let RoomFields { building, room_number, capacity } = fields.clone();
    let outcome = self
      .conn
      .call(move |conn| {
        if !row_exists(conn, "buildings", building)? {
          return Ok(Err(ValidationErrors::single("building", missing_reference(building))));
        }
        conn.execute(
          "INSERT INTO rooms (building_id, room_number, capacity) VALUES (?1, ?2, ?3)",
          rusqlite::params![building, room_number, capacity],
        )?;
        Ok(Ok(conn.last_insert_rowid()))
      })
      .await?;

    let id = outcome?;
    Ok(Room {
      id,
      building:    fields.building,
      room_number: fields.room_number,
      capacity:    fields.capacity,
    })
  }

  async fn update_room(&self, id: i64, fields: RoomFields) -> Result<Option<Room>> {
    fields.validate()?;

    let RoomFields { building, room_number, capacity } = fields.clone();
    let outcome = self
      .conn
      .call(move |conn| {
        if !row_exists(conn, "rooms", id)? {
          return Ok(Ok(false));
        }
        if !row_exists(conn, "buildings", building)? {
          return Ok(Err(ValidationErrors::single("building", missing_reference(building))));
        }
        conn.execute(
          "UPDATE rooms SET building_id = ?1, room_number = ?2, capacity = ?3 WHERE id = ?4",
          rusqlite::params![building, room_number, capacity, id],
        )?;
        Ok(Ok(true))
      })
      .await?;

    Ok(outcome?.then(|| Room {
      id,
      building:    fields.building,
      room_number: fields.room_number,
      capacity:    fields.capacity,
    }))
  }

  async fn delete_room(&self, id: i64) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM rooms WHERE id = ?1", rusqlite::params![id])?)
      })
      .await?;

    Ok(deleted > 0)
  }

  // ── Residents ─────────────────────────────────────────────────────────────

  async fn list_residents(&self, query: ListQuery) -> Result<Vec<Resident>> {
    let select = sql::select(RESIDENT_COLUMNS, "residents", &query);

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&select.sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(select.params.iter()), RawResident::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(|raw| raw.into_resident(&self.cipher)).collect()
  }

  async fn get_resident(&self, id: i64) -> Result<Option<Resident>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {RESIDENT_COLUMNS} FROM residents WHERE id = ?1"),
              rusqlite::params![id],
              RawResident::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(|raw| raw.into_resident(&self.cipher)).transpose()
  }

  async fn create_resident(&self, fields: ResidentFields) -> Result<Resident> {
    fields.validate()?;

    let notes_sealed   = self.seal_notes(fields.notes.as_deref())?;
    let first_name     = fields.first_name.clone();
    let last_name      = fields.last_name.clone();
    let email          = fields.email.clone();
    let room           = fields.room;
    let check_in_str   = encode_date(fields.check_in_date);
    let check_out_str  = fields.check_out_date.map(encode_date);

    let outcome = self
      .conn
      .call(move |conn| {
        let conflicts = resident_conflicts(conn, None, room, &email)?;
        if !conflicts.is_empty() {
          return Ok(Err(conflicts));
        }
        conn.execute(
          "INSERT INTO residents (
             first_name, last_name, email, room_id,
             check_in_date, check_out_date, notes_sealed
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            first_name,
            last_name,
            email,
            room,
            check_in_str,
            check_out_str,
            notes_sealed,
          ],
        )?;
        Ok(Ok(conn.last_insert_rowid()))
      })
      .await?;

    let id = outcome?;
    Ok(Resident {
      id,
      first_name:     fields.first_name,
      last_name:      fields.last_name,
      email:          fields.email,
      room:           fields.room,
      check_in_date:  fields.check_in_date,
      check_out_date: fields.check_out_date,
      notes:          fields.notes,
    })
  }

  async fn update_resident(&self, id: i64, fields: ResidentFields) -> Result<Option<Resident>> {
    fields.validate()?;

    let notes_sealed   = self.seal_notes(fields.notes.as_deref())?;
    let first_name     = fields.first_name.clone();
    let last_name      = fields.last_name.clone();
    let email          = fields.email.clone();
    let room           = fields.room;
    let check_in_str   = encode_date(fields.check_in_date);
    let check_out_str  = fields.check_out_date.map(encode_date);

    let outcome = self
      .conn
      .call(move |conn| {
        if !row_exists(conn, "residents", id)? {
          return Ok(Ok(false));
        }
        let conflicts = resident_conflicts(conn, Some(id), room, &email)?;
        if !conflicts.is_empty() {
          return Ok(Err(conflicts));
        }
        conn.execute(
          "UPDATE residents SET
             first_name = ?1, last_name = ?2, email = ?3, room_id = ?4,
             check_in_date = ?5, check_out_date = ?6, notes_sealed = ?7
           WHERE id = ?8",
          rusqlite::params![
            first_name,
            last_name,
            email,
            room,
            check_in_str,
            check_out_str,
            notes_sealed,
            id,
          ],
        )?;
        Ok(Ok(true))
      })
      .await?;

    Ok(outcome?.then(|| Resident {
      id,
      first_name:     fields.first_name,
      last_name:      fields.last_name,
      email:          fields.email,
      room:           fields.room,
      check_in_date:  fields.check_in_date,
      check_out_date: fields.check_out_date,
      notes:          fields.notes,
    }))
  }

  async fn delete_resident(&self, id: i64) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM residents WHERE id = ?1", rusqlite::params![id])?)
      })
      .await?;

    Ok(deleted > 0)
  }

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn create_user(&self, user: NewUser) -> Result<User> {
    user.validate()?;

    let date_joined = Utc::now();
    let username    = user.username.clone();
    let hash        = user.password_hash.clone();
    let is_admin    = user.is_admin;
    let joined_str  = encode_dt(date_joined);

    let outcome = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row(
            "SELECT 1 FROM users WHERE username = ?1",
            rusqlite::params![username],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Ok(Err(ValidationErrors::single("username", DUPLICATE_USERNAME)));
        }
        conn.execute(
          "INSERT INTO users (username, password_hash, is_admin, date_joined)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![username, hash, is_admin, joined_str],
        )?;
        Ok(Ok(conn.last_insert_rowid()))
      })
      .await?;

    let id = outcome?;
    tracing::info!(id, username = %user.username, is_admin, "user created");
    Ok(User {
      id,
      username: user.username,
      password_hash: user.password_hash,
      is_admin,
      date_joined,
    })
  }

  async fn get_user_by_username(&self, username: String) -> Result<Option<User>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
              rusqlite::params![username],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn token_for_user(&self, user_id: i64) -> Result<String> {
    let fresh_key  = generate_token_key();
    let created_at = encode_dt(Utc::now());

    let key = self
      .conn
      .call(move |conn| {
        let existing: Option<String> = conn
          .query_row(
            "SELECT key FROM tokens WHERE user_id = ?1",
            rusqlite::params![user_id],
            |row| row.get(0),
          )
          .optional()?;
        if let Some(key) = existing {
          return Ok(key);
        }
        conn.execute(
          "INSERT INTO tokens (key, user_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![fresh_key, user_id, created_at],
        )?;
        Ok(fresh_key)
      })
      .await?;

    Ok(key)
  }

  async fn user_for_token(&self, key: String) -> Result<Option<User>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT u.id, u.username, u.password_hash, u.is_admin, u.date_joined
               FROM tokens t
               JOIN users u ON u.id = t.user_id
               WHERE t.key = ?1",
              rusqlite::params![key],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  // ── Reporting ─────────────────────────────────────────────────────────────

  async fn summary(&self) -> Result<Summary> {
    let counts = self
      .conn
      .call(|conn| {
        let count = |table: &str| -> rusqlite::Result<i64> {
          conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        };
        Ok([count("buildings")?, count("rooms")?, count("residents")?, count("users")?])
      })
      .await?;

    let [buildings, rooms, residents, users] = counts.map(|n| n.max(0) as u64);
    Ok(Summary { buildings, rooms, residents, users })
  }
}
