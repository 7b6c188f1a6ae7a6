//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Calendar dates are stored as `YYYY-MM-DD`, timestamps as RFC 3339 strings,
//! and sealed fields in [`SealedValue::encode`] form.

use chrono::{DateTime, NaiveDate, Utc};
use residence_core::{
  account::User,
  building::Building,
  cipher::{FieldCipher, SealedValue},
  query::FilterValue,
  resident::Resident,
  room::Room,
};
use rusqlite::{Row, types::Value};

use crate::{Error, Result};

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_date(date: NaiveDate) -> String { date.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Filters ─────────────────────────────────────────────────────────────────

pub fn encode_filter_value(value: &FilterValue) -> Value {
  match value {
    FilterValue::Integer(i) => Value::Integer(*i),
    FilterValue::Text(s) => Value::Text(s.clone()),
    FilterValue::Date(d) => Value::Text(encode_date(*d)),
  }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

pub const BUILDING_COLUMNS: &str = "id, name, address";

pub fn building_from_row(row: &Row<'_>) -> rusqlite::Result<Building> {
  Ok(Building { id: row.get(0)?, name: row.get(1)?, address: row.get(2)? })
}

pub const ROOM_COLUMNS: &str = "id, building_id, room_number, capacity";

pub fn room_from_row(row: &Row<'_>) -> rusqlite::Result<Room> {
  Ok(Room {
    id:          row.get(0)?,
    building:    row.get(1)?,
    room_number: row.get(2)?,
    capacity:    row.get(3)?,
  })
}

pub const RESIDENT_COLUMNS: &str = "id, first_name, last_name, email, room_id, \
                                    check_in_date, check_out_date, notes_sealed";

/// A resident row as stored: dates still text, notes still sealed.
pub struct RawResident {
  pub id:             i64,
  pub first_name:     String,
  pub last_name:      String,
  pub email:          String,
  pub room_id:        Option<i64>,
  pub check_in_date:  String,
  pub check_out_date: Option<String>,
  pub notes_sealed:   Option<String>,
}

impl RawResident {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      first_name:     row.get(1)?,
      last_name:      row.get(2)?,
      email:          row.get(3)?,
      room_id:        row.get(4)?,
      check_in_date:  row.get(5)?,
      check_out_date: row.get(6)?,
      notes_sealed:   row.get(7)?,
    })
  }

  pub fn into_resident(self, cipher: &FieldCipher) -> Result<Resident> {
    let notes = self
      .notes_sealed
      .as_deref()
      .map(|encoded| {
        let sealed = SealedValue::decode(encoded)?;
        cipher.open(&sealed)
      })
      .transpose()?;

    Ok(Resident {
      id:             self.id,
      first_name:     self.first_name,
      last_name:      self.last_name,
      email:          self.email,
      room:           self.room_id,
      check_in_date:  decode_date(&self.check_in_date)?,
      check_out_date: self.check_out_date.as_deref().map(decode_date).transpose()?,
      notes,
    })
  }
}

pub const USER_COLUMNS: &str = "id, username, password_hash, is_admin, date_joined";

pub struct RawUser {
  pub id:            i64,
  pub username:      String,
  pub password_hash: String,
  pub is_admin:      bool,
  pub date_joined:   String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      username:      row.get(1)?,
      password_hash: row.get(2)?,
      is_admin:      row.get(3)?,
      date_joined:   row.get(4)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:            self.id,
      username:      self.username,
      password_hash: self.password_hash,
      is_admin:      self.is_admin,
      date_joined:   decode_dt(&self.date_joined)?,
    })
  }
}
