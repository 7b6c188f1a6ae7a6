//! Request parsing shared by the entity handlers.
//!
//! A body is read as a JSON object and each field is decoded on its own, so
//! a badly typed value becomes a message on that field rather than failing
//! the whole body. Whether a key is absent, `null` or set drives the
//! create / full update / partial update rules.

use axum::{
  Json,
  extract::{FromRequest, FromRequestParts, Path, Request},
  http::request::Parts,
};
use chrono::NaiveDate;
use residence_core::{
  ValidationErrors,
  validation::{NON_FIELD, NULL, REQUIRED},
};
use serde_json::{Map, Value};

use crate::error::ApiError;

pub const INVALID_STRING: &str = "Not a valid string.";
pub const INVALID_INTEGER: &str = "A valid integer is required.";
pub const INVALID_DATE: &str =
  "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";

// ─── Ids ─────────────────────────────────────────────────────────────────────

/// The `{id}` of an item route. Anything that is not an integer cannot name
/// a record, so it is a 404 rather than a 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for RecordId {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let Path(raw) = Path::<String>::from_request_parts(parts, state)
      .await
      .map_err(|_| ApiError::NotFound)?;
    raw.parse().map(RecordId).map_err(|_| ApiError::NotFound)
  }
}

// ─── Field values ────────────────────────────────────────────────────────────

/// A type a single body field can be decoded into.
pub trait FromJson: Sized {
  /// Decode a non-null value, or return the message for the field.
  fn from_json(value: Value) -> Result<Self, String>;
}

impl FromJson for String {
  fn from_json(value: Value) -> Result<Self, String> {
    match value {
      Value::String(s) => Ok(s),
      Value::Number(n) => Ok(n.to_string()),
      _ => Err(INVALID_STRING.into()),
    }
  }
}

impl FromJson for i64 {
  fn from_json(value: Value) -> Result<Self, String> {
    let parsed = match &value {
      Value::Number(n) => n.as_i64().or_else(|| {
        n.as_f64()
          .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
          .map(|f| f as i64)
      }),
      Value::String(s) => s.trim().parse().ok(),
      _ => None,
    };
    parsed.ok_or_else(|| INVALID_INTEGER.into())
  }
}

impl FromJson for i32 {
  fn from_json(value: Value) -> Result<Self, String> {
    let wide = i64::from_json(value)?;
    i32::try_from(wide).map_err(|_| {
      if wide > 0 {
        format!("Ensure this value is less than or equal to {}.", i32::MAX)
      } else {
        format!("Ensure this value is greater than or equal to {}.", i32::MIN)
      }
    })
  }
}

impl FromJson for NaiveDate {
  fn from_json(value: Value) -> Result<Self, String> {
    match value {
      Value::String(s) => {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| INVALID_DATE.into())
      }
      _ => Err(INVALID_DATE.into()),
    }
  }
}

/// One body field after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
  Absent,
  Null,
  Value(T),
  /// Present but not decodable; carries the message for the client.
  Invalid(String),
}

// ─── Bodies ──────────────────────────────────────────────────────────────────

/// A JSON object request body.
///
/// Syntactically broken JSON is rejected as a whole with `{"detail"}`; a
/// body that is valid JSON but not an object is a `non_field_errors` entry.
#[derive(Debug, Clone, Default)]
pub struct Payload(Map<String, Value>);

impl Payload {
  pub fn from_value(value: Value) -> Result<Self, ValidationErrors> {
    match value {
      Value::Object(map) => Ok(Self(map)),
      other => Err(ValidationErrors::single(
        NON_FIELD,
        format!("Invalid data. Expected a dictionary, but got {}.", kind(&other)),
      )),
    }
  }

  /// Take and decode field `name`.
  pub fn field<T: FromJson>(&mut self, name: &str) -> Field<T> {
    match self.0.remove(name) {
      None => Field::Absent,
      Some(Value::Null) => Field::Null,
      Some(value) => match T::from_json(value) {
        Ok(value) => Field::Value(value),
        Err(message) => Field::Invalid(message),
      },
    }
  }
}

impl<S: Send + Sync> FromRequest<S> for Payload {
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let Json(value) = Json::<Value>::from_request(req, state).await?;
    Ok(Self::from_value(value)?)
  }
}

fn kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "bool",
    Value::Number(_) => "number",
    Value::String(_) => "str",
    Value::Array(_) => "list",
    Value::Object(_) => "dict",
  }
}

// ─── Write rules ─────────────────────────────────────────────────────────────

/// How a request body is applied to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Write {
  Create,
  /// PUT: every required field must be present.
  Replace,
  /// PATCH: absent fields keep their stored value.
  Partial,
}

/// Resolve a non-nullable field. Records a message in `errors` and returns
/// `None` when the field is missing, null or invalid.
pub fn required<T>(
  errors: &mut ValidationErrors,
  name: &str,
  field: Field<T>,
  current: Option<T>,
  write: Write,
) -> Option<T> {
  match field {
    Field::Value(value) => Some(value),
    Field::Null => {
      errors.add(name, NULL);
      None
    }
    Field::Invalid(message) => {
      errors.add(name, message);
      None
    }
    Field::Absent if write == Write::Partial && current.is_some() => current,
    Field::Absent => {
      errors.add(name, REQUIRED);
      None
    }
  }
}

/// Resolve a nullable field. An absent key keeps the stored value.
pub fn optional<T>(
  errors: &mut ValidationErrors,
  name: &str,
  field: Field<T>,
  current: Option<T>,
) -> Option<T> {
  match field {
    Field::Value(value) => Some(value),
    Field::Null => None,
    Field::Absent => current,
    Field::Invalid(message) => {
      errors.add(name, message);
      None
    }
  }
}
