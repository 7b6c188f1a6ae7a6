//! Room: belongs to exactly one building.

use serde::{Deserialize, Serialize};

use crate::{
  query::{Field, FieldKind, ListSpec},
  validation::{ValidationErrors, check_text},
};

pub const ROOM_NUMBER_MAX_LEN: usize = 10;

/// A persisted room. Deleting it clears the `room` of its residents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
  pub id:          i64,
  /// Id of the owning [`Building`](crate::building::Building).
  pub building:    i64,
  pub room_number: String,
  pub capacity:    i32,
}

impl Room {
  pub const LIST: ListSpec = ListSpec {
    filters:  &[
      Field::new("building", "building_id", FieldKind::Integer),
      Field::new("room_number", "room_number", FieldKind::Text),
      Field::new("capacity", "capacity", FieldKind::Integer),
    ],
    search:   &[Field::new("room_number", "room_number", FieldKind::Text)],
    ordering: &[
      Field::new("id", "id", FieldKind::Integer),
      Field::new("room_number", "room_number", FieldKind::Text),
      Field::new("capacity", "capacity", FieldKind::Integer),
    ],
  };

  pub fn fields(&self) -> RoomFields {
    RoomFields {
      building:    self.building,
      room_number: self.room_number.clone(),
      capacity:    self.capacity,
    }
  }
}

/// The writable part of a [`Room`].
///
/// Whether `building` exists is checked by the store at save time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomFields {
  pub building:    i64,
  pub room_number: String,
  pub capacity:    i32,
}

impl RoomFields {
  pub fn validate(&self) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_text(&mut errors, "room_number", &self.room_number, Some(ROOM_NUMBER_MAX_LEN));
    errors.into_result()
  }
}

/// Message for a reference to a row that does not exist.
pub fn missing_reference(id: i64) -> String {
  format!("Invalid pk \"{id}\" - object does not exist.")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn room_number_is_bounded() {
    let mut fields = RoomFields { building: 1, room_number: "101".into(), capacity: 2 };
    assert!(fields.validate().is_ok());

    fields.room_number = "A-123456789".into();
    assert!(fields.validate().unwrap_err().get("room_number").is_some());
  }

  #[test]
  fn missing_reference_names_the_id() {
    assert_eq!(missing_reference(7), "Invalid pk \"7\" - object does not exist.");
  }
}
