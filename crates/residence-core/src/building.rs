//! Building: the top of the residence hierarchy.

use serde::{Deserialize, Serialize};

use crate::{
  query::{Field, FieldKind, ListSpec},
  validation::{ValidationErrors, check_text},
};

pub const NAME_MAX_LEN: usize = 100;

/// A persisted building. Deleting it deletes its rooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
  pub id:      i64,
  pub name:    String,
  pub address: String,
}

impl Building {
  pub const LIST: ListSpec = ListSpec {
    filters:  &[
      Field::new("name", "name", FieldKind::Text),
      Field::new("address", "address", FieldKind::Text),
    ],
    search:   &[
      Field::new("name", "name", FieldKind::Text),
      Field::new("address", "address", FieldKind::Text),
    ],
    ordering: &[
      Field::new("id", "id", FieldKind::Integer),
      Field::new("name", "name", FieldKind::Text),
    ],
  };

  pub fn fields(&self) -> BuildingFields {
    BuildingFields { name: self.name.clone(), address: self.address.clone() }
  }
}

/// The writable part of a [`Building`]; input to create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingFields {
  pub name:    String,
  pub address: String,
}

impl BuildingFields {
  pub fn validate(&self) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_text(&mut errors, "name", &self.name, Some(NAME_MAX_LEN));
    check_text(&mut errors, "address", &self.address, None);
    errors.into_result()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn valid_building_passes() {
    let fields = BuildingFields {
      name:    "North Hall".into(),
      address: "1 College Road".into(),
    };
    assert!(fields.validate().is_ok());
  }

  #[test]
  fn blank_and_oversized_fields_fail_together() {
    let fields = BuildingFields { name: "x".repeat(101), address: "".into() };
    let errors = fields.validate().unwrap_err();
    assert!(errors.get("name").is_some());
    assert!(errors.get("address").is_some());
  }
}
