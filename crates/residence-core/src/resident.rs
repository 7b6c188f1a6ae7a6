//! Resident: a person staying in (at most) one room.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  query::{Field, FieldKind, ListSpec},
  validation::{ValidationErrors, check_email, check_text},
};

pub const NAME_MAX_LEN: usize = 50;

pub const CHECK_OUT_BEFORE_CHECK_IN: &str =
  "Check-out date cannot be before check-in date.";

pub const DUPLICATE_EMAIL: &str = "resident with this email already exists.";

/// A persisted resident.
///
/// `notes` is stored encrypted; values of this type always carry the
/// plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resident {
  pub id:             i64,
  pub first_name:     String,
  pub last_name:      String,
  pub email:          String,
  /// Id of the assigned [`Room`](crate::room::Room), if any.
  pub room:           Option<i64>,
  pub check_in_date:  NaiveDate,
  pub check_out_date: Option<NaiveDate>,
  pub notes:          Option<String>,
}

impl Resident {
  pub const LIST: ListSpec = ListSpec {
    filters:  &[
      Field::new("room", "room_id", FieldKind::Integer),
      Field::new("email", "email", FieldKind::Text),
      Field::new("check_in_date", "check_in_date", FieldKind::Date),
      Field::new("check_out_date", "check_out_date", FieldKind::Date),
    ],
    search:   &[
      Field::new("first_name", "first_name", FieldKind::Text),
      Field::new("last_name", "last_name", FieldKind::Text),
      Field::new("email", "email", FieldKind::Text),
    ],
    ordering: &[
      Field::new("id", "id", FieldKind::Integer),
      Field::new("last_name", "last_name", FieldKind::Text),
      Field::new("check_in_date", "check_in_date", FieldKind::Date),
      Field::new("check_out_date", "check_out_date", FieldKind::Date),
    ],
  };

  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }

  pub fn fields(&self) -> ResidentFields {
    ResidentFields {
      first_name:     self.first_name.clone(),
      last_name:      self.last_name.clone(),
      email:          self.email.clone(),
      room:           self.room,
      check_in_date:  self.check_in_date,
      check_out_date: self.check_out_date,
      notes:          self.notes.clone(),
    }
  }
}

/// The writable part of a [`Resident`].
///
/// Email uniqueness and the existence of `room` are checked by the store at
/// save time; everything else is checked by [`ResidentFields::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidentFields {
  pub first_name:     String,
  pub last_name:      String,
  pub email:          String,
  pub room:           Option<i64>,
  pub check_in_date:  NaiveDate,
  pub check_out_date: Option<NaiveDate>,
  pub notes:          Option<String>,
}

impl ResidentFields {
  pub fn validate(&self) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_text(&mut errors, "first_name", &self.first_name, Some(NAME_MAX_LEN));
    check_text(&mut errors, "last_name", &self.last_name, Some(NAME_MAX_LEN));
    check_email(&mut errors, "email", &self.email);
    if let Err(stay) = check_stay(self.check_in_date, self.check_out_date) {
      errors.merge(stay);
    }
    errors.into_result()
  }
}

/// A check-out date, when present, must not precede the check-in date.
pub fn check_stay(
  check_in: NaiveDate,
  check_out: Option<NaiveDate>,
) -> Result<(), ValidationErrors> {
  match check_out {
    Some(out) if out < check_in => Err(ValidationErrors::single(
      "check_out_date",
      CHECK_OUT_BEFORE_CHECK_IN,
    )),
    _ => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn jane() -> ResidentFields {
    ResidentFields {
      first_name:     "Jane".into(),
      last_name:      "Doe".into(),
      email:          "jane.doe@example.com".into(),
      room:           Some(1),
      check_in_date:  date(2023, 1, 1),
      check_out_date: Some(date(2023, 12, 31)),
      notes:          None,
    }
  }

  #[test]
  fn open_ended_and_same_day_stays_pass() {
    assert!(check_stay(date(2023, 1, 1), None).is_ok());
    assert!(check_stay(date(2023, 1, 1), Some(date(2023, 1, 1))).is_ok());
  }

  #[test]
  fn check_out_before_check_in_fails() {
    let errors = check_stay(date(2023, 6, 1), Some(date(2023, 5, 31))).unwrap_err();
    assert_eq!(
      errors.get("check_out_date"),
      Some(&[CHECK_OUT_BEFORE_CHECK_IN.to_string()][..])
    );
  }

  #[test]
  fn validate_runs_the_stay_rule() {
    let mut fields = jane();
    assert!(fields.validate().is_ok());

    fields.check_out_date = Some(date(2022, 12, 31));
    let errors = fields.validate().unwrap_err();
    assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["check_out_date"]);
  }

  #[test]
  fn validate_collects_every_field() {
    let mut fields = jane();
    fields.first_name = "".into();
    fields.last_name = "L".repeat(51);
    fields.email = "jane at example".into();
    let errors = fields.validate().unwrap_err();
    assert_eq!(
      errors.fields().collect::<Vec<_>>(),
      vec!["email", "first_name", "last_name"]
    );
  }

  #[test]
  fn full_name_joins_names() {
    let resident = Resident {
      id:             1,
      first_name:     "Jane".into(),
      last_name:      "Doe".into(),
      email:          "jane.doe@example.com".into(),
      room:           None,
      check_in_date:  date(2023, 1, 1),
      check_out_date: None,
      notes:          None,
    };
    assert_eq!(resident.full_name(), "Jane Doe");
    assert_eq!(resident.fields().email, "jane.doe@example.com");
  }
}
