//! Field-level validation failures and the shared checks that produce them.
//!
//! Messages match the wording API clients already display.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;

pub const REQUIRED: &str = "This field is required.";
pub const NULL: &str = "This field may not be null.";
pub const BLANK: &str = "This field may not be blank.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const NON_FIELD: &str = "non_field_errors";

/// Longest address accepted by the `email` column.
pub const EMAIL_MAX_LEN: usize = 254;

/// A map from field name to the messages explaining why it was rejected.
///
/// Serialises as `{"field": ["message", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
  pub fn new() -> Self { Self::default() }

  /// Shorthand for a map holding one message for one field.
  pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
    let mut errors = Self::new();
    errors.add(field, message);
    errors
  }

  pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
    self.0.entry(field.into()).or_default().push(message.into());
  }

  pub fn merge(&mut self, other: ValidationErrors) {
    for (field, messages) in other.0 {
      self.0.entry(field).or_default().extend(messages);
    }
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn get(&self, field: &str) -> Option<&[String]> {
    self.0.get(field).map(Vec::as_slice)
  }

  pub fn fields(&self) -> impl Iterator<Item = &str> {
    self.0.keys().map(String::as_str)
  }

  /// `Ok(())` when nothing was recorded, otherwise `Err(self)`.
  pub fn into_result(self) -> Result<(), ValidationErrors> {
    if self.is_empty() { Ok(()) } else { Err(self) }
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, messages) in &self.0 {
      for message in messages {
        if !first {
          f.write_str("; ")?;
        }
        write!(f, "{field}: {message}")?;
        first = false;
      }
    }
    Ok(())
  }
}

impl std::error::Error for ValidationErrors {}

// ─── Shared checks ───────────────────────────────────────────────────────────

/// Reject blank text and, when `max_len` is set, text longer than `max_len`
/// characters.
pub fn check_text(
  errors: &mut ValidationErrors,
  field: &str,
  value: &str,
  max_len: Option<usize>,
) {
  if value.trim().is_empty() {
    errors.add(field, BLANK);
    return;
  }
  if let Some(max) = max_len
    && value.chars().count() > max
  {
    errors.add(
      field,
      format!("Ensure this field has no more than {max} characters."),
    );
  }
}

pub fn check_email(errors: &mut ValidationErrors, field: &str, value: &str) {
  check_text(errors, field, value, Some(EMAIL_MAX_LEN));
  if !value.trim().is_empty() && !email_address::EmailAddress::is_valid(value) {
    errors.add(field, INVALID_EMAIL);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_text_is_rejected() {
    let mut errors = ValidationErrors::new();
    check_text(&mut errors, "name", "   ", Some(10));
    assert_eq!(errors.get("name"), Some(&[BLANK.to_string()][..]));
  }

  #[test]
  fn length_is_counted_in_characters() {
    let mut errors = ValidationErrors::new();
    check_text(&mut errors, "room_number", "ÅÅÅÅÅÅÅÅÅÅ", Some(10));
    assert!(errors.is_empty());

    check_text(&mut errors, "room_number", "12345678901", Some(10));
    assert_eq!(
      errors.get("room_number").unwrap()[0],
      "Ensure this field has no more than 10 characters."
    );
  }

  #[test]
  fn email_format_is_checked() {
    let mut errors = ValidationErrors::new();
    check_email(&mut errors, "email", "jane.doe@example.com");
    assert!(errors.is_empty());

    check_email(&mut errors, "email", "not-an-email");
    assert_eq!(errors.get("email"), Some(&[INVALID_EMAIL.to_string()][..]));
  }

  #[test]
  fn serialises_as_field_map() {
    let mut errors = ValidationErrors::single("email", INVALID_EMAIL);
    errors.add("email", BLANK);
    let json = serde_json::to_value(&errors).unwrap();
    assert_eq!(
      json,
      serde_json::json!({ "email": [INVALID_EMAIL, BLANK] })
    );
  }

  #[test]
  fn merge_appends_messages() {
    let mut a = ValidationErrors::single("name", BLANK);
    a.merge(ValidationErrors::single("name", REQUIRED));
    a.merge(ValidationErrors::single("address", REQUIRED));
    assert_eq!(a.get("name").unwrap().len(), 2);
    assert_eq!(a.fields().collect::<Vec<_>>(), vec!["address", "name"]);
    assert_eq!(a.to_string(), format!("address: {REQUIRED}; name: {BLANK}; name: {REQUIRED}"));
  }
}
