//! API users and their authentication tokens.

use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::validation::{ValidationErrors, check_text};

pub const USERNAME_MAX_LEN: usize = 150;

pub const DUPLICATE_USERNAME: &str = "A user with that username already exists.";

/// Bytes of entropy in a token; rendered as twice as many hex characters.
const TOKEN_BYTES: usize = 20;

/// A user that can authenticate against the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:            i64,
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  #[serde(skip_serializing)]
  pub password_hash: String,
  /// Administrators may create, update and delete records.
  pub is_admin:      bool,
  pub date_joined:   DateTime<Utc>,
}

/// Input to [`crate::store::ResidenceStore::create_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub password_hash: String,
  pub is_admin:      bool,
}

impl NewUser {
  pub fn validate(&self) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_text(&mut errors, "username", &self.username, Some(USERNAME_MAX_LEN));
    if self.username.chars().any(char::is_whitespace) {
      errors.add("username", "Enter a valid username.");
    }
    errors.into_result()
  }
}

/// Generate an opaque token key: 40 lowercase hex characters.
pub fn generate_token_key() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn token_keys_are_forty_hex_chars_and_distinct() {
    let a = generate_token_key();
    let b = generate_token_key();
    assert_eq!(a.len(), 40);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(a, b);
  }

  #[test]
  fn usernames_may_not_contain_spaces() {
    let user = NewUser {
      username:      "warden smith".into(),
      password_hash: String::new(),
      is_admin:      false,
    };
    assert!(user.validate().unwrap_err().get("username").is_some());
  }
}
