//! Error types for `residence-core`.

use thiserror::Error;

use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(#[from] ValidationErrors),

  #[error("encryption failed")]
  Encryption,

  /// Wrong key, truncated input, or tampered ciphertext.
  #[error("decryption failed")]
  Decryption,

  #[error("invalid field key: {0}")]
  InvalidKey(String),

  #[error("malformed sealed value")]
  MalformedSealedValue,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
