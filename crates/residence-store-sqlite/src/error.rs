//! Error type for `residence-store-sqlite`.

use residence_core::{ValidationErrors, store::StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] residence_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl From<ValidationErrors> for Error {
  fn from(errors: ValidationErrors) -> Self { Error::Core(errors.into()) }
}

impl StoreError for Error {
  fn validation(&self) -> Option<&ValidationErrors> {
    match self {
      Error::Core(residence_core::Error::Validation(errors)) => Some(errors),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
