//! Error type for `hail-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] hail_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column holds a value the domain types cannot represent.
  #[error("invalid column value: {0}")]
  InvalidColumn(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
