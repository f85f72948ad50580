//! Error type for `hail-dispatch`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DispatchError {
  /// Validation, lifecycle and lookup failures from the ride model.
  #[error(transparent)]
  Ride(#[from] hail_core::Error),

  /// The ride changed between being read and being written back.
  #[error("ride {0} was modified concurrently")]
  Conflict(Uuid),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl DispatchError {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = DispatchError> = std::result::Result<T, E>;
