//! Error types for `hail-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::ride::RideStatus;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
  /// Missing or malformed input from the caller.
  #[error("invalid request: {0}")]
  InvalidRequest(String),

  #[error("ride {ride_id}: cannot move from {from} to {to}")]
  InvalidTransition {
    ride_id: Uuid,
    from:    RideStatus,
    to:      RideStatus,
  },

  #[error("ride not found: {0}")]
  NotFound(Uuid),

  #[error("invalid fare: {0}")]
  InvalidFare(String),

  #[error("estimated arrival must be at least one minute")]
  InvalidEta,

  /// A persisted record violates a ride invariant.
  #[error("corrupt ride record {ride_id}: {reason}")]
  CorruptRecord { ride_id: Uuid, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
