//! The matching-provider seam.
//!
//! The dispatcher hands a freshly created ride to a [`MatchProvider`] and
//! awaits exactly one outcome. Concrete algorithms (a simulated provider, a
//! nearest-driver search, ...) live outside this crate.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  quote::{Eta, Fare},
  ride::Ride,
};

/// A successful match: who is coming, in what, for how much, and how soon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverMatch {
  pub driver_id:   String,
  pub driver_name: String,
  pub vehicle:     String,
  pub fare:        Fare,
  pub eta:         Eta,
}

/// Why a provider could not produce a match. The message is shown to the
/// rider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchFailure {
  #[error("no drivers are available near the pickup location")]
  NoDriversAvailable,

  #[error("matching service unavailable: {0}")]
  Unavailable(String),
}

/// Resolves a ride request to a driver.
///
/// Each call produces a single result after a finite delay; there are no
/// partial updates. Calls for different rides may run concurrently and must
/// not interfere with each other.
pub trait MatchProvider: Send + Sync {
  fn find_match<'a>(
    &'a self,
    ride: &'a Ride,
  ) -> impl Future<Output = Result<DriverMatch, MatchFailure>> + Send + 'a;
}
