//! The `RideStore` trait.
//!
//! Implemented by persistence backends (e.g. `hail-store-sqlite`). The
//! dispatcher depends on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::ride::{Ride, RideStatus};

/// Abstraction over a ride persistence backend.
///
/// Rides are never deleted. Updates are compare-and-set on the status the
/// writer last observed, so two flows can never both move a ride out of the
/// same state.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RideStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a newly created ride. Fails if the id is already taken.
  fn insert_ride<'a>(
    &'a self,
    ride: &'a Ride,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Retrieve a ride by id. Returns `None` if not found.
  fn get_ride(
    &self,
    ride_id: Uuid,
  ) -> impl Future<Output = Result<Option<Ride>, Self::Error>> + Send + '_;

  /// All rides requested by `rider_id`, newest first.
  fn rides_for_rider<'a>(
    &'a self,
    rider_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Ride>, Self::Error>> + Send + 'a;

  /// Overwrite the stored ride with `ride`, but only if its stored status is
  /// still `expected`.
  ///
  /// Returns `false` when the ride is missing or its status has moved on, in
  /// which case nothing is written.
  fn update_ride<'a>(
    &'a self,
    ride: &'a Ride,
    expected: RideStatus,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
