//! Events exchanged with riders and drivers: the ride-update event pushed to
//! every channel a rider has joined, and the inbound driver-location signal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  quote::{Eta, Fare},
  ride::{Ride, RideStatus},
};

/// Snapshot of a ride's state as seen by the rider.
///
/// Driver and quote fields are `None` until the ride has been matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideUpdate {
  pub ride_id:           Uuid,
  pub status:            RideStatus,
  pub driver_name:       Option<String>,
  pub driver_vehicle:    Option<String>,
  pub estimated_arrival: Option<Eta>,
  pub fare:              Option<Fare>,
  pub pickup_time:       Option<DateTime<Utc>>,
  pub message:           String,
}

impl RideUpdate {
  /// Build an update from the current state of `ride` with a status-specific
  /// default message.
  pub fn from_ride(ride: &Ride) -> Self {
    let driver = ride.driver();
    let message = match ride.status() {
      RideStatus::Requested | RideStatus::Searching => {
        "Searching for a driver...".to_owned()
      }
      RideStatus::Accepted => match driver {
        Some(d) => format!("Driver found! {} is on the way.", d.name),
        None => "Driver found!".to_owned(),
      },
      RideStatus::OnTheWay => "You're on your way.".to_owned(),
      RideStatus::Completed => "Trip completed. Thanks for riding!".to_owned(),
      RideStatus::Cancelled => match ride.cancellation_reason() {
        Some(reason) => format!("Ride cancelled: {reason}"),
        None => "Ride cancelled.".to_owned(),
      },
    };

    Self {
      ride_id: ride.ride_id(),
      status: ride.status(),
      driver_name: driver.map(|d| d.name.clone()),
      driver_vehicle: driver.map(|d| d.vehicle.clone()),
      estimated_arrival: ride.eta(),
      fare: ride.fare(),
      pickup_time: ride.pickup_time(),
      message,
    }
  }

  /// Replace the default message.
  pub fn with_message(mut self, message: impl Into<String>) -> Self {
    self.message = message.into();
    self
  }
}

/// A driver's reported position.
///
/// Accepted from drivers and logged; routing it to the relevant rider is left
/// to a future location collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverLocation {
  pub driver_id: String,
  pub lat:       f64,
  pub lon:       f64,
}

impl DriverLocation {
  /// Whether the coordinates are a plausible WGS84 position.
  pub fn is_valid(&self) -> bool {
    !self.driver_id.trim().is_empty()
      && (-90.0..=90.0).contains(&self.lat)
      && (-180.0..=180.0).contains(&self.lon)
  }
}
