//! Plain-text rendering of rides for the terminal.

use chrono::Local;
use hail_core::ride::{Ride, RideStatus};
use hail_dispatch::RideAck;

pub fn ack(ack: &RideAck) -> String {
  format!("ride {} requested ({})", ack.ride_id, ack.status)
}

/// One line per ride, for `hail list`.
pub fn summary(ride: &Ride) -> String {
  format!(
    "{}  {:<10}  {} → {}  {}",
    ride.ride_id(),
    ride.status().as_str(),
    ride.pickup_location(),
    ride.destination(),
    ride.created_at().with_timezone(&Local).format("%Y-%m-%d %H:%M"),
  )
}

/// Multi-line detail view, for `hail status`.
pub fn detail(ride: &Ride) -> String {
  let mut lines = vec![
    format!("ride:        {}", ride.ride_id()),
    format!("rider:       {}", ride.rider_id()),
    format!("from:        {}", ride.pickup_location()),
    format!("to:          {}", ride.destination()),
    format!("status:      {}", ride.status()),
  ];
  if let Some(driver) = ride.driver() {
    lines.push(format!("driver:      {} ({})", driver.name, driver.vehicle));
  }
  if let Some(fare) = ride.fare() {
    lines.push(format!("fare:        ${fare}"));
  }
  if let Some(eta) = ride.eta() {
    lines.push(format!("eta:         {eta}"));
  }
  if let Some(at) = ride.pickup_time() {
    lines.push(format!(
      "pickup at:   {}",
      at.with_timezone(&Local).format("%H:%M")
    ));
  }
  if let Some(reason) = ride.cancellation_reason() {
    lines.push(format!("cancelled:   {reason}"));
  }
  lines.join("\n")
}

/// Whether `hail watch` should stop: a ride first seen searching is watched
/// until it leaves `searching`; any other ride until it is terminal.
pub fn watch_done(initial: RideStatus, current: RideStatus) -> bool {
  if initial == RideStatus::Searching {
    current != RideStatus::Searching
  } else {
    current.is_terminal()
  }
}
