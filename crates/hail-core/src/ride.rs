//! The ride entity and its lifecycle state machine.
//!
//! A ride only moves forward through the transition graph:
//!
//! ```text
//! requested ─► searching ─► accepted ─► on_the_way ─► completed
//!      │            │           │            │
//!      └────────────┴───────────┴────────────┴──────► cancelled
//! ```
//!
//! Every transition is a method on [`Ride`]. A rejected transition returns
//! [`Error::InvalidTransition`] and leaves the ride untouched.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  matching::DriverMatch,
  quote::{Eta, Fare},
};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
  Requested,
  Searching,
  Accepted,
  OnTheWay,
  Completed,
  Cancelled,
}

impl RideStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Requested => "requested",
      Self::Searching => "searching",
      Self::Accepted => "accepted",
      Self::OnTheWay => "on_the_way",
      Self::Completed => "completed",
      Self::Cancelled => "cancelled",
    }
  }

  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Completed | Self::Cancelled)
  }

  /// Whether a driver is assigned in this state.
  pub fn has_driver(self) -> bool {
    matches!(self, Self::Accepted | Self::OnTheWay | Self::Completed)
  }

  pub fn can_transition_to(self, next: RideStatus) -> bool {
    use RideStatus::*;
    match (self, next) {
      (Requested, Searching)
      | (Searching, Accepted)
      | (Accepted, OnTheWay)
      | (OnTheWay, Completed) => true,
      (from, Cancelled) => !from.is_terminal(),
      _ => false,
    }
  }
}

impl fmt::Display for RideStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for RideStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "requested" => Ok(Self::Requested),
      "searching" => Ok(Self::Searching),
      "accepted" => Ok(Self::Accepted),
      "on_the_way" => Ok(Self::OnTheWay),
      "completed" => Ok(Self::Completed),
      "cancelled" => Ok(Self::Cancelled),
      other => Err(Error::InvalidRequest(format!("unknown ride status {other:?}"))),
    }
  }
}

// ─── Driver ──────────────────────────────────────────────────────────────────

/// The driver bound to a ride once it has been matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverAssignment {
  pub driver_id: String,
  pub name:      String,
  /// Free-text description, e.g. "Toyota Camry (ABC-1234)".
  pub vehicle:   String,
}

// ─── Ride ────────────────────────────────────────────────────────────────────

/// One trip request and its evolving match state.
///
/// Fields are private so that every mutation goes through a transition method;
/// storage backends rebuild rides from a [`RideRecord`]. Deserialising goes
/// through the same checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RideRecord")]
pub struct Ride {
  ride_id:             Uuid,
  rider_id:            String,
  pickup_location:     String,
  destination:         String,
  status:              RideStatus,
  driver:              Option<DriverAssignment>,
  fare:                Option<Fare>,
  eta:                 Option<Eta>,
  pickup_time:         Option<DateTime<Utc>>,
  cancellation_reason: Option<String>,
  created_at:          DateTime<Utc>,
  updated_at:          DateTime<Utc>,
}

impl Ride {
  /// Validate a ride request and open a new ride in `searching`.
  pub fn create(
    rider_id: impl Into<String>,
    pickup_location: impl Into<String>,
    destination: impl Into<String>,
  ) -> Result<Self> {
    let rider_id = required("rider_id", rider_id.into())?;
    let pickup_location = required("pickup_location", pickup_location.into())?;
    let destination = required("destination", destination.into())?;

    let now = Utc::now();
    Ok(Self {
      ride_id: Uuid::new_v4(),
      rider_id,
      pickup_location,
      destination,
      status: RideStatus::Searching,
      driver: None,
      fare: None,
      eta: None,
      pickup_time: None,
      cancellation_reason: None,
      created_at: now,
      updated_at: now,
    })
  }

  // ── Accessors ─────────────────────────────────────────────────────────

  pub fn ride_id(&self) -> Uuid { self.ride_id }

  pub fn rider_id(&self) -> &str { &self.rider_id }

  pub fn pickup_location(&self) -> &str { &self.pickup_location }

  pub fn destination(&self) -> &str { &self.destination }

  pub fn status(&self) -> RideStatus { self.status }

  pub fn driver(&self) -> Option<&DriverAssignment> { self.driver.as_ref() }

  pub fn fare(&self) -> Option<Fare> { self.fare }

  pub fn eta(&self) -> Option<Eta> { self.eta }

  pub fn pickup_time(&self) -> Option<DateTime<Utc>> { self.pickup_time }

  pub fn cancellation_reason(&self) -> Option<&str> {
    self.cancellation_reason.as_deref()
  }

  pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

  pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

  // ── Transitions ───────────────────────────────────────────────────────

  /// Bind a driver, fare and ETA in one step and move to `accepted`.
  ///
  /// Only valid from `searching`, so a match can never be applied twice.
  pub fn apply_match(&mut self, found: DriverMatch) -> Result<()> {
    self.check_transition(RideStatus::Accepted)?;
    let now = Utc::now();
    self.driver = Some(DriverAssignment {
      driver_id: found.driver_id,
      name:      found.driver_name,
      vehicle:   found.vehicle,
    });
    self.fare = Some(found.fare);
    self.eta = Some(found.eta);
    self.pickup_time = Some(now);
    self.status = RideStatus::Accepted;
    self.updated_at = now;
    Ok(())
  }

  /// The driver has picked the rider up: `accepted` → `on_the_way`.
  pub fn start_trip(&mut self) -> Result<()> {
    self.advance(RideStatus::OnTheWay)
  }

  /// `on_the_way` → `completed`.
  pub fn complete(&mut self) -> Result<()> {
    self.advance(RideStatus::Completed)
  }

  /// Cancel from any non-terminal state. Clears the driver assignment; the
  /// fare and ETA quote, if any, are kept for the record.
  pub fn cancel(&mut self, reason: impl Into<String>) -> Result<()> {
    self.check_transition(RideStatus::Cancelled)?;
    self.driver = None;
    self.cancellation_reason = Some(reason.into());
    self.status = RideStatus::Cancelled;
    self.updated_at = Utc::now();
    Ok(())
  }

  fn advance(&mut self, next: RideStatus) -> Result<()> {
    self.check_transition(next)?;
    self.status = next;
    self.updated_at = Utc::now();
    Ok(())
  }

  fn check_transition(&self, next: RideStatus) -> Result<()> {
    if self.status.can_transition_to(next) {
      Ok(())
    } else {
      Err(Error::InvalidTransition {
        ride_id: self.ride_id,
        from:    self.status,
        to:      next,
      })
    }
  }
}

fn required(field: &str, value: String) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::InvalidRequest(format!("{field} is required")));
  }
  Ok(trimmed.to_owned())
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// Plain field bundle used by storage backends to rebuild a [`Ride`].
///
/// Conversion checks the invariants a well-formed ride always satisfies, so a
/// corrupt row surfaces as [`Error::CorruptRecord`] instead of a ride in an
/// impossible state.
#[derive(Debug, Clone, Deserialize)]
pub struct RideRecord {
  pub ride_id:             Uuid,
  pub rider_id:            String,
  pub pickup_location:     String,
  pub destination:         String,
  pub status:              RideStatus,
  pub driver:              Option<DriverAssignment>,
  pub fare:                Option<Fare>,
  pub eta:                 Option<Eta>,
  pub pickup_time:         Option<DateTime<Utc>>,
  pub cancellation_reason: Option<String>,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
}

impl TryFrom<RideRecord> for Ride {
  type Error = Error;

  fn try_from(r: RideRecord) -> Result<Self> {
    let corrupt = |reason: &str| Error::CorruptRecord {
      ride_id: r.ride_id,
      reason:  reason.to_owned(),
    };

    if r.rider_id.trim().is_empty() {
      return Err(corrupt("empty rider_id"));
    }
    if r.status.has_driver() != r.driver.is_some() {
      return Err(corrupt("driver assignment does not match status"));
    }
    if r.status.has_driver() && (r.fare.is_none() || r.eta.is_none()) {
      return Err(corrupt("matched ride is missing its fare or eta"));
    }
    if matches!(r.status, RideStatus::Requested | RideStatus::Searching)
      && (r.fare.is_some() || r.eta.is_some() || r.pickup_time.is_some())
    {
      return Err(corrupt("unmatched ride carries a quote"));
    }

    Ok(Self {
      ride_id:             r.ride_id,
      rider_id:            r.rider_id,
      pickup_location:     r.pickup_location,
      destination:         r.destination,
      status:              r.status,
      driver:              r.driver,
      fare:                r.fare,
      eta:                 r.eta,
      pickup_time:         r.pickup_time,
      cancellation_reason: r.cancellation_reason,
      created_at:          r.created_at,
      updated_at:          r.updated_at,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn matched() -> DriverMatch {
    DriverMatch {
      driver_id:   "driver-001".into(),
      driver_name: "John Doe".into(),
      vehicle:     "Toyota Camry (ABC-1234)".into(),
      fare:        Fare::from_cents(1850),
      eta:         Eta::from_minutes(4).unwrap(),
    }
  }

  fn ride() -> Ride { Ride::create("u1", "A", "B").unwrap() }

  #[test]
  fn create_opens_searching_ride() {
    let r = ride();
    assert_eq!(r.status(), RideStatus::Searching);
    assert_eq!(r.rider_id(), "u1");
    assert!(r.driver().is_none());
    assert!(r.fare().is_none());
    assert!(r.eta().is_none());
    assert!(r.pickup_time().is_none());
    assert_eq!(r.created_at(), r.updated_at());
  }

  #[test]
  fn create_generates_distinct_ids() {
    let a = ride();
    let b = ride();
    assert_ne!(a.ride_id(), b.ride_id());
  }

  #[test]
  fn create_rejects_blank_fields() {
    for (rider, pickup, dest, field) in [
      ("", "A", "B", "rider_id"),
      ("u1", "", "B", "pickup_location"),
      ("u1", "A", "   ", "destination"),
    ] {
      match Ride::create(rider, pickup, dest) {
        Err(Error::InvalidRequest(msg)) => assert!(msg.contains(field), "{msg}"),
        other => panic!("expected InvalidRequest, got {other:?}"),
      }
    }
  }

  #[test]
  fn apply_match_sets_quote_atomically() {
    let mut r = ride();
    r.apply_match(matched()).unwrap();
    assert_eq!(r.status(), RideStatus::Accepted);
    assert_eq!(r.driver().unwrap().name, "John Doe");
    assert_eq!(r.fare(), Some(Fare::from_cents(1850)));
    assert_eq!(r.eta().unwrap().minutes(), 4);
    assert!(r.pickup_time().is_some());
    assert!(r.updated_at() >= r.created_at());
  }

  #[test]
  fn apply_match_twice_fails_without_changes() {
    let mut r = ride();
    r.apply_match(matched()).unwrap();
    let before = r.clone();

    let mut second = matched();
    second.fare = Fare::from_cents(99);
    let err = r.apply_match(second).unwrap_err();
    assert!(matches!(
      err,
      Error::InvalidTransition {
        from: RideStatus::Accepted,
        to: RideStatus::Accepted,
        ..
      }
    ));
    assert_eq!(r, before);
  }

  #[test]
  fn apply_match_rejected_after_cancel() {
    let mut r = ride();
    r.cancel("rider changed their mind").unwrap();
    assert!(r.apply_match(matched()).is_err());
    assert!(r.driver().is_none());
  }

  #[test]
  fn full_lifecycle() {
    let mut r = ride();
    r.apply_match(matched()).unwrap();
    r.start_trip().unwrap();
    assert_eq!(r.status(), RideStatus::OnTheWay);
    r.complete().unwrap();
    assert_eq!(r.status(), RideStatus::Completed);
    assert!(r.driver().is_some());
    assert!(r.cancel("too late").is_err());
  }

  #[test]
  fn no_backward_or_skipping_transitions() {
    let mut r = ride();
    assert!(r.start_trip().is_err());
    assert!(r.complete().is_err());
    r.apply_match(matched()).unwrap();
    assert!(r.complete().is_err());
    assert_eq!(r.status(), RideStatus::Accepted);
  }

  #[test]
  fn cancel_clears_driver_but_keeps_quote() {
    let mut r = ride();
    r.apply_match(matched()).unwrap();
    r.cancel("driver unavailable").unwrap();
    assert_eq!(r.status(), RideStatus::Cancelled);
    assert!(r.driver().is_none());
    assert_eq!(r.fare(), Some(Fare::from_cents(1850)));
    assert_eq!(r.cancellation_reason(), Some("driver unavailable"));
  }

  #[test]
  fn transition_graph() {
    use RideStatus::*;
    assert!(Requested.can_transition_to(Searching));
    assert!(Searching.can_transition_to(Cancelled));
    assert!(OnTheWay.can_transition_to(Cancelled));
    assert!(!Cancelled.can_transition_to(Cancelled));
    assert!(!Completed.can_transition_to(Cancelled));
    assert!(!Accepted.can_transition_to(Searching));
    assert!(!Searching.can_transition_to(Requested));
  }

  #[test]
  fn status_string_round_trip() {
    for s in [
      RideStatus::Requested,
      RideStatus::Searching,
      RideStatus::Accepted,
      RideStatus::OnTheWay,
      RideStatus::Completed,
      RideStatus::Cancelled,
    ] {
      assert_eq!(s.as_str().parse::<RideStatus>().unwrap(), s);
    }
    assert!("pending".parse::<RideStatus>().is_err());
  }

  fn record(status: RideStatus) -> RideRecord {
    let r = ride();
    RideRecord {
      ride_id: r.ride_id(),
      rider_id: "u1".into(),
      pickup_location: "A".into(),
      destination: "B".into(),
      status,
      driver: None,
      fare: None,
      eta: None,
      pickup_time: None,
      cancellation_reason: None,
      created_at: r.created_at(),
      updated_at: r.updated_at(),
    }
  }

  #[test]
  fn record_rejects_driverless_accepted_ride() {
    assert!(matches!(
      Ride::try_from(record(RideStatus::Accepted)),
      Err(Error::CorruptRecord { .. })
    ));
  }

  #[test]
  fn record_rejects_quote_on_unmatched_ride() {
    for status in [RideStatus::Requested, RideStatus::Searching] {
      let priced = RideRecord {
        fare: Some(Fare::from_cents(1200)),
        ..record(status)
      };
      assert!(Ride::try_from(priced).is_err(), "{status}");

      let eta = RideRecord {
        eta: Some(Eta::from_minutes(3).unwrap()),
        ..record(status)
      };
      assert!(Ride::try_from(eta).is_err(), "{status}");

      let timed = RideRecord {
        pickup_time: Some(Utc::now()),
        ..record(status)
      };
      assert!(Ride::try_from(timed).is_err(), "{status}");
    }
  }

  #[test]
  fn cancelled_ride_may_keep_its_quote() {
    let kept = RideRecord {
      fare: Some(Fare::from_cents(1200)),
      eta: Some(Eta::from_minutes(3).unwrap()),
      pickup_time: Some(Utc::now()),
      cancellation_reason: Some("driver unavailable".into()),
      ..record(RideStatus::Cancelled)
    };
    assert!(Ride::try_from(kept).is_ok());
  }

  #[test]
  fn json_round_trips_a_matched_ride() {
    let mut r = ride();
    r.apply_match(matched()).unwrap();
    let json = serde_json::to_value(&r).unwrap();
    let back: Ride = serde_json::from_value(json).unwrap();
    assert_eq!(back, r);
  }

  #[test]
  fn json_with_impossible_state_is_rejected() {
    let mut json = serde_json::to_value(ride()).unwrap();
    json["driver"] = serde_json::json!({
      "driver_id": "d1",
      "name": "John Doe",
      "vehicle": "Toyota Camry (ABC-1234)",
    });
    assert!(serde_json::from_value::<Ride>(json).is_err());

    let mut json = serde_json::to_value(ride()).unwrap();
    json["rider_id"] = serde_json::json!("");
    assert!(serde_json::from_value::<Ride>(json).is_err());
  }
}
