//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, UUIDs as hyphenated lowercase
//! strings, fares as integer cents and ETAs as whole minutes.

use chrono::{DateTime, Utc};
use hail_core::{
  quote::{Eta, Fare},
  ride::{DriverAssignment, Ride, RideRecord, RideStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

/// Column list shared by every `SELECT` so [`RawRide::from_row`] can read by
/// position.
pub const RIDE_COLUMNS: &str = "ride_id, rider_id, pickup_location, destination, status,
  driver_id, driver_name, driver_vehicle, fare_cents, eta_minutes,
  pickup_time, cancellation_reason, created_at, updated_at";

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Quote ────────────────────────────────────────────────────────────────────

pub fn encode_fare(fare: Fare) -> Result<i64> {
  i64::try_from(fare.cents())
    .map_err(|_| Error::InvalidColumn(format!("fare {fare} does not fit a column")))
}

pub fn decode_fare(cents: i64) -> Result<Fare> {
  u64::try_from(cents)
    .map(Fare::from_cents)
    .map_err(|_| Error::InvalidColumn(format!("negative fare_cents {cents}")))
}

pub fn decode_eta(minutes: i64) -> Result<Eta> {
  let minutes = u32::try_from(minutes)
    .map_err(|_| Error::InvalidColumn(format!("eta_minutes {minutes} out of range")))?;
  Ok(Eta::from_minutes(minutes)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Owned column values for one `rides` row, ready to bind as parameters.
pub struct RideParams {
  pub ride_id:             String,
  pub rider_id:            String,
  pub pickup_location:     String,
  pub destination:         String,
  pub status:              &'static str,
  pub driver_id:           Option<String>,
  pub driver_name:         Option<String>,
  pub driver_vehicle:      Option<String>,
  pub fare_cents:          Option<i64>,
  pub eta_minutes:         Option<i64>,
  pub pickup_time:         Option<String>,
  pub cancellation_reason: Option<String>,
  pub created_at:          String,
  pub updated_at:          String,
}

impl RideParams {
  pub fn from_ride(ride: &Ride) -> Result<Self> {
    let driver = ride.driver();
    Ok(Self {
      ride_id:             encode_uuid(ride.ride_id()),
      rider_id:            ride.rider_id().to_owned(),
      pickup_location:     ride.pickup_location().to_owned(),
      destination:         ride.destination().to_owned(),
      status:              ride.status().as_str(),
      driver_id:           driver.map(|d| d.driver_id.clone()),
      driver_name:         driver.map(|d| d.name.clone()),
      driver_vehicle:      driver.map(|d| d.vehicle.clone()),
      fare_cents:          ride.fare().map(encode_fare).transpose()?,
      eta_minutes:         ride.eta().map(|e| i64::from(e.minutes())),
      pickup_time:         ride.pickup_time().map(encode_dt),
      cancellation_reason: ride.cancellation_reason().map(str::to_owned),
      created_at:          encode_dt(ride.created_at()),
      updated_at:          encode_dt(ride.updated_at()),
    })
  }
}

/// Raw values read directly from a `rides` row.
pub struct RawRide {
  pub ride_id:             String,
  pub rider_id:            String,
  pub pickup_location:     String,
  pub destination:         String,
  pub status:              String,
  pub driver_id:           Option<String>,
  pub driver_name:         Option<String>,
  pub driver_vehicle:      Option<String>,
  pub fare_cents:          Option<i64>,
  pub eta_minutes:         Option<i64>,
  pub pickup_time:         Option<String>,
  pub cancellation_reason: Option<String>,
  pub created_at:          String,
  pub updated_at:          String,
}

impl RawRide {
  /// Read a row selected with [`RIDE_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      ride_id:             row.get(0)?,
      rider_id:            row.get(1)?,
      pickup_location:     row.get(2)?,
      destination:         row.get(3)?,
      status:              row.get(4)?,
      driver_id:           row.get(5)?,
      driver_name:         row.get(6)?,
      driver_vehicle:      row.get(7)?,
      fare_cents:          row.get(8)?,
      eta_minutes:         row.get(9)?,
      pickup_time:         row.get(10)?,
      cancellation_reason: row.get(11)?,
      created_at:          row.get(12)?,
      updated_at:          row.get(13)?,
    })
  }

  pub fn into_ride(self) -> Result<Ride> {
    let status: RideStatus = self.status.parse()?;

    let driver = match (self.driver_id, self.driver_name, self.driver_vehicle) {
      (Some(driver_id), Some(name), Some(vehicle)) => Some(DriverAssignment {
        driver_id,
        name,
        vehicle,
      }),
      (None, None, None) => None,
      _ => {
        return Err(Error::InvalidColumn(format!(
          "ride {} has partially populated driver columns",
          self.ride_id
        )));
      }
    };

    let record = RideRecord {
      ride_id: decode_uuid(&self.ride_id)?,
      rider_id: self.rider_id,
      pickup_location: self.pickup_location,
      destination: self.destination,
      status,
      driver,
      fare: self.fare_cents.map(decode_fare).transpose()?,
      eta: self.eta_minutes.map(decode_eta).transpose()?,
      pickup_time: self.pickup_time.as_deref().map(decode_dt).transpose()?,
      cancellation_reason: self.cancellation_reason,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    };

    Ok(Ride::try_from(record)?)
  }
}
