//! [`SqliteStore`]: the SQLite implementation of [`RideStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use hail_core::{
  ride::{Ride, RideStatus},
  store::RideStore,
};

use crate::{
  encode::{encode_uuid, RawRide, RideParams, RIDE_COLUMNS},
  schema::SCHEMA,
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Hail ride store backed by a single SQLite file.
///
/// Clones share one background connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) the database at `path` and apply the schema.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a private in-memory database. Used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── RideStore impl ──────────────────────────────────────────────────────────

impl RideStore for SqliteStore {
  type Error = crate::Error;

  async fn insert_ride(&self, ride: &Ride) -> Result<()> {
    let p = RideParams::from_ride(ride)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO rides (
             ride_id, rider_id, pickup_location, destination, status,
             driver_id, driver_name, driver_vehicle, fare_cents, eta_minutes,
             pickup_time, cancellation_reason, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
          rusqlite::params![
            p.ride_id,
            p.rider_id,
            p.pickup_location,
            p.destination,
            p.status,
            p.driver_id,
            p.driver_name,
            p.driver_vehicle,
            p.fare_cents,
            p.eta_minutes,
            p.pickup_time,
            p.cancellation_reason,
            p.created_at,
            p.updated_at,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  async fn get_ride(&self, ride_id: Uuid) -> Result<Option<Ride>> {
    let id_str = encode_uuid(ride_id);

    let raw: Option<RawRide> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {RIDE_COLUMNS} FROM rides WHERE ride_id = ?1"),
            rusqlite::params![id_str],
            RawRide::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawRide::into_ride).transpose()
  }

  async fn rides_for_rider(&self, rider_id: &str) -> Result<Vec<Ride>> {
    let rider_id = rider_id.to_owned();

    let raws: Vec<RawRide> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RIDE_COLUMNS} FROM rides
           WHERE rider_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![rider_id], RawRide::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRide::into_ride).collect()
  }

  async fn update_ride(&self, ride: &Ride, expected: RideStatus) -> Result<bool> {
    let p = RideParams::from_ride(ride)?;
    let expected = expected.as_str();

    // Identity columns (rider, locations, created_at) are never rewritten.
    let changed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE rides SET
             status              = ?2,
             driver_id           = ?3,
             driver_name         = ?4,
             driver_vehicle      = ?5,
             fare_cents          = ?6,
             eta_minutes         = ?7,
             pickup_time         = ?8,
             cancellation_reason = ?9,
             updated_at          = ?10
           WHERE ride_id = ?1 AND status = ?11",
          rusqlite::params![
            p.ride_id,
            p.status,
            p.driver_id,
            p.driver_name,
            p.driver_vehicle,
            p.fare_cents,
            p.eta_minutes,
            p.pickup_time,
            p.cancellation_reason,
            p.updated_at,
            expected,
          ],
        )?;
        Ok(n)
      })
      .await?;

    Ok(changed == 1)
  }
}
