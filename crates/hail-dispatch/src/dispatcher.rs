//! The dispatch coordinator.
//!
//! A ride request is acknowledged as soon as the ride is persisted. Matching
//! runs in its own task:
//!
//! ```text
//! request_ride ─► Ride::create ─► insert ─► ack
//!                                   └─► spawn: find_match (with timeout)
//!                                                 ─► apply_match | cancel
//!                                                 ─► update (CAS on searching)
//!                                                 ─► publish to rider
//! ```
//!
//! Post-acknowledgement failures (provider failure, timeout, a store error
//! while recording the outcome) never reach the original caller; they surface
//! as a cancelled ride and a pushed event. An update nobody is listening for
//! is logged and dropped.

use std::{sync::Arc, time::Duration};

use hail_core::{
  Error,
  event::{DriverLocation, RideUpdate},
  matching::MatchProvider,
  ride::{Ride, RideStatus},
  store::RideStore,
};
use hail_realtime::{ServerMessage, SubscriptionRegistry};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{DispatchError, Result};

/// Cancellation reason when the match outcome cannot be persisted.
pub const UNRECORDED_MATCH: &str = "could not record match result";

// ─── Inputs / outputs ────────────────────────────────────────────────────────

/// A rider's trip request.
#[derive(Debug, Clone)]
pub struct RideRequest {
  pub rider_id:        String,
  pub pickup_location: String,
  pub destination:     String,
  /// Overrides [`DispatchConfig::match_timeout`] for this ride.
  pub match_timeout:   Option<Duration>,
}

/// Immediate acknowledgement of a ride request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideAck {
  pub ride_id: Uuid,
  pub status:  RideStatus,
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
  /// How long to wait for the provider before cancelling the ride.
  pub match_timeout: Duration,
}

impl Default for DispatchConfig {
  fn default() -> Self {
    Self {
      match_timeout: Duration::from_secs(30),
    }
  }
}

// ─── Dispatcher ──────────────────────────────────────────────────────────────

/// Orchestrates ride creation, matching, persistence and delivery.
///
/// Cheap to clone; all shared parts are reference-counted.
pub struct Dispatcher<S, P> {
  store:    Arc<S>,
  provider: Arc<P>,
  registry: Arc<SubscriptionRegistry>,
  config:   DispatchConfig,
}

impl<S, P> Clone for Dispatcher<S, P> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      provider: self.provider.clone(),
      registry: self.registry.clone(),
      config:   self.config.clone(),
    }
  }
}

impl<S, P> Dispatcher<S, P>
where
  S: RideStore + 'static,
  P: MatchProvider + 'static,
{
  pub fn new(
    store: Arc<S>,
    provider: Arc<P>,
    registry: Arc<SubscriptionRegistry>,
    config: DispatchConfig,
  ) -> Self {
    Self {
      store,
      provider,
      registry,
      config,
    }
  }

  pub fn registry(&self) -> &Arc<SubscriptionRegistry> { &self.registry }

  // ── Requests ──────────────────────────────────────────────────────────

  /// Validate and persist a new ride, start matching in the background, and
  /// return without waiting for the provider.
  ///
  /// Invalid input fails here with [`Error::InvalidRequest`]; nothing is
  /// stored and no event is ever sent for it.
  pub async fn request_ride(&self, request: RideRequest) -> Result<RideAck> {
    let ride = Ride::create(
      request.rider_id,
      request.pickup_location,
      request.destination,
    )?;
    self
      .store
      .insert_ride(&ride)
      .await
      .map_err(DispatchError::store)?;

    let ack = RideAck {
      ride_id: ride.ride_id(),
      status:  ride.status(),
    };
    let timeout = request.match_timeout.unwrap_or(self.config.match_timeout);
    info!(
      ride_id = %ack.ride_id,
      rider_id = %ride.rider_id(),
      "ride requested"
    );

    let this = self.clone();
    tokio::spawn(async move { this.run_match(ride, timeout).await });

    Ok(ack)
  }

  async fn run_match(&self, mut ride: Ride, timeout: Duration) {
    let ride_id = ride.ride_id();
    let searching = ride.clone();
    let outcome =
      tokio::time::timeout(timeout, self.provider.find_match(&ride)).await;

    let failure = match outcome {
      Ok(Ok(found)) => {
        if let Err(e) = ride.apply_match(found) {
          error!(ride_id = %ride_id, error = %e, "cannot apply match");
          return;
        }
        None
      }
      Ok(Err(failure)) => {
        warn!(ride_id = %ride_id, error = %failure, "matching failed");
        Some(failure.to_string())
      }
      Err(_) => {
        warn!(ride_id = %ride_id, ?timeout, "matching timed out");
        Some(format!("matching timed out after {timeout:?}"))
      }
    };

    if let Some(reason) = &failure
      && let Err(e) = ride.cancel(reason.as_str())
    {
      error!(ride_id = %ride_id, error = %e, "cannot cancel unmatched ride");
      return;
    }

    match self.store.update_ride(&ride, RideStatus::Searching).await {
      Ok(true) => {}
      Ok(false) => {
        // Cancelled (or otherwise moved on) while we were matching.
        info!(ride_id = %ride_id, "ride changed during matching; result discarded");
        return;
      }
      Err(e) => {
        error!(ride_id = %ride_id, error = %e, "failed to persist match outcome");
        self.abandon(searching).await;
        return;
      }
    }

    info!(ride_id = %ride_id, status = %ride.status(), "match completed");

    let mut update = RideUpdate::from_ride(&ride);
    if let Some(reason) = failure {
      update = update.with_message(format!("No driver could be matched: {reason}"));
    }
    self.notify(ride.rider_id(), update);
  }

  /// The match outcome could not be stored. Try once more to record the
  /// ride as cancelled, then tell the rider it was cancelled either way.
  async fn abandon(&self, mut ride: Ride) {
    let ride_id = ride.ride_id();
    if let Err(e) = ride.cancel(UNRECORDED_MATCH) {
      error!(ride_id = %ride_id, error = %e, "cannot cancel unrecorded ride");
      return;
    }

    match self.store.update_ride(&ride, RideStatus::Searching).await {
      Ok(true) => info!(ride_id = %ride_id, "ride cancelled after store failure"),
      Ok(false) => {
        info!(ride_id = %ride_id, "ride changed during matching; result discarded");
        return;
      }
      Err(e) => {
        error!(ride_id = %ride_id, error = %e, "failed to persist cancellation");
      }
    }

    self.notify(ride.rider_id(), RideUpdate::from_ride(&ride));
  }

  // ── Collaborator-driven transitions ───────────────────────────────────

  /// The driver has picked the rider up.
  pub async fn start_trip(&self, ride_id: Uuid) -> Result<Ride> {
    self.transition(ride_id, Ride::start_trip).await
  }

  pub async fn complete_trip(&self, ride_id: Uuid) -> Result<Ride> {
    self.transition(ride_id, Ride::complete).await
  }

  /// Cancel a ride from any non-terminal state. A match still in flight for
  /// it will be discarded when it completes.
  pub async fn cancel_ride(&self, ride_id: Uuid, reason: Option<String>) -> Result<Ride> {
    let reason = reason
      .filter(|r| !r.trim().is_empty())
      .unwrap_or_else(|| "cancelled by rider".to_owned());
    self.transition(ride_id, move |r| r.cancel(reason)).await
  }

  async fn transition<F>(&self, ride_id: Uuid, apply: F) -> Result<Ride>
  where
    F: FnOnce(&mut Ride) -> hail_core::Result<()> + Send,
  {
    let mut ride = self.get_ride(ride_id).await?;
    let previous = ride.status();
    apply(&mut ride)?;

    let applied = self
      .store
      .update_ride(&ride, previous)
      .await
      .map_err(DispatchError::store)?;
    if !applied {
      return Err(DispatchError::Conflict(ride_id));
    }

    info!(
      ride_id = %ride_id,
      from = %previous,
      to = %ride.status(),
      "ride transitioned"
    );
    self.notify(ride.rider_id(), RideUpdate::from_ride(&ride));
    Ok(ride)
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  pub async fn get_ride(&self, ride_id: Uuid) -> Result<Ride> {
    self
      .store
      .get_ride(ride_id)
      .await
      .map_err(DispatchError::store)?
      .ok_or(DispatchError::Ride(Error::NotFound(ride_id)))
  }

  pub async fn rides_for_rider(&self, rider_id: &str) -> Result<Vec<Ride>> {
    self
      .store
      .rides_for_rider(rider_id)
      .await
      .map_err(DispatchError::store)
  }

  // ── Signals ───────────────────────────────────────────────────────────

  /// Accept a driver position report. Nothing consumes it yet beyond the log.
  pub fn driver_location(&self, location: &DriverLocation) -> Result<()> {
    if !location.is_valid() {
      return Err(
        Error::InvalidRequest(format!(
          "invalid location for driver {:?}: ({}, {})",
          location.driver_id, location.lat, location.lon
        ))
        .into(),
      );
    }
    debug!(
      driver_id = %location.driver_id,
      lat = location.lat,
      lon = location.lon,
      "driver location"
    );
    Ok(())
  }

  // ── Delivery ──────────────────────────────────────────────────────────

  /// Push `update` to every channel the rider has joined. A rider with no
  /// joined channel simply misses it.
  fn notify(&self, rider_id: &str, update: RideUpdate) -> usize {
    let ride_id = update.ride_id;
    let delivered = self
      .registry
      .publish(rider_id, &ServerMessage::RideUpdate(update));
    if delivered == 0 {
      debug!(ride_id = %ride_id, rider_id, "no channel joined; update dropped");
    } else {
      debug!(ride_id = %ride_id, rider_id, delivered, "update delivered");
    }
    delivered
  }
}

#[cfg(test)]
mod tests;
