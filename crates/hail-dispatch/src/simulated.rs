//! The reference matching provider: waits a fixed delay, then always matches
//! the same mock driver with a random fare and ETA.

use std::{ops::RangeInclusive, time::Duration};

use hail_core::{
  matching::{DriverMatch, MatchFailure, MatchProvider},
  quote::{Eta, Fare},
  ride::Ride,
};
use rand::Rng as _;
use serde::Deserialize;
use tracing::debug;

/// Fares are drawn uniformly from 10.00 to 30.00 inclusive.
pub const FARE_RANGE_CENTS: RangeInclusive<u64> = 1_000..=3_000;

/// ETAs are drawn uniformly from 2 to 7 whole minutes inclusive.
pub const ETA_RANGE_MINUTES: RangeInclusive<u32> = 2..=7;

/// Settings for [`SimulatedProvider`], read from the `[matching]` config
/// table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
  /// How long each match takes, in milliseconds.
  pub delay_ms:    u64,
  pub driver_id:   String,
  pub driver_name: String,
  pub vehicle:     String,
}

impl Default for SimulationConfig {
  fn default() -> Self {
    Self {
      delay_ms:    3_000,
      driver_id:   "driver-001".to_owned(),
      driver_name: "John Doe".to_owned(),
      vehicle:     "Toyota Camry (ABC-1234)".to_owned(),
    }
  }
}

/// Stateless apart from its configuration, so concurrent matches never
/// interfere.
#[derive(Debug, Clone, Default)]
pub struct SimulatedProvider {
  config: SimulationConfig,
}

impl SimulatedProvider {
  pub fn new(config: SimulationConfig) -> Self { Self { config } }

  pub fn delay(&self) -> Duration { Duration::from_millis(self.config.delay_ms) }
}

impl MatchProvider for SimulatedProvider {
  async fn find_match(&self, ride: &Ride) -> Result<DriverMatch, MatchFailure> {
    tokio::time::sleep(self.delay()).await;

    // `ThreadRng` is not `Send`; keep it out of the awaited state.
    let (cents, minutes) = {
      let mut rng = rand::thread_rng();
      (
        rng.gen_range(FARE_RANGE_CENTS),
        rng.gen_range(ETA_RANGE_MINUTES),
      )
    };
    let eta = Eta::from_minutes(minutes)
      .map_err(|e| MatchFailure::Unavailable(e.to_string()))?;

    debug!(
      ride_id = %ride.ride_id(),
      driver_id = %self.config.driver_id,
      fare_cents = cents,
      eta_minutes = minutes,
      "simulated match"
    );

    Ok(DriverMatch {
      driver_id: self.config.driver_id.clone(),
      driver_name: self.config.driver_name.clone(),
      vehicle: self.config.vehicle.clone(),
      fare: Fare::from_cents(cents),
      eta,
    })
  }
}
