//! Fare and ETA value types attached to a ride when it is matched.

use std::{fmt, time::Duration};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{Error, Result};

// ─── Fare ────────────────────────────────────────────────────────────────────

/// A non-negative monetary amount with cent precision.
///
/// Held as integer cents so arithmetic and comparisons are exact; serialised
/// as a decimal JSON number (e.g. `17.42`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fare {
  cents: u64,
}

impl Fare {
  pub const fn from_cents(cents: u64) -> Self { Self { cents } }

  /// Build a fare from a decimal amount, rounding to two decimal places.
  ///
  /// Negative, NaN and infinite amounts are rejected.
  pub fn from_amount(amount: f64) -> Result<Self> {
    if !amount.is_finite() {
      return Err(Error::InvalidFare(format!("{amount} is not a finite amount")));
    }
    if amount < 0.0 {
      return Err(Error::InvalidFare(format!("{amount} is negative")));
    }
    let cents = (amount * 100.0).round();
    if cents > u64::MAX as f64 {
      return Err(Error::InvalidFare(format!("{amount} is out of range")));
    }
    Ok(Self { cents: cents as u64 })
  }

  pub fn cents(self) -> u64 { self.cents }

  pub fn amount(self) -> f64 { self.cents as f64 / 100.0 }
}

impl fmt::Display for Fare {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
  }
}

impl Serialize for Fare {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(self.amount())
  }
}

impl<'de> Deserialize<'de> for Fare {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let amount = f64::deserialize(deserializer)?;
    Fare::from_amount(amount).map_err(de::Error::custom)
  }
}

// ─── Eta ─────────────────────────────────────────────────────────────────────

/// Estimated time until the driver reaches the pickup, in whole minutes.
/// Always at least one minute.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub struct Eta(u32);

impl Eta {
  pub fn from_minutes(minutes: u32) -> Result<Self> {
    if minutes == 0 {
      return Err(Error::InvalidEta);
    }
    Ok(Self(minutes))
  }

  pub fn minutes(self) -> u32 { self.0 }

  pub fn as_duration(self) -> Duration { Duration::from_secs(u64::from(self.0) * 60) }
}

impl TryFrom<u32> for Eta {
  type Error = Error;

  fn try_from(minutes: u32) -> Result<Self> { Self::from_minutes(minutes) }
}

impl From<Eta> for u32 {
  fn from(eta: Eta) -> u32 { eta.0 }
}

impl fmt::Display for Eta {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.0 == 1 {
      write!(f, "1 min")
    } else {
      write!(f, "{} mins", self.0)
    }
  }
}
