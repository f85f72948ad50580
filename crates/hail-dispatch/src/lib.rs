//! Ride dispatch coordination for Hail.
//!
//! [`Dispatcher`] accepts ride requests, acknowledges them immediately, runs
//! the match against a [`MatchProvider`](hail_core::matching::MatchProvider)
//! in the background, persists the outcome through a
//! [`RideStore`](hail_core::store::RideStore), and pushes the result to every
//! channel the rider has joined.
//!
//! [`SimulatedProvider`] is the reference provider: a fixed delay and a fixed
//! mock driver with a randomised fare and ETA.

pub mod dispatcher;
pub mod error;
pub mod simulated;

pub use dispatcher::{DispatchConfig, Dispatcher, RideAck, RideRequest};
pub use error::{DispatchError, Result};
pub use simulated::{SimulatedProvider, SimulationConfig};
