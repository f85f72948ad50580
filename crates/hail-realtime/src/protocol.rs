//! JSON messages exchanged over a channel.
//!
//! ```json
//! // client -> server
//! {"type": "join", "rider_id": "u1"}
//! {"type": "driver_location", "driver_id": "d1", "lat": 40.7, "lon": -74.0}
//! {"type": "ping"}
//!
//! // server -> client
//! {"type": "joined", "rider_id": "u1"}
//! {"type": "ride_update", "ride_id": "...", "status": "accepted", ...}
//! {"type": "pong"}
//! {"type": "error", "message": "..."}
//! ```

use hail_core::event::{DriverLocation, RideUpdate};
use serde::{Deserialize, Serialize};

use crate::error::RealtimeError;

/// Commands a client can send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
  /// Receive ride updates for `rider_id` on this channel.
  Join { rider_id: String },
  /// A driver reporting its position.
  DriverLocation(DriverLocation),
  /// Keepalive.
  Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
  Joined { rider_id: String },
  RideUpdate(RideUpdate),
  Pong,
  Error { message: String },
}

impl ServerMessage {
  /// Encode as a single JSON text frame.
  pub fn to_json(&self) -> Result<String, RealtimeError> {
    Ok(serde_json::to_string(self)?)
  }
}
