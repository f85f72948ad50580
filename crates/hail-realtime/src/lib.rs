//! Real-time delivery for Hail.
//!
//! - [`channel`]: a send-handle for one live connection (the delivery
//!   transport's view of a socket).
//! - [`registry`]: which channels each rider is currently reachable on.
//! - [`protocol`]: the JSON messages exchanged over a channel.
//!
//! The registry never owns a connection. The socket task that opened a
//! channel is responsible for calling [`SubscriptionRegistry::leave`] when
//! the connection goes away.

pub mod channel;
pub mod error;
pub mod protocol;
pub mod registry;

pub use channel::{
  CHANNEL_CAPACITY, ChannelHandle, ChannelId, ChannelReceiver, open_channel,
  open_channel_with_capacity,
};
pub use error::RealtimeError;
pub use protocol::{ClientCommand, ServerMessage};
pub use registry::{RegistryStats, SubscriptionRegistry};
