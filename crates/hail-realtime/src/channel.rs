//! Channel handles.
//!
//! A channel is one live connection (e.g. a WebSocket). The connection task
//! keeps the [`ChannelReceiver`] and forwards whatever arrives on it to the
//! socket; everyone else holds a cloneable [`ChannelHandle`].
//!
//! Queues are bounded. A connection that stops reading loses messages once
//! its queue is full; senders never wait on it.

use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::{error::RealtimeError, protocol::ServerMessage};

/// Unique identifier for a channel.
pub type ChannelId = Uuid;

/// Messages a channel may hold before further sends are dropped.
pub const CHANNEL_CAPACITY: usize = 64;

/// Receiving half, owned by the connection task.
pub type ChannelReceiver = mpsc::Receiver<ServerMessage>;

/// Cloneable send-handle for one channel.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
  id:     ChannelId,
  sender: mpsc::Sender<ServerMessage>,
}

impl ChannelHandle {
  pub fn id(&self) -> ChannelId { self.id }

  /// Queue a message for the connection. Never blocks; fails with
  /// [`RealtimeError::ChannelFull`] when the reader has fallen behind.
  pub fn send(&self, message: ServerMessage) -> Result<(), RealtimeError> {
    self.sender.try_send(message).map_err(|e| match e {
      TrySendError::Full(_) => RealtimeError::ChannelFull,
      TrySendError::Closed(_) => RealtimeError::ChannelClosed,
    })
  }

  /// Whether the connection task has dropped its receiver.
  pub fn is_closed(&self) -> bool { self.sender.is_closed() }
}

/// Open a new channel with a fresh id and [`CHANNEL_CAPACITY`] slots.
pub fn open_channel() -> (ChannelHandle, ChannelReceiver) {
  open_channel_with_capacity(CHANNEL_CAPACITY)
}

pub fn open_channel_with_capacity(capacity: usize) -> (ChannelHandle, ChannelReceiver) {
  let (sender, receiver) = mpsc::channel(capacity);
  (
    ChannelHandle {
      id: Uuid::new_v4(),
      sender,
    },
    receiver,
  )
}
