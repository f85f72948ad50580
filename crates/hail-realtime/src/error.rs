//! Error types for the real-time layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RealtimeError {
  /// The receiving side of the channel has been dropped.
  #[error("channel closed")]
  ChannelClosed,

  /// The connection is not reading fast enough; the message was dropped.
  #[error("channel full")]
  ChannelFull,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}
