//! Subscription registry: rider identity → joined channels.

use std::{
  collections::{HashMap, HashSet},
  sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

use crate::{
  channel::{ChannelHandle, ChannelId},
  error::RealtimeError,
  protocol::ServerMessage,
};

#[derive(Debug, Default)]
struct Bindings {
  /// Subscriber id → channels joined under it.
  by_subscriber: HashMap<String, HashMap<ChannelId, ChannelHandle>>,
  /// Reverse index so `leave` does not scan every subscriber.
  by_channel:    HashMap<ChannelId, HashSet<String>>,
}

/// Tracks which channels each subscriber is reachable on.
///
/// Holds send-handles only; connection lifecycle stays with the socket task.
/// Both indexes live behind one lock so a join racing a leave can never leave
/// them disagreeing.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
  bindings:         RwLock<Bindings>,
  total_joins:      AtomicU64,
  total_deliveries: AtomicU64,
  total_misses:     AtomicU64,
  total_dropped:    AtomicU64,
}

/// Point-in-time registry statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
  pub subscribers:      usize,
  pub channels:         usize,
  pub total_joins:      u64,
  pub total_deliveries: u64,
  /// Publishes that reached no channel.
  pub total_misses:     u64,
  /// Per-channel sends dropped because the channel's queue was full.
  pub total_dropped:    u64,
}

impl SubscriptionRegistry {
  pub fn new() -> Self { Self::default() }

  /// Join `channel` under `subscriber_id`. Idempotent; returns `true` if the
  /// binding is new.
  pub fn join(&self, subscriber_id: &str, channel: &ChannelHandle) -> bool {
    let mut b = self.bindings.write();
    let is_new = b
      .by_subscriber
      .entry(subscriber_id.to_owned())
      .or_default()
      .insert(channel.id(), channel.clone())
      .is_none();
    b.by_channel
      .entry(channel.id())
      .or_default()
      .insert(subscriber_id.to_owned());
    drop(b);

    if is_new {
      self.total_joins.fetch_add(1, Ordering::Relaxed);
      debug!(subscriber_id, channel_id = %channel.id(), "channel joined");
    }
    is_new
  }

  /// Remove `channel_id` from every subscriber it joined. Returns the number
  /// of bindings removed; zero if the channel was unknown.
  pub fn leave(&self, channel_id: ChannelId) -> usize {
    let mut b = self.bindings.write();
    let Some(subscribers) = b.by_channel.remove(&channel_id) else {
      return 0;
    };
    for subscriber in &subscribers {
      if let Some(channels) = b.by_subscriber.get_mut(subscriber) {
        channels.remove(&channel_id);
        if channels.is_empty() {
          b.by_subscriber.remove(subscriber);
        }
      }
    }
    drop(b);

    debug!(channel_id = %channel_id, bindings = subscribers.len(), "channel left");
    subscribers.len()
  }

  /// Snapshot of the channels currently joined under `subscriber_id`.
  pub fn channels_for(&self, subscriber_id: &str) -> Vec<ChannelHandle> {
    self
      .bindings
      .read()
      .by_subscriber
      .get(subscriber_id)
      .map(|channels| channels.values().cloned().collect())
      .unwrap_or_default()
  }

  /// Send `message` to every channel joined under `subscriber_id`.
  ///
  /// Fire-and-forget: returns how many channels accepted the message. Zero
  /// means nothing was delivered; there is no retry. A channel whose queue is
  /// full misses this message but stays joined. Channels whose receiver is
  /// gone are dropped from the registry.
  pub fn publish(&self, subscriber_id: &str, message: &ServerMessage) -> usize {
    let channels = self.channels_for(subscriber_id);
    if channels.is_empty() {
      self.total_misses.fetch_add(1, Ordering::Relaxed);
      return 0;
    }

    let mut delivered = 0;
    for channel in &channels {
      match channel.send(message.clone()) {
        Ok(()) => delivered += 1,
        Err(RealtimeError::ChannelFull) => {
          self.total_dropped.fetch_add(1, Ordering::Relaxed);
          debug!(subscriber_id, channel_id = %channel.id(), "channel full; message dropped");
        }
        Err(_) => {
          self.leave(channel.id());
        }
      }
    }

    self
      .total_deliveries
      .fetch_add(delivered as u64, Ordering::Relaxed);
    if delivered == 0 {
      self.total_misses.fetch_add(1, Ordering::Relaxed);
    }
    delivered
  }

  pub fn subscriber_count(&self) -> usize { self.bindings.read().by_subscriber.len() }

  pub fn channel_count(&self) -> usize { self.bindings.read().by_channel.len() }

  pub fn stats(&self) -> RegistryStats {
    let b = self.bindings.read();
    RegistryStats {
      subscribers:      b.by_subscriber.len(),
      channels:         b.by_channel.len(),
      total_joins:      self.total_joins.load(Ordering::Relaxed),
      total_deliveries: self.total_deliveries.load(Ordering::Relaxed),
      total_misses:     self.total_misses.load(Ordering::Relaxed),
      total_dropped:    self.total_dropped.load(Ordering::Relaxed),
    }
  }
}
