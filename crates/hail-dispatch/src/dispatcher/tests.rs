//! Dispatcher tests against an in-memory SQLite store.

use std::{
  future, io,
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use hail_core::{
  Error,
  event::DriverLocation,
  matching::{DriverMatch, MatchFailure, MatchProvider},
  quote::{Eta, Fare},
  ride::{Ride, RideStatus},
};
use hail_realtime::{ChannelReceiver, ServerMessage, SubscriptionRegistry, open_channel};
use hail_store_sqlite::SqliteStore;
use tokio::time::timeout;
use uuid::Uuid;

use super::*;
use crate::simulated::{SimulatedProvider, SimulationConfig};

// ─── Test providers ──────────────────────────────────────────────────────────

/// Matches after `delay` with a fixed driver.
struct FixedProvider {
  delay: Duration,
}

impl MatchProvider for FixedProvider {
  async fn find_match(&self, _ride: &Ride) -> Result<DriverMatch, MatchFailure> {
    tokio::time::sleep(self.delay).await;
    Ok(DriverMatch {
      driver_id:   "d1".into(),
      driver_name: "Jane Roe".into(),
      vehicle:     "Honda Civic (XYZ-9876)".into(),
      fare:        Fare::from_cents(1999),
      eta:         Eta::from_minutes(5).unwrap(),
    })
  }
}

struct FailingProvider;

impl MatchProvider for FailingProvider {
  async fn find_match(&self, _ride: &Ride) -> Result<DriverMatch, MatchFailure> {
    Err(MatchFailure::NoDriversAvailable)
  }
}

/// Never answers.
struct HangingProvider;

impl MatchProvider for HangingProvider {
  async fn find_match(&self, _ride: &Ride) -> Result<DriverMatch, MatchFailure> {
    future::pending().await
  }
}

// ─── Test stores ─────────────────────────────────────────────────────────────

/// SQLite store whose first `failures` calls to `update_ride` error out.
struct FlakyStore {
  inner:    SqliteStore,
  failures: AtomicUsize,
}

impl FlakyStore {
  async fn new(failures: usize) -> Self {
    Self {
      inner:    SqliteStore::open_in_memory().await.unwrap(),
      failures: AtomicUsize::new(failures),
    }
  }
}

impl RideStore for FlakyStore {
  type Error = io::Error;

  async fn insert_ride(&self, ride: &Ride) -> Result<(), io::Error> {
    self.inner.insert_ride(ride).await.map_err(io::Error::other)
  }

  async fn get_ride(&self, ride_id: Uuid) -> Result<Option<Ride>, io::Error> {
    self.inner.get_ride(ride_id).await.map_err(io::Error::other)
  }

  async fn rides_for_rider(&self, rider_id: &str) -> Result<Vec<Ride>, io::Error> {
    self.inner.rides_for_rider(rider_id).await.map_err(io::Error::other)
  }

  async fn update_ride(&self, ride: &Ride, expected: RideStatus) -> Result<bool, io::Error> {
    let failing = self
      .failures
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok();
    if failing {
      return Err(io::Error::other("disk full"));
    }
    self.inner.update_ride(ride, expected).await.map_err(io::Error::other)
  }
}

async fn flaky_dispatcher(failures: usize) -> Dispatcher<FlakyStore, FixedProvider> {
  Dispatcher::new(
    Arc::new(FlakyStore::new(failures).await),
    Arc::new(FixedProvider { delay: Duration::from_millis(10) }),
    Arc::new(SubscriptionRegistry::new()),
    DispatchConfig::default(),
  )
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

const WAIT: Duration = Duration::from_secs(5);

async fn dispatcher<P: MatchProvider + 'static>(
  provider: P,
) -> Dispatcher<SqliteStore, P> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  Dispatcher::new(
    Arc::new(store),
    Arc::new(provider),
    Arc::new(SubscriptionRegistry::new()),
    DispatchConfig::default(),
  )
}

fn fast_simulated() -> SimulatedProvider {
  SimulatedProvider::new(SimulationConfig {
    delay_ms: 20,
    ..SimulationConfig::default()
  })
}

fn request(rider_id: &str, pickup: &str, destination: &str) -> RideRequest {
  RideRequest {
    rider_id:        rider_id.into(),
    pickup_location: pickup.into(),
    destination:     destination.into(),
    match_timeout:   None,
  }
}

async fn next_update(rx: &mut ChannelReceiver) -> RideUpdate {
  match timeout(WAIT, rx.recv()).await {
    Ok(Some(ServerMessage::RideUpdate(update))) => update,
    other => panic!("expected a ride update, got {other:?}"),
  }
}

async fn assert_silent(rx: &mut ChannelReceiver, for_: Duration) {
  if let Ok(msg) = timeout(for_, rx.recv()).await {
    panic!("expected no message, got {msg:?}");
  }
}

// ─── Requesting ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn request_is_acknowledged_before_matching_finishes() {
  let d = dispatcher(FixedProvider { delay: Duration::from_secs(60) }).await;
  let ack = timeout(Duration::from_secs(1), d.request_ride(request("u1", "A", "B")))
    .await
    .expect("ack must not wait for the provider")
    .unwrap();
  assert_eq!(ack.status, RideStatus::Searching);

  let stored = d.get_ride(ack.ride_id).await.unwrap();
  assert_eq!(stored.status(), RideStatus::Searching);
}

#[tokio::test]
async fn accepted_event_reaches_joined_rider() {
  let d = dispatcher(fast_simulated()).await;
  let (ch, mut rx) = open_channel();
  d.registry().join("u1", &ch);

  let ack = d.request_ride(request("u1", "A", "B")).await.unwrap();
  assert_eq!(ack.status, RideStatus::Searching);

  let update = next_update(&mut rx).await;
  assert_eq!(update.ride_id, ack.ride_id);
  assert_eq!(update.status, RideStatus::Accepted);
  assert_eq!(update.driver_name.as_deref(), Some("John Doe"));
  let fare = update.fare.unwrap().amount();
  assert!((10.0..=30.0).contains(&fare), "fare {fare}");
  let eta = update.estimated_arrival.unwrap().minutes();
  assert!((2..=7).contains(&eta), "eta {eta}");
  assert!(update.pickup_time.is_some());

  // Exactly one event for the match.
  assert_silent(&mut rx, Duration::from_millis(100)).await;

  let stored = d.get_ride(ack.ride_id).await.unwrap();
  assert_eq!(stored.status(), RideStatus::Accepted);
  assert_eq!(stored.fare(), update.fare);
}

#[tokio::test]
async fn invalid_request_creates_nothing() {
  let d = dispatcher(fast_simulated()).await;
  let (ch, mut rx) = open_channel();
  d.registry().join("u1", &ch);

  let err = d.request_ride(request("u1", "", "B")).await.unwrap_err();
  assert!(matches!(err, DispatchError::Ride(Error::InvalidRequest(_))));

  assert!(d.rides_for_rider("u1").await.unwrap().is_empty());
  assert_silent(&mut rx, Duration::from_millis(100)).await;
}

#[tokio::test]
async fn every_joined_channel_gets_the_same_event() {
  let d = dispatcher(fast_simulated()).await;
  let (a, mut ra) = open_channel();
  let (b, mut rb) = open_channel();
  d.registry().join("u2", &a);
  d.registry().join("u2", &b);

  d.request_ride(request("u2", "A", "B")).await.unwrap();

  let first = next_update(&mut ra).await;
  let second = next_update(&mut rb).await;
  assert_eq!(first, second);
}

#[tokio::test]
async fn channel_that_left_receives_nothing() {
  let d = dispatcher(FixedProvider { delay: Duration::from_millis(50) }).await;
  let (gone, mut gone_rx) = open_channel();
  let (stay, mut stay_rx) = open_channel();
  d.registry().join("u1", &gone);
  d.registry().join("u1", &stay);

  let ack = d.request_ride(request("u1", "A", "B")).await.unwrap();
  d.registry().leave(gone.id());

  assert_eq!(next_update(&mut stay_rx).await.ride_id, ack.ride_id);
  assert_silent(&mut gone_rx, Duration::from_millis(100)).await;
}

#[tokio::test]
async fn other_riders_are_not_notified() {
  let d = dispatcher(fast_simulated()).await;
  let (mine, mut mine_rx) = open_channel();
  let (theirs, mut theirs_rx) = open_channel();
  d.registry().join("u1", &mine);
  d.registry().join("u9", &theirs);

  d.request_ride(request("u1", "A", "B")).await.unwrap();
  next_update(&mut mine_rx).await;
  assert_silent(&mut theirs_rx, Duration::from_millis(100)).await;
}

#[tokio::test]
async fn rider_without_channels_still_gets_matched() {
  let d = dispatcher(FixedProvider { delay: Duration::from_millis(10) }).await;
  let ack = d.request_ride(request("u1", "A", "B")).await.unwrap();

  let mut status = RideStatus::Searching;
  for _ in 0..100 {
    status = d.get_ride(ack.ride_id).await.unwrap().status();
    if status != RideStatus::Searching {
      break;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
  }
  assert_eq!(status, RideStatus::Accepted);
  assert_eq!(d.registry().stats().total_misses, 1);
}

#[tokio::test]
async fn same_rider_may_hold_several_rides() {
  let d = dispatcher(fast_simulated()).await;
  let (ch, mut rx) = open_channel();
  d.registry().join("u1", &ch);

  let a = d.request_ride(request("u1", "A", "B")).await.unwrap();
  let b = d.request_ride(request("u1", "C", "D")).await.unwrap();
  assert_ne!(a.ride_id, b.ride_id);

  let mut seen = vec![next_update(&mut rx).await.ride_id, next_update(&mut rx).await.ride_id];
  seen.sort();
  let mut expected = vec![a.ride_id, b.ride_id];
  expected.sort();
  assert_eq!(seen, expected);
  assert_eq!(d.rides_for_rider("u1").await.unwrap().len(), 2);
}

// ─── Failure paths ───────────────────────────────────────────────────────────

#[tokio::test]
async fn provider_failure_cancels_and_notifies() {
  let d = dispatcher(FailingProvider).await;
  let (ch, mut rx) = open_channel();
  d.registry().join("u1", &ch);

  let ack = d.request_ride(request("u1", "A", "B")).await.unwrap();
  let update = next_update(&mut rx).await;
  assert_eq!(update.status, RideStatus::Cancelled);
  assert!(update.message.starts_with("No driver could be matched"), "{}", update.message);
  assert!(update.driver_name.is_none());

  let stored = d.get_ride(ack.ride_id).await.unwrap();
  assert_eq!(stored.status(), RideStatus::Cancelled);
  assert!(stored.cancellation_reason().is_some());
}

#[tokio::test]
async fn timeout_cancels_and_notifies() {
  let d = dispatcher(HangingProvider).await;
  let (ch, mut rx) = open_channel();
  d.registry().join("u1", &ch);

  let mut req = request("u1", "A", "B");
  req.match_timeout = Some(Duration::from_millis(50));
  let ack = d.request_ride(req).await.unwrap();

  let update = next_update(&mut rx).await;
  assert_eq!(update.ride_id, ack.ride_id);
  assert_eq!(update.status, RideStatus::Cancelled);
  assert!(update.message.contains("timed out"), "{}", update.message);
}

#[tokio::test]
async fn cancel_during_search_discards_late_match() {
  let d = dispatcher(FixedProvider { delay: Duration::from_millis(100) }).await;
  let (ch, mut rx) = open_channel();
  d.registry().join("u1", &ch);

  let ack = d.request_ride(request("u1", "A", "B")).await.unwrap();
  let cancelled = d.cancel_ride(ack.ride_id, None).await.unwrap();
  assert_eq!(cancelled.status(), RideStatus::Cancelled);
  assert_eq!(cancelled.cancellation_reason(), Some("cancelled by rider"));

  let update = next_update(&mut rx).await;
  assert_eq!(update.status, RideStatus::Cancelled);

  // The match completes later but must not resurrect the ride.
  assert_silent(&mut rx, Duration::from_millis(300)).await;
  let stored = d.get_ride(ack.ride_id).await.unwrap();
  assert_eq!(stored.status(), RideStatus::Cancelled);
  assert!(stored.driver().is_none());
}

#[tokio::test]
async fn store_failure_cancels_and_notifies() {
  let d = flaky_dispatcher(1).await;
  let (ch, mut rx) = open_channel();
  d.registry().join("u1", &ch);

  let ack = d.request_ride(request("u1", "A", "B")).await.unwrap();
  let update = next_update(&mut rx).await;
  assert_eq!(update.ride_id, ack.ride_id);
  assert_eq!(update.status, RideStatus::Cancelled);
  assert!(update.message.contains(UNRECORDED_MATCH), "{}", update.message);
  assert!(update.driver_name.is_none());

  let stored = d.get_ride(ack.ride_id).await.unwrap();
  assert_eq!(stored.status(), RideStatus::Cancelled);
  assert_eq!(stored.cancellation_reason(), Some(UNRECORDED_MATCH));
  assert!(stored.fare().is_none());
}

#[tokio::test]
async fn rider_is_told_even_when_store_stays_down() {
  let d = flaky_dispatcher(usize::MAX).await;
  let (ch, mut rx) = open_channel();
  d.registry().join("u1", &ch);

  let ack = d.request_ride(request("u1", "A", "B")).await.unwrap();
  let update = next_update(&mut rx).await;
  assert_eq!(update.ride_id, ack.ride_id);
  assert_eq!(update.status, RideStatus::Cancelled);
  assert_silent(&mut rx, Duration::from_millis(100)).await;
}

// ─── Collaborator transitions ────────────────────────────────────────────────

#[tokio::test]
async fn trip_progresses_and_rider_is_told() {
  let d = dispatcher(FixedProvider { delay: Duration::from_millis(10) }).await;
  let (ch, mut rx) = open_channel();
  d.registry().join("u1", &ch);

  let ack = d.request_ride(request("u1", "A", "B")).await.unwrap();
  assert_eq!(next_update(&mut rx).await.status, RideStatus::Accepted);

  let ride = d.start_trip(ack.ride_id).await.unwrap();
  assert_eq!(ride.status(), RideStatus::OnTheWay);
  assert_eq!(next_update(&mut rx).await.status, RideStatus::OnTheWay);

  let ride = d.complete_trip(ack.ride_id).await.unwrap();
  assert_eq!(ride.status(), RideStatus::Completed);
  assert_eq!(next_update(&mut rx).await.status, RideStatus::Completed);
}

#[tokio::test]
async fn illegal_transition_is_rejected() {
  let d = dispatcher(FixedProvider { delay: Duration::from_secs(60) }).await;
  let ack = d.request_ride(request("u1", "A", "B")).await.unwrap();

  let err = d.complete_trip(ack.ride_id).await.unwrap_err();
  assert!(matches!(
    err,
    DispatchError::Ride(Error::InvalidTransition {
      from: RideStatus::Searching,
      to: RideStatus::Completed,
      ..
    })
  ));
  assert_eq!(
    d.get_ride(ack.ride_id).await.unwrap().status(),
    RideStatus::Searching
  );
}

#[tokio::test]
async fn unknown_ride_is_not_found() {
  let d = dispatcher(FailingProvider).await;
  let id = Uuid::new_v4();
  assert!(matches!(
    d.get_ride(id).await,
    Err(DispatchError::Ride(Error::NotFound(missing))) if missing == id
  ));
  assert!(matches!(
    d.start_trip(id).await,
    Err(DispatchError::Ride(Error::NotFound(_)))
  ));
}

#[tokio::test]
async fn driver_location_is_validated() {
  let d = dispatcher(FailingProvider).await;
  let ok = DriverLocation {
    driver_id: "d1".into(),
    lat:       51.5,
    lon:       -0.12,
  };
  assert!(d.driver_location(&ok).is_ok());
  let bad = DriverLocation { lat: 200.0, ..ok };
  assert!(matches!(
    d.driver_location(&bad),
    Err(DispatchError::Ride(Error::InvalidRequest(_)))
  ));
}
