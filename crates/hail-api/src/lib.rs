//! JSON REST and WebSocket API for Hail.
//!
//! Exposes an axum [`Router`] backed by a [`Dispatcher`] over any
//! [`RideStore`] and [`MatchProvider`]. Auth, TLS and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", hail_api::api_router(dispatcher.clone()))
//! ```

pub mod drivers;
pub mod error;
pub mod realtime;
pub mod rides;

use axum::{
  Router,
  routing::{get, post},
};
use hail_core::{matching::MatchProvider, store::RideStore};
use hail_dispatch::Dispatcher;

pub use error::ApiError;

/// Build a fully-materialised API router for `dispatcher`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, P>(dispatcher: Dispatcher<S, P>) -> Router<()>
where
  S: RideStore + 'static,
  P: MatchProvider + 'static,
{
  Router::new()
    // Rides
    .route("/rides", get(rides::list::<S, P>).post(rides::create::<S, P>))
    .route("/rides/{id}", get(rides::get_one::<S, P>))
    .route("/rides/{id}/start", post(rides::start::<S, P>))
    .route("/rides/{id}/complete", post(rides::complete::<S, P>))
    .route("/rides/{id}/cancel", post(rides::cancel::<S, P>))
    // Drivers
    .route("/drivers/location", post(drivers::report_location::<S, P>))
    // Realtime
    .route("/ws", get(realtime::ws_handler::<S, P>))
    .route("/realtime/stats", get(realtime::stats::<S, P>))
    .with_state(dispatcher)
}
