//! `POST /drivers/location`: accepts a driver position report.
//!
//! Reports are validated and logged; nothing downstream consumes them yet.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
};
use hail_core::{event::DriverLocation, matching::MatchProvider, store::RideStore};
use hail_dispatch::Dispatcher;

use crate::error::ApiError;

pub async fn report_location<S, P>(
  State(dispatcher): State<Dispatcher<S, P>>,
  location: Result<Json<DriverLocation>, JsonRejection>,
) -> Result<StatusCode, ApiError>
where
  S: RideStore + 'static,
  P: MatchProvider + 'static,
{
  let Json(location) = location?;
  dispatcher.driver_location(&location)?;
  Ok(StatusCode::ACCEPTED)
}
