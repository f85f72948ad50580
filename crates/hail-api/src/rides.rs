//! Handlers for `/rides` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/rides` | Body: [`CreateBody`]; returns 202 + `{ride_id, status}` |
//! | `GET`  | `/rides` | `?rider_id` required; newest first |
//! | `GET`  | `/rides/:id` | Full ride record; 404 if unknown |
//! | `POST` | `/rides/:id/start` | `accepted` → `on_the_way` |
//! | `POST` | `/rides/:id/complete` | `on_the_way` → `completed` |
//! | `POST` | `/rides/:id/cancel` | Optional body: `{"reason":"..."}` |

use std::time::Duration;

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use hail_core::{matching::MatchProvider, ride::Ride, store::RideStore};
use hail_dispatch::{Dispatcher, RideRequest};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /rides`.
///
/// Missing strings default to empty so they fail ride validation with a
/// message naming the field.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub rider_id:           String,
  #[serde(default)]
  pub pickup_location:    String,
  #[serde(default)]
  pub destination:        String,
  /// Give up on matching after this many seconds.
  pub match_timeout_secs: Option<u64>,
}

impl From<CreateBody> for RideRequest {
  fn from(b: CreateBody) -> Self {
    RideRequest {
      rider_id:        b.rider_id,
      pickup_location: b.pickup_location,
      destination:     b.destination,
      match_timeout:   b.match_timeout_secs.map(Duration::from_secs),
    }
  }
}

/// `POST /rides`: returns 202 as soon as the ride is stored; the match
/// result is pushed over the rider's WebSocket channels.
pub async fn create<S, P>(
  State(dispatcher): State<Dispatcher<S, P>>,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RideStore + 'static,
  P: MatchProvider + 'static,
{
  let Json(body) = body?;
  if body.match_timeout_secs == Some(0) {
    return Err(ApiError::BadRequest(
      "match_timeout_secs must be positive".to_owned(),
    ));
  }
  let ack = dispatcher.request_ride(body.into()).await?;
  Ok((StatusCode::ACCEPTED, Json(ack)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub rider_id: String,
}

/// `GET /rides?rider_id=<id>`
pub async fn list<S, P>(
  State(dispatcher): State<Dispatcher<S, P>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Ride>>, ApiError>
where
  S: RideStore + 'static,
  P: MatchProvider + 'static,
{
  let Query(params) = params?;
  let rides = dispatcher.rides_for_rider(&params.rider_id).await?;
  Ok(Json(rides))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /rides/:id`
pub async fn get_one<S, P>(
  State(dispatcher): State<Dispatcher<S, P>>,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Ride>, ApiError>
where
  S: RideStore + 'static,
  P: MatchProvider + 'static,
{
  let Path(id) = id?;
  Ok(Json(dispatcher.get_ride(id).await?))
}

// ─── Transitions ──────────────────────────────────────────────────────────────

/// `POST /rides/:id/start`
pub async fn start<S, P>(
  State(dispatcher): State<Dispatcher<S, P>>,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Ride>, ApiError>
where
  S: RideStore + 'static,
  P: MatchProvider + 'static,
{
  let Path(id) = id?;
  Ok(Json(dispatcher.start_trip(id).await?))
}

/// `POST /rides/:id/complete`
pub async fn complete<S, P>(
  State(dispatcher): State<Dispatcher<S, P>>,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Ride>, ApiError>
where
  S: RideStore + 'static,
  P: MatchProvider + 'static,
{
  let Path(id) = id?;
  Ok(Json(dispatcher.complete_trip(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct CancelBody {
  pub reason: Option<String>,
}

/// `POST /rides/:id/cancel`. The body may be omitted entirely.
pub async fn cancel<S, P>(
  State(dispatcher): State<Dispatcher<S, P>>,
  id: Result<Path<Uuid>, PathRejection>,
  body: Result<Option<Json<CancelBody>>, JsonRejection>,
) -> Result<Json<Ride>, ApiError>
where
  S: RideStore + 'static,
  P: MatchProvider + 'static,
{
  let Path(id) = id?;
  let reason = body?.and_then(|Json(b)| b.reason);
  Ok(Json(dispatcher.cancel_ride(id, reason).await?))
}
