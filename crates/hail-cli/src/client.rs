//! Async HTTP client wrapping the hail JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use hail_core::ride::Ride;
use hail_dispatch::RideAck;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

/// Async HTTP client for the hail REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
}

/// Error body returned by the server on any non-2xx response.
#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self {
      client,
      base_url: base_url.into(),
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
  }

  /// Turn a non-2xx response into an error carrying the server's message.
  async fn check(resp: Response, what: &str) -> Result<Response> {
    let status = resp.status();
    debug!(%status, what, "response");
    if status.is_success() {
      return Ok(resp);
    }
    let message = match resp.json::<ErrorBody>().await {
      Ok(body) => body.error,
      Err(_) => status.to_string(),
    };
    Err(anyhow!("{what} → {status}: {message}"))
  }

  // ── Rides ─────────────────────────────────────────────────────────────────

  /// `POST /api/rides`
  pub async fn request_ride(
    &self,
    rider_id: &str,
    pickup_location: &str,
    destination: &str,
  ) -> Result<RideAck> {
    let resp = self
      .client
      .post(self.url("/rides"))
      .json(&json!({
        "rider_id": rider_id,
        "pickup_location": pickup_location,
        "destination": destination,
      }))
      .send()
      .await
      .context("POST /rides failed")?;
    Self::check(resp, "POST /rides")
      .await?
      .json()
      .await
      .context("deserialising ride ack")
  }

  /// `GET /api/rides/<id>`
  pub async fn get_ride(&self, ride_id: Uuid) -> Result<Ride> {
    let resp = self
      .client
      .get(self.url(&format!("/rides/{ride_id}")))
      .send()
      .await
      .context("GET /rides/<id> failed")?;
    Self::check(resp, "GET /rides/<id>")
      .await?
      .json()
      .await
      .context("deserialising ride")
  }

  /// `GET /api/rides?rider_id=<id>`
  pub async fn list_rides(&self, rider_id: &str) -> Result<Vec<Ride>> {
    let resp = self
      .client
      .get(self.url("/rides"))
      .query(&[("rider_id", rider_id)])
      .send()
      .await
      .context("GET /rides failed")?;
    Self::check(resp, "GET /rides")
      .await?
      .json()
      .await
      .context("deserialising rides")
  }

  /// `POST /api/rides/<id>/cancel`
  pub async fn cancel_ride(&self, ride_id: Uuid, reason: Option<&str>) -> Result<Ride> {
    let resp = self
      .client
      .post(self.url(&format!("/rides/{ride_id}/cancel")))
      .json(&json!({ "reason": reason }))
      .send()
      .await
      .context("POST /rides/<id>/cancel failed")?;
    Self::check(resp, "POST /rides/<id>/cancel")
      .await?
      .json()
      .await
      .context("deserialising ride")
  }
}
