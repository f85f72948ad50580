//! WebSocket endpoint and registry statistics.
//!
//! Each socket gets its own channel. The client joins it under a rider id
//! (`{"type":"join","rider_id":"u1"}`) and from then on receives every ride
//! update published for that rider. See [`hail_realtime::protocol`] for the
//! full message set.

use axum::{
  Json,
  extract::{
    State,
    ws::{Message, WebSocket, WebSocketUpgrade},
  },
  response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use hail_core::{matching::MatchProvider, store::RideStore};
use hail_dispatch::Dispatcher;
use hail_realtime::{
  ChannelHandle, ClientCommand, RealtimeError, RegistryStats, ServerMessage, open_channel,
};
use tracing::{debug, info, warn};

// ─── Upgrade ──────────────────────────────────────────────────────────────────

/// `GET /ws`
pub async fn ws_handler<S, P>(
  ws: WebSocketUpgrade,
  State(dispatcher): State<Dispatcher<S, P>>,
) -> impl IntoResponse
where
  S: RideStore + 'static,
  P: MatchProvider + 'static,
{
  ws.on_upgrade(move |socket| handle_socket(socket, dispatcher))
}

async fn handle_socket<S, P>(socket: WebSocket, dispatcher: Dispatcher<S, P>)
where
  S: RideStore + 'static,
  P: MatchProvider + 'static,
{
  let (channel, mut outbound) = open_channel();
  let channel_id = channel.id();
  info!(channel_id = %channel_id, "websocket connected");

  let (mut ws_tx, mut ws_rx) = socket.split();

  let forward = tokio::spawn(async move {
    while let Some(message) = outbound.recv().await {
      let text = match message.to_json() {
        Ok(text) => text,
        Err(e) => {
          warn!(channel_id = %channel_id, error = %e, "cannot encode message");
          continue;
        }
      };
      if ws_tx.send(Message::Text(text.into())).await.is_err() {
        break;
      }
    }
    debug!(channel_id = %channel_id, "forward task ended");
  });

  while let Some(frame) = ws_rx.next().await {
    match frame {
      Ok(Message::Text(text)) => {
        let reply = match serde_json::from_str::<ClientCommand>(text.as_str()) {
          Ok(command) => handle_command(&dispatcher, &channel, command),
          Err(e) => {
            debug!(channel_id = %channel_id, error = %e, "malformed command");
            Some(ServerMessage::Error {
              message: format!("invalid message: {e}"),
            })
          }
        };
        match reply.map(|reply| channel.send(reply)) {
          Some(Err(RealtimeError::ChannelFull)) => {
            warn!(channel_id = %channel_id, "outbound queue full; reply dropped");
          }
          Some(Err(_)) => break,
          _ => {}
        }
      }
      Ok(Message::Close(_)) => break,
      Ok(Message::Binary(_)) => {
        debug!(channel_id = %channel_id, "binary frame ignored");
      }
      Ok(Message::Ping(_) | Message::Pong(_)) => {}
      Err(e) => {
        warn!(channel_id = %channel_id, error = %e, "websocket error");
        break;
      }
    }
  }

  forward.abort();
  let removed = dispatcher.registry().leave(channel_id);
  info!(channel_id = %channel_id, bindings = removed, "websocket disconnected");
}

// ─── Commands ─────────────────────────────────────────────────────────────────

/// Apply one client command on behalf of `channel`, returning the direct
/// reply, if any.
pub fn handle_command<S, P>(
  dispatcher: &Dispatcher<S, P>,
  channel: &ChannelHandle,
  command: ClientCommand,
) -> Option<ServerMessage>
where
  S: RideStore + 'static,
  P: MatchProvider + 'static,
{
  match command {
    ClientCommand::Join { rider_id } => {
      let rider_id = rider_id.trim().to_owned();
      if rider_id.is_empty() {
        return Some(ServerMessage::Error {
          message: "rider_id is required".to_owned(),
        });
      }
      dispatcher.registry().join(&rider_id, channel);
      Some(ServerMessage::Joined { rider_id })
    }
    ClientCommand::DriverLocation(location) => match dispatcher.driver_location(&location) {
      Ok(()) => None,
      Err(e) => Some(ServerMessage::Error { message: e.to_string() }),
    },
    ClientCommand::Ping => Some(ServerMessage::Pong),
  }
}

// ─── Stats ────────────────────────────────────────────────────────────────────

/// `GET /realtime/stats`
pub async fn stats<S, P>(State(dispatcher): State<Dispatcher<S, P>>) -> Json<RegistryStats>
where
  S: RideStore + 'static,
  P: MatchProvider + 'static,
{
  Json(dispatcher.registry().stats())
}
