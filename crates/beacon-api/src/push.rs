//! `GET /ws`: the push channel.
//!
//! Each upgraded socket registers with the [`BroadcastHub`] and forwards
//! every published event as a text frame. The channel is receive-only:
//! client frames are read just to notice a close. The subscription is
//! dropped, and so unregistered, on every exit path.

use axum::{
  extract::{
    State,
    ws::{Message, WebSocket, WebSocketUpgrade},
  },
  response::Response,
};
use beacon_core::store::LocationStore;
use beacon_service::BroadcastHub;

use crate::AppState;

pub async fn upgrade<S>(State(state): State<AppState<S>>, ws: WebSocketUpgrade) -> Response
where
  S: LocationStore + 'static,
{
  let hub = state.service.hub().clone();
  ws.on_upgrade(move |socket| serve(socket, hub))
}

async fn serve(mut socket: WebSocket, hub: BroadcastHub) {
  let mut sub = hub.register();
  let id = sub.id();
  tracing::debug!(%id, connections = hub.len(), "push connection opened");

  loop {
    tokio::select! {
      event = sub.recv() => match event {
        Some(text) => {
          if let Err(e) = socket.send(Message::Text(text.to_string().into())).await {
            tracing::debug!(%id, error = %e, "push send failed");
            break;
          }
        }
        // Hub drained at shutdown.
        None => {
          let _ = socket.send(Message::Close(None)).await;
          break;
        }
      },
      incoming = socket.recv() => match incoming {
        Some(Ok(Message::Close(_))) | None => break,
        Some(Err(e)) => {
          tracing::debug!(%id, error = %e, "push socket error");
          break;
        }
        Some(Ok(_)) => {}
      },
    }
  }

  drop(sub);
  tracing::debug!(%id, "push connection closed");
}
