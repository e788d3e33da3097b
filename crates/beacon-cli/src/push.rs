//! Feeds push-channel frames from the server's `/ws` endpoint into the
//! [`SyncAdapter`](crate::sync::SyncAdapter).
//!
//! The socket is best effort. When it cannot connect or drops, the adapter
//! keeps polling and the forwarder retries after a pause.

use std::time::Duration;

use futures::StreamExt as _;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// The push endpoint for a gateway base URL: `http` becomes `ws` and
/// `https` becomes `wss`.
pub fn push_url(base_url: &str) -> String {
  let base = base_url.trim_end_matches('/');
  let base = match base.split_once("://") {
    Some(("https", rest)) => format!("wss://{rest}"),
    Some(("http", rest)) => format!("ws://{rest}"),
    Some(_) => base.to_owned(),
    None => format!("ws://{base}"),
  };
  format!("{base}/ws")
}

/// Forward every text frame from `url` into `tx` until the receiving side
/// of `tx` is dropped.
pub async fn forward_pushes(url: String, tx: mpsc::Sender<String>, retry: Duration) {
  loop {
    match connect_async(url.as_str()).await {
      Ok((mut ws, _)) => {
        tracing::info!(%url, "push channel connected");
        loop {
          let frame = tokio::select! {
            _ = tx.closed() => return,
            frame = ws.next() => frame,
          };
          match frame {
            Some(Ok(Message::Text(text))) => {
              if tx.send(text.as_str().to_owned()).await.is_err() {
                return;
              }
            }
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
              tracing::warn!(error = %e, "push channel error");
              break;
            }
          }
        }
        tracing::warn!("push channel closed; polling until it reconnects");
      }
      Err(e) => tracing::warn!(%url, error = %e, "push channel unavailable"),
    }

    tokio::select! {
      _ = tx.closed() => return,
      _ = tokio::time::sleep(retry) => {}
    }
  }
}
