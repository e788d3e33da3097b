//! Keeps a local copy of the current location in step with the server.
//!
//! Two inputs feed the [`SyncAdapter`]: a poll of `GET /api/location` on a
//! fixed interval, and raw push-channel messages. A push that carries a
//! record is applied at once; a push that does not triggers an immediate
//! poll. A record whose id is lower than the one held is stale and ignored,
//! so a slow poll can never roll back a fresher push.

use std::{future::Future, time::Duration};

use anyhow::Result;
use beacon_core::{event::PushEvent, location::LocationRecord};
use tokio::sync::{mpsc, watch};

use crate::client::ApiClient;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// What the adapter currently knows.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncState {
  /// Nothing fetched yet.
  Loading,
  /// The server has no location yet.
  Empty,
  Ready(LocationRecord),
}

impl SyncState {
  fn held_id(&self) -> Option<i64> {
    match self {
      Self::Ready(r) => Some(r.id),
      _ => None,
    }
  }
}

/// Where polls come from.
pub trait LocationSource: Send + Sync {
  fn fetch_current(&self) -> impl Future<Output = Result<Option<LocationRecord>>> + Send + '_;
}

impl LocationSource for ApiClient {
  async fn fetch_current(&self) -> Result<Option<LocationRecord>> { self.current_location().await }
}

/// How one push-channel message should be handled.
#[derive(Debug, PartialEq)]
pub enum PushAction {
  Apply(LocationRecord),
  Refetch,
  Ignore,
}

/// Classify a raw push-channel text frame.
pub fn classify_push(text: &str) -> PushAction {
  let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
    return PushAction::Ignore;
  };
  if value["type"] != "location_update" {
    return PushAction::Ignore;
  }
  match serde_json::from_value::<PushEvent>(value) {
    Ok(PushEvent::LocationUpdate(record)) => PushAction::Apply(record),
    Err(_) => PushAction::Refetch,
  }
}

pub struct SyncAdapter<C> {
  source:   C,
  interval: Duration,
  state:    watch::Sender<SyncState>,
}

impl<C: LocationSource> SyncAdapter<C> {
  pub fn new(source: C, interval: Duration) -> (Self, watch::Receiver<SyncState>) {
    let (state, rx) = watch::channel(SyncState::Loading);
    (Self { source, interval, state }, rx)
  }

  /// Adopt `record` unless it is older than the one held. Returns whether
  /// the state changed.
  pub fn apply(&self, record: LocationRecord) -> bool {
    self.state.send_if_modified(|state| match state.held_id() {
      Some(held) if record.id < held => false,
      Some(held) if record.id == held => {
        if *state == SyncState::Ready(record.clone()) {
          false
        } else {
          *state = SyncState::Ready(record);
          true
        }
      }
      _ => {
        *state = SyncState::Ready(record);
        true
      }
    })
  }

  /// Poll the source once. A `404` becomes [`SyncState::Empty`] unless a
  /// record is already held; records are never withdrawn.
  pub async fn refresh(&self) -> Result<()> {
    match self.source.fetch_current().await? {
      Some(record) => {
        self.apply(record);
      }
      None => {
        self.state.send_if_modified(|state| {
          if matches!(state, SyncState::Loading) {
            *state = SyncState::Empty;
            true
          } else {
            false
          }
        });
      }
    }
    Ok(())
  }

  pub async fn handle_push(&self, text: &str) {
    match classify_push(text) {
      PushAction::Apply(record) => {
        if self.apply(record) {
          tracing::debug!("applied pushed location");
        }
      }
      PushAction::Refetch => self.poll_logged().await,
      PushAction::Ignore => tracing::debug!("ignored push message"),
    }
  }

  async fn poll_logged(&self) {
    if let Err(e) = self.refresh().await {
      tracing::warn!(error = %e, "location poll failed");
    }
  }

  /// Poll on the interval and apply pushes until every state receiver is
  /// gone. When the push channel closes the adapter keeps polling.
  pub async fn run(self, mut pushes: mpsc::Receiver<String>) {
    let mut ticker = tokio::time::interval(self.interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut pushes_open = true;

    loop {
      tokio::select! {
        _ = self.state.closed() => break,
        _ = ticker.tick() => self.poll_logged().await,
        msg = pushes.recv(), if pushes_open => match msg {
          Some(text) => self.handle_push(&text).await,
          None => {
            tracing::debug!("push channel closed; polling only");
            pushes_open = false;
          }
        },
      }
    }
  }
}
