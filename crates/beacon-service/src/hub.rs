//! The live-connection registry and best-effort fan-out.
//!
//! Each push connection owns a [`Subscription`]: a bounded channel receiver
//! whose sender sits in the hub. Publishing serialises the event once and
//! `try_send`s the shared text to every sender. A full channel drops the
//! message for that connection; a closed one is skipped. Nothing is retried
//! and nothing is remembered for connections that join later.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use beacon_core::{event::PushEvent, location::LocationRecord};
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

/// Default per-connection buffer, in messages.
pub const DEFAULT_BUFFER: usize = 16;

pub type ConnectionId = Uuid;

type Senders = HashMap<ConnectionId, mpsc::Sender<Arc<str>>>;

struct Inner {
  connections: Mutex<Senders>,
  buffer:      usize,
}

impl Inner {
  fn lock(&self) -> MutexGuard<'_, Senders> {
    self.connections.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// Registry of live push connections.
///
/// Cheap to clone; clones share one registry. Safe to register, unregister
/// and publish from any task concurrently. The lock is never held across an
/// await.
#[derive(Clone)]
pub struct BroadcastHub {
  inner: Arc<Inner>,
}

/// Outcome of one [`BroadcastHub::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
  /// Connections the message was queued for.
  pub delivered: usize,
  /// Connections whose receiver was already closed.
  pub skipped:   usize,
  /// Connections whose buffer was full; they miss this event.
  pub dropped:   usize,
}

impl Default for BroadcastHub {
  fn default() -> Self { Self::new(DEFAULT_BUFFER) }
}

impl BroadcastHub {
  /// An empty hub whose connections each buffer up to `buffer` messages.
  pub fn new(buffer: usize) -> Self {
    Self {
      inner: Arc::new(Inner {
        connections: Mutex::new(HashMap::new()),
        buffer:      buffer.max(1),
      }),
    }
  }

  /// Add a new connection to the live set.
  ///
  /// The connection stays registered until the returned [`Subscription`] is
  /// dropped, [`unregister`](Self::unregister) is called with its id, or the
  /// hub is drained.
  pub fn register(&self) -> Subscription {
    let (tx, rx) = mpsc::channel(self.inner.buffer);
    let id = Uuid::new_v4();
    self.inner.lock().insert(id, tx);
    tracing::debug!(%id, "push connection registered");
    Subscription { id, rx, hub: Arc::downgrade(&self.inner) }
  }

  /// Remove a connection. Returns `false` if it was not registered.
  pub fn unregister(&self, id: ConnectionId) -> bool {
    let removed = self.inner.lock().remove(&id).is_some();
    if removed {
      tracing::debug!(%id, "push connection unregistered");
    }
    removed
  }

  /// Fan a `location_update` for `record` out to every open connection.
  pub fn publish(&self, record: &LocationRecord) -> serde_json::Result<PublishReport> {
    self.publish_event(&PushEvent::LocationUpdate(record.clone()))
  }

  /// Serialise `event` once and offer it to every open connection.
  pub fn publish_event(&self, event: &PushEvent) -> serde_json::Result<PublishReport> {
    let text: Arc<str> = serde_json::to_string(event)?.into();
    let mut report = PublishReport::default();

    for tx in self.inner.lock().values() {
      if tx.is_closed() {
        report.skipped += 1;
        continue;
      }
      match tx.try_send(Arc::clone(&text)) {
        Ok(()) => report.delivered += 1,
        Err(TrySendError::Full(_)) => report.dropped += 1,
        Err(TrySendError::Closed(_)) => report.skipped += 1,
      }
    }

    tracing::debug!(
      delivered = report.delivered,
      skipped = report.skipped,
      dropped = report.dropped,
      "push fan-out complete"
    );
    Ok(report)
  }

  pub fn contains(&self, id: ConnectionId) -> bool { self.inner.lock().contains_key(&id) }

  /// Number of registered connections, open or not.
  pub fn len(&self) -> usize { self.inner.lock().len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// Drop every registered sender. Each subscription then sees end-of-stream
  /// once its buffer is drained. Returns how many were removed.
  pub fn close_all(&self) -> usize {
    let drained = std::mem::take(&mut *self.inner.lock());
    tracing::info!(connections = drained.len(), "push hub drained");
    drained.len()
  }
}

/// One connection's membership in a [`BroadcastHub`].
///
/// Dropping it unregisters the connection.
pub struct Subscription {
  id:  ConnectionId,
  rx:  mpsc::Receiver<Arc<str>>,
  hub: Weak<Inner>,
}

impl Subscription {
  pub fn id(&self) -> ConnectionId { self.id }

  /// Wait for the next serialised event. `None` once the hub has dropped this
  /// connection and the buffer is empty.
  pub async fn recv(&mut self) -> Option<Arc<str>> { self.rx.recv().await }

  /// Take a buffered event without waiting.
  pub fn try_recv(&mut self) -> Option<Arc<str>> { self.rx.try_recv().ok() }

  /// Mark the channel as no longer open. The connection stays in the live
  /// set until dropped, but publishes skip it.
  pub fn close(&mut self) { self.rx.close(); }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    if let Some(inner) = self.hub.upgrade() {
      inner.lock().remove(&self.id);
    }
  }
}

impl std::fmt::Debug for Subscription {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription").field("id", &self.id).finish_non_exhaustive()
  }
}
