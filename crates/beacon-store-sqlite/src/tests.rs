//! Integration tests for `SqliteStore` against an in-memory database.

use beacon_core::{
  Coordinate,
  device::NewDeviceSession,
  location::{NewLocation, SourceIdentity},
  store::LocationStore,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn bengaluru() -> NewLocation {
  NewLocation {
    latitude:   Coordinate::from_degrees(12.9716).unwrap(),
    longitude:  Coordinate::from_degrees(77.5946).unwrap(),
    address:    "X".into(),
    city:       "Bengaluru".into(),
    state:      "KA".into(),
    country:    "India".into(),
    updated_by: SourceIdentity::AdminWeb,
  }
}

fn mysuru() -> NewLocation {
  NewLocation {
    latitude:   Coordinate::from_degrees(12.2958).unwrap(),
    longitude:  Coordinate::from_degrees(76.6394).unwrap(),
    address:    "Palace Road".into(),
    city:       "Mysuru".into(),
    state:      "KA".into(),
    country:    "India".into(),
    updated_by: SourceIdentity::TelegramBot,
  }
}

async fn active_count(s: &SqliteStore) -> usize {
  s.history(usize::MAX)
    .await
    .unwrap()
    .iter()
    .filter(|r| r.is_active)
    .count()
}

// ─── Locations ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_store_has_no_active_location() {
  let s = store().await;
  assert!(s.get_active().await.unwrap().is_none());
  assert!(s.history(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn activate_then_get_active_round_trips() {
  let s = store().await;

  let written = s.activate(bengaluru()).await.unwrap();
  assert!(written.is_active);
  assert_eq!(written.updated_by, "admin_web");

  let active = s.get_active().await.unwrap().expect("active row");
  assert_eq!(active, written);
  assert_eq!(active.latitude.to_string(), "12.97160000");
  assert_eq!(active.longitude.to_string(), "77.59460000");
}

#[tokio::test]
async fn activate_deactivates_previous_row() {
  let s = store().await;

  let first = s.activate(bengaluru()).await.unwrap();
  let second = s.activate(mysuru()).await.unwrap();

  assert!(second.id > first.id);
  assert!(second.created_at > first.created_at);

  let active = s.get_active().await.unwrap().unwrap();
  assert_eq!(active.id, second.id);
  assert_eq!(active.updated_by, "telegram_bot");

  let history = s.history(10).await.unwrap();
  assert_eq!(history.len(), 2);
  assert_eq!(history[0].id, second.id);
  assert!(history[0].is_active);
  assert_eq!(history[1].id, first.id);
  assert!(!history[1].is_active);
  assert_eq!(history[1].city, "Bengaluru");
}

#[tokio::test]
async fn at_most_one_active_row_after_many_activations() {
  let s = store().await;
  for i in 0..20 {
    let next = if i % 2 == 0 { bengaluru() } else { mysuru() };
    s.activate(next).await.unwrap();
    assert_eq!(active_count(&s).await, 1);
  }
}

#[tokio::test]
async fn concurrent_activations_leave_exactly_one_active_row() {
  let s = store().await;

  let mut tasks = Vec::new();
  for i in 0..16 {
    let s = s.clone();
    tasks.push(tokio::spawn(async move {
      let next = if i % 2 == 0 { bengaluru() } else { mysuru() };
      s.activate(next).await.unwrap()
    }));
  }
  let mut ids = Vec::new();
  for t in tasks {
    ids.push(t.await.unwrap().id);
  }

  assert_eq!(active_count(&s).await, 1);
  let active = s.get_active().await.unwrap().unwrap();
  assert_eq!(active.id, *ids.iter().max().unwrap());
}

#[tokio::test]
async fn repeated_reads_are_identical() {
  let s = store().await;
  s.activate(bengaluru()).await.unwrap();

  let a = s.get_active().await.unwrap();
  let b = s.get_active().await.unwrap();
  assert_eq!(a, b);
}

#[tokio::test]
async fn history_respects_limit() {
  let s = store().await;
  for _ in 0..5 {
    s.activate(bengaluru()).await.unwrap();
  }
  let history = s.history(3).await.unwrap();
  assert_eq!(history.len(), 3);
  assert!(history.windows(2).all(|w| w[0].id > w[1].id));
}

#[tokio::test]
async fn extreme_coordinates_are_stored_exactly() {
  let s = store().await;
  let mut edge = bengaluru();
  edge.latitude = Coordinate::from_degrees(-90.0).unwrap();
  edge.longitude = Coordinate::from_degrees(180.0).unwrap();

  s.activate(edge).await.unwrap();
  let active = s.get_active().await.unwrap().unwrap();
  assert_eq!(active.latitude.to_string(), "-90.00000000");
  assert_eq!(active.longitude.to_string(), "180.00000000");
}

// ─── Devices ─────────────────────────────────────────────────────────────────

fn device(id: &str, sub: Option<&str>) -> NewDeviceSession {
  NewDeviceSession {
    device_id:         id.into(),
    push_subscription: sub.map(str::to_owned),
  }
}

#[tokio::test]
async fn register_device_creates_session() {
  let s = store().await;

  let session = s.register_device(device("phone-1", Some("sub-a"))).await.unwrap();
  assert_eq!(session.device_id, "phone-1");
  assert_eq!(session.push_subscription.as_deref(), Some("sub-a"));
  assert!(session.is_active);

  let fetched = s.get_device("phone-1").await.unwrap().unwrap();
  assert_eq!(fetched, session);
}

#[tokio::test]
async fn register_device_twice_upserts() {
  let s = store().await;

  let first = s.register_device(device("phone-1", Some("sub-a"))).await.unwrap();
  let second = s.register_device(device("phone-1", Some("sub-b"))).await.unwrap();

  assert_eq!(first.id, second.id);
  assert_eq!(second.push_subscription.as_deref(), Some("sub-b"));
  assert!(second.last_seen >= first.last_seen);

  let fetched = s.get_device("phone-1").await.unwrap().unwrap();
  assert_eq!(fetched.push_subscription.as_deref(), Some("sub-b"));
}

#[tokio::test]
async fn distinct_devices_get_distinct_rows() {
  let s = store().await;
  let a = s.register_device(device("phone-1", None)).await.unwrap();
  let b = s.register_device(device("phone-2", None)).await.unwrap();
  assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn get_device_missing_returns_none() {
  let s = store().await;
  assert!(s.get_device("nobody").await.unwrap().is_none());
}

// ─── Persistence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn reopening_a_file_store_keeps_the_active_row() {
  let path = std::env::temp_dir().join(format!(
    "beacon-store-test-{}-{}.db",
    std::process::id(),
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
  ));

  let written = {
    let s = SqliteStore::open(&path).await.unwrap();
    s.activate(bengaluru()).await.unwrap()
  };

  let s = SqliteStore::open(&path).await.unwrap();
  let active = s.get_active().await.unwrap().unwrap();
  assert_eq!(active, written);

  drop(s);
  let _ = std::fs::remove_file(&path);
}
