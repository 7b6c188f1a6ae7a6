//! Response cache for building and room listings.
//!
//! Entries are keyed by the raw query string and varied by the `Cookie`
//! header. Every write to an entity clears that entity's cache so a client
//! never reads back a stale list after its own write.
//!
//! Each list also carries an epoch that [`ListCache::invalidate`] bumps. A
//! reader captures the epoch before querying the store and files its result
//! under that epoch, so a list read before a write can never be served after
//! it: its entry lands under an epoch nobody looks up any more.

use std::{
  sync::atomic::{AtomicU64, Ordering},
  time::Duration,
};

use axum::{
  body::Bytes,
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use moka::future::Cache;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachedList {
  Buildings,
  Rooms,
}

struct Slot {
  entries: Cache<String, Bytes>,
  epoch:   AtomicU64,
}

/// Thread-safe async caches holding serialised list bodies.
pub struct ListCache {
  buildings: Slot,
  rooms:     Slot,
}

impl ListCache {
  pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);
  const MAX_ENTRIES: u64 = 1_000;

  pub fn new(ttl: Duration) -> Self {
    let slot = || Slot {
      entries: Cache::builder().max_capacity(Self::MAX_ENTRIES).time_to_live(ttl).build(),
      epoch:   AtomicU64::new(0),
    };
    Self { buildings: slot(), rooms: slot() }
  }

  fn slot(&self, list: CachedList) -> &Slot {
    match list {
      CachedList::Buildings => &self.buildings,
      CachedList::Rooms => &self.rooms,
    }
  }

  /// The current epoch of `list`. Capture it before reading the store.
  pub fn epoch(&self, list: CachedList) -> u64 { self.slot(list).epoch.load(Ordering::Acquire) }

  pub async fn get(&self, list: CachedList, epoch: u64, key: &str) -> Option<Bytes> {
    let hit = self.slot(list).entries.get(&entry_key(epoch, key)).await;
    if hit.is_some() {
      tracing::debug!(?list, "list cache hit");
    }
    hit
  }

  /// File `body` under the epoch it was read in.
  pub async fn insert(&self, list: CachedList, epoch: u64, key: &str, body: Bytes) {
    self.slot(list).entries.insert(entry_key(epoch, key), body).await;
  }

  pub fn invalidate(&self, list: CachedList) {
    let slot = self.slot(list);
    slot.epoch.fetch_add(1, Ordering::AcqRel);
    slot.entries.invalidate_all();
  }
}

impl Default for ListCache {
  fn default() -> Self { Self::new(Self::DEFAULT_TTL) }
}

fn entry_key(epoch: u64, key: &str) -> String { format!("{epoch}\n{key}") }

/// Cache key for a list request: query string, varied by cookie.
pub fn key(raw_query: Option<&str>, headers: &HeaderMap) -> String {
  let cookie = headers
    .get(header::COOKIE)
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default();
  format!("{}\n{}", raw_query.unwrap_or_default(), cookie)
}

pub fn encode<T: Serialize>(value: &T) -> Result<Bytes, serde_json::Error> {
  serde_json::to_vec(value).map(Bytes::from)
}

/// A 200 JSON response for a (possibly cached) list body.
pub fn list_response(body: Bytes) -> Response {
  (
    StatusCode::OK,
    [(header::CONTENT_TYPE, "application/json"), (header::VARY, "Cookie")],
    body,
  )
    .into_response()
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  const ROOMS: CachedList = CachedList::Rooms;

  #[test]
  fn key_varies_by_cookie_and_query() {
    let mut with_cookie = HeaderMap::new();
    with_cookie.insert(header::COOKIE, HeaderValue::from_static("sessionid=abc"));
    let plain = HeaderMap::new();

    assert_ne!(key(Some("capacity=2"), &plain), key(Some("capacity=2"), &with_cookie));
    assert_ne!(key(Some("capacity=2"), &plain), key(Some("capacity=3"), &plain));
    assert_eq!(key(None, &plain), key(Some(""), &plain));
  }

  #[tokio::test]
  async fn invalidate_clears_only_that_list() {
    let cache = ListCache::default();
    let rooms = cache.epoch(ROOMS);
    let buildings = cache.epoch(CachedList::Buildings);
    cache.insert(ROOMS, rooms, "k", Bytes::from_static(b"[]")).await;
    cache.insert(CachedList::Buildings, buildings, "k", Bytes::from_static(b"[]")).await;

    cache.invalidate(ROOMS);

    assert!(cache.get(ROOMS, cache.epoch(ROOMS), "k").await.is_none());
    assert_eq!(
      cache.get(CachedList::Buildings, cache.epoch(CachedList::Buildings), "k").await,
      Some(Bytes::from_static(b"[]"))
    );
  }

  #[tokio::test]
  async fn result_read_before_an_invalidation_is_never_served() {
    let cache = ListCache::default();
    let read_at = cache.epoch(ROOMS);

    // A write lands while the reader is still querying the store.
    cache.invalidate(ROOMS);
    cache.insert(ROOMS, read_at, "k", Bytes::from_static(b"[]")).await;

    assert!(cache.get(ROOMS, cache.epoch(ROOMS), "k").await.is_none());
  }

  #[tokio::test]
  async fn entries_expire_after_ttl() {
    let cache = ListCache::new(Duration::from_millis(50));
    cache.insert(ROOMS, 0, "k", Bytes::from_static(b"[]")).await;
    assert!(cache.get(ROOMS, 0, "k").await.is_some());

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(cache.get(ROOMS, 0, "k").await.is_none());
  }
}
