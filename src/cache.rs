//! Keyed TTL cache with in-flight load de-duplication.
//!
//! Concurrent `fetch_or_load` calls for one key share a single pending
//! load. The pending entry is dropped as soon as the load settles and only
//! successful values are stored.

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use log::debug;
use tokio::time::Instant;

pub const DEFAULT_TTL: Duration = Duration::from_secs(120);

/// Number of decimal places kept from coordinates in cache keys (~11 m).
const KEY_SCALE: f64 = 10_000.0;

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

type Pending<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

pub struct TtlCache<V, E = Infallible> {
    ttl: Duration,
    entries: Arc<Mutex<HashMap<String, CacheEntry<V>>>>,
    in_flight: Arc<Mutex<HashMap<String, Pending<V, E>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A poisoned map only means another task panicked mid-insert.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<V, E> TtlCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(Mutex::new(HashMap::new())),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let entries = lock(&self.entries);
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub fn put(&self, key: impl Into<String>, value: V) {
        store(&self.entries, self.ttl, key.into(), value);
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn in_flight(&self) -> usize {
        lock(&self.in_flight).len()
    }

    /// Return the cached value for `key`, or run `loader` once no matter how
    /// many callers ask for the same key while it is pending.
    pub async fn fetch_or_load<F, Fut>(&self, key: &str, loader: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        if let Some(value) = self.get(key) {
            debug!("Cache hit for {}", key);
            return Ok(value);
        }

        let pending = {
            let mut in_flight = lock(&self.in_flight);
            // A load may have settled since the check above.
            if let Some(value) = self.get(key) {
                return Ok(value);
            }
            if let Some(pending) = in_flight.get(key) {
                debug!("Joining in-flight load for {}", key);
                pending.clone()
            } else {
                debug!("Cache miss for {}, loading", key);
                let load = loader();
                let entries = Arc::clone(&self.entries);
                let ttl = self.ttl;
                let registry = Arc::clone(&self.in_flight);
                let owned_key = key.to_string();
                let pending = async move {
                    let result = load.await;
                    if let Ok(value) = &result {
                        store(&entries, ttl, owned_key.clone(), value.clone());
                    }
                    lock(&registry).remove(&owned_key);
                    result
                }
                .boxed()
                .shared();
                in_flight.insert(key.to_string(), pending.clone());
                pending
            }
        };

        pending.await
    }
}

/// Insert `value` and drop every entry that has outlived `ttl`.
fn store<V>(entries: &Mutex<HashMap<String, CacheEntry<V>>>, ttl: Duration, key: String, value: V) {
    let mut entries = lock(entries);
    entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
    entries.insert(
        key,
        CacheEntry {
            value,
            stored_at: Instant::now(),
        },
    );
}

/// Canonical cache key for a nearby search. Coordinates are rounded to four
/// decimals so near-identical queries share a slot.
pub fn search_key(latitude: f64, longitude: f64, radius: u32, cap: usize) -> String {
    let lat = (latitude * KEY_SCALE).round() as i64;
    let lng = (longitude * KEY_SCALE).round() as i64;
    let radius = crate::models::clamp_radius(radius);
    format!("nearby:{lat}:{lng}:{radius}:{cap}")
}
