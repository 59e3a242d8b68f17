//! Memoised resolutions and in-flight bookkeeping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::RwLock;

use super::RegistryVariant;
use crate::address::RegistryAddress;

pub(crate) type CacheKey = (u64, RegistryAddress);

/// Resolved variants per `(chain_id, address)`.
///
/// `Unknown` is stored only when every source gave a definitive negative
/// answer, so it is a cached "not found" rather than a cached failure.
#[derive(Default)]
pub(crate) struct VariantCache {
    entries: RwLock<HashMap<CacheKey, RegistryVariant>>,
    in_flight: Arc<Mutex<HashMap<CacheKey, usize>>>,
}

impl VariantCache {
    pub async fn get(&self, key: &CacheKey) -> Option<RegistryVariant> {
        self.entries.read().await.get(key).copied()
    }

    pub async fn insert(&self, key: CacheKey, variant: RegistryVariant) {
        self.entries.write().await.insert(key, variant);
    }

    pub async fn remove(&self, key: &CacheKey) -> Option<RegistryVariant> {
        self.entries.write().await.remove(key)
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub fn is_in_flight(&self, key: &CacheKey) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Marks `key` as being resolved until the returned guard drops.
    pub fn begin(&self, key: CacheKey) -> InFlightGuard {
        *self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.clone())
            .or_insert(0) += 1;

        InFlightGuard {
            key,
            in_flight: self.in_flight.clone(),
        }
    }
}

/// Clears the in-flight mark on drop, including when the resolving future
/// is cancelled.
pub(crate) struct InFlightGuard {
    key: CacheKey,
    in_flight: Arc<Mutex<HashMap<CacheKey, usize>>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(count) = in_flight.get_mut(&self.key) {
            *count -= 1;
            if *count == 0 {
                in_flight.remove(&self.key);
            }
        }
    }
}
