//! Chord registry: chord name → reference fingering
//!
//! The registry is an explicit object owned by the practice session and
//! shared by reference; it is not a process-wide global. The first lookup
//! populates the cache from `GET /api/chords`; later lookups for cached
//! names never touch the network. Names missing from the bulk table are
//! tried once more against `GET /api/chords/{name}` and cached on success.
//!
//! Failures are returned, never retried: the caller decides whether to ask
//! again on its next cycle.

use crate::client::ApiClient;
use fretcoach_common::api::types::ChordTable;
use fretcoach_common::{Error, PositionSet, Result};
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct RegistryCache {
    /// Bulk table fetched at least once
    loaded: bool,
    chords: BTreeMap<String, PositionSet>,
}

impl RegistryCache {
    fn populate(&mut self, table: ChordTable) {
        self.chords.clear();
        for (name, shape) in table {
            match shape.to_position_set() {
                Ok(positions) => {
                    self.chords.insert(name, positions);
                }
                Err(e) => warn!(chord = %name, "Skipping malformed chord entry: {}", e),
            }
        }
        self.loaded = true;
    }
}

/// Caching chord lookup backed by the sensor server
#[derive(Debug)]
pub struct ChordRegistry {
    client: ApiClient,
    // Held across the fetch so concurrent first lookups share one request
    cache: Mutex<RegistryCache>,
}

impl ChordRegistry {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            cache: Mutex::new(RegistryCache::default()),
        }
    }

    /// Reference fingering for `name` (exact, case-sensitive)
    ///
    /// # Errors
    /// - [`Error::NotFound`] when the server has no mapping for the name
    /// - [`Error::UpstreamUnavailable`] on transport or status failures
    pub async fn resolve(&self, name: &str) -> Result<PositionSet> {
        let mut cache = self.cache.lock().await;

        if !cache.loaded {
            let table = self.client.fetch_chords().await?;
            info!("Chord registry loaded: {} chords", table.len());
            cache.populate(table);
        }

        if let Some(positions) = cache.chords.get(name) {
            debug!(chord = %name, "Chord resolved from cache");
            return Ok(positions.clone());
        }

        let shape = match self.client.fetch_chord(name).await {
            Ok(shape) => shape,
            Err(Error::NotFound(msg)) => {
                debug!(chord = %name, "Chord not in registry");
                return Err(Error::NotFound(msg));
            }
            Err(e) => return Err(e),
        };
        let positions = shape.to_position_set()?;
        debug!(chord = %name, "Chord resolved by direct lookup");
        cache.chords.insert(name.to_string(), positions.clone());
        Ok(positions)
    }

    /// Sorted chord names, loading the table if needed
    pub async fn names(&self) -> Result<Vec<String>> {
        let mut cache = self.cache.lock().await;
        if !cache.loaded {
            let table = self.client.fetch_chords().await?;
            cache.populate(table);
        }
        Ok(cache.chords.keys().cloned().collect())
    }

    /// Re-fetch the bulk table, replacing the cache
    ///
    /// On failure the previous cache is kept.
    pub async fn refresh(&self) -> Result<usize> {
        let table = self.client.fetch_chords().await?;
        let mut cache = self.cache.lock().await;
        cache.populate(table);
        info!("Chord registry refreshed: {} chords", cache.chords.len());
        Ok(cache.chords.len())
    }

    /// Cached fingering without any network access
    pub async fn cached(&self, name: &str) -> Option<PositionSet> {
        self.cache.lock().await.chords.get(name).cloned()
    }

    /// Drop everything; the next lookup fetches again
    pub async fn clear(&self) {
        let mut cache = self.cache.lock().await;
        cache.chords.clear();
        cache.loaded = false;
    }
}
