use crate::cache::{normalize_key, CacheStats, GeocodeCache};
use crate::models::GeocodedPoint;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// In-memory geocoding cache backed by moka. Entries never expire and there
/// is no capacity bound; only `clear()` removes them.
/// All methods take `&self`; moka handles synchronization.
pub struct MemoryGeocodeCache {
    points: Cache<String, Arc<GeocodedPoint>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryGeocodeCache {
    pub fn new() -> Self {
        MemoryGeocodeCache {
            points: Cache::builder().build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

impl Default for MemoryGeocodeCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GeocodeCache for MemoryGeocodeCache {
    async fn get(&self, name: &str) -> Option<GeocodedPoint> {
        let key = normalize_key(name);
        match self.points.get(&key).await {
            Some(point) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Geocode cache hit: {}", key);
                Some((*point).clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Geocode cache miss: {}", key);
                None
            }
        }
    }

    async fn insert(&self, name: &str, point: &GeocodedPoint) {
        let key = normalize_key(name);
        self.points.insert(key.clone(), Arc::new(point.clone())).await;
        tracing::debug!(source = %point.source, "Geocode cached: {}", key);
    }

    async fn clear(&self) {
        self.points.invalidate_all();
        self.points.run_pending_tasks().await;
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    async fn get_stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let hit_rate = if hits + misses > 0 {
            (hits as f64 / (hits + misses) as f64) * 100.0
        } else {
            0.0
        };
        self.points.run_pending_tasks().await;

        CacheStats {
            hits,
            misses,
            hit_rate,
            entries: self.points.entry_count(),
        }
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
