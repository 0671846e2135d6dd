mod memory;

pub use memory::MemoryGeocodeCache;

use crate::models::GeocodedPoint;
use async_trait::async_trait;
use serde::Serialize;

/// Name → geocoded point cache shared by every pipeline run in the process.
/// Writes are idempotent (same name, same point), so concurrent writers can
/// only cause redundant provider calls, never inconsistent entries.
#[async_trait]
pub trait GeocodeCache: Send + Sync {
    async fn get(&self, name: &str) -> Option<GeocodedPoint>;
    async fn insert(&self, name: &str, point: &GeocodedPoint);
    /// Drop every entry (tests and operational resets).
    async fn clear(&self);
    async fn get_stats(&self) -> CacheStats;
    fn backend_name(&self) -> &'static str;
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub entries: u64,
}

/// Cache key for a place name: trimmed, lowercased, inner whitespace collapsed.
pub fn normalize_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  Mont  Blanc, France "), "mont blanc, france");
        assert_eq!(normalize_key("PARIS"), normalize_key("paris"));
        assert_eq!(normalize_key(""), "");
    }
}
