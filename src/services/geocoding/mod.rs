mod google_geocoding;
mod google_places;
mod nominatim;

pub use google_geocoding::GoogleGeocodingProvider;
pub use google_places::GooglePlacesProvider;
pub use nominatim::NominatimProvider;

use crate::cache::GeocodeCache;
use crate::error::{AppError, ProviderError, Result};
use crate::models::GeocodedPoint;
use crate::services::providers::GeocodeProvider;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Resolves place names through an ordered provider chain, first success
/// wins. Results are written to the shared cache before being returned.
#[derive(Clone)]
pub struct GeocodingResolver {
    providers: Vec<Arc<dyn GeocodeProvider>>,
    cache: Arc<dyn GeocodeCache>,
    timeout: Duration,
}

impl GeocodingResolver {
    pub fn new(
        providers: Vec<Arc<dyn GeocodeProvider>>,
        cache: Arc<dyn GeocodeCache>,
        timeout: Duration,
    ) -> Self {
        GeocodingResolver {
            providers,
            cache,
            timeout,
        }
    }

    pub fn provider_ids(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    pub fn cache(&self) -> &Arc<dyn GeocodeCache> {
        &self.cache
    }

    pub async fn resolve(&self, name: &str) -> Result<GeocodedPoint> {
        let query = name.trim();
        if query.is_empty() {
            return Err(AppError::GeocodingFailed("empty place name".to_string()));
        }

        if let Some(point) = self.cache.get(query).await {
            return Ok(point);
        }

        let mut skipped_scopes: HashSet<&'static str> = HashSet::new();
        let mut last_error: Option<ProviderError> = None;

        for provider in &self.providers {
            if let Some(scope) = provider.credential_scope() {
                if skipped_scopes.contains(scope) {
                    tracing::debug!(
                        provider = provider.id(),
                        scope = scope,
                        "Skipping {}: credentials for scope '{}' already failed",
                        provider.id(),
                        scope
                    );
                    continue;
                }
            }

            let outcome = match tokio::time::timeout(self.timeout, provider.search(query)).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout),
            };

            match outcome {
                Ok(hit) => {
                    let point = GeocodedPoint::from_hit(query, provider.id(), hit);
                    tracing::debug!(
                        provider = provider.id(),
                        lat = point.coordinates.lat,
                        lng = point.coordinates.lng,
                        "Geocoded '{}' via {} -> {}",
                        query,
                        provider.id(),
                        point.display_name
                    );
                    self.cache.insert(query, &point).await;
                    return Ok(point);
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.id(),
                        error = %e,
                        "Geocoding '{}' failed with {}: {}",
                        query,
                        provider.id(),
                        e
                    );
                    if e.is_credential_failure() {
                        if let Some(scope) = provider.credential_scope() {
                            skipped_scopes.insert(scope);
                        }
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(AppError::GeocodingFailed(match last_error {
            Some(e) => format!("'{}': all providers exhausted, last error: {}", query, e),
            None => format!("'{}': no geocoding providers configured", query),
        }))
    }
}
