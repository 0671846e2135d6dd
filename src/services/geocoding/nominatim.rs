use crate::constants::{DEFAULT_NOMINATIM_BASE_URL, DEFAULT_NOMINATIM_USER_AGENT};
use crate::error::ProviderError;
use crate::models::{Coordinates, GeocodeHit};
use crate::services::providers::GeocodeProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// OpenStreetMap's community geocoder. Needs no key, so it closes every chain.
#[derive(Clone)]
pub struct NominatimProvider {
    client: Client,
    base_url: String,
    user_agent: String,
    timeout: Duration,
}

impl NominatimProvider {
    pub fn new(timeout: Duration) -> Self {
        Self::with_config(
            DEFAULT_NOMINATIM_BASE_URL.to_string(),
            DEFAULT_NOMINATIM_USER_AGENT.to_string(),
            timeout,
        )
    }

    pub fn with_config(base_url: String, user_agent: String, timeout: Duration) -> Self {
        NominatimProvider {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent,
            timeout,
        }
    }
}

#[async_trait]
impl GeocodeProvider for NominatimProvider {
    fn id(&self) -> &'static str {
        "nominatim"
    }

    async fn search(&self, query: &str) -> Result<GeocodeHit, ProviderError> {
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            // Usage policy requires an identifying User-Agent
            .header("User-Agent", &self.user_agent)
            .query(&[("q", query), ("format", "jsonv2"), ("limit", "1")])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, &error_text));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        parse_search_response(query, raw)
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
    #[serde(default, rename = "type")]
    place_type: Option<String>,
    #[serde(default)]
    addresstype: Option<String>,
}

fn parse_search_response(query: &str, raw: serde_json::Value) -> Result<GeocodeHit, ProviderError> {
    let places: Vec<NominatimPlace> =
        serde_json::from_value(raw.clone()).map_err(|e| ProviderError::Parse(e.to_string()))?;
    let place = places
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::NotFound(query.to_string()))?;

    let lat: f64 = place
        .lat
        .parse()
        .map_err(|_| ProviderError::Parse(format!("Invalid latitude '{}'", place.lat)))?;
    let lon: f64 = place
        .lon
        .parse()
        .map_err(|_| ProviderError::Parse(format!("Invalid longitude '{}'", place.lon)))?;
    let coordinates = Coordinates::new(lat, lon).map_err(ProviderError::Parse)?;

    Ok(GeocodeHit {
        coordinates,
        display_name: if place.display_name.is_empty() {
            query.to_string()
        } else {
            place.display_name
        },
        place_type: place
            .addresstype
            .or(place.place_type)
            .unwrap_or_else(|| "unknown".to_string()),
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_string_coordinates() {
        let raw = json!([{
            "lat": "43.7009358",
            "lon": "7.2683912",
            "display_name": "Nice, Alpes-Maritimes, France",
            "type": "administrative",
            "addresstype": "city"
        }]);
        let hit = parse_search_response("Nice, France", raw).unwrap();
        assert!((hit.coordinates.lat - 43.7009).abs() < 1e-3);
        assert_eq!(hit.place_type, "city");
        assert_eq!(hit.display_name, "Nice, Alpes-Maritimes, France");
    }

    #[test]
    fn test_empty_array_is_not_found() {
        let result = parse_search_response("Atlantis", json!([]));
        assert!(matches!(result, Err(ProviderError::NotFound(_))));
    }

    #[test]
    fn test_garbage_coordinates_is_parse_error() {
        let raw = json!([{"lat": "north", "lon": "7.0"}]);
        assert!(matches!(
            parse_search_response("x", raw),
            Err(ProviderError::Parse(_))
        ));
    }

    #[test]
    fn test_has_no_credential_scope() {
        let provider = NominatimProvider::new(Duration::from_secs(1));
        assert_eq!(provider.credential_scope(), None);
        assert_eq!(provider.id(), "nominatim");
    }
}
