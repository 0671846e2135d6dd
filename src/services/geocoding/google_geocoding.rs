use crate::error::ProviderError;
use crate::models::{Coordinates, GeocodeHit};
use crate::services::providers::GeocodeProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const GEOCODING_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Structured address geocoding.
#[derive(Clone)]
pub struct GoogleGeocodingProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl GoogleGeocodingProvider {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        GoogleGeocodingProvider {
            client: Client::new(),
            api_key,
            base_url: GEOCODING_URL.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl GeocodeProvider for GoogleGeocodingProvider {
    fn id(&self) -> &'static str {
        "google_geocoding"
    }

    fn credential_scope(&self) -> Option<&'static str> {
        Some("google")
    }

    async fn search(&self, query: &str) -> Result<GeocodeHit, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::Unconfigured)?;

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("address", query), ("key", api_key)])
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
        parse_geocoding_response(query, raw)
    }
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    geometry: ResultGeometry,
    #[serde(default)]
    formatted_address: String,
}

#[derive(Debug, Deserialize)]
struct ResultGeometry {
    location: LatLng,
    #[serde(default)]
    location_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// The API answers 200 for most failures and reports them in `status`.
fn parse_geocoding_response(
    query: &str,
    raw: serde_json::Value,
) -> Result<GeocodeHit, ProviderError> {
    let parsed: GeocodingResponse =
        serde_json::from_value(raw.clone()).map_err(|e| ProviderError::Parse(e.to_string()))?;
    let detail = parsed
        .error_message
        .clone()
        .unwrap_or_else(|| parsed.status.clone());

    match parsed.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Err(ProviderError::NotFound(query.to_string())),
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => return Err(ProviderError::Quota(detail)),
        "REQUEST_DENIED" => return Err(ProviderError::Auth(detail)),
        "INVALID_REQUEST" => return Err(ProviderError::InvalidRequest(detail)),
        _ => return Err(ProviderError::Http(detail)),
    }

    let result = parsed
        .results
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::NotFound(query.to_string()))?;
    let coordinates = Coordinates::new(result.geometry.location.lat, result.geometry.location.lng)
        .map_err(ProviderError::Parse)?;

    Ok(GeocodeHit {
        coordinates,
        display_name: if result.formatted_address.is_empty() {
            query.to_string()
        } else {
            result.formatted_address
        },
        place_type: result
            .geometry
            .location_type
            .unwrap_or_else(|| "APPROXIMATE".to_string()),
        raw,
    })
}
