use crate::error::ProviderError;
use crate::models::{Coordinates, GeocodeHit};
use crate::services::providers::GeocodeProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const PLACES_TEXT_SEARCH_URL: &str = "https://places.googleapis.com/v1/places:searchText";
const FIELD_MASK: &str = "places.displayName,places.formattedAddress,places.location,places.types";

/// Point-of-interest text search. Best for landmarks, passes and huts that
/// address geocoders resolve poorly.
#[derive(Clone)]
pub struct GooglePlacesProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl GooglePlacesProvider {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        GooglePlacesProvider {
            client: Client::new(),
            api_key,
            base_url: PLACES_TEXT_SEARCH_URL.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl GeocodeProvider for GooglePlacesProvider {
    fn id(&self) -> &'static str {
        "google_places"
    }

    fn credential_scope(&self) -> Option<&'static str> {
        Some("google")
    }

    async fn search(&self, query: &str) -> Result<GeocodeHit, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::Unconfigured)?;

        let response = self
            .client
            .post(&self.base_url)
            .header("X-Goog-Api-Key", api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&json!({ "textQuery": query, "maxResultCount": 1 }))
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
        parse_places_response(query, raw)
    }
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    #[serde(default)]
    places: Vec<Place>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Place {
    location: PlaceLocation,
    #[serde(default)]
    display_name: Option<LocalizedText>,
    #[serde(default)]
    formatted_address: Option<String>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceLocation {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct LocalizedText {
    text: String,
}

fn parse_places_response(query: &str, raw: serde_json::Value) -> Result<GeocodeHit, ProviderError> {
    let parsed: PlacesResponse =
        serde_json::from_value(raw.clone()).map_err(|e| ProviderError::Parse(e.to_string()))?;
    let place = parsed
        .places
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::NotFound(query.to_string()))?;

    let coordinates = Coordinates::new(place.location.latitude, place.location.longitude)
        .map_err(ProviderError::Parse)?;
    let display_name = match (place.display_name, place.formatted_address) {
        (Some(name), Some(address)) => format!("{}, {}", name.text, address),
        (Some(name), None) => name.text,
        (None, Some(address)) => address,
        (None, None) => query.to_string(),
    };

    Ok(GeocodeHit {
        coordinates,
        display_name,
        place_type: place.types.into_iter().next().unwrap_or_else(|| "place".to_string()),
        raw,
    })
}
