use crate::constants::{DEFAULT_ORS_BASE_URL, DEFAULT_ORS_DAILY_LIMIT};
use crate::error::ProviderError;
use crate::models::{Coordinates, RoutingProfile};
use crate::services::providers::{DirectionsResponse, RoutingProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use time::{Date, OffsetDateTime};

/// OpenRouteService caps directions requests at 50 waypoints
const MAX_WAYPOINTS: usize = 50;

#[derive(Clone)]
pub struct OpenRouteServiceClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
    budget: Arc<DailyBudget>,
}

/// Calls made during the current UTC day.
struct DailyBudget {
    limit: u32,
    usage: Mutex<(Date, u32)>,
}

impl DailyBudget {
    fn new(limit: u32) -> Self {
        DailyBudget {
            limit,
            usage: Mutex::new((OffsetDateTime::now_utc().date(), 0)),
        }
    }

    fn used_today(&self) -> u32 {
        let today = OffsetDateTime::now_utc().date();
        match self.usage.lock() {
            Ok(usage) if usage.0 == today => usage.1,
            Ok(_) => 0,
            // A poisoned counter must not block routing
            Err(_) => 0,
        }
    }

    fn has_remaining(&self) -> bool {
        self.used_today() < self.limit
    }

    fn record_call(&self) {
        let today = OffsetDateTime::now_utc().date();
        if let Ok(mut usage) = self.usage.lock() {
            if usage.0 != today {
                *usage = (today, 0);
            }
            usage.1 = usage.1.saturating_add(1);
        }
    }
}

impl OpenRouteServiceClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        Self::with_config(
            api_key,
            DEFAULT_ORS_BASE_URL.to_string(),
            DEFAULT_ORS_DAILY_LIMIT,
            timeout,
        )
    }

    pub fn with_config(
        api_key: Option<String>,
        base_url: String,
        daily_limit: u32,
        timeout: Duration,
    ) -> Self {
        OpenRouteServiceClient {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            budget: Arc::new(DailyBudget::new(daily_limit)),
        }
    }

    pub fn calls_today(&self) -> u32 {
        self.budget.used_today()
    }

    fn ors_profile(profile: RoutingProfile) -> &'static str {
        match profile {
            RoutingProfile::RoadCycling => "cycling-road",
            RoutingProfile::FootHiking => "foot-hiking",
        }
    }
}

#[async_trait]
impl RoutingProvider for OpenRouteServiceClient {
    fn id(&self) -> &'static str {
        "openrouteservice"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some() && self.budget.has_remaining()
    }

    /// Get directions between waypoints
    /// Returns the route with full geometry, distance, and duration
    async fn directions(
        &self,
        waypoints: &[Coordinates],
        profile: RoutingProfile,
    ) -> Result<DirectionsResponse, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::Unconfigured)?;

        if waypoints.len() < 2 {
            return Err(ProviderError::InvalidRequest(
                "At least 2 waypoints required".to_string(),
            ));
        }
        if waypoints.len() > MAX_WAYPOINTS {
            return Err(ProviderError::InvalidRequest(format!(
                "Maximum {} waypoints allowed",
                MAX_WAYPOINTS
            )));
        }
        if !self.budget.has_remaining() {
            return Err(ProviderError::Quota(format!(
                "daily budget of {} calls exhausted",
                self.budget.limit
            )));
        }

        let coordinates: Vec<[f64; 2]> = waypoints.iter().map(|c| [c.lng, c.lat]).collect();
        let url = format!(
            "{}/v2/directions/{}/geojson",
            self.base_url,
            Self::ors_profile(profile)
        );

        tracing::debug!(
            waypoints = waypoints.len(),
            profile = %profile,
            "ORS request: {} waypoints, profile {}",
            waypoints.len(), profile
        );

        self.budget.record_call();
        let response = self
            .client
            .post(&url)
            .header("Authorization", api_key)
            .json(&json!({ "coordinates": coordinates, "instructions": false }))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(
                status = %status,
                waypoints = waypoints.len(),
                "ORS API HTTP error {}: {}",
                status, error_text
            );
            return Err(ProviderError::from_status(status, &error_text));
        }

        let directions: OrsFeatureCollection = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        directions.into_directions()
    }
}

// ORS API response types

#[derive(Debug, Deserialize)]
struct OrsFeatureCollection {
    #[serde(default)]
    features: Vec<OrsFeature>,
}

#[derive(Debug, Deserialize)]
struct OrsFeature {
    geometry: OrsGeometry,
    properties: OrsProperties,
}

#[derive(Debug, Deserialize)]
struct OrsGeometry {
    coordinates: Vec<[f64; 2]>, // [lng, lat] pairs
}

#[derive(Debug, Deserialize)]
struct OrsProperties {
    summary: OrsSummary,
}

#[derive(Debug, Deserialize)]
struct OrsSummary {
    #[serde(default)]
    distance: f64, // meters
    #[serde(default)]
    duration: f64, // seconds
}

impl OrsFeatureCollection {
    fn into_directions(self) -> Result<DirectionsResponse, ProviderError> {
        let route = self
            .features
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NotFound("No routes found".to_string()))?;

        tracing::debug!(
            distance_km = %format!("{:.2}", route.properties.summary.distance / 1000.0),
            duration_min = %format!("{:.0}", route.properties.summary.duration / 60.0),
            path_points = route.geometry.coordinates.len(),
            "ORS response: {:.2}km, {:.0}min, {} path points",
            route.properties.summary.distance / 1000.0,
            route.properties.summary.duration / 60.0,
            route.geometry.coordinates.len()
        );

        Ok(DirectionsResponse {
            distance_meters: route.properties.summary.distance,
            duration_seconds: route.properties.summary.duration,
            geometry: route.geometry.coordinates,
        })
    }
}
