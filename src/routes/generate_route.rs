use crate::error::{AppError, Result};
use crate::models::{RouteRequest, SynthesizedRoute};
use crate::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;

/// POST /routes/generate
/// Synthesize a route for a country, trip type and optional city
pub async fn generate_route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<SynthesizedRoute>> {
    request.validate().map_err(AppError::InvalidRequest)?;

    tracing::info!(
        country = request.country(),
        city = request.city().unwrap_or(""),
        trip_type = %request.trip_type,
        "Route request: {} trip in {}",
        request.trip_type,
        request.place()
    );

    let route = state
        .synthesizer
        .synthesize_with_timeout(&request, state.synthesis_timeout)
        .await?;

    Ok(Json(route))
}
