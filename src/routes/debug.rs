use crate::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// GET /debug/health - Report configured providers and cache state
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let synthesizer = &state.synthesizer;
    let stats = state.geocode_cache.get_stats().await;

    Json(json!({
        "status": "ok",
        "checks": {
            "generative_models": synthesizer.generator().models(),
            "geocoding_providers": synthesizer.geocoder().provider_ids(),
            "routing_providers": synthesizer.router().provider_ids(),
            "geocode_cache": {
                "backend": state.geocode_cache.backend_name(),
                "stats": stats,
            },
        },
        "synthesis_timeout_secs": state.synthesis_timeout.as_secs(),
    }))
}
