pub mod debug;
pub mod generate_route;

use axum::{routing::{get, post}, Router};
use std::sync::Arc;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/routes/generate", post(generate_route::generate_route))
        .route("/debug/health", get(debug::health_check))
        .with_state(state)
}
