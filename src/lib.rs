// Library exports for testing and reusability

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use error::{AppError, Result};

use cache::GeocodeCache;
use services::route_synthesis::RouteSynthesizer;
use std::sync::Arc;
use std::time::Duration;

// App state for sharing across the application
pub struct AppState {
    pub synthesizer: RouteSynthesizer,
    pub geocode_cache: Arc<dyn GeocodeCache>,
    /// Wall-clock budget for one synthesis request
    pub synthesis_timeout: Duration,
}
