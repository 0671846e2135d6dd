use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tripforge::cache::{GeocodeCache, MemoryGeocodeCache};
use tripforge::config::Config;
use tripforge::constants::IMAGE_LOOKUP_TIMEOUT_SECS;
use tripforge::services::gemini::GeminiClient;
use tripforge::services::geocoding::{
    GeocodingResolver, GoogleGeocodingProvider, GooglePlacesProvider, NominatimProvider,
};
use tripforge::services::openrouteservice::OpenRouteServiceClient;
use tripforge::services::providers::{GeocodeProvider, RoutingProvider};
use tripforge::services::route_synthesis::{RouteSynthesizer, RoutingResolver, SkeletonGenerator};
use tripforge::services::unsplash::UnsplashClient;
use tripforge::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tripforge=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| format!("Failed to load configuration: {}", e))?;
    let synthesis = config.synthesis.clone();

    tracing::info!("Starting TripForge API server");
    tracing::info!(
        models = ?synthesis.generative_models,
        "Configuration loaded: generative models {:?}",
        synthesis.generative_models
    );

    if config.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not set: every generation request will fail with 503");
    }

    // Geocoding chain: places search, address geocoding, then the keyless fallback
    let geocode_cache: Arc<dyn GeocodeCache> = Arc::new(MemoryGeocodeCache::new());
    let geocode_timeout = synthesis.geocode_timeout();
    let mut geocode_providers: Vec<Arc<dyn GeocodeProvider>> = Vec::new();
    if config.google_maps_api_key.is_some() {
        geocode_providers.push(Arc::new(GooglePlacesProvider::new(
            config.google_maps_api_key.clone(),
            geocode_timeout,
        )));
        geocode_providers.push(Arc::new(GoogleGeocodingProvider::new(
            config.google_maps_api_key.clone(),
            geocode_timeout,
        )));
    } else {
        tracing::info!("GOOGLE_MAPS_API_KEY not set, geocoding with Nominatim only");
    }
    geocode_providers.push(Arc::new(NominatimProvider::with_config(
        config.nominatim_base_url.clone(),
        config.nominatim_user_agent.clone(),
        geocode_timeout,
    )));
    let geocoder = GeocodingResolver::new(geocode_providers, geocode_cache.clone(), geocode_timeout);

    // Routing: OpenRouteService when configured, geometric synthesis otherwise
    let mut routing_providers: Vec<Arc<dyn RoutingProvider>> = Vec::new();
    if config.ors_api_key.is_some() {
        routing_providers.push(Arc::new(OpenRouteServiceClient::with_config(
            config.ors_api_key.clone(),
            config.ors_base_url.clone(),
            config.ors_daily_limit,
            synthesis.routing_timeout(),
        )));
    } else {
        tracing::info!("ORS_API_KEY not set, routes will be synthesized geometrically");
    }
    let router = RoutingResolver::new(routing_providers, &synthesis);

    let gemini = Arc::new(GeminiClient::with_config(
        config.gemini_api_key.clone(),
        config.gemini_base_url.clone(),
        synthesis.generation_timeout(),
    ));
    let generator = SkeletonGenerator::new(gemini, &synthesis);

    let mut synthesizer = RouteSynthesizer::new(generator, geocoder, router, synthesis);
    if config.unsplash_access_key.is_some() {
        synthesizer = synthesizer.with_image_lookup(Arc::new(UnsplashClient::new(
            config.unsplash_access_key.clone(),
            Duration::from_secs(IMAGE_LOOKUP_TIMEOUT_SECS),
        )));
    }

    // Create application state
    let state = Arc::new(AppState {
        synthesizer,
        geocode_cache,
        synthesis_timeout: config.synthesis_timeout(),
    });

    // Build router with CORS and tracing
    let app = Router::new()
        .nest("/api/v1", tripforge::routes::create_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
