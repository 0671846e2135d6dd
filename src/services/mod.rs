pub mod gemini;
pub mod geocoding;
pub mod openrouteservice;
pub mod providers;
pub mod route_synthesis;
pub mod unsplash;
