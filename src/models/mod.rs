pub mod coordinates;
pub mod geocoding;
pub mod route;
pub mod skeleton;

pub use coordinates::{path_length_km, Coordinates};
pub use geocoding::{GeocodeHit, GeocodedPoint};
pub use route::{
    DailyRoute, Difficulty, FallbackTier, GenerationMetadata, GeocodedWaypoint, RouteData,
    RouteGeometry, RouteRequest, RoutingMetadata, RoutingProfile, SynthesizedRoute, TripType,
};
pub use skeleton::{DaySpec, RouteSkeleton};
