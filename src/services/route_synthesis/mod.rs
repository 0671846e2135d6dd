pub mod country_centroids;
pub mod geometric_path;
pub mod geometry;
pub mod loop_optimizer;
pub mod prompts;
pub mod retry;
pub mod routing_resolver;
pub mod skeleton_generator;
pub mod skeleton_validator;
pub mod waypoint_extractor;

pub use loop_optimizer::LoopOptimizer;
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use routing_resolver::RoutingResolver;
pub use skeleton_generator::{GeneratedSkeleton, SkeletonGenerator};
pub use skeleton_validator::SkeletonValidator;

use crate::config::RouteSynthesisConfig;
use crate::constants::{DEFAULT_CYCLING_DAY_KM, GEOMETRIC_SOURCE, IMAGE_LOOKUP_TIMEOUT_SECS};
use crate::error::Result;
use crate::models::{
    path_length_km, Coordinates, DailyRoute, FallbackTier, GenerationMetadata, GeocodedPoint,
    GeocodedWaypoint, RouteData, RouteGeometry, RouteRequest, RouteSkeleton, RoutingMetadata,
    SynthesizedRoute, TripType,
};
use crate::services::geocoding::GeocodingResolver;
use crate::services::providers::ImageLookup;
use geometric_path::open_path_points;
use routing_resolver::estimated_duration_min;
use std::sync::Arc;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;
use waypoint_extractor::{extract_detailed, WaypointQuery, WaypointRole};

/// Legs of the open path drawn around a centroid for cycling routes.
const CENTROID_PATH_LEGS: usize = 4;

/// A skeleton place that the geocoder resolved.
#[derive(Debug, Clone)]
struct ResolvedWaypoint {
    query: WaypointQuery,
    point: GeocodedPoint,
}

/// Where the final coordinates came from.
struct Placement {
    geometry: RouteGeometry,
    tier: FallbackTier,
}

/// Skeleton plus the generation facts carried into the output.
struct SkeletonSource {
    skeleton: RouteSkeleton,
    raw: serde_json::Value,
    model: String,
    warnings: Vec<String>,
}

/// Runs the whole pipeline: skeleton generation, validation and repair,
/// waypoint extraction, sequential geocoding, loop optimization for
/// trekking, routing, and distance reconciliation. Every failure after
/// generation degrades to a fallback tier instead of propagating.
pub struct RouteSynthesizer {
    generator: SkeletonGenerator,
    validator: SkeletonValidator,
    geocoder: GeocodingResolver,
    router: RoutingResolver,
    loop_optimizer: LoopOptimizer,
    images: Option<Arc<dyn ImageLookup>>,
    config: RouteSynthesisConfig,
}

impl RouteSynthesizer {
    pub fn new(
        generator: SkeletonGenerator,
        geocoder: GeocodingResolver,
        router: RoutingResolver,
        config: RouteSynthesisConfig,
    ) -> Self {
        RouteSynthesizer {
            generator,
            validator: SkeletonValidator::new(&config),
            geocoder,
            router,
            loop_optimizer: LoopOptimizer::new(&config),
            images: None,
            config,
        }
    }

    pub fn with_image_lookup(mut self, images: Arc<dyn ImageLookup>) -> Self {
        self.images = Some(images);
        self
    }

    pub fn generator(&self) -> &SkeletonGenerator {
        &self.generator
    }

    pub fn geocoder(&self) -> &GeocodingResolver {
        &self.geocoder
    }

    pub fn router(&self) -> &RoutingResolver {
        &self.router
    }

    /// Only generation exhaustion is surfaced as an error.
    pub async fn synthesize(&self, request: &RouteRequest) -> Result<SynthesizedRoute> {
        let trip_type = request.trip_type;
        let country = request.country();
        tracing::info!(
            country = country,
            city = request.city().unwrap_or(""),
            trip_type = %trip_type,
            "Synthesizing {} route for {}",
            trip_type,
            request.place()
        );

        let generated = self.generator.generate(trip_type, country, request.city()).await?;
        let skeleton = self.validator.repair(generated.skeleton, trip_type);
        for warning in &generated.warnings {
            tracing::warn!(model = %generated.model, "Skeleton corrected: {}", warning);
        }
        let total_km = skeleton.authoritative_total_km(self.config.default_total_distance_km);

        let queries = extract_detailed(&skeleton, country);
        let resolved = self.geocode_all(&queries).await;
        tracing::info!(
            resolved = resolved.len(),
            requested = queries.len(),
            "Geocoded {}/{} waypoints",
            resolved.len(),
            queries.len()
        );

        let placement = self.place(&resolved, trip_type, total_km, country).await;

        let source = SkeletonSource {
            skeleton,
            raw: generated.raw,
            model: generated.model,
            warnings: generated.warnings,
        };
        let mut route = self.assemble(request, source, &queries, &resolved, placement, total_km);
        route.image_url = self.find_image(request).await;

        tracing::info!(
            total_km = route.route_data.total_distance_km,
            tier = ?route.routing_metadata.fallback_tier,
            points = route.route_data.coordinates.len(),
            "Route synthesized: {:.1}km via {}",
            route.route_data.total_distance_km,
            route.routing_metadata.source
        );
        Ok(route)
    }

    /// [`synthesize`](Self::synthesize) under a wall-clock budget. On
    /// timeout a centroid route built from a default skeleton is returned.
    pub async fn synthesize_with_timeout(
        &self,
        request: &RouteRequest,
        timeout: Duration,
    ) -> Result<SynthesizedRoute> {
        match tokio::time::timeout(timeout, self.synthesize(request)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "Synthesis for {} timed out, returning centroid route",
                    request.place()
                );
                Ok(self.timeout_route(request, timeout))
            }
        }
    }

    fn timeout_route(&self, request: &RouteRequest, timeout: Duration) -> SynthesizedRoute {
        let trip_type = request.trip_type;
        let skeleton = RouteSkeleton::fallback(
            trip_type,
            request.place(),
            self.config.default_total_distance_km,
            DEFAULT_CYCLING_DAY_KM,
        );
        let total_km = skeleton.authoritative_total_km(self.config.default_total_distance_km);
        let placement = self.centroid_placement(trip_type, total_km, request.country());

        let source = SkeletonSource {
            raw: serde_json::to_value(&skeleton).unwrap_or(serde_json::Value::Null),
            skeleton,
            model: "none".to_string(),
            warnings: vec![format!(
                "synthesis timed out after {}s, fallback route returned",
                timeout.as_secs()
            )],
        };
        self.assemble(request, source, &[], &[], placement, total_km)
    }

    /// One waypoint at a time, in skeleton order; failures are skipped.
    async fn geocode_all(&self, queries: &[WaypointQuery]) -> Vec<ResolvedWaypoint> {
        let mut resolved = Vec::with_capacity(queries.len());
        for query in queries {
            match self.geocoder.resolve(&query.query).await {
                Ok(point) => resolved.push(ResolvedWaypoint {
                    query: query.clone(),
                    point,
                }),
                Err(e) => {
                    tracing::warn!(waypoint = %query.query, "Skipping waypoint: {}", e);
                }
            }
        }
        resolved
    }

    async fn place(
        &self,
        resolved: &[ResolvedWaypoint],
        trip_type: TripType,
        total_km: f64,
        country: &str,
    ) -> Placement {
        let points: Vec<GeocodedPoint> = resolved.iter().map(|r| r.point.clone()).collect();

        let routed = match trip_type {
            TripType::Trekking => self.place_loop(&points, total_km).await,
            TripType::Cycling if points.len() >= 2 => {
                let coords: Vec<Coordinates> = points.iter().map(|p| p.coordinates).collect();
                self.router.route(&coords, trip_type).await.ok()
            }
            TripType::Cycling => None,
        };

        match routed {
            Some(geometry) => {
                let tier = if geometry.source == GEOMETRIC_SOURCE {
                    FallbackTier::GeocodedGeometric
                } else {
                    FallbackTier::Provider
                };
                Placement { geometry, tier }
            }
            None => {
                tracing::warn!(
                    resolved = points.len(),
                    "Too few waypoints geocoded for {}, falling back to centroid route",
                    country
                );
                self.centroid_placement(trip_type, total_km, country)
            }
        }
    }

    async fn place_loop(&self, points: &[GeocodedPoint], total_km: f64) -> Option<RouteGeometry> {
        let filtered = self.loop_optimizer.filter_for_trekking(points, total_km);
        let ordered = self.loop_optimizer.optimize_for_loop(&filtered);

        match ordered.as_slice() {
            [] => None,
            [single] => {
                tracing::debug!("Single trekking point '{}', building circular route", single.name);
                self.router
                    .circular_route(&single.coordinates, total_km, TripType::Trekking)
                    .await
                    .ok()
            }
            [first, ..] => {
                let mut coords: Vec<Coordinates> = ordered.iter().map(|p| p.coordinates).collect();
                coords.push(first.coordinates);
                self.router.route(&coords, TripType::Trekking).await.ok()
            }
        }
    }

    /// Synthetic route around the country's centroid, or the default
    /// centroid when the country is unknown.
    fn centroid_placement(&self, trip_type: TripType, total_km: f64, country: &str) -> Placement {
        let (center, tier) = match country_centroids::lookup(country) {
            Some(center) => (center, FallbackTier::CountryCentroid),
            None => {
                tracing::warn!("No centroid known for '{}', using default centroid", country);
                (country_centroids::default_centroid(), FallbackTier::DefaultCentroid)
            }
        };

        let geometry = match trip_type {
            TripType::Trekking => self.router.geometric_loop(&center, total_km, trip_type),
            TripType::Cycling => {
                let points = open_path_points(&center, total_km, CENTROID_PATH_LEGS);
                RoutingResolver::geometric(&points, trip_type)
            }
        };
        Placement { geometry, tier }
    }

    fn assemble(
        &self,
        request: &RouteRequest,
        source: SkeletonSource,
        queries: &[WaypointQuery],
        resolved: &[ResolvedWaypoint],
        placement: Placement,
        total_km: f64,
    ) -> SynthesizedRoute {
        let trip_type = request.trip_type;
        let Placement { geometry, tier } = placement;
        let skeleton = &source.skeleton;

        // Only a path that actually runs through the geocoded day-1 end can
        // be split there
        let day1_end = match tier {
            FallbackTier::Provider | FallbackTier::GeocodedGeometric => resolved
                .iter()
                .find(|r| r.query.day == 1 && r.query.role == WaypointRole::End)
                .map(|r| r.point.coordinates),
            _ => None,
        };
        let daily_routes = split_days(skeleton, trip_type, &geometry.coordinates, day1_end, total_km);

        let waypoints = if queries.is_empty() {
            skeleton
                .days()
                .flat_map(|d| d.waypoints.iter().map(|w| w.trim().to_string()))
                .filter(|w| !w.is_empty())
                .collect()
        } else {
            queries.iter().map(|q| q.label.clone()).collect()
        };

        let discrepancy = if total_km > 0.0 {
            (geometry.distance_km - total_km) / total_km
        } else {
            0.0
        };
        if discrepancy.abs() > 0.25 {
            tracing::debug!(
                measured_km = geometry.distance_km,
                authoritative_km = total_km,
                "Measured distance differs from skeleton by {:.0}%",
                discrepancy * 100.0
            );
        }

        let routing_metadata = RoutingMetadata {
            source: geometry.source.clone(),
            profile: geometry.profile,
            fallback_tier: tier,
            measured_distance_km: geometry.distance_km,
            measured_duration_min: geometry.duration_min,
            distance_discrepancy: discrepancy,
            geocoded_waypoints: resolved
                .iter()
                .map(|r| GeocodedWaypoint {
                    name: r.query.label.clone(),
                    coordinates: r.point.coordinates,
                    source: r.point.source.clone(),
                    display_name: r.point.display_name.clone(),
                })
                .collect(),
        };

        let route_data = RouteData {
            coordinates: geometry.coordinates.clone(),
            waypoints,
            daily_routes,
            total_distance_km: total_km,
            estimated_duration: estimated_duration(skeleton, trip_type, total_km),
            difficulty: difficulty_label(skeleton, &geometry),
        };

        SynthesizedRoute {
            country: request.country().to_string(),
            city: request.city().map(str::to_string),
            trip_type,
            route_data,
            image_url: None,
            routing_metadata,
            generation_metadata: GenerationMetadata {
                id: Uuid::new_v4(),
                model: source.model,
                generated_at: OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
                skeleton: source.raw,
                warnings: source.warnings,
            },
        }
    }

    /// Best effort: failures and slow lookups yield no image.
    async fn find_image(&self, request: &RouteRequest) -> Option<String> {
        let images = self.images.as_ref()?;
        let query = match request.city() {
            Some(city) => format!("{} {}", city, request.country()),
            None => request.country().to_string(),
        };

        let timeout = Duration::from_secs(IMAGE_LOOKUP_TIMEOUT_SECS);
        match tokio::time::timeout(timeout, images.find_image(&query)).await {
            Ok(Ok(url)) => url,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Image lookup for '{}' failed: {}", query, e);
                None
            }
            Err(_) => {
                tracing::warn!("Image lookup for '{}' timed out", query);
                None
            }
        }
    }
}

/// Split the path into per-day routes. Day distances always come from the
/// skeleton. A cycling path is cut at the vertex nearest the day-1 end, or
/// in proportion to the day distances when that point is unknown.
fn split_days(
    skeleton: &RouteSkeleton,
    trip_type: TripType,
    coordinates: &[Coordinates],
    day1_end: Option<Coordinates>,
    total_km: f64,
) -> Vec<DailyRoute> {
    let day_waypoints = |day: Option<&crate::models::DaySpec>| -> Vec<String> {
        day.map(|d| {
            d.waypoints
                .iter()
                .map(|w| w.trim().to_string())
                .filter(|w| !w.is_empty())
                .collect()
        })
        .unwrap_or_default()
    };

    let day1 = skeleton.day1.as_ref();
    let day2 = skeleton.day2.as_ref();

    match (trip_type, day2) {
        (TripType::Cycling, Some(day2)) if coordinates.len() >= 2 => {
            let day1_km = day1.and_then(|d| d.positive_distance()).unwrap_or(total_km / 2.0);
            let day2_km = day2.positive_distance().unwrap_or(total_km - day1_km);

            // A bare segment has no interior vertex; both days share it
            let (day1_coords, day2_coords) = if coordinates.len() < 3 {
                (coordinates.to_vec(), coordinates.to_vec())
            } else {
                let split = day1_end
                    .and_then(|end| end.nearest_index(coordinates))
                    .filter(|i| *i > 0 && *i < coordinates.len() - 1)
                    .unwrap_or_else(|| {
                        proportional_split(coordinates, day1_km / (day1_km + day2_km))
                    });
                (coordinates[..=split].to_vec(), coordinates[split..].to_vec())
            };

            let day1_end_name = day1.map(|d| d.end.clone()).unwrap_or_default();
            vec![
                DailyRoute {
                    day: 1,
                    start_point: day1.map(|d| d.start.clone()).unwrap_or_default(),
                    end_point: day1_end_name.clone(),
                    distance_km: day1_km,
                    coordinates: day1_coords,
                    waypoints: day_waypoints(day1),
                },
                DailyRoute {
                    day: 2,
                    start_point: day1_end_name,
                    end_point: day2.end.clone(),
                    distance_km: day2_km,
                    coordinates: day2_coords,
                    waypoints: day_waypoints(Some(day2)),
                },
            ]
        }
        _ => {
            let start = day1.map(|d| d.start.clone()).unwrap_or_default();
            let end = match trip_type {
                TripType::Trekking => start.clone(),
                TripType::Cycling => day1.map(|d| d.end.clone()).unwrap_or_default(),
            };
            vec![DailyRoute {
                day: 1,
                start_point: start,
                end_point: end,
                distance_km: total_km,
                coordinates: coordinates.to_vec(),
                waypoints: day_waypoints(day1),
            }]
        }
    }
}

/// Index of the first vertex at or beyond `fraction` of the path length,
/// kept strictly inside the path.
fn proportional_split(coordinates: &[Coordinates], fraction: f64) -> usize {
    let last = coordinates.len().saturating_sub(1);
    if last < 2 {
        return last;
    }
    let target = path_length_km(coordinates) * fraction.clamp(0.0, 1.0);
    let mut walked = 0.0;
    for (i, w) in coordinates.windows(2).enumerate() {
        walked += w[0].distance_to(&w[1]);
        if walked >= target {
            return (i + 1).clamp(1, last - 1);
        }
    }
    last - 1
}

fn estimated_duration(skeleton: &RouteSkeleton, trip_type: TripType, total_km: f64) -> String {
    if let Some(duration) = skeleton
        .estimated_duration
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
    {
        return duration.to_string();
    }
    match trip_type {
        TripType::Cycling => format!("{} days", skeleton.days().count().max(1)),
        TripType::Trekking => {
            let hours = estimated_duration_min(total_km, trip_type) / 60.0;
            format!("{:.1} hours", hours)
        }
    }
}

/// The model's own label when it is one we recognise, else the routed one.
fn difficulty_label(skeleton: &RouteSkeleton, geometry: &RouteGeometry) -> String {
    skeleton
        .difficulty
        .as_deref()
        .map(|d| d.trim().to_lowercase())
        .filter(|d| matches!(d.as_str(), "easy" | "moderate" | "hard"))
        .unwrap_or_else(|| geometry.difficulty.as_str().to_string())
}
