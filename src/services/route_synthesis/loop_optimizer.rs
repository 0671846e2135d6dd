use super::geometry::{angle_from, centroid, normalized_variance, turn_angle_deg};
use crate::config::RouteSynthesisConfig;
use crate::constants::LOOP_SCORE_MAX;
use crate::models::{Coordinates, GeocodedPoint};

/// Trekking-only waypoint filtering and reordering. The first point of every
/// input is the fixed start of the loop and never moves.
#[derive(Debug, Clone)]
pub struct LoopOptimizer {
    max_hop_km: f64,
    linear_penalty: f64,
    low_variance_bonus: f64,
    straight_tolerance_deg: f64,
    variance_threshold: f64,
}

impl LoopOptimizer {
    pub fn new(config: &RouteSynthesisConfig) -> Self {
        LoopOptimizer {
            max_hop_km: config.max_trekking_hop_km,
            linear_penalty: config.loop_linear_penalty,
            low_variance_bonus: config.loop_low_variance_bonus,
            straight_tolerance_deg: config.loop_straight_tolerance_deg,
            variance_threshold: config.loop_variance_threshold,
        }
    }

    /// Keep waypoints reachable on foot within a loop of `max_total_km`.
    ///
    /// A point is accepted when the hop from the previously accepted point
    /// is at most the configured hop limit and it lies within half the
    /// budget of the start. The walk stops once the running total would
    /// exceed the budget. If the resulting loop is still too long, the
    /// points farthest from the start are dropped.
    pub fn filter_for_trekking(&self, points: &[GeocodedPoint], max_total_km: f64) -> Vec<GeocodedPoint> {
        let Some(start) = points.first() else {
            return Vec::new();
        };
        let origin = start.coordinates;
        let max_radius_km = max_total_km / 2.0;

        let mut kept = vec![start.clone()];
        let mut running_km = 0.0;

        for point in &points[1..] {
            let Some(previous) = kept.last() else { break };
            let hop_km = previous.coordinates.distance_to(&point.coordinates);
            let from_start_km = origin.distance_to(&point.coordinates);

            if hop_km > self.max_hop_km || from_start_km > max_radius_km {
                tracing::debug!(
                    hop_km = hop_km,
                    from_start_km = from_start_km,
                    "Trekking filter: dropping '{}'",
                    point.name
                );
                continue;
            }
            if running_km + hop_km > max_total_km {
                tracing::debug!(
                    running_km = running_km,
                    "Trekking filter: budget of {:.1}km exhausted at '{}'",
                    max_total_km,
                    point.name
                );
                break;
            }

            running_km += hop_km;
            kept.push(point.clone());
        }

        while kept.len() > 2 && closed_length_km(&kept) > max_total_km {
            let farthest = kept
                .iter()
                .enumerate()
                .skip(1)
                .max_by(|a, b| {
                    let da = origin.distance_to(&a.1.coordinates);
                    let db = origin.distance_to(&b.1.coordinates);
                    da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(i, _)| i);
            match farthest {
                Some(index) => {
                    let dropped = kept.remove(index);
                    tracing::debug!(
                        "Trekking filter: loop too long, dropping farthest point '{}'",
                        dropped.name
                    );
                }
                None => break,
            }
        }

        kept
    }

    /// Reorder waypoints into a circular visiting order around their
    /// centroid, starting from the fixed start. The reordering is kept only
    /// when it scores strictly better than the given order.
    pub fn optimize_for_loop(&self, points: &[GeocodedPoint]) -> Vec<GeocodedPoint> {
        if points.len() < 3 {
            return points.to_vec();
        }

        let coords: Vec<Coordinates> = points.iter().map(|p| p.coordinates).collect();
        let Some(center) = centroid(&coords) else {
            return points.to_vec();
        };

        let mut indexed: Vec<(usize, f64)> = coords
            .iter()
            .enumerate()
            .map(|(i, c)| (i, angle_from(&center, c)))
            .collect();
        indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let start_pos = indexed.iter().position(|(i, _)| *i == 0).unwrap_or(0);
        indexed.rotate_left(start_pos);

        let reordered: Vec<GeocodedPoint> = indexed.iter().map(|(i, _)| points[*i].clone()).collect();
        let reordered_coords: Vec<Coordinates> = reordered.iter().map(|p| p.coordinates).collect();

        let original_score = self.loop_quality_score(&coords);
        let reordered_score = self.loop_quality_score(&reordered_coords);

        tracing::debug!(
            original_score = original_score,
            reordered_score = reordered_score,
            "Loop optimization: original {:.0}, reordered {:.0}",
            original_score,
            reordered_score
        );

        if reordered_score > original_score {
            reordered
        } else {
            points.to_vec()
        }
    }

    /// Heuristic 0-100 score of how circular the closed path through
    /// `path` is. Near-straight interior vertices cost the linear penalty;
    /// near-uniform distances to the centroid earn the roundness bonus.
    pub fn loop_quality_score(&self, path: &[Coordinates]) -> f64 {
        let ring = close_ring(path);
        if ring.len() < 4 {
            return 0.0;
        }

        let mut score = LOOP_SCORE_MAX;
        for w in ring.windows(3) {
            if let Some(angle) = turn_angle_deg(&w[0], &w[1], &w[2]) {
                if (180.0 - angle) <= self.straight_tolerance_deg {
                    score -= self.linear_penalty;
                }
            }
        }

        let distinct = &ring[..ring.len() - 1];
        if let Some(center) = centroid(distinct) {
            let radii: Vec<f64> = distinct.iter().map(|p| center.distance_to(p)).collect();
            if normalized_variance(&radii) < self.variance_threshold {
                score += self.low_variance_bonus;
            }
        }

        score.clamp(0.0, LOOP_SCORE_MAX)
    }
}

/// The path with its start appended, unless it already ends there.
fn close_ring(path: &[Coordinates]) -> Vec<Coordinates> {
    let mut ring = path.to_vec();
    if let (Some(first), Some(last)) = (path.first(), path.last()) {
        if path.len() > 1 && first.distance_m(last) > 1.0 {
            ring.push(*first);
        }
    }
    ring
}

fn closed_length_km(points: &[GeocodedPoint]) -> f64 {
    let coords: Vec<Coordinates> = points.iter().map(|p| p.coordinates).collect();
    crate::models::path_length_km(&close_ring(&coords))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn optimizer() -> LoopOptimizer {
        LoopOptimizer::new(&RouteSynthesisConfig::default())
    }

    fn point(name: &str, lat: f64, lng: f64) -> GeocodedPoint {
        GeocodedPoint {
            name: name.to_string(),
            coordinates: Coordinates::new(lat, lng).unwrap(),
            source: "test".to_string(),
            accuracy: "test".to_string(),
            display_name: name.to_string(),
        }
    }

    /// Pentagon of radius ~1.5km around Nice, in visiting order.
    fn round_points() -> Vec<GeocodedPoint> {
        let center = Coordinates::new(43.70, 7.27).unwrap();
        (0..5)
            .map(|i| {
                let angle = i as f64 / 5.0 * std::f64::consts::TAU;
                let c = center.offset_km(1.5 * angle.sin(), 1.5 * angle.cos());
                point(&format!("p{}", i), c.lat, c.lng)
            })
            .collect()
    }

    #[test]
    fn test_linear_scores_below_round() {
        let optimizer = optimizer();
        let linear: Vec<Coordinates> = (0..5)
            .map(|i| Coordinates::new(43.70, 7.27 + 0.01 * i as f64).unwrap())
            .collect();
        let round: Vec<Coordinates> = round_points().iter().map(|p| p.coordinates).collect();

        let linear_score = optimizer.loop_quality_score(&linear);
        let round_score = optimizer.loop_quality_score(&round);

        assert!(linear_score < round_score);
        assert_eq!(round_score, 100.0);
        // Three straight interior vertices
        assert_eq!(linear_score, 40.0);
    }

    #[test]
    fn test_degenerate_paths_score_zero() {
        let optimizer = optimizer();
        let a = Coordinates::new(43.7, 7.27).unwrap();
        let b = Coordinates::new(43.71, 7.27).unwrap();
        assert_eq!(optimizer.loop_quality_score(&[a]), 0.0);
        assert_eq!(optimizer.loop_quality_score(&[a, b]), 0.0);
    }

    #[test]
    fn test_optimize_reorders_out_and_back() {
        let optimizer = optimizer();
        let base = Coordinates::new(43.70, 7.27).unwrap();
        let at = |name: &str, east: f64, north: f64| {
            let c = base.offset_km(north, east);
            point(name, c.lat, c.lng)
        };
        // Square with an inner point on the start's diagonal, visited so
        // the first leg runs straight through it
        let given = vec![
            at("s", 0.0, 0.0),
            at("m", 1.6, 1.4),
            at("q", 2.0, 2.0),
            at("p", 2.0, 0.0),
            at("r", 0.0, 2.0),
        ];

        let optimized = optimizer.optimize_for_loop(&given);
        let names: Vec<&str> = optimized.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["s", "p", "m", "q", "r"]);

        let before: Vec<Coordinates> = given.iter().map(|p| p.coordinates).collect();
        let after: Vec<Coordinates> = optimized.iter().map(|p| p.coordinates).collect();
        assert!(optimizer.loop_quality_score(&after) > optimizer.loop_quality_score(&before));
    }

    #[test]
    fn test_optimize_keeps_good_order() {
        let optimizer = optimizer();
        let round = round_points();
        let optimized = optimizer.optimize_for_loop(&round);
        let names: Vec<&str> = optimized.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names[0], "p0");
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn test_filter_drops_distant_points() {
        let optimizer = optimizer();
        let points = vec![
            point("start", 43.70, 7.27),
            point("near", 43.71, 7.28),
            point("far", 44.50, 7.27),
            point("close", 43.705, 7.26),
        ];

        let kept = optimizer.filter_for_trekking(&points, 10.0);
        let names: Vec<&str> = kept.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["start", "near", "close"]);
    }

    #[test]
    fn test_filter_trims_overlong_loop() {
        let optimizer = optimizer();
        // Each point ~4.4km from the start in different directions
        let points = vec![
            point("start", 43.70, 7.27),
            point("north", 43.74, 7.27),
            point("east", 43.70, 7.325),
            point("south", 43.66, 7.27),
        ];

        let kept = optimizer.filter_for_trekking(&points, 14.0);
        let names: Vec<&str> = kept.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["start", "east"]);
        let coords: Vec<Coordinates> = kept.iter().map(|p| p.coordinates).collect();
        assert!(crate::models::path_length_km(&close_ring(&coords)) <= 14.0);
    }

    #[test]
    fn test_filter_empty_input() {
        assert!(optimizer().filter_for_trekking(&[], 10.0).is_empty());
    }
}
