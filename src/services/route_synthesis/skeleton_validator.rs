use crate::config::RouteSynthesisConfig;
use crate::error::{AppError, Result};
use crate::models::{DaySpec, RouteSkeleton, TripType};

/// Activity-specific checks on a generated skeleton. Hard violations reject
/// it; soft violations come back as warnings and are repaired by
/// [`SkeletonValidator::repair`].
#[derive(Debug, Clone)]
pub struct SkeletonValidator {
    max_cycling_day_km: f64,
    trekking_min_km: f64,
    trekking_max_km: f64,
}

fn same_place(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

impl SkeletonValidator {
    pub fn new(config: &RouteSynthesisConfig) -> Self {
        SkeletonValidator {
            max_cycling_day_km: config.max_cycling_day_km,
            trekking_min_km: config.trekking_min_km,
            trekking_max_km: config.trekking_max_km,
        }
    }

    pub fn validate(&self, skeleton: &RouteSkeleton, trip_type: TripType) -> Result<Vec<String>> {
        let day1 = skeleton
            .day1
            .as_ref()
            .ok_or_else(|| invalid("missing day1"))?;

        match trip_type {
            TripType::Cycling => {
                let day2 = skeleton
                    .day2
                    .as_ref()
                    .ok_or_else(|| invalid("cycling route is missing day2"))?;
                self.check_cycling_day("day1", day1)?;
                self.check_cycling_day("day2", day2)?;

                let mut warnings = Vec::new();
                if !same_place(&day2.start, &day1.end) {
                    warnings.push(format!(
                        "day2 starts at '{}' but day1 ends at '{}'",
                        day2.start, day1.end
                    ));
                }
                Ok(warnings)
            }
            TripType::Trekking => {
                let distance = positive_distance("day1", day1)?;

                let mut warnings = Vec::new();
                if distance < self.trekking_min_km || distance > self.trekking_max_km {
                    warnings.push(format!(
                        "trekking distance {:.1}km is outside {:.0}-{:.0}km",
                        distance, self.trekking_min_km, self.trekking_max_km
                    ));
                }
                if !same_place(&day1.start, &day1.end) {
                    warnings.push(format!(
                        "trekking loop starts at '{}' but ends at '{}'",
                        day1.start, day1.end
                    ));
                }
                if skeleton.day2.is_some() {
                    warnings.push("trekking route has a second day, ignoring it".to_string());
                }
                Ok(warnings)
            }
        }
    }

    fn check_cycling_day(&self, label: &str, day: &DaySpec) -> Result<()> {
        let distance = positive_distance(label, day)?;
        if distance > self.max_cycling_day_km {
            return Err(invalid(&format!(
                "{} distance {:.1}km exceeds the {:.0}km cycling limit",
                label, distance, self.max_cycling_day_km
            )));
        }
        if same_place(&day.start, &day.end) {
            return Err(invalid(&format!(
                "{} starts and ends at the same place '{}'",
                label, day.start
            )));
        }
        Ok(())
    }

    /// Apply the corrections the soft rules call for, so downstream steps
    /// can rely on them: trekking loops are single-day, closed, and within
    /// the distance range; cycling day 2 starts where day 1 ended.
    pub fn repair(&self, mut skeleton: RouteSkeleton, trip_type: TripType) -> RouteSkeleton {
        match trip_type {
            TripType::Trekking => {
                skeleton.day2 = None;
                if let Some(day1) = skeleton.day1.as_mut() {
                    if !same_place(&day1.start, &day1.end) {
                        day1.end = day1.start.clone();
                    }
                    if let Some(distance) = day1.positive_distance() {
                        let clamped = distance.clamp(self.trekking_min_km, self.trekking_max_km);
                        if clamped != distance {
                            tracing::debug!(
                                "Clamping trekking distance {:.1}km to {:.1}km",
                                distance,
                                clamped
                            );
                            day1.distance_km = Some(clamped);
                        }
                    }
                }
                if let Some(total) = skeleton.total_distance_km {
                    skeleton.total_distance_km =
                        Some(total.clamp(self.trekking_min_km, self.trekking_max_km));
                }
            }
            TripType::Cycling => {
                let day1_end = skeleton.day1.as_ref().map(|d| d.end.clone());
                if let (Some(end), Some(day2)) = (day1_end, skeleton.day2.as_mut()) {
                    if !same_place(&day2.start, &end) {
                        day2.start = end;
                    }
                }
            }
        }
        skeleton
    }
}

fn positive_distance(label: &str, day: &DaySpec) -> Result<f64> {
    day.positive_distance().ok_or_else(|| {
        invalid(&format!(
            "{} distanceKm must be a positive number, got {:?}",
            label, day.distance_km
        ))
    })
}

fn invalid(message: &str) -> AppError {
    AppError::InvalidRouteSkeleton(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> SkeletonValidator {
        SkeletonValidator::new(&RouteSynthesisConfig::default())
    }

    fn cycling(day1: DaySpec, day2: DaySpec) -> RouteSkeleton {
        RouteSkeleton {
            day1: Some(day1),
            day2: Some(day2),
            ..Default::default()
        }
    }

    fn trekking(day1: DaySpec) -> RouteSkeleton {
        RouteSkeleton {
            day1: Some(day1),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_cycling_has_no_warnings() {
        let skeleton = cycling(
            DaySpec::new("Paris", "Fontainebleau", 55.0, &[]),
            DaySpec::new("Fontainebleau", "Sens", 45.0, &[]),
        );
        assert!(validator().validate(&skeleton, TripType::Cycling).unwrap().is_empty());
    }

    #[test]
    fn test_missing_day1_rejected() {
        let err = validator()
            .validate(&RouteSkeleton::default(), TripType::Trekking)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRouteSkeleton(_)));
    }

    #[test]
    fn test_cycling_without_day2_rejected() {
        let skeleton = trekking(DaySpec::new("Paris", "Meaux", 50.0, &[]));
        assert!(validator().validate(&skeleton, TripType::Cycling).is_err());
    }

    #[test]
    fn test_cycling_day_over_limit_rejected() {
        let skeleton = cycling(
            DaySpec::new("Paris", "Orleans", 120.0, &[]),
            DaySpec::new("Orleans", "Blois", 55.0, &[]),
        );
        let err = validator().validate(&skeleton, TripType::Cycling).unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn test_non_positive_distance_rejected() {
        let mut day1 = DaySpec::new("Nice", "Nice", 8.0, &[]);
        day1.distance_km = None;
        assert!(validator().validate(&trekking(day1), TripType::Trekking).is_err());

        let zero = DaySpec::new("Nice", "Nice", 0.0, &[]);
        assert!(validator().validate(&trekking(zero), TripType::Trekking).is_err());
    }

    #[test]
    fn test_cycling_round_trip_day_rejected() {
        let skeleton = cycling(
            DaySpec::new("Paris", "paris", 40.0, &[]),
            DaySpec::new("Paris", "Meaux", 45.0, &[]),
        );
        assert!(validator().validate(&skeleton, TripType::Cycling).is_err());
    }

    #[test]
    fn test_soft_rules_warn() {
        let disconnected = cycling(
            DaySpec::new("Paris", "Fontainebleau", 55.0, &[]),
            DaySpec::new("Melun", "Sens", 45.0, &[]),
        );
        assert_eq!(
            validator().validate(&disconnected, TripType::Cycling).unwrap().len(),
            1
        );

        let long_open_trek = trekking(DaySpec::new("Nice", "Eze", 22.0, &[]));
        assert_eq!(
            validator().validate(&long_open_trek, TripType::Trekking).unwrap().len(),
            2
        );
    }

    #[test]
    fn test_repair_trekking() {
        let mut skeleton = trekking(DaySpec::new("Nice", "Eze", 22.0, &[]));
        skeleton.day2 = Some(DaySpec::new("Eze", "Menton", 10.0, &[]));
        skeleton.total_distance_km = Some(32.0);

        let repaired = validator().repair(skeleton, TripType::Trekking);
        let day1 = repaired.day1.as_ref().unwrap();
        assert_eq!(day1.end, "Nice");
        assert_eq!(day1.distance_km, Some(15.0));
        assert!(repaired.day2.is_none());
        assert_eq!(repaired.authoritative_total_km(10.0), 15.0);
    }

    #[test]
    fn test_repair_cycling_joins_days() {
        let skeleton = cycling(
            DaySpec::new("Paris", "Fontainebleau", 55.0, &[]),
            DaySpec::new("Melun", "Sens", 45.0, &[]),
        );
        let repaired = validator().repair(skeleton, TripType::Cycling);
        assert_eq!(repaired.day2.unwrap().start, "Fontainebleau");
    }
}
