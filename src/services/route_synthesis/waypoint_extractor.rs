use crate::models::RouteSkeleton;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaypointRole {
    Start,
    Via,
    End,
}

/// One geocodable place from the skeleton, with where it sits in the route.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointQuery {
    /// Country-qualified text sent to the geocoder
    pub query: String,
    /// The name as the skeleton gave it
    pub label: String,
    pub day: u32,
    pub role: WaypointRole,
}

/// Ordered, de-duplicated geocoding queries for `skeleton`.
pub fn extract(skeleton: &RouteSkeleton, country: &str) -> Vec<String> {
    extract_detailed(skeleton, country)
        .into_iter()
        .map(|w| w.query)
        .collect()
}

/// Day 1 start, day 1 waypoints, day 1 end (when distinct from its start),
/// day 2 waypoints, day 2 end. Day 2's start is day 1's end and is not
/// repeated. Duplicates are dropped case-insensitively, first one wins.
pub fn extract_detailed(skeleton: &RouteSkeleton, country: &str) -> Vec<WaypointQuery> {
    let mut candidates: Vec<(&str, u32, WaypointRole)> = Vec::new();

    if let Some(day1) = &skeleton.day1 {
        candidates.push((&day1.start, 1, WaypointRole::Start));
        candidates.extend(day1.waypoints.iter().map(|w| (w.as_str(), 1, WaypointRole::Via)));
        if !day1.end.trim().eq_ignore_ascii_case(day1.start.trim()) {
            candidates.push((&day1.end, 1, WaypointRole::End));
        }
    }
    if let Some(day2) = &skeleton.day2 {
        candidates.extend(day2.waypoints.iter().map(|w| (w.as_str(), 2, WaypointRole::Via)));
        candidates.push((&day2.end, 2, WaypointRole::End));
    }

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter_map(|(name, day, role)| {
            let label = name.trim();
            if label.is_empty() {
                return None;
            }
            let query = qualify(label, country);
            if !seen.insert(query.to_lowercase()) {
                return None;
            }
            Some(WaypointQuery {
                query,
                label: label.to_string(),
                day,
                role,
            })
        })
        .collect()
}

/// Append the country unless the name already mentions it.
fn qualify(name: &str, country: &str) -> String {
    let country = country.trim();
    if country.is_empty() || name.to_lowercase().contains(&country.to_lowercase()) {
        name.to_string()
    } else {
        format!("{}, {}", name, country)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DaySpec;

    #[test]
    fn test_cycling_order() {
        let skeleton = RouteSkeleton {
            day1: Some(DaySpec::new("Paris", "Fontainebleau", 55.0, &["Evry", "Melun"])),
            day2: Some(DaySpec::new("Fontainebleau", "Sens", 45.0, &["Nemours"])),
            ..Default::default()
        };

        assert_eq!(
            extract(&skeleton, "France"),
            vec![
                "Paris, France",
                "Evry, France",
                "Melun, France",
                "Fontainebleau, France",
                "Nemours, France",
                "Sens, France",
            ]
        );

        let detailed = extract_detailed(&skeleton, "France");
        assert_eq!(detailed[3].role, WaypointRole::End);
        assert_eq!(detailed[3].day, 1);
        assert_eq!(detailed[3].label, "Fontainebleau");
        assert_eq!(detailed[5].day, 2);
    }

    #[test]
    fn test_trekking_loop_lists_start_once() {
        let skeleton = RouteSkeleton {
            day1: Some(DaySpec::new(
                "Nice",
                "nice",
                8.0,
                &["Colline du Château", "Mont Boron", "Nice, France"],
            )),
            ..Default::default()
        };

        assert_eq!(
            extract(&skeleton, "France"),
            vec!["Nice, France", "Colline du Château, France", "Mont Boron, France"]
        );
    }

    #[test]
    fn test_names_already_qualified() {
        let skeleton = RouteSkeleton {
            day1: Some(DaySpec::new("Lyon, france", "Vienne", 35.0, &["  "])),
            ..Default::default()
        };
        assert_eq!(
            extract(&skeleton, "France"),
            vec!["Lyon, france", "Vienne, France"]
        );
    }

    #[test]
    fn test_malformed_skeleton_is_empty() {
        assert!(extract(&RouteSkeleton::default(), "France").is_empty());
    }
}
