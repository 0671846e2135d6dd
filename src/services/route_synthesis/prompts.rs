use crate::config::RouteSynthesisConfig;
use crate::models::TripType;

/// Numeric limits embedded in the prompt so the model sees the same
/// constraints the validator enforces.
#[derive(Debug, Clone, Copy)]
pub struct PromptLimits {
    pub max_cycling_day_km: f64,
    pub trekking_min_km: f64,
    pub trekking_max_km: f64,
}

impl From<&RouteSynthesisConfig> for PromptLimits {
    fn from(config: &RouteSynthesisConfig) -> Self {
        PromptLimits {
            max_cycling_day_km: config.max_cycling_day_km,
            trekking_min_km: config.trekking_min_km,
            trekking_max_km: config.trekking_max_km,
        }
    }
}

pub fn build_prompt(trip_type: TripType, country: &str, city: Option<&str>, limits: &PromptLimits) -> String {
    let location = match city {
        Some(city) => format!("{}, {}", city, country),
        None => country.to_string(),
    };

    match trip_type {
        TripType::Cycling => cycling_prompt(&location, country, limits),
        TripType::Trekking => trekking_prompt(&location, country, limits),
    }
}

fn cycling_prompt(location: &str, country: &str, limits: &PromptLimits) -> String {
    format!(
        r#"You are an expert cycling route planner. Plan a 2-day road cycling trip starting in {location}.

Hard constraints:
- Exactly two days: "day1" and "day2".
- Each day's "distanceKm" is a number no greater than {max_day:.0}.
- Each day has two distinct endpoints: "start" differs from "end".
- day2 "start" is exactly day1 "end".
- Use real towns and landmarks in {country} that a geocoder can find.
- 2 to 4 intermediate "waypoints" per day, listed in riding order.

Respond with JSON only, no prose and no code fences, using this shape:
{{
  "day1": {{"start": "Town", "end": "Town", "distanceKm": 55, "waypoints": ["Place", "Place"]}},
  "day2": {{"start": "Town", "end": "Town", "distanceKm": 50, "waypoints": ["Place", "Place"]}},
  "totalDistanceKm": 105,
  "estimatedDuration": "2 days",
  "difficulty": "moderate"
}}"#,
        location = location,
        country = country,
        max_day = limits.max_cycling_day_km,
    )
}

fn trekking_prompt(location: &str, country: &str, limits: &PromptLimits) -> String {
    format!(
        r#"You are an expert hiking guide. Plan a 1-day circular trekking loop starting in {location}.

Hard constraints:
- A single day, "day1" only.
- "distanceKm" is a number between {min:.0} and {max:.0}.
- "start" and "end" are the same place: the walk returns to where it began.
- 4 to 5 "waypoints" within walking distance of each other, spread around the start so the
  route forms a loop rather than going out and back along one line.
- Use real trails, viewpoints, villages or landmarks in {country} that a geocoder can find.

Respond with JSON only, no prose and no code fences, using this shape:
{{
  "day1": {{"start": "Place", "end": "Place", "distanceKm": 10, "waypoints": ["Place", "Place", "Place", "Place"]}},
  "totalDistanceKm": 10,
  "estimatedDuration": "4 hours",
  "difficulty": "moderate"
}}"#,
        location = location,
        country = country,
        min = limits.trekking_min_km,
        max = limits.trekking_max_km,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> PromptLimits {
        PromptLimits::from(&RouteSynthesisConfig::default())
    }

    #[test]
    fn test_cycling_prompt_embeds_constraints() {
        let prompt = build_prompt(TripType::Cycling, "France", Some("Paris"), &limits());
        assert!(prompt.contains("Paris, France"));
        assert!(prompt.contains("no greater than 60"));
        assert!(prompt.contains("day2 \"start\" is exactly day1 \"end\""));
        assert!(prompt.contains("\"day2\": {"));
    }

    #[test]
    fn test_trekking_prompt_embeds_constraints() {
        let prompt = build_prompt(TripType::Trekking, "France", None, &limits());
        assert!(prompt.contains("starting in France"));
        assert!(prompt.contains("between 5 and 15"));
        assert!(prompt.contains("loop"));
        assert!(!prompt.contains("\"day2\""));
    }
}
