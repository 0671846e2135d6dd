use crate::constants::*;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    /// Shared by the Places and Geocoding providers
    pub google_maps_api_key: Option<String>,
    pub nominatim_base_url: String,
    pub nominatim_user_agent: String,
    pub ors_api_key: Option<String>,
    pub ors_base_url: String,
    pub ors_daily_limit: u32,
    pub unsplash_access_key: Option<String>,
    pub synthesis_timeout_secs: u64,
    pub synthesis: RouteSynthesisConfig,
}

#[derive(Debug, Clone)]
pub struct RouteSynthesisConfig {
    /// Generative models in priority order; the first is the primary
    pub generative_models: Vec<String>,

    /// Attempts per model before advancing to the next one
    pub model_max_attempts: u32,

    /// Delay before the second attempt; doubles on every further attempt
    pub model_backoff_base_ms: u64,

    /// Hard upper bound on a cycling day
    pub max_cycling_day_km: f64,

    /// Accepted trekking loop length range
    pub trekking_min_km: f64,
    pub trekking_max_km: f64,

    /// Authoritative total used when the skeleton carries no usable distance
    pub default_total_distance_km: f64,

    /// Longest accepted hop between consecutive trekking waypoints
    pub max_trekking_hop_km: f64,

    /// Maximum gap (meters) between first and last coordinate of a loop
    pub loop_closure_tolerance_m: f64,

    // --- Loop quality heuristic ---
    /// Subtracted for every near-straight interior vertex
    pub loop_linear_penalty: f64,

    /// Added when centroid distances are nearly uniform
    pub loop_low_variance_bonus: f64,

    /// Degrees from 180 within which a vertex counts as straight
    pub loop_straight_tolerance_deg: f64,

    /// Normalized variance threshold for the roundness bonus
    pub loop_variance_threshold: f64,

    /// Scales the radius of synthesized circular routes
    pub circular_radius_factor: f64,

    pub geocode_timeout_secs: u64,
    pub routing_timeout_secs: u64,
    pub generation_timeout_secs: u64,
}

impl Default for RouteSynthesisConfig {
    fn default() -> Self {
        Self {
            generative_models: parse_model_list(DEFAULT_GENERATIVE_MODELS),
            model_max_attempts: DEFAULT_MODEL_MAX_ATTEMPTS,
            model_backoff_base_ms: DEFAULT_MODEL_BACKOFF_BASE_MS,
            max_cycling_day_km: DEFAULT_MAX_CYCLING_DAY_KM,
            trekking_min_km: DEFAULT_TREKKING_MIN_KM,
            trekking_max_km: DEFAULT_TREKKING_MAX_KM,
            default_total_distance_km: DEFAULT_TOTAL_DISTANCE_KM,
            max_trekking_hop_km: DEFAULT_MAX_TREKKING_HOP_KM,
            loop_closure_tolerance_m: DEFAULT_LOOP_CLOSURE_TOLERANCE_M,
            loop_linear_penalty: DEFAULT_LOOP_LINEAR_PENALTY,
            loop_low_variance_bonus: DEFAULT_LOOP_LOW_VARIANCE_BONUS,
            loop_straight_tolerance_deg: DEFAULT_LOOP_STRAIGHT_TOLERANCE_DEG,
            loop_variance_threshold: DEFAULT_LOOP_VARIANCE_THRESHOLD,
            circular_radius_factor: DEFAULT_CIRCULAR_RADIUS_FACTOR,
            geocode_timeout_secs: DEFAULT_GEOCODE_TIMEOUT_SECS,
            routing_timeout_secs: DEFAULT_ROUTING_TIMEOUT_SECS,
            generation_timeout_secs: DEFAULT_GENERATION_TIMEOUT_SECS,
        }
    }
}

/// Read `key`, falling back to `default` when unset. A set-but-unparsable
/// value is an error naming the variable.
fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| format!("Invalid {}", key)),
        Err(_) => Ok(default),
    }
}

/// Unset and blank values are both treated as absent.
fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

impl RouteSynthesisConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let generative_models = match env_opt("ROUTE_GENERATIVE_MODELS") {
            Some(raw) => parse_model_list(&raw),
            None => defaults.generative_models.clone(),
        };
        if generative_models.is_empty() {
            return Err("ROUTE_GENERATIVE_MODELS must name at least one model".to_string());
        }

        let config = Self {
            generative_models,
            model_max_attempts: env_or("ROUTE_MODEL_MAX_ATTEMPTS", defaults.model_max_attempts)?,
            model_backoff_base_ms: env_or(
                "ROUTE_MODEL_BACKOFF_BASE_MS",
                defaults.model_backoff_base_ms,
            )?,
            max_cycling_day_km: env_or("ROUTE_MAX_CYCLING_DAY_KM", defaults.max_cycling_day_km)?,
            trekking_min_km: env_or("ROUTE_TREKKING_MIN_KM", defaults.trekking_min_km)?,
            trekking_max_km: env_or("ROUTE_TREKKING_MAX_KM", defaults.trekking_max_km)?,
            default_total_distance_km: env_or(
                "ROUTE_DEFAULT_TOTAL_DISTANCE_KM",
                defaults.default_total_distance_km,
            )?,
            max_trekking_hop_km: env_or("ROUTE_MAX_TREKKING_HOP_KM", defaults.max_trekking_hop_km)?,
            loop_closure_tolerance_m: env_or(
                "ROUTE_LOOP_CLOSURE_TOLERANCE_M",
                defaults.loop_closure_tolerance_m,
            )?,
            loop_linear_penalty: env_or("ROUTE_LOOP_LINEAR_PENALTY", defaults.loop_linear_penalty)?,
            loop_low_variance_bonus: env_or(
                "ROUTE_LOOP_LOW_VARIANCE_BONUS",
                defaults.loop_low_variance_bonus,
            )?,
            loop_straight_tolerance_deg: env_or(
                "ROUTE_LOOP_STRAIGHT_TOLERANCE_DEG",
                defaults.loop_straight_tolerance_deg,
            )?,
            loop_variance_threshold: env_or(
                "ROUTE_LOOP_VARIANCE_THRESHOLD",
                defaults.loop_variance_threshold,
            )?,
            circular_radius_factor: env_or(
                "ROUTE_CIRCULAR_RADIUS_FACTOR",
                defaults.circular_radius_factor,
            )?,
            geocode_timeout_secs: env_or("ROUTE_GEOCODE_TIMEOUT_SECS", defaults.geocode_timeout_secs)?,
            routing_timeout_secs: env_or("ROUTE_ROUTING_TIMEOUT_SECS", defaults.routing_timeout_secs)?,
            generation_timeout_secs: env_or(
                "ROUTE_GENERATION_TIMEOUT_SECS",
                defaults.generation_timeout_secs,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.model_max_attempts == 0 {
            return Err("ROUTE_MODEL_MAX_ATTEMPTS must be at least 1".to_string());
        }
        for (key, value) in [
            ("ROUTE_MAX_CYCLING_DAY_KM", self.max_cycling_day_km),
            ("ROUTE_TREKKING_MIN_KM", self.trekking_min_km),
            ("ROUTE_TREKKING_MAX_KM", self.trekking_max_km),
            ("ROUTE_DEFAULT_TOTAL_DISTANCE_KM", self.default_total_distance_km),
            ("ROUTE_MAX_TREKKING_HOP_KM", self.max_trekking_hop_km),
            ("ROUTE_LOOP_CLOSURE_TOLERANCE_M", self.loop_closure_tolerance_m),
            ("ROUTE_LOOP_LINEAR_PENALTY", self.loop_linear_penalty),
            ("ROUTE_LOOP_LOW_VARIANCE_BONUS", self.loop_low_variance_bonus),
            ("ROUTE_LOOP_STRAIGHT_TOLERANCE_DEG", self.loop_straight_tolerance_deg),
            ("ROUTE_LOOP_VARIANCE_THRESHOLD", self.loop_variance_threshold),
            ("ROUTE_CIRCULAR_RADIUS_FACTOR", self.circular_radius_factor),
        ] {
            if !value.is_finite() {
                return Err(format!("{} must be a finite number", key));
            }
        }
        if self.max_cycling_day_km <= 0.0 {
            return Err("ROUTE_MAX_CYCLING_DAY_KM must be positive".to_string());
        }
        if self.trekking_min_km <= 0.0 || self.trekking_min_km >= self.trekking_max_km {
            return Err(
                "ROUTE_TREKKING_MIN_KM must be positive and below ROUTE_TREKKING_MAX_KM"
                    .to_string(),
            );
        }
        if self.default_total_distance_km <= 0.0 {
            return Err("ROUTE_DEFAULT_TOTAL_DISTANCE_KM must be positive".to_string());
        }
        if self.loop_closure_tolerance_m <= 0.0 || self.loop_closure_tolerance_m > 1000.0 {
            return Err("ROUTE_LOOP_CLOSURE_TOLERANCE_M must be between 0 and 1000 meters".to_string());
        }
        if !(0.0..=90.0).contains(&self.loop_straight_tolerance_deg) {
            return Err("ROUTE_LOOP_STRAIGHT_TOLERANCE_DEG must be between 0 and 90".to_string());
        }
        if self.max_trekking_hop_km <= 0.0 {
            return Err("ROUTE_MAX_TREKKING_HOP_KM must be positive".to_string());
        }
        if self.circular_radius_factor <= 0.0 {
            return Err("ROUTE_CIRCULAR_RADIUS_FACTOR must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.loop_variance_threshold) {
            return Err("ROUTE_LOOP_VARIANCE_THRESHOLD must be between 0 and 1".to_string());
        }
        if self.loop_linear_penalty < 0.0 || self.loop_low_variance_bonus < 0.0 {
            return Err(
                "ROUTE_LOOP_LINEAR_PENALTY and ROUTE_LOOP_LOW_VARIANCE_BONUS must not be negative"
                    .to_string(),
            );
        }
        if self.generation_timeout_secs == 0 {
            return Err("ROUTE_GENERATION_TIMEOUT_SECS must be at least 1".to_string());
        }
        Ok(())
    }

    /// Worst-case time to try every model: each attempt times out and every
    /// retry waits its full backoff.
    pub fn generation_budget(&self) -> Duration {
        let attempts = self.model_max_attempts.max(1);
        let per_attempt = self.generation_timeout().saturating_mul(attempts);
        let backoff = (1..attempts).fold(Duration::ZERO, |total, attempt| {
            let exponent = (attempt - 1).min(16);
            total.saturating_add(self.model_backoff_base().saturating_mul(1u32 << exponent))
        });
        let models = self.generative_models.len().max(1) as u32;
        per_attempt.saturating_add(backoff).saturating_mul(models)
    }

    pub fn model_backoff_base(&self) -> Duration {
        Duration::from_millis(self.model_backoff_base_ms)
    }

    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_secs(self.geocode_timeout_secs)
    }

    pub fn routing_timeout(&self) -> Duration {
        Duration::from_secs(self.routing_timeout_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| "Invalid PORT")?,
            gemini_api_key: env_opt("GEMINI_API_KEY"),
            gemini_base_url: env_opt("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            google_maps_api_key: env_opt("GOOGLE_MAPS_API_KEY"),
            nominatim_base_url: env_opt("NOMINATIM_BASE_URL")
                .unwrap_or_else(|| DEFAULT_NOMINATIM_BASE_URL.to_string()),
            nominatim_user_agent: env_opt("NOMINATIM_USER_AGENT")
                .unwrap_or_else(|| DEFAULT_NOMINATIM_USER_AGENT.to_string()),
            ors_api_key: env_opt("ORS_API_KEY"),
            ors_base_url: env_opt("ORS_BASE_URL").unwrap_or_else(|| DEFAULT_ORS_BASE_URL.to_string()),
            ors_daily_limit: env_or("ORS_DAILY_LIMIT", DEFAULT_ORS_DAILY_LIMIT)?,
            unsplash_access_key: env_opt("UNSPLASH_ACCESS_KEY"),
            synthesis_timeout_secs: env_or(
                "SYNTHESIS_TIMEOUT_SECS",
                DEFAULT_SYNTHESIS_TIMEOUT_SECS,
            )?,
            synthesis: RouteSynthesisConfig::from_env()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// The request timeout must leave room for a full model failover.
    pub fn validate(&self) -> Result<(), String> {
        let budget = self.synthesis.generation_budget();
        if self.synthesis_timeout() < budget {
            return Err(format!(
                "SYNTHESIS_TIMEOUT_SECS must be at least {}s to cover {} model(s) with {} attempt(s) each",
                budget.as_secs_f64().ceil(),
                self.synthesis.generative_models.len(),
                self.synthesis.model_max_attempts
            ));
        }
        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_route_env() {
        for (key, _) in env::vars() {
            if key.starts_with("ROUTE_") {
                env::remove_var(key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_defaults_when_env_is_empty() {
        clear_route_env();
        let config = RouteSynthesisConfig::from_env().unwrap();
        assert_eq!(
            config.generative_models,
            vec!["gemini-2.0-flash".to_string(), "gemini-1.5-flash".to_string()]
        );
        assert_eq!(config.model_max_attempts, 3);
        assert_eq!(config.model_backoff_base(), Duration::from_secs(2));
        assert_eq!(config.max_cycling_day_km, 60.0);
        assert_eq!(config.loop_linear_penalty, 20.0);
        assert_eq!(config.loop_low_variance_bonus, 10.0);
    }

    #[test]
    #[serial]
    fn test_model_list_is_trimmed() {
        clear_route_env();
        env::set_var("ROUTE_GENERATIVE_MODELS", " model-a , ,model-b ");
        let config = RouteSynthesisConfig::from_env().unwrap();
        assert_eq!(config.generative_models, vec!["model-a", "model-b"]);
        env::remove_var("ROUTE_GENERATIVE_MODELS");
    }

    #[test]
    #[serial]
    fn test_invalid_value_names_variable() {
        clear_route_env();
        env::set_var("ROUTE_MAX_CYCLING_DAY_KM", "sixty");
        let err = RouteSynthesisConfig::from_env().unwrap_err();
        assert!(err.contains("ROUTE_MAX_CYCLING_DAY_KM"));
        env::remove_var("ROUTE_MAX_CYCLING_DAY_KM");
    }

    #[test]
    #[serial]
    fn test_inverted_trekking_range_rejected() {
        clear_route_env();
        env::set_var("ROUTE_TREKKING_MIN_KM", "20");
        assert!(RouteSynthesisConfig::from_env().is_err());
        env::remove_var("ROUTE_TREKKING_MIN_KM");
    }

    #[test]
    #[serial]
    fn test_nan_trekking_bound_rejected() {
        clear_route_env();
        env::set_var("ROUTE_TREKKING_MAX_KM", "NaN");
        let err = RouteSynthesisConfig::from_env().unwrap_err();
        assert!(err.contains("ROUTE_TREKKING_MAX_KM"), "{}", err);
        env::remove_var("ROUTE_TREKKING_MAX_KM");
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let nan_min = RouteSynthesisConfig {
            trekking_min_km: f64::NAN,
            ..RouteSynthesisConfig::default()
        };
        assert!(nan_min.validate().unwrap_err().contains("ROUTE_TREKKING_MIN_KM"));

        let infinite_hop = RouteSynthesisConfig {
            max_trekking_hop_km: f64::INFINITY,
            ..RouteSynthesisConfig::default()
        };
        assert!(infinite_hop.validate().is_err());

        let zero_radius = RouteSynthesisConfig {
            circular_radius_factor: 0.0,
            ..RouteSynthesisConfig::default()
        };
        assert!(zero_radius.validate().is_err());

        let wide_variance = RouteSynthesisConfig {
            loop_variance_threshold: 2.0,
            ..RouteSynthesisConfig::default()
        };
        assert!(wide_variance.validate().is_err());
    }

    fn server_config(synthesis_timeout_secs: u64) -> Config {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: 3000,
            gemini_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            google_maps_api_key: None,
            nominatim_base_url: DEFAULT_NOMINATIM_BASE_URL.to_string(),
            nominatim_user_agent: DEFAULT_NOMINATIM_USER_AGENT.to_string(),
            ors_api_key: None,
            ors_base_url: DEFAULT_ORS_BASE_URL.to_string(),
            ors_daily_limit: DEFAULT_ORS_DAILY_LIMIT,
            unsplash_access_key: None,
            synthesis_timeout_secs,
            synthesis: RouteSynthesisConfig::default(),
        }
    }

    #[test]
    fn test_default_timeout_covers_model_failover() {
        // 2 models × (3 × 10s + 2s + 4s)
        let synthesis = RouteSynthesisConfig::default();
        assert_eq!(synthesis.generation_budget(), Duration::from_secs(72));
        assert!(server_config(DEFAULT_SYNTHESIS_TIMEOUT_SECS).validate().is_ok());
    }

    #[test]
    fn test_timeout_shorter_than_failover_rejected() {
        let err = server_config(60).validate().unwrap_err();
        assert!(err.contains("SYNTHESIS_TIMEOUT_SECS"), "{}", err);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = RouteSynthesisConfig {
            model_max_attempts: 0,
            ..RouteSynthesisConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
