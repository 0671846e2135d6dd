use super::prompts::{build_prompt, PromptLimits};
use super::retry::{with_retry, RetryPolicy, Sleeper, TokioSleeper};
use super::skeleton_validator::SkeletonValidator;
use crate::config::RouteSynthesisConfig;
use crate::error::{AppError, ProviderError, Result};
use crate::models::{RouteSkeleton, TripType};
use crate::services::providers::TextGenerator;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A skeleton that parsed and passed the hard validation rules.
#[derive(Debug, Clone)]
pub struct GeneratedSkeleton {
    pub skeleton: RouteSkeleton,
    /// The JSON block exactly as extracted from the reply
    pub skeleton_json: String,
    pub raw: serde_json::Value,
    pub model: String,
    /// Soft-rule violations
    pub warnings: Vec<String>,
}

/// Why a single model attempt was rejected.
#[derive(Debug)]
enum AttemptError {
    Provider(ProviderError),
    EmptyResponse,
    MalformedJson(String),
    InvalidSkeleton(String),
}

impl AttemptError {
    fn is_retryable(&self) -> bool {
        match self {
            AttemptError::Provider(e) => e.is_retryable(),
            AttemptError::EmptyResponse | AttemptError::MalformedJson(_) => true,
            // Another model is more likely to respect the constraints
            AttemptError::InvalidSkeleton(_) => false,
        }
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Provider(e) => write!(f, "{}", e),
            AttemptError::EmptyResponse => write!(f, "empty response"),
            AttemptError::MalformedJson(e) => write!(f, "malformed skeleton JSON: {}", e),
            AttemptError::InvalidSkeleton(e) => write!(f, "invalid skeleton: {}", e),
        }
    }
}

pub struct SkeletonGenerator {
    generator: Arc<dyn TextGenerator>,
    models: Vec<String>,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    validator: SkeletonValidator,
    limits: PromptLimits,
    timeout: Duration,
}

impl SkeletonGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &RouteSynthesisConfig) -> Self {
        SkeletonGenerator {
            generator,
            models: config.generative_models.clone(),
            retry: RetryPolicy::new(config.model_max_attempts, config.model_backoff_base()),
            sleeper: Arc::new(TokioSleeper),
            validator: SkeletonValidator::new(config),
            limits: PromptLimits::from(config),
            timeout: config.generation_timeout(),
        }
    }

    /// Replace the backoff clock (tests record delays instead of sleeping).
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Ask each model in order, with retries, for a valid skeleton.
    pub async fn generate(
        &self,
        trip_type: TripType,
        country: &str,
        city: Option<&str>,
    ) -> Result<GeneratedSkeleton> {
        let prompt = build_prompt(trip_type, country, city, &self.limits);
        let mut last_error: Option<String> = None;

        for model in &self.models {
            tracing::info!(model = %model, "Requesting {} skeleton from {}", trip_type, model);

            let label = format!("Skeleton generation with {}", model);
            let outcome = with_retry(
                &self.retry,
                self.sleeper.as_ref(),
                &label,
                |attempt| self.attempt(model, &prompt, trip_type, attempt),
                AttemptError::is_retryable,
            )
            .await;

            match outcome {
                Ok(generated) => {
                    tracing::info!(
                        model = %model,
                        warnings = generated.warnings.len(),
                        "Skeleton accepted from {}",
                        model
                    );
                    return Ok(generated);
                }
                Err(e) => {
                    tracing::warn!(model = %model, error = %e, "Model {} exhausted: {}", model, e);
                    last_error = Some(format!("{}: {}", model, e));
                }
            }
        }

        Err(AppError::GenerationExhausted(
            last_error.unwrap_or_else(|| "no generative models configured".to_string()),
        ))
    }

    async fn attempt(
        &self,
        model: &str,
        prompt: &str,
        trip_type: TripType,
        attempt: u32,
    ) -> std::result::Result<GeneratedSkeleton, AttemptError> {
        tracing::debug!(model = %model, attempt = attempt, "Generation attempt {}", attempt);

        let text = match tokio::time::timeout(self.timeout, self.generator.generate(model, prompt)).await {
            Ok(result) => result.map_err(AttemptError::Provider)?,
            Err(_) => return Err(AttemptError::Provider(ProviderError::Timeout)),
        };
        if text.trim().is_empty() {
            return Err(AttemptError::EmptyResponse);
        }

        let block = extract_json_block(&text)
            .ok_or_else(|| AttemptError::MalformedJson("no JSON object in response".to_string()))?;
        let raw: serde_json::Value =
            serde_json::from_str(block).map_err(|e| AttemptError::MalformedJson(e.to_string()))?;
        let skeleton: RouteSkeleton = serde_json::from_value(raw.clone())
            .map_err(|e| AttemptError::MalformedJson(e.to_string()))?;

        let warnings = self
            .validator
            .validate(&skeleton, trip_type)
            .map_err(|e| AttemptError::InvalidSkeleton(e.to_string()))?;

        Ok(GeneratedSkeleton {
            skeleton,
            skeleton_json: block.to_string(),
            raw,
            model: model.to_string(),
            warnings,
        })
    }
}

/// The first balanced `{...}` substring of `text`, ignoring braces inside
/// JSON strings. Surrounding prose and code fences are skipped.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
