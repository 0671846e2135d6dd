use crate::constants::DEFAULT_GEMINI_BASE_URL;
use crate::error::ProviderError;
use crate::services::providers::TextGenerator;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        Self::with_config(api_key, DEFAULT_GEMINI_BASE_URL.to_string(), timeout)
    }

    pub fn with_config(api_key: Option<String>, base_url: String, timeout: Duration) -> Self {
        GeminiClient {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url,
            urlencoding::encode(model)
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::Unconfigured)?;

        tracing::debug!(
            model = model,
            prompt_chars = prompt.len(),
            "Gemini request: model {}",
            model
        );

        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.7 },
        });

        let response = self
            .client
            .post(self.endpoint(model))
            .query(&[("key", api_key)])
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(
                status = %status,
                model = model,
                "Gemini API HTTP error {}: {}",
                status, error_text
            );
            // Gemini reports a bad key as 400 INVALID_ARGUMENT
            if status.as_u16() == 400 && error_text.contains("API key") {
                return Err(ProviderError::Auth(error_text));
            }
            return Err(ProviderError::from_status(status, &error_text));
        }

        let reply: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        reply.into_text()
    }
}

// Gemini API response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Result<String, ProviderError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(ProviderError::ContentPolicy(reason));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Parse("No candidates in response".to_string()))?;

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if matches!(reason, "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST") {
                return Err(ProviderError::ContentPolicy(reason.to_string()));
            }
        }

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_endpoint_encodes_model() {
        let client = GeminiClient::with_config(
            Some("k".to_string()),
            "http://localhost:9000/v1beta/".to_string(),
            Duration::from_secs(5),
        );
        assert_eq!(
            client.endpoint("gemini-2.0-flash"),
            "http://localhost:9000/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert!(client.endpoint("a b").contains("a%20b"));
    }

    #[test]
    fn test_text_is_concatenated_from_parts() {
        let reply = parse(
            r#"{"candidates": [{"content": {"parts": [{"text": "{\"day1\": "}, {"text": "{}}"}]}, "finishReason": "STOP"}]}"#,
        );
        assert_eq!(reply.into_text().unwrap(), "{\"day1\": {}}");
    }

    #[test]
    fn test_blocked_prompt_is_content_policy() {
        let reply = parse(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#);
        assert!(matches!(
            reply.into_text(),
            Err(ProviderError::ContentPolicy(_))
        ));
    }

    #[test]
    fn test_safety_finish_is_content_policy() {
        let reply = parse(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#);
        assert!(matches!(
            reply.into_text(),
            Err(ProviderError::ContentPolicy(_))
        ));
    }

    #[test]
    fn test_missing_candidates_is_parse_error() {
        let reply = parse(r#"{"candidates": []}"#);
        assert!(matches!(reply.into_text(), Err(ProviderError::Parse(_))));
    }

    #[tokio::test]
    async fn test_missing_key_is_unconfigured() {
        let client = GeminiClient::new(None, Duration::from_secs(1));
        let result = client.generate("gemini-2.0-flash", "hello").await;
        assert_eq!(result, Err(ProviderError::Unconfigured));
    }
}
