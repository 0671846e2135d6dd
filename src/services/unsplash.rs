use crate::error::ProviderError;
use crate::services::providers::ImageLookup;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const UNSPLASH_SEARCH_URL: &str = "https://api.unsplash.com/search/photos";

#[derive(Clone)]
pub struct UnsplashClient {
    client: Client,
    access_key: Option<String>,
    timeout: Duration,
}

impl UnsplashClient {
    pub fn new(access_key: Option<String>, timeout: Duration) -> Self {
        UnsplashClient {
            client: Client::new(),
            access_key,
            timeout,
        }
    }
}

#[async_trait]
impl ImageLookup for UnsplashClient {
    async fn find_image(&self, query: &str) -> Result<Option<String>, ProviderError> {
        let access_key = self
            .access_key
            .as_deref()
            .ok_or(ProviderError::Unconfigured)?;

        let response = self
            .client
            .get(UNSPLASH_SEARCH_URL)
            .header("Authorization", format!("Client-ID {}", access_key))
            .query(&[("query", query), ("per_page", "1"), ("orientation", "landscape")])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, &error_text));
        }

        let results: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok(results.first_url())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
}

impl SearchResponse {
    fn first_url(self) -> Option<String> {
        self.results.into_iter().next().map(|p| p.urls.regular)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_url() {
        let parsed: SearchResponse = serde_json::from_str(
            r#"{"total": 2, "results": [{"urls": {"regular": "https://img/1"}}, {"urls": {"regular": "https://img/2"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.first_url().as_deref(), Some("https://img/1"));

        let empty: SearchResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert_eq!(empty.first_url(), None);
    }

    #[tokio::test]
    async fn test_missing_key_is_unconfigured() {
        let client = UnsplashClient::new(None, Duration::from_secs(1));
        assert_eq!(
            client.find_image("Nice").await,
            Err(ProviderError::Unconfigured)
        );
    }
}
