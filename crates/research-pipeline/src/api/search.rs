//! Search client for the web and news search services
//!
//! Talks to a Tavily-style search REST endpoint. One client serves both
//! scopes: general topic for [`WebSearchService`], news topic for
//! [`NewsSearchService`]. Requests are rate limited so bursty stages do
//! not exhaust the free tier.

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use research_core::{NewsSearchService, ResearchError, Result, SearchHit, WebSearchService};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use url::Url;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const DEFAULT_ENDPOINT: &str = "https://api.tavily.com/search";
const DEFAULT_RATE_LIMIT: u32 = 60;

/// Configuration for the search client
#[derive(Debug, Clone)]
pub struct SearchApiConfig {
    /// API key for the search service
    pub api_key: String,
    /// Search endpoint URL
    pub endpoint: String,
    /// Requests per minute
    pub rate_limit: u32,
}

impl SearchApiConfig {
    /// Create a config with the given API key and defaults
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            rate_limit: DEFAULT_RATE_LIMIT,
        }
    }

    /// Create config from environment variables
    ///
    /// Reads `SEARCH_API_KEY`, and optionally `SEARCH_API_ENDPOINT`.
    pub fn from_env() -> Result<Self> {
        let api_key =
            research_utils::require_env("SEARCH_API_KEY").map_err(ResearchError::Config)?;
        Ok(Self {
            api_key,
            endpoint: research_utils::env_or("SEARCH_API_ENDPOINT", DEFAULT_ENDPOINT),
            rate_limit: DEFAULT_RATE_LIMIT,
        })
    }

    /// Set a custom endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Rate-limited search client
pub struct SearchApiClient {
    client: Client,
    config: SearchApiConfig,
    endpoint: Url,
    rate_limiter: SharedRateLimiter,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    topic: &'a str,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    url: String,
}

impl SearchApiClient {
    /// Create a client with the given configuration
    pub fn with_config(config: SearchApiConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| ResearchError::Config(format!("invalid search endpoint: {e}")))?;
        let quota = Quota::per_minute(
            NonZeroU32::new(config.rate_limit)
                .unwrap_or_else(|| NonZeroU32::new(DEFAULT_RATE_LIMIT).expect("nonzero")),
        );
        Ok(Self {
            client: Client::new(),
            config,
            endpoint,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// Create a client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::with_config(SearchApiConfig::from_env()?)
    }

    async fn search_topic(
        &self,
        query: &str,
        max_results: usize,
        topic: &str,
    ) -> Result<Vec<SearchHit>> {
        self.rate_limiter.until_ready().await;

        let request = SearchRequest {
            api_key: &self.config.api_key,
            query,
            max_results,
            topic,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| ResearchError::Search(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ResearchError::Search(format!("API error {status}: {body}")));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ResearchError::Search(format!("malformed response: {e}")))?;

        Ok(parsed
            .results
            .into_iter()
            .take(max_results)
            .map(|r| SearchHit {
                title: r.title,
                snippet: r.content,
                url: r.url,
            })
            .collect())
    }
}

#[async_trait]
impl WebSearchService for SearchApiClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        self.search_topic(query, max_results, "general").await
    }
}

#[async_trait]
impl NewsSearchService for SearchApiClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        self.search_topic(query, max_results, "news").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SearchApiConfig::new("key");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.rate_limit, DEFAULT_RATE_LIMIT);
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let config = SearchApiConfig::new("key").with_endpoint("::broken::");
        assert!(SearchApiClient::with_config(config).is_err());
    }

    #[test]
    fn test_response_parsing_tolerates_missing_fields() {
        let parsed: SearchResponse =
            serde_json::from_str(r#"{"results": [{"title": "only title"}]}"#).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].title, "only title");
        assert!(parsed.results[0].content.is_empty());

        let empty: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.results.is_empty());
    }
}
