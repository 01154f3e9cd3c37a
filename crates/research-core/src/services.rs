//! Collaborator service traits
//!
//! The pipeline consumes four external collaborators: a narrative
//! (reasoning/text-generation) backend, free-text web and news search
//! services, and a market time-series data provider. All four are consumed
//! behind traits so provider implementations stay swappable and tests can
//! substitute mocks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// One search result from the web or news search services
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

/// Daily OHLC observation from the market data provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OhlcBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Point-in-time quote data for one ticker
///
/// Every field beyond the ticker is independently nullable: providers
/// differ in what they expose, and missing fields flow through the
/// narrative-extraction tier instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QuoteSummary {
    pub ticker: String,
    pub current_price: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub eps: Option<f64>,
    pub beta: Option<f64>,
    pub week_52_high: Option<f64>,
    pub week_52_low: Option<f64>,
    pub target_low: Option<f64>,
    pub target_avg: Option<f64>,
    pub target_high: Option<f64>,
}

impl QuoteSummary {
    /// Create an empty quote for a ticker
    pub fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Self::default()
        }
    }
}

/// Reasoning/text-generation backend
///
/// Calls may fail transiently; callers recover with placeholder output.
#[cfg_attr(any(test, feature = "test-mocks"), mockall::automock)]
#[async_trait]
pub trait NarrativeService: Send + Sync {
    /// Generate free-form narrative text for a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate a structured JSON object for a prompt
    async fn generate_json(&self, prompt: &str) -> Result<serde_json::Value>;
}

/// General web search service
#[cfg_attr(any(test, feature = "test-mocks"), mockall::automock)]
#[async_trait]
pub trait WebSearchService: Send + Sync {
    /// Search the web, returning up to `max_results` ordered hits
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

/// News-scoped search service
#[cfg_attr(any(test, feature = "test-mocks"), mockall::automock)]
#[async_trait]
pub trait NewsSearchService: Send + Sync {
    /// Search recent news, returning up to `max_results` ordered hits
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

/// Market time-series data provider
#[cfg_attr(any(test, feature = "test-mocks"), mockall::automock)]
#[async_trait]
pub trait MarketDataService: Send + Sync {
    /// Latest quote data for a ticker on an exchange
    async fn quote(&self, ticker: &str, exchange: &str) -> Result<QuoteSummary>;

    /// Ordered daily OHLC history covering `lookback_days`
    async fn history(&self, ticker: &str, lookback_days: u32) -> Result<Vec<OhlcBar>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_summary_empty() {
        let quote = QuoteSummary::empty("TCS");
        assert_eq!(quote.ticker, "TCS");
        assert!(quote.current_price.is_none());
        assert!(quote.pe_ratio.is_none());
    }

    #[tokio::test]
    async fn test_mock_narrative_service() {
        let mut narrative = MockNarrativeService::new();
        narrative
            .expect_generate()
            .returning(|_| Ok("narrative".to_string()));

        let text = narrative.generate("prompt").await.unwrap();
        assert_eq!(text, "narrative");
    }
}
