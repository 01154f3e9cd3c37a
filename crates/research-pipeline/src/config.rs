//! Configuration for research runs

use research_core::{ResearchError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for research pipeline runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Exchange suffix used when querying the market data provider
    pub exchange: String,

    /// Days of daily history fetched for indicator calculation
    pub lookback_days: u32,

    /// Hits requested per web-search sub-query
    pub web_results: usize,

    /// Hits requested per news-search sub-query
    pub news_results: usize,

    /// Cache TTL for provider quotes and history
    pub quote_cache_ttl: Duration,

    /// Caller-level timeout for one full run
    pub run_timeout: Duration,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            exchange: "NSE".to_string(),
            lookback_days: 365, // one year of dailies covers MA200
            web_results: 3,
            news_results: 3,
            quote_cache_ttl: Duration::from_secs(60),
            run_timeout: Duration::from_secs(300),
        }
    }
}

impl ResearchConfig {
    /// Create a new configuration builder
    pub fn builder() -> ResearchConfigBuilder {
        ResearchConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.lookback_days == 0 {
            return Err(ResearchError::Config(
                "lookback_days must be greater than 0".to_string(),
            ));
        }
        if self.web_results == 0 || self.news_results == 0 {
            return Err(ResearchError::Config(
                "search result counts must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for ResearchConfig
#[derive(Debug, Default)]
pub struct ResearchConfigBuilder {
    exchange: Option<String>,
    lookback_days: Option<u32>,
    web_results: Option<usize>,
    news_results: Option<usize>,
    quote_cache_ttl: Option<Duration>,
    run_timeout: Option<Duration>,
}

impl ResearchConfigBuilder {
    /// Set the exchange suffix
    pub fn exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    /// Set the history lookback in days
    pub fn lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = Some(days);
        self
    }

    /// Set the per-query web search fan-out
    pub fn web_results(mut self, n: usize) -> Self {
        self.web_results = Some(n);
        self
    }

    /// Set the per-query news search fan-out
    pub fn news_results(mut self, n: usize) -> Self {
        self.news_results = Some(n);
        self
    }

    /// Set the quote cache TTL
    pub fn quote_cache_ttl(mut self, ttl: Duration) -> Self {
        self.quote_cache_ttl = Some(ttl);
        self
    }

    /// Set the caller-level run timeout
    pub fn run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = Some(timeout);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ResearchConfig> {
        let defaults = ResearchConfig::default();
        let config = ResearchConfig {
            exchange: self.exchange.unwrap_or(defaults.exchange),
            lookback_days: self.lookback_days.unwrap_or(defaults.lookback_days),
            web_results: self.web_results.unwrap_or(defaults.web_results),
            news_results: self.news_results.unwrap_or(defaults.news_results),
            quote_cache_ttl: self.quote_cache_ttl.unwrap_or(defaults.quote_cache_ttl),
            run_timeout: self.run_timeout.unwrap_or(defaults.run_timeout),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ResearchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = ResearchConfig::builder()
            .exchange("BSE")
            .lookback_days(180)
            .web_results(5)
            .build()
            .unwrap();

        assert_eq!(config.exchange, "BSE");
        assert_eq!(config.lookback_days, 180);
        assert_eq!(config.web_results, 5);
        // Untouched fields keep their defaults
        assert_eq!(config.news_results, 3);
    }

    #[test]
    fn test_zero_lookback_rejected() {
        let result = ResearchConfig::builder().lookback_days(0).build();
        assert!(result.is_err());
    }
}
