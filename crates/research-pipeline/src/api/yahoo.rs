//! Yahoo Finance market data client
//!
//! Implements [`MarketDataService`] over the Yahoo Finance API. The quote
//! call reports the price plus 52-week extrema derived from one year of
//! history; valuation and analyst fields stay null and flow through the
//! narrative-extraction tier instead.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use research_core::{MarketDataService, OhlcBar, QuoteSummary, ResearchError, Result};
use std::time::Duration;
use time::OffsetDateTime;
use yahoo_finance_api as yahoo;

use super::cache::MarketCache;

/// Yahoo Finance client with a TTL cache
pub struct YahooMarketData {
    cache: MarketCache,
}

impl YahooMarketData {
    /// Create a client whose responses are cached for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: MarketCache::new(ttl),
        }
    }

    /// Map an exchange name to Yahoo's ticker suffix convention
    fn exchange_symbol(ticker: &str, exchange: &str) -> String {
        match exchange.to_uppercase().as_str() {
            "NSE" => format!("{ticker}.NS"),
            "BSE" => format!("{ticker}.BO"),
            _ => ticker.to_string(),
        }
    }

    async fn fetch_history(symbol: &str, ticker: &str, lookback_days: u32) -> Result<Vec<OhlcBar>> {
        let provider = yahoo::YahooConnector::new().map_err(|e| provider_err(ticker, &e))?;

        let end = Utc::now();
        let start = end - chrono::Duration::days(i64::from(lookback_days));
        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| provider_err(ticker, &e))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| provider_err(ticker, &e))?;

        let response = provider
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(|e| provider_err(ticker, &e))?;
        let quotes = response.quotes().map_err(|e| provider_err(ticker, &e))?;

        Ok(quotes
            .iter()
            .map(|q| OhlcBar {
                timestamp: DateTime::from_timestamp(q.timestamp as i64, 0).unwrap_or_else(Utc::now),
                open: q.open,
                high: q.high,
                low: q.low,
                close: q.close,
                volume: q.volume,
            })
            .collect())
    }
}

#[async_trait]
impl MarketDataService for YahooMarketData {
    async fn quote(&self, ticker: &str, exchange: &str) -> Result<QuoteSummary> {
        let symbol = Self::exchange_symbol(ticker, exchange);
        let key = format!("quote:{symbol}");
        let owned_ticker = ticker.to_string();

        let value = self
            .cache
            .get_or_fetch(key, || async move {
                let bars = Self::fetch_history(&symbol, &owned_ticker, 365).await?;
                if bars.is_empty() {
                    return Err(ResearchError::ProviderUnavailable {
                        ticker: owned_ticker,
                        reason: "no quotes returned".to_string(),
                    });
                }

                let week_52_high = bars.iter().map(|b| b.high).fold(f64::MIN, f64::max);
                let week_52_low = bars.iter().map(|b| b.low).fold(f64::MAX, f64::min);
                let quote = QuoteSummary {
                    ticker: owned_ticker.clone(),
                    current_price: bars.last().map(|b| b.close),
                    week_52_high: Some(week_52_high),
                    week_52_low: Some(week_52_low),
                    ..QuoteSummary::default()
                };
                serde_json::to_value(&quote).map_err(|e| ResearchError::ProviderUnavailable {
                    ticker: owned_ticker,
                    reason: format!("quote serialization: {e}"),
                })
            })
            .await?;

        serde_json::from_value(value).map_err(|e| ResearchError::ProviderUnavailable {
            ticker: ticker.to_string(),
            reason: format!("cached quote corrupt: {e}"),
        })
    }

    async fn history(&self, ticker: &str, lookback_days: u32) -> Result<Vec<OhlcBar>> {
        let symbol = Self::exchange_symbol(ticker, "NSE");
        let key = format!("history:{symbol}:{lookback_days}");
        let owned_ticker = ticker.to_string();

        let value = self
            .cache
            .get_or_fetch(key, || async move {
                let bars = Self::fetch_history(&symbol, &owned_ticker, lookback_days).await?;
                serde_json::to_value(&bars).map_err(|e| ResearchError::ProviderUnavailable {
                    ticker: owned_ticker,
                    reason: format!("history serialization: {e}"),
                })
            })
            .await?;

        serde_json::from_value(value).map_err(|e| ResearchError::ProviderUnavailable {
            ticker: ticker.to_string(),
            reason: format!("cached history corrupt: {e}"),
        })
    }
}

fn provider_err(ticker: &str, e: &dyn std::fmt::Display) -> ResearchError {
    ResearchError::ProviderUnavailable {
        ticker: ticker.to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_symbol_mapping() {
        assert_eq!(
            YahooMarketData::exchange_symbol("TATAMOTORS", "NSE"),
            "TATAMOTORS.NS"
        );
        assert_eq!(YahooMarketData::exchange_symbol("TCS", "BSE"), "TCS.BO");
        assert_eq!(YahooMarketData::exchange_symbol("AAPL", "NASDAQ"), "AAPL");
    }
}
