//! Two-tier indicator sourcing
//!
//! Tier one is the market data provider: quote plus one year of daily
//! history, with indicators computed locally. Tier two fills whatever is
//! still null through field-scoped searches whose hits the narrative
//! backend distills into the same structured record, under instructions to
//! prefer the given authoritative values. Merging applies provider
//! precedence per field, and a run in which both tiers fail simply carries
//! null fields — never an error.

use research_quant::snapshot::{IndicatorSnapshot, merge};
use research_quant::{compute, indicators};
use tracing::{debug, warn};

use crate::config::ResearchConfig;
use crate::engine::Collaborators;
use crate::prompts::{Prompts, render_hits, vars};

/// Everything the technical stage needs from sourcing
#[derive(Debug, Clone)]
pub struct SourcedIndicators {
    pub snapshot: IndicatorSnapshot,
    pub negative_news: bool,
    pub negative_news_summary: Option<String>,
    /// Whether the provider tier contributed any field
    pub provider_used: bool,
}

/// Orchestrates provider and extraction tiers for one entity
pub struct IndicatorSourcing<'a> {
    collaborators: &'a Collaborators,
    prompts: &'a Prompts,
    config: &'a ResearchConfig,
}

impl<'a> IndicatorSourcing<'a> {
    pub fn new(
        collaborators: &'a Collaborators,
        prompts: &'a Prompts,
        config: &'a ResearchConfig,
    ) -> Self {
        Self {
            collaborators,
            prompts,
            config,
        }
    }

    /// Assemble the merged snapshot and the negative-news signal
    ///
    /// `background` carries excerpts of earlier narrative stages; it is
    /// context for extraction only and never overrides provider values.
    pub async fn assemble(
        &self,
        entity: &str,
        ticker: Option<&str>,
        background: &str,
    ) -> SourcedIndicators {
        let provider = match ticker {
            Some(ticker) => self.provider_snapshot(ticker).await,
            None => {
                debug!(entity, "no ticker resolved, provider tier skipped");
                IndicatorSnapshot::default()
            }
        };
        let provider_used = !provider.is_unpopulated();

        let extracted = self.extracted_snapshot(entity, &provider, background).await;
        let snapshot = merge(&provider, &extracted);

        let (negative_news, negative_news_summary) = self.negative_news_probe(entity).await;

        SourcedIndicators {
            snapshot,
            negative_news,
            negative_news_summary,
            provider_used,
        }
    }

    /// Tier one: quote + history from the market data provider
    async fn provider_snapshot(&self, ticker: &str) -> IndicatorSnapshot {
        let market = &self.collaborators.market;
        let (quote, history) = tokio::join!(
            market.quote(ticker, &self.config.exchange),
            market.history(ticker, self.config.lookback_days),
        );

        let mut snapshot = match history {
            Ok(bars) if bars.len() > indicators::RSI_PERIOD => compute(&bars),
            Ok(bars) => {
                warn!(ticker, observations = bars.len(), "history too short for indicators");
                compute(&bars)
            }
            Err(e) => {
                warn!(ticker, error = %e, "history fetch failed");
                IndicatorSnapshot::default()
            }
        };

        match quote {
            Ok(quote) => snapshot = snapshot.apply_quote(&quote),
            Err(e) => warn!(ticker, error = %e, "quote fetch failed"),
        }

        snapshot
    }

    /// Tier two: field-scoped searches distilled by the narrative backend
    async fn extracted_snapshot(
        &self,
        entity: &str,
        provider: &IndicatorSnapshot,
        background: &str,
    ) -> IndicatorSnapshot {
        let missing = provider.missing_fields();
        if missing.is_empty() {
            return IndicatorSnapshot::default();
        }

        let hits = self.gap_search(entity, &missing).await;
        let known = serde_json::to_string_pretty(provider).unwrap_or_else(|_| "{}".to_string());

        let prompt = match self.prompts.render(
            "extract_indicators",
            vars! { known => known, hits => hits, background => background },
        ) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "indicator extraction prompt failed");
                return IndicatorSnapshot::default();
            }
        };

        match self.collaborators.narrative.generate_json(&prompt).await {
            Ok(value) => IndicatorSnapshot::from_extracted(&value),
            Err(e) => {
                warn!(entity, error = %e, "indicator extraction failed, keeping provider data only");
                IndicatorSnapshot::default()
            }
        }
    }

    /// Run the field-scoped searches for whatever is still missing
    async fn gap_search(&self, entity: &str, missing: &[&str]) -> String {
        let needs = |field: &str| missing.contains(&field);
        let n = self.config.web_results;
        let web = &self.collaborators.web;

        let technical_query = format!("{entity} stock RSI technical analysis India");
        let valuation_query = format!("{entity} stock P/E ratio EPS valuation India NSE BSE");
        let target_query = format!("{entity} stock target price analyst recommendation India NSE rupees");
        let volatility_query = format!("{entity} stock volatility beta India");

        let (technical, valuation, targets, volatility) = tokio::join!(
            async {
                if needs("rsi_14") || needs("current_price") {
                    web.search(&technical_query, n).await.unwrap_or_default()
                } else {
                    Vec::new()
                }
            },
            async {
                if needs("pe_ratio") || needs("eps") {
                    web.search(&valuation_query, n).await.unwrap_or_default()
                } else {
                    Vec::new()
                }
            },
            async {
                if needs("target_low") || needs("target_avg") || needs("target_high") {
                    web.search(&target_query, n).await.unwrap_or_default()
                } else {
                    Vec::new()
                }
            },
            async {
                if needs("beta") || needs("week_52_high") || needs("week_52_low") {
                    web.search(&volatility_query, n).await.unwrap_or_default()
                } else {
                    Vec::new()
                }
            },
        );

        let mut all = technical;
        all.extend(valuation);
        all.extend(targets);
        all.extend(volatility);
        render_hits(&all)
    }

    /// Screen recent news for red flags; degrades to no-signal on failure
    async fn negative_news_probe(&self, entity: &str) -> (bool, Option<String>) {
        let query =
            format!("{entity} stock fraud scam loss bankruptcy investigation SEBI warning");
        let hits = match self
            .collaborators
            .news
            .search(&query, self.config.news_results)
            .await
        {
            Ok(hits) => hits,
            Err(e) => {
                warn!(entity, error = %e, "negative news search failed");
                return (false, None);
            }
        };

        if hits.is_empty() {
            return (false, None);
        }

        let prompt = match self.prompts.render(
            "negative_news",
            vars! { entity => entity, hits => render_hits(&hits) },
        ) {
            Ok(prompt) => prompt,
            Err(_) => return (false, None),
        };

        match self.collaborators.narrative.generate_json(&prompt).await {
            Ok(value) => {
                let found = value
                    .get("negative_news_found")
                    .and_then(serde_json::Value::as_bool)
                    .unwrap_or(false);
                let summary = value
                    .get("negative_news_summary")
                    .and_then(serde_json::Value::as_str)
                    .filter(|s| !s.trim().is_empty())
                    .map(ToString::to_string);
                (found, summary)
            }
            Err(e) => {
                warn!(entity, error = %e, "negative news screening failed");
                (false, None)
            }
        }
    }
}
