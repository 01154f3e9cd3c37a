//! Sector pipeline stages
//!
//! Four stages for sector-level queries: general overview, investor
//! sentiment, technical & valuation risk, and the final suggestion with a
//! top-companies listing.

use async_trait::async_trait;
use research_core::context::keys;
use research_core::{ResearchContext, Result, Stage, StageOutput};
use tracing::debug;

use super::{DISCLAIMER, excerpt};
use crate::prompts::{render_hits, vars};
use crate::stages::company::StageContext;

// ---------------------------------------------------------------------------
// Stage 1: general overview
// ---------------------------------------------------------------------------

/// Current state of the sector from news and trend searches
pub struct SectorOverviewStage {
    deps: StageContext,
}

impl SectorOverviewStage {
    pub fn new(deps: StageContext) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Stage for SectorOverviewStage {
    fn name(&self) -> &'static str {
        "sector-overview"
    }

    fn reads(&self) -> &'static [&'static str] {
        &[keys::QUERY, keys::ENTITY, keys::CURRENT_DATE]
    }

    fn writes(&self) -> &'static [&'static str] {
        &[keys::SECTOR_OVERVIEW]
    }

    async fn run(&self, ctx: &ResearchContext) -> Result<StageOutput> {
        let sector = ctx.get_str_or(keys::ENTITY, "");
        let n = self.deps.config.web_results.max(5);

        let news_query = format!("{sector} sector India latest news");
        let trends_query = format!("{sector} sector India trends growth outlook");

        let (news, trends) = tokio::join!(
            async {
                self.deps
                    .collaborators
                    .news
                    .search(&news_query, n)
                    .await
                    .unwrap_or_default()
            },
            async {
                self.deps
                    .collaborators
                    .web
                    .search(&trends_query, n)
                    .await
                    .unwrap_or_default()
            },
        );

        let prompt = self.deps.prompts.render(
            "sector_overview",
            vars! {
                query => ctx.get_str_or(keys::QUERY, ""),
                sector => sector,
                date => ctx.get_str_or(keys::CURRENT_DATE, ""),
                news_hits => render_hits(&news),
                trend_hits => render_hits(&trends),
            },
        )?;
        let text = self.deps.collaborators.narrative.generate(&prompt).await?;

        Ok(StageOutput::new().with_text(keys::SECTOR_OVERVIEW, text))
    }

    fn placeholder(&self) -> StageOutput {
        StageOutput::new().with_text(
            keys::SECTOR_OVERVIEW,
            "A general overview of this sector is currently unavailable.",
        )
    }
}

// ---------------------------------------------------------------------------
// Stage 2: investor sentiment
// ---------------------------------------------------------------------------

/// Sector-level sentiment, analyst outlook, and institutional flows
pub struct SectorSentimentStage {
    deps: StageContext,
}

impl SectorSentimentStage {
    pub fn new(deps: StageContext) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Stage for SectorSentimentStage {
    fn name(&self) -> &'static str {
        "sector-sentiment"
    }

    fn reads(&self) -> &'static [&'static str] {
        &[keys::ENTITY, keys::SECTOR_OVERVIEW]
    }

    fn writes(&self) -> &'static [&'static str] {
        &[keys::INVESTOR_SENTIMENT]
    }

    async fn run(&self, ctx: &ResearchContext) -> Result<StageOutput> {
        let sector = ctx.get_str_or(keys::ENTITY, "");
        let overview = ctx.get_str_or(keys::SECTOR_OVERVIEW, "");

        let query = format!("{sector} sector India investor sentiment analyst outlook");
        let hits = self
            .deps
            .collaborators
            .web
            .search(&query, self.deps.config.web_results.max(5))
            .await
            .unwrap_or_default();

        let prompt = self.deps.prompts.render(
            "sector_sentiment",
            vars! {
                sector => sector,
                overview => excerpt(overview, 500),
                hits => render_hits(&hits),
            },
        )?;
        let text = self.deps.collaborators.narrative.generate(&prompt).await?;

        Ok(StageOutput::new().with_text(keys::INVESTOR_SENTIMENT, text))
    }

    fn placeholder(&self) -> StageOutput {
        StageOutput::new().with_text(
            keys::INVESTOR_SENTIMENT,
            "Investor sentiment data for this sector is not available.",
        )
    }
}

// ---------------------------------------------------------------------------
// Stage 3: technical & valuation risk
// ---------------------------------------------------------------------------

/// Sector valuation and risk review; flags overvaluation mentions
pub struct SectorTechnicalStage {
    deps: StageContext,
}

impl SectorTechnicalStage {
    pub fn new(deps: StageContext) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Stage for SectorTechnicalStage {
    fn name(&self) -> &'static str {
        "sector-technical"
    }

    fn reads(&self) -> &'static [&'static str] {
        &[keys::ENTITY, keys::SECTOR_OVERVIEW, keys::INVESTOR_SENTIMENT]
    }

    fn writes(&self) -> &'static [&'static str] {
        &[keys::TECHNICAL_ANALYSIS, keys::SECTOR_WARNINGS]
    }

    async fn run(&self, ctx: &ResearchContext) -> Result<StageOutput> {
        let sector = ctx.get_str_or(keys::ENTITY, "");
        let n = self.deps.config.web_results;

        let valuation_query =
            format!("{sector} sector India P/E ratio valuation overvalued undervalued");
        let risks_query = format!("{sector} sector India risks challenges");

        let (valuation, risks) = tokio::join!(
            async {
                self.deps
                    .collaborators
                    .web
                    .search(&valuation_query, n)
                    .await
                    .unwrap_or_default()
            },
            async {
                self.deps
                    .collaborators
                    .web
                    .search(&risks_query, n)
                    .await
                    .unwrap_or_default()
            },
        );

        let prompt = self.deps.prompts.render(
            "sector_technical",
            vars! {
                sector => sector,
                valuation_hits => render_hits(&valuation),
                risk_hits => render_hits(&risks),
            },
        )?;
        let text = self.deps.collaborators.narrative.generate(&prompt).await?;

        let mut warnings: Vec<String> = Vec::new();
        if text.to_lowercase().contains("overvalued") {
            warnings.push("⚠️ Sector appears overvalued".to_string());
        }
        debug!(sector, warning_count = warnings.len(), "sector risk review done");

        Ok(StageOutput::new()
            .with_text(keys::TECHNICAL_ANALYSIS, text)
            .with_typed(keys::SECTOR_WARNINGS, &warnings)?)
    }

    fn placeholder(&self) -> StageOutput {
        StageOutput::new()
            .with_text(
                keys::TECHNICAL_ANALYSIS,
                "Technical analysis for this sector is not available.",
            )
            .with(keys::SECTOR_WARNINGS, serde_json::json!([]))
    }
}

// ---------------------------------------------------------------------------
// Stage 4: investment suggestion
// ---------------------------------------------------------------------------

/// Sector recommendation with a top-companies listing
pub struct SectorSuggestionStage {
    deps: StageContext,
}

impl SectorSuggestionStage {
    pub fn new(deps: StageContext) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Stage for SectorSuggestionStage {
    fn name(&self) -> &'static str {
        "sector-suggestion"
    }

    fn reads(&self) -> &'static [&'static str] {
        &[
            keys::QUERY,
            keys::ENTITY,
            keys::SECTOR_OVERVIEW,
            keys::INVESTOR_SENTIMENT,
            keys::TECHNICAL_ANALYSIS,
            keys::SECTOR_WARNINGS,
        ]
    }

    fn writes(&self) -> &'static [&'static str] {
        &[keys::RECOMMENDATION]
    }

    async fn run(&self, ctx: &ResearchContext) -> Result<StageOutput> {
        let sector = ctx.get_str_or(keys::ENTITY, "");
        let warnings: Vec<String> = ctx.get_typed(keys::SECTOR_WARNINGS)?.unwrap_or_default();

        let companies_query = format!("top {sector} companies India NSE BSE listed stocks best");
        let company_hits = self
            .deps
            .collaborators
            .web
            .search(&companies_query, self.deps.config.web_results.max(5))
            .await
            .unwrap_or_default();

        let warnings_block = if warnings.is_empty() {
            "None".to_string()
        } else {
            warnings.join(", ")
        };

        let prompt = self.deps.prompts.render(
            "sector_suggestion",
            vars! {
                query => ctx.get_str_or(keys::QUERY, ""),
                sector => sector,
                overview => ctx.get_str_or(keys::SECTOR_OVERVIEW, ""),
                sentiment => ctx.get_str_or(keys::INVESTOR_SENTIMENT, ""),
                technical => ctx.get_str_or(keys::TECHNICAL_ANALYSIS, ""),
                warnings => warnings_block,
                company_hits => render_hits(&company_hits),
            },
        )?;
        let text = self.deps.collaborators.narrative.generate(&prompt).await?;

        Ok(StageOutput::new()
            .with_text(keys::RECOMMENDATION, format!("{text}\n\n---\n\n{DISCLAIMER}")))
    }

    fn placeholder(&self) -> StageOutput {
        StageOutput::new().with_text(
            keys::RECOMMENDATION,
            format!(
                "An investment suggestion for this sector is currently unavailable.\n\n{DISCLAIMER}"
            ),
        )
    }
}
