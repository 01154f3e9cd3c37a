//! Company pipeline stages
//!
//! Seven stages, run in a fixed order: introduction, sector analysis,
//! trusted-source research, policy impact, investor sentiment, technical &
//! risk, recommendation. Each stage dispatches its independent sub-queries
//! concurrently but the stages themselves never overlap.

use async_trait::async_trait;
use research_core::context::keys;
use research_core::{ResearchContext, Result, Stage, StageOutput};
use research_quant::{IndicatorSnapshot, RiskFlags, evaluate};
use std::sync::Arc;
use tracing::debug;

use super::{DISCLAIMER, excerpt};
use crate::config::ResearchConfig;
use crate::engine::Collaborators;
use crate::prompts::{Prompts, render_hits, vars};
use crate::report::format_rupee;
use crate::sourcing::IndicatorSourcing;
use crate::symbols::SymbolResolver;

/// Shared handles every company stage needs
#[derive(Clone)]
pub struct StageContext {
    pub collaborators: Arc<Collaborators>,
    pub prompts: Arc<Prompts>,
    pub config: Arc<ResearchConfig>,
}

impl StageContext {
    fn web(&self) -> &dyn research_core::WebSearchService {
        self.collaborators.web.as_ref()
    }

    fn news(&self) -> &dyn research_core::NewsSearchService {
        self.collaborators.news.as_ref()
    }

    async fn narrate(&self, template: &str, vars: minijinja::Value) -> Result<String> {
        let prompt = self.prompts.render(template, vars)?;
        self.collaborators.narrative.generate(&prompt).await
    }
}

// ---------------------------------------------------------------------------
// Stage 1: company introduction
// ---------------------------------------------------------------------------

/// Introduces the company: overview, segments, locations
pub struct IntroStage {
    deps: StageContext,
}

impl IntroStage {
    pub fn new(deps: StageContext) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Stage for IntroStage {
    fn name(&self) -> &'static str {
        "company-intro"
    }

    fn reads(&self) -> &'static [&'static str] {
        &[keys::QUERY, keys::ENTITY]
    }

    fn writes(&self) -> &'static [&'static str] {
        &[keys::COMPANY_INTRO]
    }

    async fn run(&self, ctx: &ResearchContext) -> Result<StageOutput> {
        let entity = ctx.get_str_or(keys::ENTITY, ctx.get_str_or(keys::QUERY, ""));
        let n = self.deps.config.web_results;

        let overview_query = format!("{entity} company overview history headquarters India");
        let business_query = format!("{entity} business segments products services key activities");
        let location_query = format!("{entity} manufacturing plants offices locations India");

        let (overview, business, locations) = tokio::join!(
            self.deps.web().search(&overview_query, n),
            self.deps.web().search(&business_query, n),
            self.deps.web().search(&location_query, n.min(2)),
        );

        let text = self
            .deps
            .narrate(
                "company_intro",
                vars! {
                    entity => entity,
                    overview_hits => render_hits(&overview.unwrap_or_default()),
                    business_hits => render_hits(&business.unwrap_or_default()),
                    location_hits => render_hits(&locations.unwrap_or_default()),
                },
            )
            .await?;

        Ok(StageOutput::new().with_text(keys::COMPANY_INTRO, text))
    }

    fn placeholder(&self) -> StageOutput {
        StageOutput::new().with_text(
            keys::COMPANY_INTRO,
            "Company introduction is currently unavailable.",
        )
    }
}

// ---------------------------------------------------------------------------
// Stage 2: sector analysis
// ---------------------------------------------------------------------------

/// Identifies the company's sector from the introduction and analyzes it
pub struct SectorAnalysisStage {
    deps: StageContext,
}

impl SectorAnalysisStage {
    pub fn new(deps: StageContext) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Stage for SectorAnalysisStage {
    fn name(&self) -> &'static str {
        "sector-analyst"
    }

    fn reads(&self) -> &'static [&'static str] {
        &[keys::ENTITY, keys::COMPANY_INTRO]
    }

    fn writes(&self) -> &'static [&'static str] {
        &[keys::SECTOR_ANALYSIS, keys::SECTOR_NAME]
    }

    async fn run(&self, ctx: &ResearchContext) -> Result<StageOutput> {
        let entity = ctx.get_str_or(keys::ENTITY, "");
        let intro = ctx.get_str_or(keys::COMPANY_INTRO, "");

        // Identify the sector from the intro so generic names still land
        // in the right industry
        let prompt = self
            .deps
            .prompts
            .render("sector_identify", vars! { entity => entity, intro => intro })?;
        let identified = self.deps.collaborators.narrative.generate_json(&prompt).await?;

        let sector = identified
            .get("sector")
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("General")
            .to_string();
        let search_query = identified
            .get("search_query")
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| format!("{sector} sector trends India"), ToString::to_string);

        debug!(sector = %sector, "sector identified");

        let hits = self
            .deps
            .web()
            .search(&search_query, self.deps.config.web_results)
            .await
            .unwrap_or_default();

        let text = self
            .deps
            .narrate(
                "sector_summary",
                vars! {
                    entity => entity,
                    sector => sector.clone(),
                    hits => render_hits(&hits),
                },
            )
            .await?;

        Ok(StageOutput::new()
            .with_text(keys::SECTOR_ANALYSIS, text)
            .with_text(keys::SECTOR_NAME, sector))
    }

    fn placeholder(&self) -> StageOutput {
        StageOutput::new()
            .with_text(keys::SECTOR_ANALYSIS, "Sector analysis is currently unavailable.")
            .with_text(keys::SECTOR_NAME, "General")
    }
}

// ---------------------------------------------------------------------------
// Stage 3: trusted-source company research
// ---------------------------------------------------------------------------

/// Financials and news from trusted financial sites only
pub struct CompanyResearchStage {
    deps: StageContext,
}

impl CompanyResearchStage {
    pub fn new(deps: StageContext) -> Self {
        Self { deps }
    }
}

/// Sites the research query is restricted to
const TRUSTED_SITES: &str =
    "site:moneycontrol.com OR site:screener.in OR site:economictimes.indiatimes.com";

#[async_trait]
impl Stage for CompanyResearchStage {
    fn name(&self) -> &'static str {
        "company-researcher"
    }

    fn reads(&self) -> &'static [&'static str] {
        &[keys::ENTITY]
    }

    fn writes(&self) -> &'static [&'static str] {
        &[keys::COMPANY_RESEARCH]
    }

    async fn run(&self, ctx: &ResearchContext) -> Result<StageOutput> {
        let entity = ctx.get_str_or(keys::ENTITY, "");

        let query = format!("{entity} quarterly results news ({TRUSTED_SITES})");
        let hits = self
            .deps
            .web()
            .search(&query, self.deps.config.web_results.max(5))
            .await
            .unwrap_or_default();

        let summary = self
            .deps
            .narrate(
                "company_research",
                vars! { entity => entity, hits => render_hits(&hits) },
            )
            .await?;

        let body = format!("**Company: {entity}**\n\n{summary}");
        Ok(StageOutput::new().with_text(keys::COMPANY_RESEARCH, body))
    }

    fn placeholder(&self) -> StageOutput {
        StageOutput::new().with_text(
            keys::COMPANY_RESEARCH,
            "Company research is currently unavailable.",
        )
    }
}

// ---------------------------------------------------------------------------
// Stage 4: policy impact
// ---------------------------------------------------------------------------

/// Government policies and regulations affecting the company
pub struct PolicyImpactStage {
    deps: StageContext,
}

impl PolicyImpactStage {
    pub fn new(deps: StageContext) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Stage for PolicyImpactStage {
    fn name(&self) -> &'static str {
        "policy-watchdog"
    }

    fn reads(&self) -> &'static [&'static str] {
        &[keys::ENTITY, keys::SECTOR_NAME]
    }

    fn writes(&self) -> &'static [&'static str] {
        &[keys::POLICY_IMPACT]
    }

    async fn run(&self, ctx: &ResearchContext) -> Result<StageOutput> {
        let entity = ctx.get_str_or(keys::ENTITY, "");
        let sector = ctx.get_str_or(keys::SECTOR_NAME, "general");

        let sector_query = format!("government policy {sector} India");
        let company_query = format!("{entity} government policy regulation news");

        let (sector_news, company_news) = tokio::join!(
            self.deps.news().search(&sector_query, self.deps.config.news_results),
            self.deps.web().search(&company_query, 2),
        );

        let mut hits = sector_news.unwrap_or_default();
        hits.extend(company_news.unwrap_or_default());

        let text = self
            .deps
            .narrate(
                "policy_impact",
                vars! { entity => entity, sector => sector, hits => render_hits(&hits) },
            )
            .await?;

        Ok(StageOutput::new().with_text(keys::POLICY_IMPACT, format!("**Policy Impact:**\n\n{text}")))
    }

    fn placeholder(&self) -> StageOutput {
        StageOutput::new().with_text(keys::POLICY_IMPACT, "No policy analysis available.")
    }
}

// ---------------------------------------------------------------------------
// Stage 5: investor sentiment
// ---------------------------------------------------------------------------

/// Analyst ratings, institutional holdings, and market buzz
pub struct InvestorSentimentStage {
    deps: StageContext,
}

impl InvestorSentimentStage {
    pub fn new(deps: StageContext) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Stage for InvestorSentimentStage {
    fn name(&self) -> &'static str {
        "investor-sentiment"
    }

    fn reads(&self) -> &'static [&'static str] {
        &[keys::ENTITY]
    }

    fn writes(&self) -> &'static [&'static str] {
        &[keys::INVESTOR_SENTIMENT]
    }

    async fn run(&self, ctx: &ResearchContext) -> Result<StageOutput> {
        let entity = ctx.get_str_or(keys::ENTITY, "");
        let n = self.deps.config.web_results;

        let sentiment_query =
            format!("{entity} stock investor sentiment analyst rating buy sell hold");
        let holdings_query =
            format!("{entity} FII DII shareholding pattern institutional investors");
        let analyst_query =
            format!("{entity} stock target price analyst recommendation India NSE BSE rupees");

        let (sentiment, holdings, analysts) = tokio::join!(
            self.deps.web().search(&sentiment_query, n),
            self.deps.web().search(&holdings_query, n.min(2)),
            self.deps.web().search(&analyst_query, n.min(2)),
        );

        let text = self
            .deps
            .narrate(
                "investor_sentiment",
                vars! {
                    entity => entity,
                    sentiment_hits => render_hits(&sentiment.unwrap_or_default()),
                    holdings_hits => render_hits(&holdings.unwrap_or_default()),
                    analyst_hits => render_hits(&analysts.unwrap_or_default()),
                },
            )
            .await?;

        Ok(StageOutput::new().with_text(keys::INVESTOR_SENTIMENT, text))
    }

    fn placeholder(&self) -> StageOutput {
        StageOutput::new().with_text(
            keys::INVESTOR_SENTIMENT,
            "Investor sentiment data is not available.",
        )
    }
}

// ---------------------------------------------------------------------------
// Stage 6: technical analysis & risk check
// ---------------------------------------------------------------------------

/// Sources indicators, runs the risk rules, renders the technical summary
pub struct TechnicalRiskStage {
    deps: StageContext,
    resolver: SymbolResolver,
}

impl TechnicalRiskStage {
    pub fn new(deps: StageContext, resolver: SymbolResolver) -> Self {
        Self { deps, resolver }
    }
}

#[async_trait]
impl Stage for TechnicalRiskStage {
    fn name(&self) -> &'static str {
        "technical-risk"
    }

    fn reads(&self) -> &'static [&'static str] {
        &[keys::ENTITY, keys::COMPANY_RESEARCH, keys::INVESTOR_SENTIMENT]
    }

    fn writes(&self) -> &'static [&'static str] {
        &[keys::TECHNICAL_ANALYSIS, keys::INDICATORS, keys::RISK_FLAGS]
    }

    async fn run(&self, ctx: &ResearchContext) -> Result<StageOutput> {
        let entity = ctx.get_str_or(keys::ENTITY, "");
        let research = ctx.get_str_or(keys::COMPANY_RESEARCH, "");
        let sentiment = ctx.get_str_or(keys::INVESTOR_SENTIMENT, "");

        let ticker = self.resolver.resolve(entity);
        debug!(entity, ticker = ?ticker, "ticker resolution");

        let background = format!(
            "{}\n\n{}",
            excerpt(research, 500),
            excerpt(sentiment, 500)
        );

        let sourcing =
            IndicatorSourcing::new(&self.deps.collaborators, &self.deps.prompts, &self.deps.config);
        let sourced = sourcing
            .assemble(entity, ticker.as_deref(), &background)
            .await;

        let flags = evaluate(
            &sourced.snapshot,
            sourced.negative_news,
            sourced.negative_news_summary.as_deref(),
        );

        let summary = render_technical_summary(entity, &sourced.snapshot, &flags);

        Ok(StageOutput::new()
            .with_text(keys::TECHNICAL_ANALYSIS, summary)
            .with_typed(keys::INDICATORS, &sourced.snapshot)?
            .with_typed(keys::RISK_FLAGS, &flags)?)
    }

    fn placeholder(&self) -> StageOutput {
        StageOutput::new()
            .with_text(keys::TECHNICAL_ANALYSIS, "Technical analysis is not available.")
            .with(
                keys::INDICATORS,
                serde_json::to_value(IndicatorSnapshot::default()).unwrap_or_default(),
            )
            .with(
                keys::RISK_FLAGS,
                serde_json::to_value(RiskFlags::default()).unwrap_or_default(),
            )
    }
}

/// Trend verdict from the moving-average structure
fn technical_verdict(snapshot: &IndicatorSnapshot) -> &'static str {
    match (
        snapshot.current_price,
        snapshot.moving_avg_50,
        snapshot.moving_avg_200,
    ) {
        (Some(price), Some(ma50), Some(ma200)) => {
            if price > ma200 && ma50 > ma200 {
                "BULLISH"
            } else if price < ma200 && ma50 < ma200 {
                "BEARISH"
            } else {
                "NEUTRAL"
            }
        }
        _ => "NEUTRAL",
    }
}

/// Markdown tables of indicators, levels, targets, and risk metrics
fn render_technical_summary(
    entity: &str,
    snapshot: &IndicatorSnapshot,
    flags: &RiskFlags,
) -> String {
    let rsi = snapshot
        .rsi_14
        .map_or_else(|| "N/A".to_string(), |v| format!("{v:.1}"));
    let pe = snapshot
        .pe_ratio
        .map_or_else(|| "N/A".to_string(), |v| format!("{v:.1}"));
    let beta = snapshot
        .beta
        .map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"));

    format!(
        "**📈 Technical Analysis for {entity}**

**Key Indicators**

| Indicator | Value | What it means |
|-----------|-------|---------------|
| RSI (14-day) | {rsi} | *Momentum meter: below 30 is oversold, above 70 is overbought.* |
| P/E Ratio | {pe} | *Years of earnings paid per share; lower is usually cheaper.* |
| EPS | {eps} | *Profit per share; higher means more profitable.* |

**Moving Averages & Levels**

| Level | Price | Meaning |
|-------|-------|---------|
| 50-Day MA | {ma50} | *Short-term trend; price above it is short-term bullish.* |
| 200-Day MA | {ma200} | *Long-term trend; price above it is long-term bullish.* |
| Support | {support} | *Price floor the stock tends to bounce up from.* |
| Resistance | {resistance} | *Price ceiling the stock struggles to clear.* |

**Analyst Targets (₹)**

| Target | Price |
|--------|-------|
| Low | {target_low} |
| Average | {target_avg} |
| High | {target_high} |

**Volatility & Risk Metrics**

| Metric | Value |
|--------|-------|
| Beta | {beta} |
| 52-Week Range | {low_52} - {high_52} |

**Technical Verdict: {verdict}**

**🚨 RISK CHECK**

{risk}",
        entity = entity,
        rsi = rsi,
        pe = pe,
        eps = format_rupee(snapshot.eps),
        ma50 = format_rupee(snapshot.moving_avg_50),
        ma200 = format_rupee(snapshot.moving_avg_200),
        support = format_rupee(snapshot.support_level),
        resistance = format_rupee(snapshot.resistance_level),
        target_low = format_rupee(snapshot.target_low),
        target_avg = format_rupee(snapshot.target_avg),
        target_high = format_rupee(snapshot.target_high),
        beta = beta,
        low_52 = format_rupee(snapshot.week_52_low),
        high_52 = format_rupee(snapshot.week_52_high),
        verdict = technical_verdict(snapshot),
        risk = flags.summary(),
    )
}

// ---------------------------------------------------------------------------
// Stage 7: final recommendation
// ---------------------------------------------------------------------------

/// Risk-aware investment suggestion built from all earlier stages
pub struct RecommendationStage {
    deps: StageContext,
}

impl RecommendationStage {
    pub fn new(deps: StageContext) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Stage for RecommendationStage {
    fn name(&self) -> &'static str {
        "investment-suggestion"
    }

    fn reads(&self) -> &'static [&'static str] {
        &[
            keys::ENTITY,
            keys::CURRENT_DATE,
            keys::COMPANY_INTRO,
            keys::SECTOR_ANALYSIS,
            keys::COMPANY_RESEARCH,
            keys::POLICY_IMPACT,
            keys::INVESTOR_SENTIMENT,
            keys::TECHNICAL_ANALYSIS,
            keys::RISK_FLAGS,
        ]
    }

    fn writes(&self) -> &'static [&'static str] {
        &[keys::RECOMMENDATION]
    }

    async fn run(&self, ctx: &ResearchContext) -> Result<StageOutput> {
        let entity = ctx.get_str_or(keys::ENTITY, "");
        let flags: RiskFlags = ctx.get_typed(keys::RISK_FLAGS)?.unwrap_or_default();

        let text = self
            .deps
            .narrate(
                "recommendation",
                vars! {
                    entity => entity,
                    date => ctx.get_str_or(keys::CURRENT_DATE, ""),
                    risk_context => risk_context(&flags),
                    intro => ctx.get_str_or(keys::COMPANY_INTRO, ""),
                    sector_analysis => ctx.get_str_or(keys::SECTOR_ANALYSIS, ""),
                    research => ctx.get_str_or(keys::COMPANY_RESEARCH, ""),
                    policy => ctx.get_str_or(keys::POLICY_IMPACT, ""),
                    sentiment => ctx.get_str_or(keys::INVESTOR_SENTIMENT, ""),
                    technical => ctx.get_str_or(keys::TECHNICAL_ANALYSIS, ""),
                },
            )
            .await?;

        Ok(StageOutput::new()
            .with_text(keys::RECOMMENDATION, format!("{text}\n\n---\n\n{DISCLAIMER}")))
    }

    fn placeholder(&self) -> StageOutput {
        StageOutput::new().with_text(
            keys::RECOMMENDATION,
            format!(
                "An investment suggestion could not be generated for this run.\n\n{DISCLAIMER}"
            ),
        )
    }
}

/// Explicit branch per flag, so the advice always reflects the rules
fn risk_context(flags: &RiskFlags) -> String {
    let mut lines = Vec::new();
    if flags.negative_news {
        lines.push(
            "🚨 CRITICAL: NEGATIVE NEWS DETECTED - Must strongly warn against buying!".to_string(),
        );
    }
    if flags.overbought {
        lines.push("⚠️ WARNING: Stock is OVERBOUGHT (RSI > 70) - Wait for correction!".to_string());
    }
    if flags.speculative {
        lines.push(
            "⚡ ALERT: SPECULATIVE ZONE - High volatility, only for aggressive investors!"
                .to_string(),
        );
    }
    if flags.oversold {
        lines.push(
            "🟢 NOTE: Stock is OVERSOLD (RSI < 30) - Potential buying opportunity!".to_string(),
        );
    }
    if lines.is_empty() {
        return "No major risk flags detected.".to_string();
    }
    lines.join("\n")
}
