//! Research engine: classification, routing, and run assembly
//!
//! The engine owns the collaborator handles, the static tables, and the
//! prompt environment, and exposes one entry point:
//! [`ResearchEngine::run_research`]. Each call creates a fresh context,
//! routes the query to the company or sector pipeline, executes it, and
//! assembles the terminal [`PipelineResult`]. Concurrent runs share
//! nothing mutable.

use std::sync::Arc;

use chrono::Utc;
use research_core::context::keys;
use research_core::{
    MarketDataService, NarrativeService, NewsSearchService, ResearchContext, ResearchError, Result,
    Stage, WebSearchService,
};
use research_quant::{IndicatorSnapshot, RiskFlags};
use tracing::{info, warn};

use crate::classify::QueryClassifier;
use crate::config::ResearchConfig;
use crate::executor::PipelineExecutor;
use crate::prompts::{Prompts, vars};
use crate::report::{PipelineKind, PipelineResult, ReportSection};
use crate::stages::company::StageContext;
use crate::stages::{
    CompanyResearchStage, IntroStage, InvestorSentimentStage, PolicyImpactStage,
    RecommendationStage, SectorAnalysisStage, SectorOverviewStage, SectorSentimentStage,
    SectorSuggestionStage, SectorTechnicalStage, TechnicalRiskStage,
};
use crate::symbols::SymbolResolver;
use crate::tables::{SectorKeywordTable, SymbolTable};

/// External collaborators the pipeline consumes
#[derive(Clone)]
pub struct Collaborators {
    pub narrative: Arc<dyn NarrativeService>,
    pub web: Arc<dyn WebSearchService>,
    pub news: Arc<dyn NewsSearchService>,
    pub market: Arc<dyn MarketDataService>,
}

/// Entry point for research runs
pub struct ResearchEngine {
    collaborators: Arc<Collaborators>,
    prompts: Arc<Prompts>,
    config: Arc<ResearchConfig>,
    classifier: QueryClassifier,
    resolver: SymbolResolver,
}

impl ResearchEngine {
    /// Create an engine over the built-in alias and sector tables
    pub fn new(collaborators: Collaborators, config: ResearchConfig) -> Result<Self> {
        Self::with_tables(
            collaborators,
            config,
            SymbolTable::builtin(),
            SectorKeywordTable::builtin(),
        )
    }

    /// Create an engine with explicit tables (test fixtures)
    pub fn with_tables(
        collaborators: Collaborators,
        config: ResearchConfig,
        aliases: Arc<SymbolTable>,
        sectors: Arc<SectorKeywordTable>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            collaborators: Arc::new(collaborators),
            prompts: Arc::new(Prompts::new()?),
            config: Arc::new(config),
            classifier: QueryClassifier::new(Arc::clone(&aliases), sectors),
            resolver: SymbolResolver::new(aliases),
        })
    }

    /// Configuration in effect for this engine
    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Run research for one query
    ///
    /// Routes to the company or sector pipeline and always produces a
    /// complete result; only pre-pipeline failures (blank query, invalid
    /// composition) surface as errors.
    pub async fn run_research(
        &self,
        query: &str,
        explicit_entity: Option<&str>,
    ) -> Result<PipelineResult> {
        if query.trim().is_empty() {
            return Err(ResearchError::Pipeline(format!(
                "cannot research an empty query (received {query:?})"
            )));
        }

        let classification = self.classifier.classify(query);
        info!(
            kind = ?classification.kind,
            entity = ?classification.entity,
            confidence = classification.confidence,
            "query classified"
        );

        if classification.routes_to_sector() {
            let sector = classification
                .entity
                .clone()
                .unwrap_or_else(|| query.trim().to_string());
            return self.run_sector(query, &sector).await;
        }

        let entity = match explicit_entity {
            Some(entity) => entity.to_string(),
            None => match classification.entity {
                Some(entity) => entity,
                None => self.extract_entity(query).await,
            },
        };

        self.run_company(query, &entity).await
    }

    /// Execute the seven-stage company pipeline
    async fn run_company(&self, query: &str, entity: &str) -> Result<PipelineResult> {
        let deps = self.stage_context();
        let stages: Vec<Arc<dyn Stage>> = vec![
            Arc::new(IntroStage::new(deps.clone())),
            Arc::new(SectorAnalysisStage::new(deps.clone())),
            Arc::new(CompanyResearchStage::new(deps.clone())),
            Arc::new(PolicyImpactStage::new(deps.clone())),
            Arc::new(InvestorSentimentStage::new(deps.clone())),
            Arc::new(TechnicalRiskStage::new(deps.clone(), self.resolver.clone())),
            Arc::new(RecommendationStage::new(deps)),
        ];

        let executor = PipelineExecutor::new(stages, INITIAL_KEYS)?;
        let ctx = executor.execute(self.seed_context(query, entity)).await;

        let indicators: IndicatorSnapshot = ctx.get_typed(keys::INDICATORS)?.unwrap_or_default();
        let risk: RiskFlags = ctx.get_typed(keys::RISK_FLAGS)?.unwrap_or_default();

        let sections = vec![
            section(&ctx, "Company Introduction", keys::COMPANY_INTRO),
            section(&ctx, "Sector Analysis", keys::SECTOR_ANALYSIS),
            section(&ctx, "Company Research", keys::COMPANY_RESEARCH),
            section(&ctx, "Policy Analysis", keys::POLICY_IMPACT),
            section(&ctx, "Investor Sentiment", keys::INVESTOR_SENTIMENT),
            section(&ctx, "Technical Analysis & Risk Check", keys::TECHNICAL_ANALYSIS),
            section(&ctx, "Investment Suggestion", keys::RECOMMENDATION),
        ];

        Ok(PipelineResult::new(
            query,
            entity,
            PipelineKind::Company,
            sections,
            indicators,
            risk,
        ))
    }

    /// Execute the four-stage sector pipeline
    async fn run_sector(&self, query: &str, sector: &str) -> Result<PipelineResult> {
        let deps = self.stage_context();
        let stages: Vec<Arc<dyn Stage>> = vec![
            Arc::new(SectorOverviewStage::new(deps.clone())),
            Arc::new(SectorSentimentStage::new(deps.clone())),
            Arc::new(SectorTechnicalStage::new(deps.clone())),
            Arc::new(SectorSuggestionStage::new(deps)),
        ];

        let executor = PipelineExecutor::new(stages, INITIAL_KEYS)?;
        let ctx = executor.execute(self.seed_context(query, sector)).await;

        let warnings: Vec<String> = ctx.get_typed(keys::SECTOR_WARNINGS)?.unwrap_or_default();
        let risk = RiskFlags {
            warnings,
            ..RiskFlags::default()
        };

        let sections = vec![
            section(&ctx, "General Overview", keys::SECTOR_OVERVIEW),
            section(&ctx, "Investor Sentiment", keys::INVESTOR_SENTIMENT),
            section(&ctx, "Technical Analysis & Risk Check", keys::TECHNICAL_ANALYSIS),
            section(&ctx, "Investment Suggestion", keys::RECOMMENDATION),
        ];

        Ok(PipelineResult::new(
            query,
            sector,
            PipelineKind::Sector,
            sections,
            IndicatorSnapshot::default(),
            risk,
        ))
    }

    fn stage_context(&self) -> StageContext {
        StageContext {
            collaborators: Arc::clone(&self.collaborators),
            prompts: Arc::clone(&self.prompts),
            config: Arc::clone(&self.config),
        }
    }

    fn seed_context(&self, query: &str, entity: &str) -> ResearchContext {
        let mut ctx = ResearchContext::new();
        ctx.insert(keys::QUERY, serde_json::json!(query));
        ctx.insert(keys::ENTITY, serde_json::json!(entity));
        ctx.insert(
            keys::CURRENT_DATE,
            serde_json::json!(Utc::now().format("%A, %d %B %Y").to_string()),
        );
        ctx
    }

    /// Extract the company name from a free-form query
    ///
    /// Tries a structured narrative call first; falls back to a stop-word
    /// filter over the query so extraction works even with the backend
    /// down.
    async fn extract_entity(&self, query: &str) -> String {
        let prompt = self
            .prompts
            .render("extract_entity", vars! { query => query });
        if let Ok(prompt) = prompt {
            match self.collaborators.narrative.generate_json(&prompt).await {
                Ok(value) => {
                    if let Some(entity) = value
                        .get("entity")
                        .and_then(serde_json::Value::as_str)
                        .map(str::trim)
                        .filter(|e| !e.is_empty() && !e.eq_ignore_ascii_case("unknown"))
                    {
                        return entity.to_string();
                    }
                }
                Err(e) => warn!(error = %e, "entity extraction failed, using lexical fallback"),
            }
        }
        lexical_entity(query)
    }
}

/// Keys seeded into the context before the first stage
const INITIAL_KEYS: &[&str] = &[keys::QUERY, keys::ENTITY, keys::CURRENT_DATE];

fn section(ctx: &ResearchContext, title: &str, key: &str) -> ReportSection {
    ReportSection::new(title, ctx.get_str_or(key, "Not available."))
}

/// Deterministic fallback: keep the first significant words of the query
fn lexical_entity(query: &str) -> String {
    const STOP_WORDS: &[&str] = &[
        "tell", "me", "about", "what", "is", "the", "stock", "share", "shares", "suggest", "how",
        "future", "price", "analysis", "give", "show", "check", "find", "get", "of", "for", "a",
        "an", "should", "i", "buy", "sell", "in", "on", "to",
    ];

    let words: Vec<String> = query
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '&'))
        .filter(|w| w.len() > 2 && !STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .take(2)
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();

    if words.is_empty() {
        query.trim().to_string()
    } else {
        words.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexical_entity_strips_stop_words() {
        assert_eq!(lexical_entity("Tell me about Zzzcorp stock"), "Zzzcorp");
        assert_eq!(
            lexical_entity("should i buy quantum fusion shares"),
            "Quantum Fusion"
        );
    }

    #[test]
    fn test_lexical_entity_keeps_query_when_nothing_survives() {
        assert_eq!(lexical_entity("buy it"), "buy it");
    }
}
