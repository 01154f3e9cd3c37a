//! Staged equity/sector research pipeline
//!
//! This crate turns a free-text market query into a multi-section research
//! report. A query is classified as company- or sector-scoped and routed to
//! the matching pipeline: seven stages for a company (introduction, sector
//! analysis, trusted-source research, policy impact, investor sentiment,
//! technical & risk, recommendation), four for a sector (overview,
//! sentiment, technical & valuation, suggestion).
//!
//! Stages run strictly in order over one accumulating
//! [`ResearchContext`](research_core::ResearchContext). Quantitative data is
//! sourced in two tiers — market-data provider first, narrative extraction
//! filling the gaps — and the deterministic risk rule engine derives
//! warnings that narrative text can never override. A stage failure never
//! aborts the run: the executor substitutes the stage's documented
//! placeholder and carries on.
//!
//! # Example
//!
//! ```rust,ignore
//! use research_pipeline::{Collaborators, ResearchConfig, ResearchEngine};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let collaborators = Collaborators {
//!         narrative: Arc::new(/* narrative backend */),
//!         web: Arc::new(/* web search */),
//!         news: Arc::new(/* news search */),
//!         market: Arc::new(/* market data */),
//!     };
//!
//!     let engine = ResearchEngine::new(collaborators, ResearchConfig::default())?;
//!     let result = engine.run_research("Tell me about Tata Motors stock", None).await?;
//!     println!("{}", result.report);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod classify;
pub mod config;
pub mod engine;
pub mod executor;
pub mod prompts;
pub mod report;
pub mod sourcing;
pub mod stages;
pub mod symbols;
pub mod tables;

// Re-export main types for convenience
pub use classify::{Classification, QueryClassifier, QueryKind};
pub use config::ResearchConfig;
pub use engine::{Collaborators, ResearchEngine};
pub use executor::PipelineExecutor;
pub use prompts::Prompts;
pub use report::{PipelineKind, PipelineResult, ReportSection};
pub use symbols::SymbolResolver;
pub use tables::{SectorKeywordTable, SymbolTable};
