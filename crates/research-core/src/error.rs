//! Error types shared across the research workspace
//!
//! The taxonomy distinguishes stage-local failures, which every stage
//! recovers from by substituting its placeholder output, from pre-pipeline
//! failures, which surface to the caller. Only `Pipeline` and `Config`
//! errors are fatal.

use thiserror::Error;

/// Result type alias for research operations
pub type Result<T> = std::result::Result<T, ResearchError>;

/// Error type for research pipeline operations
#[derive(Debug, Error)]
pub enum ResearchError {
    /// No ticker could be resolved for an entity name.
    /// Non-fatal: sourcing degrades to the narrative-only tier.
    #[error("could not resolve a ticker for {entity}")]
    Resolution { entity: String },

    /// Market data provider call failed or returned nothing.
    /// Non-fatal: indicators fall back to narrative-extracted values.
    #[error("market data unavailable for {ticker}: {reason}")]
    ProviderUnavailable { ticker: String, reason: String },

    /// Narrative backend call failed.
    /// Non-fatal: the owning stage substitutes its placeholder output.
    #[error("narrative service error: {0}")]
    Narrative(String),

    /// Web or news search call failed.
    /// Non-fatal: the affected sub-query contributes no hits.
    #[error("search service error: {0}")]
    Search(String),

    /// Pre-pipeline failure (empty query, invalid stage composition).
    /// Fatal: surfaced to the caller with the original input.
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// Provider or engine construction failed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ResearchError {
    /// Whether the error aborts the run instead of degrading locally
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Pipeline(_) | Self::Config(_))
    }
}
