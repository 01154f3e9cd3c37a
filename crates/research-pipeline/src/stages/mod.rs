//! Stage implementations for the company and sector pipelines

pub mod company;
pub mod sector;

pub use company::{
    CompanyResearchStage, IntroStage, InvestorSentimentStage, PolicyImpactStage,
    RecommendationStage, SectorAnalysisStage, TechnicalRiskStage,
};
pub use sector::{
    SectorOverviewStage, SectorSentimentStage, SectorSuggestionStage, SectorTechnicalStage,
};

/// Appended to every recommendation section
pub const DISCLAIMER: &str = "\
⚠️ **IMPORTANT DISCLAIMER:**
This analysis is for educational purposes only and NOT financial advice.
Stock market investments are subject to market risks. Do your own research,
consult a SEBI-registered financial advisor, and never invest more than you
can afford to lose.";

/// Truncate a narrative excerpt for embedding into a later prompt
pub(crate) fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("short", 100), "short");
        assert_eq!(excerpt("abcdef", 3), "abc");
        // Multi-byte characters are not split
        assert_eq!(excerpt("₹₹₹₹", 2), "₹₹");
    }
}
