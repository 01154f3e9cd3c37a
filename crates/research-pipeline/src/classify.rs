//! Query classification and pipeline routing
//!
//! Distinguishes company-scoped queries ("Tell me about Tata Motors
//! stock") from sector-scoped ones ("Should I buy defence shares?").
//! Classification is a pure function over the injected alias and keyword
//! tables; routing applies a confidence threshold on top.

use std::sync::Arc;

use crate::tables::{SectorKeywordTable, SymbolTable};

/// Confidence assigned to a known-entity alias match
const COMPANY_ALIAS_CONFIDENCE: f64 = 0.9;
/// Confidence assigned to a qualified sector keyword match
const SECTOR_KEYWORD_CONFIDENCE: f64 = 0.85;
/// Confidence of the default classification
const DEFAULT_CONFIDENCE: f64 = 0.5;
/// Minimum confidence for the sector pipeline to be selected
const SECTOR_ROUTE_THRESHOLD: f64 = 0.7;

/// What kind of research the query asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// A single listed company
    Company,
    /// A whole sector or industry
    Sector,
}

/// Result of classifying one query
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub kind: QueryKind,
    pub entity: Option<String>,
    pub confidence: f64,
}

impl Classification {
    /// Whether routing selects the sector pipeline
    ///
    /// The company pipeline is the default: sector routing requires both a
    /// sector classification and confidence above the threshold.
    pub fn routes_to_sector(&self) -> bool {
        self.kind == QueryKind::Sector && self.confidence > SECTOR_ROUTE_THRESHOLD
    }
}

/// Classifies queries against the shared static tables
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    aliases: Arc<SymbolTable>,
    sectors: Arc<SectorKeywordTable>,
}

impl QueryClassifier {
    /// Create a classifier over shared alias and sector tables
    pub fn new(aliases: Arc<SymbolTable>, sectors: Arc<SectorKeywordTable>) -> Self {
        Self { aliases, sectors }
    }

    /// Classify a query as company- or sector-scoped
    ///
    /// Known entity aliases win over sector keywords, so "Tata Motors" is a
    /// company even though "motors" brushes against the auto sector. A
    /// sector keyword only counts when it co-occurs with a qualifying
    /// pattern ("<keyword> shares", "buy <keyword>", ...) — a bare mention
    /// is not enough to reroute the query.
    pub fn classify(&self, query: &str) -> Classification {
        let query_lower = query.to_lowercase();

        if let Some((alias, _ticker)) = self.aliases.find_in(&query_lower) {
            return Classification {
                kind: QueryKind::Company,
                entity: Some(title_case(alias)),
                confidence: COMPANY_ALIAS_CONFIDENCE,
            };
        }

        for (sector, keywords) in self.sectors.groups() {
            for keyword in keywords {
                if !query_lower.contains(keyword.as_str()) {
                    continue;
                }
                if sector_patterns(keyword).any(|pattern| query_lower.contains(&pattern)) {
                    return Classification {
                        kind: QueryKind::Sector,
                        entity: Some(sector.to_string()),
                        confidence: SECTOR_KEYWORD_CONFIDENCE,
                    };
                }
            }
        }

        Classification {
            kind: QueryKind::Company,
            entity: None,
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

/// Qualifying patterns that turn a keyword mention into a sector query
fn sector_patterns(keyword: &str) -> impl Iterator<Item = String> {
    [
        format!("{keyword} share"),
        format!("{keyword} shares"),
        format!("{keyword} stock"),
        format!("{keyword} stocks"),
        format!("{keyword} sector"),
        format!("{keyword} industry"),
        format!("{keyword} companies"),
        format!("buy {keyword}"),
        format!("invest in {keyword}"),
    ]
    .into_iter()
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{SectorKeywordTable, SymbolTable};

    fn classifier() -> QueryClassifier {
        QueryClassifier::new(SymbolTable::builtin(), SectorKeywordTable::builtin())
    }

    #[test]
    fn test_known_company_detection() {
        let c = classifier().classify("Tell me about Tata Motors stock");
        assert_eq!(c.kind, QueryKind::Company);
        assert!(c.entity.as_deref().unwrap().contains("Tata Motors"));
        assert!(c.confidence >= 0.9);
        assert!(!c.routes_to_sector());
    }

    #[test]
    fn test_sector_detection() {
        let c = classifier().classify("Should I buy defence shares?");
        assert_eq!(c.kind, QueryKind::Sector);
        assert_eq!(c.entity.as_deref(), Some("Defence"));
        assert!(c.confidence >= 0.85);
        assert!(c.routes_to_sector());
    }

    #[test]
    fn test_unknown_query_defaults_to_company() {
        let c = classifier().classify("Should I buy Zzzcorp?");
        assert_eq!(c.kind, QueryKind::Company);
        assert_eq!(c.entity, None);
        assert_eq!(c.confidence, 0.5);
        assert!(!c.routes_to_sector());
    }

    #[test]
    fn test_bare_keyword_mention_is_not_a_sector_query() {
        // "power" appears but with no qualifying pattern around it
        let c = classifier().classify("What gives this device its power?");
        assert_eq!(c.kind, QueryKind::Company);
        assert_eq!(c.confidence, 0.5);
    }

    #[test]
    fn test_company_alias_wins_over_sector_keyword() {
        // "tata steel" is an alias even though "steel" is a sector keyword
        let c = classifier().classify("Is Tata Steel stock worth buying?");
        assert_eq!(c.kind, QueryKind::Company);
        assert!(c.entity.as_deref().unwrap().contains("Tata Steel"));
    }

    #[test]
    fn test_invest_in_pattern() {
        let c = classifier().classify("Should I invest in banking this year?");
        assert_eq!(c.kind, QueryKind::Sector);
        assert_eq!(c.entity.as_deref(), Some("Banking"));
    }

    #[test]
    fn test_classification_is_pure() {
        let classifier = classifier();
        let first = classifier.classify("pharma stocks outlook");
        for _ in 0..5 {
            assert_eq!(classifier.classify("pharma stocks outlook"), first);
        }
    }
}
