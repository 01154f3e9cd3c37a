//! Entity name → ticker resolution
//!
//! Resolution never fails: when the alias table has no entry, the ticker is
//! derived lexically, and a `None` result just means downstream sourcing
//! skips the provider tier.

use std::sync::Arc;

use crate::tables::SymbolTable;

/// Resolves free-text entity names to exchange tickers
#[derive(Debug, Clone)]
pub struct SymbolResolver {
    table: Arc<SymbolTable>,
}

impl SymbolResolver {
    /// Create a resolver over a shared alias table
    pub fn new(table: Arc<SymbolTable>) -> Self {
        Self { table }
    }

    /// Resolve an entity name to a ticker
    ///
    /// Order: alias-table lookup, then an acronym of capitalized word
    /// initials (2–6 letters), then the first word if it is alphabetic and
    /// 3–10 letters. Pure and stable: the same name always yields the same
    /// ticker.
    pub fn resolve(&self, entity: &str) -> Option<String> {
        let normalized = entity.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        if let Some((_, ticker)) = self.table.find_in(&normalized) {
            return Some(ticker.to_string());
        }

        let words: Vec<&str> = entity.split_whitespace().collect();

        if words.len() >= 2 {
            let acronym: String = words
                .iter()
                .filter_map(|w| w.chars().next())
                .map(|c| c.to_ascii_uppercase())
                .collect();
            if (2..=6).contains(&acronym.len()) && acronym.chars().all(|c| c.is_ascii_alphabetic())
            {
                return Some(acronym);
            }
        }

        if let Some(first) = words.first() {
            let candidate = first.to_uppercase();
            if (3..=10).contains(&candidate.len())
                && candidate.chars().all(|c| c.is_ascii_alphabetic())
            {
                return Some(candidate);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> SymbolResolver {
        SymbolResolver::new(SymbolTable::builtin())
    }

    #[test]
    fn test_alias_lookup() {
        let r = resolver();
        assert_eq!(r.resolve("Tata Motors Limited"), Some("TATAMOTORS".into()));
        assert_eq!(
            r.resolve("Hindustan Aeronautics Limited"),
            Some("HAL".into())
        );
        assert_eq!(r.resolve("State Bank of India"), Some("SBIN".into()));
    }

    #[test]
    fn test_acronym_fallback() {
        let r = resolver();
        // Unknown multi-word name falls back to its initials
        assert_eq!(r.resolve("Quantum Fusion Labs"), Some("QFL".into()));
    }

    #[test]
    fn test_first_word_fallback() {
        let r = resolver();
        assert_eq!(r.resolve("Zzzcorp"), Some("ZZZCORP".into()));
    }

    #[test]
    fn test_unresolvable_names() {
        let r = resolver();
        assert_eq!(r.resolve(""), None);
        assert_eq!(r.resolve("   "), None);
        // First word too short, too few words for an acronym
        assert_eq!(r.resolve("Io"), None);
        // Numeric tokens produce neither an acronym nor a first-word ticker
        assert_eq!(r.resolve("42"), None);
    }

    #[test]
    fn test_resolution_is_stable() {
        let r = resolver();
        let first = r.resolve("Quantum Fusion Labs");
        for _ in 0..10 {
            assert_eq!(r.resolve("Quantum Fusion Labs"), first);
        }
    }
}
