//! Accumulating context for a single research run
//!
//! The [`ResearchContext`] is a key-value store threaded through the stage
//! pipeline. It grows monotonically: stages append their outputs and later
//! stages read them, but entries are never removed or overwritten. Each run
//! owns its context exclusively; nothing is shared across runs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known context keys written by the pipelines
pub mod keys {
    /// The original user query
    pub const QUERY: &str = "query";
    /// The entity under research (company or sector name)
    pub const ENTITY: &str = "entity";
    /// Today's date, formatted for prompt freshness
    pub const CURRENT_DATE: &str = "current_date";

    /// Company pipeline: introduction narrative
    pub const COMPANY_INTRO: &str = "company_intro";
    /// Company pipeline: sector analysis narrative
    pub const SECTOR_ANALYSIS: &str = "sector_analysis";
    /// Company pipeline: identified primary sector name
    pub const SECTOR_NAME: &str = "sector_name";
    /// Company pipeline: trusted-source research narrative
    pub const COMPANY_RESEARCH: &str = "company_research";
    /// Company pipeline: policy impact narrative
    pub const POLICY_IMPACT: &str = "policy_impact";
    /// Investor sentiment narrative (both pipelines)
    pub const INVESTOR_SENTIMENT: &str = "investor_sentiment";
    /// Technical analysis narrative (both pipelines)
    pub const TECHNICAL_ANALYSIS: &str = "technical_analysis";
    /// Merged indicator snapshot, stored typed
    pub const INDICATORS: &str = "indicators";
    /// Risk flags derived by the rule engine, stored typed
    pub const RISK_FLAGS: &str = "risk_flags";
    /// Final recommendation narrative (both pipelines)
    pub const RECOMMENDATION: &str = "recommendation";

    /// Sector pipeline: general overview narrative
    pub const SECTOR_OVERVIEW: &str = "sector_overview";
    /// Sector pipeline: risk warning lines
    pub const SECTOR_WARNINGS: &str = "sector_warnings";
}

/// Context threaded through a pipeline run
///
/// Supports both untyped JSON values and typed accessors. Unlike a general
/// session store there is no removal: a key, once written, stays for the
/// rest of the run.
///
/// # Example
///
/// ```
/// use research_core::ResearchContext;
/// use research_core::context::keys;
///
/// let mut ctx = ResearchContext::new();
/// ctx.insert(keys::QUERY, serde_json::json!("Tell me about Tata Motors"));
/// assert_eq!(ctx.get_str(keys::QUERY), Some("Tell me about Tata Motors"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResearchContext {
    data: HashMap<String, serde_json::Value>,
}

impl ResearchContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value into the context
    ///
    /// Writing the same key twice indicates a stage composition bug; the
    /// first value is kept and the duplicate is logged and dropped.
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        let key = key.into();
        if self.data.contains_key(&key) {
            tracing::warn!(key = %key, "duplicate context write ignored");
            return;
        }
        self.data.insert(key, value);
    }

    /// Get a value from the context
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Get a string value from the context
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    /// Get a string value, or a fallback when missing or non-textual
    pub fn get_str_or<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.get_str(key).unwrap_or(fallback)
    }

    /// Insert a typed value into the context
    ///
    /// Serializes the value to JSON before storing.
    pub fn insert_typed<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> crate::Result<()> {
        let json_value = serde_json::to_value(value).map_err(|e| {
            crate::ResearchError::Pipeline(format!("failed to serialize context value: {e}"))
        })?;
        self.insert(key, json_value);
        Ok(())
    }

    /// Get a typed value from the context
    ///
    /// Deserializes the JSON value into the specified type.
    pub fn get_typed<T: for<'de> Deserialize<'de>>(&self, key: &str) -> crate::Result<Option<T>> {
        match self.data.get(key) {
            None => Ok(None),
            Some(value) => {
                let typed = serde_json::from_value(value.clone()).map_err(|e| {
                    crate::ResearchError::Pipeline(format!(
                        "failed to deserialize context value: {e}"
                    ))
                })?;
                Ok(Some(typed))
            }
        }
    }

    /// Check if a key exists in the context
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Get the number of entries in the context
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the context is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over all keys currently present
    pub fn key_names(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestData {
        value: i32,
        text: String,
    }

    #[test]
    fn test_basic_operations() {
        let mut ctx = ResearchContext::new();
        assert!(ctx.is_empty());

        ctx.insert("key", serde_json::json!("value"));
        assert_eq!(ctx.len(), 1);
        assert!(ctx.contains_key("key"));
        assert_eq!(ctx.get("key"), Some(&serde_json::json!("value")));
        assert_eq!(ctx.get_str("key"), Some("value"));
    }

    #[test]
    fn test_duplicate_write_keeps_first() {
        let mut ctx = ResearchContext::new();
        ctx.insert("key", serde_json::json!("first"));
        ctx.insert("key", serde_json::json!("second"));
        assert_eq!(ctx.get_str("key"), Some("first"));
    }

    #[test]
    fn test_typed_insert_get() {
        let mut ctx = ResearchContext::new();
        let data = TestData {
            value: 42,
            text: "hello".to_string(),
        };

        ctx.insert_typed("test", &data).unwrap();

        let retrieved: TestData = ctx.get_typed("test").unwrap().unwrap();
        assert_eq!(retrieved, data);
    }

    #[test]
    fn test_get_typed_missing_key() {
        let ctx = ResearchContext::new();
        let result: crate::Result<Option<TestData>> = ctx.get_typed("missing");
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_get_str_or_fallback() {
        let mut ctx = ResearchContext::new();
        ctx.insert("number", serde_json::json!(7));
        assert_eq!(ctx.get_str_or("missing", "n/a"), "n/a");
        assert_eq!(ctx.get_str_or("number", "n/a"), "n/a");
    }
}
