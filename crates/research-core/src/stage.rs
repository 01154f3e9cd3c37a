//! Stage trait for pipeline units
//!
//! A stage declares the context keys it reads and the keys it writes. The
//! executor uses these declarations to reject a composition in which a stage
//! would read a key no earlier stage produces, turning ordering mistakes
//! into build-time errors instead of silent empty reads.

use crate::{ResearchContext, Result};
use async_trait::async_trait;

/// Output of one stage: the values for every key the stage declared
#[derive(Debug, Clone, Default)]
pub struct StageOutput {
    entries: Vec<(String, serde_json::Value)>,
}

impl StageOutput {
    /// Create an empty output
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, consuming and returning self for chaining
    pub fn with(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.entries.push((key.into(), value));
        self
    }

    /// Add a text entry
    pub fn with_text(self, key: impl Into<String>, text: impl Into<String>) -> Self {
        let text: String = text.into();
        self.with(key, serde_json::Value::String(text))
    }

    /// Add a typed entry, serialized to JSON
    pub fn with_typed<T: serde::Serialize>(self, key: impl Into<String>, value: &T) -> Result<Self> {
        let json_value = serde_json::to_value(value).map_err(|e| {
            crate::ResearchError::Pipeline(format!("failed to serialize stage output: {e}"))
        })?;
        Ok(self.with(key, json_value))
    }

    /// Iterate over the entries in insertion order
    pub fn entries(&self) -> impl Iterator<Item = &(String, serde_json::Value)> {
        self.entries.iter()
    }

    /// Consume the output, yielding its entries
    pub fn into_entries(self) -> Vec<(String, serde_json::Value)> {
        self.entries
    }
}

/// A unit of the research pipeline
///
/// Stages run strictly in order; each receives the context accumulated by
/// all earlier stages. A stage must only read the keys it declares in
/// [`reads`](Stage::reads) and must produce every key it declares in
/// [`writes`](Stage::writes) — including in its placeholder output, so a
/// failed stage still satisfies downstream readers.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stable stage name, used for logging and report labels
    fn name(&self) -> &'static str;

    /// Context keys this stage reads; must be written by earlier stages
    /// or seeded into the initial context
    fn reads(&self) -> &'static [&'static str] {
        &[]
    }

    /// Context keys this stage writes
    fn writes(&self) -> &'static [&'static str];

    /// Run the stage against the accumulated context
    async fn run(&self, ctx: &ResearchContext) -> Result<StageOutput>;

    /// Output substituted when [`run`](Stage::run) fails
    ///
    /// Covers every declared write key so the pipeline always completes
    /// with a fully-populated context.
    fn placeholder(&self) -> StageOutput;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_preserves_insertion_order() {
        let out = StageOutput::new()
            .with_text("b", "second")
            .with_text("a", "first");

        let keys: Vec<&str> = out.entries().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_output_typed_entry() {
        #[derive(serde::Serialize)]
        struct Payload {
            n: u32,
        }

        let out = StageOutput::new()
            .with_typed("payload", &Payload { n: 3 })
            .unwrap();
        let entries = out.into_entries();
        assert_eq!(entries[0].1["n"], 3);
    }
}
