//! Sequential stage executor
//!
//! Stages run one after another over a single accumulating context. The
//! executor enforces two guarantees: composition-time validation that every
//! stage only reads keys produced by strictly earlier stages (or seeded
//! initially), and run-time recovery that replaces a failed stage's output
//! with its documented placeholder so the pipeline always completes.

use std::collections::HashSet;
use std::sync::Arc;

use research_core::{ResearchContext, ResearchError, Result, Stage, StageOutput};
use tracing::{info, warn};

/// Executes an ordered list of stages over a shared context
pub struct PipelineExecutor {
    stages: Vec<Arc<dyn Stage>>,
}

impl std::fmt::Debug for PipelineExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineExecutor")
            .field("stages", &self.stages.len())
            .finish()
    }
}

impl PipelineExecutor {
    /// Build an executor, validating stage ordering
    ///
    /// `initial_keys` are the context keys seeded before the first stage
    /// (query, entity, date). Returns a fatal pipeline error when a stage
    /// reads a key no earlier stage writes, or when two stages write the
    /// same key.
    pub fn new(stages: Vec<Arc<dyn Stage>>, initial_keys: &[&str]) -> Result<Self> {
        let mut available: HashSet<String> = initial_keys.iter().map(ToString::to_string).collect();

        for stage in &stages {
            for read in stage.reads() {
                if !available.contains(*read) {
                    return Err(ResearchError::Pipeline(format!(
                        "stage '{}' reads key '{}' which no earlier stage writes",
                        stage.name(),
                        read
                    )));
                }
            }
            for write in stage.writes() {
                if !available.insert((*write).to_string()) {
                    return Err(ResearchError::Pipeline(format!(
                        "stage '{}' rewrites key '{}'",
                        stage.name(),
                        write
                    )));
                }
            }
        }

        Ok(Self { stages })
    }

    /// Number of stages in the pipeline
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the pipeline has no stages
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run all stages in order
    ///
    /// Strictly sequential: stage i+1 starts only after stage i returns.
    /// Stage failures are absorbed into placeholders; this method itself
    /// never fails.
    pub async fn execute(&self, mut ctx: ResearchContext) -> ResearchContext {
        for stage in &self.stages {
            let name = stage.name();
            info!(stage = name, "running stage");

            let output = match stage.run(&ctx).await {
                Ok(output) => output,
                Err(e) => {
                    warn!(stage = name, error = %e, "stage failed, substituting placeholder");
                    stage.placeholder()
                }
            };
            apply(&mut ctx, output);

            // A stage that under-delivers still owes its declared keys
            for write in stage.writes() {
                if !ctx.contains_key(write) {
                    warn!(stage = name, key = write, "declared key missing, backfilling");
                    apply(&mut ctx, stage.placeholder());
                    break;
                }
            }
        }
        ctx
    }
}

fn apply(ctx: &mut ResearchContext, output: StageOutput) {
    for (key, value) in output.into_entries() {
        ctx.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct RecordingStage {
        name: &'static str,
        reads: &'static [&'static str],
        writes: &'static [&'static str],
        fail: bool,
    }

    #[async_trait]
    impl Stage for RecordingStage {
        fn name(&self) -> &'static str {
            self.name
        }

        fn reads(&self) -> &'static [&'static str] {
            self.reads
        }

        fn writes(&self) -> &'static [&'static str] {
            self.writes
        }

        async fn run(&self, ctx: &ResearchContext) -> Result<StageOutput> {
            if self.fail {
                return Err(ResearchError::Narrative("backend down".to_string()));
            }
            // Every declared read must already be present when we run
            for read in self.reads {
                assert!(ctx.contains_key(read), "missing read key {read}");
            }
            let mut out = StageOutput::new();
            for write in self.writes {
                out = out.with_text(*write, format!("{} output", self.name));
            }
            Ok(out)
        }

        fn placeholder(&self) -> StageOutput {
            let mut out = StageOutput::new();
            for write in self.writes {
                out = out.with_text(*write, format!("{} unavailable", self.name));
            }
            out
        }
    }

    fn stage(
        name: &'static str,
        reads: &'static [&'static str],
        writes: &'static [&'static str],
    ) -> Arc<dyn Stage> {
        Arc::new(RecordingStage {
            name,
            reads,
            writes,
            fail: false,
        })
    }

    #[test]
    fn test_valid_composition() {
        let stages = vec![
            stage("first", &["query"], &["a"]),
            stage("second", &["a"], &["b"]),
        ];
        assert!(PipelineExecutor::new(stages, &["query"]).is_ok());
    }

    #[test]
    fn test_misordered_composition_rejected() {
        // "second" reads a key only written later
        let stages = vec![
            stage("second", &["a"], &["b"]),
            stage("first", &["query"], &["a"]),
        ];
        let err = PipelineExecutor::new(stages, &["query"]).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("second"));
    }

    #[test]
    fn test_duplicate_write_rejected() {
        let stages = vec![stage("first", &[], &["a"]), stage("dup", &[], &["a"])];
        assert!(PipelineExecutor::new(stages, &[]).is_err());
    }

    #[tokio::test]
    async fn test_sequential_execution_accumulates_context() {
        let stages = vec![
            stage("first", &["query"], &["a"]),
            stage("second", &["a"], &["b"]),
        ];
        let executor = PipelineExecutor::new(stages, &["query"]).unwrap();

        let mut ctx = ResearchContext::new();
        ctx.insert("query", serde_json::json!("q"));
        let ctx = executor.execute(ctx).await;

        assert_eq!(ctx.get_str("a"), Some("first output"));
        assert_eq!(ctx.get_str("b"), Some("second output"));
    }

    #[tokio::test]
    async fn test_failed_stage_yields_placeholder_and_run_completes() {
        let stages: Vec<Arc<dyn Stage>> = vec![
            Arc::new(RecordingStage {
                name: "broken",
                reads: &[],
                writes: &["a"],
                fail: true,
            }),
            stage("after", &["a"], &["b"]),
        ];
        let executor = PipelineExecutor::new(stages, &[]).unwrap();

        let ctx = executor.execute(ResearchContext::new()).await;
        assert_eq!(ctx.get_str("a"), Some("broken unavailable"));
        assert_eq!(ctx.get_str("b"), Some("after output"));
    }
}
