//! Command-line interface for the research pipeline
//!
//! Builds the collaborator clients from environment variables, runs one
//! research query under a caller-level timeout, and prints the composite
//! report with an indicator summary table.

use anyhow::{Context, bail};
use clap::Parser;
use comfy_table::{Table, presets::UTF8_FULL};
use research_core::services::{NewsSearchService, WebSearchService};
use research_pipeline::api::{OpenAiNarrative, SearchApiClient, YahooMarketData};
use research_pipeline::report::{format_number, format_rupee};
use research_pipeline::{Collaborators, PipelineResult, ResearchConfig, ResearchEngine};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "research")]
#[command(about = "Multi-stage equity and sector research reports", long_about = None)]
struct Args {
    /// The research query, e.g. "Tell me about Tata Motors stock"
    query: String,

    /// Explicit entity name, overriding extraction from the query
    #[arg(short, long)]
    entity: Option<String>,

    /// Abort the whole run after this many seconds
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,

    /// Emit the full result as JSON instead of the rendered report
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    research_utils::init_tracing();

    let args = Args::parse();

    let narrative = OpenAiNarrative::from_env().context("narrative backend configuration")?;
    let search =
        Arc::new(SearchApiClient::from_env().context("search service configuration")?);

    let config = ResearchConfig::builder()
        .run_timeout(Duration::from_secs(args.timeout_secs))
        .build()
        .context("research configuration")?;

    let collaborators = Collaborators {
        narrative: Arc::new(narrative),
        web: Arc::clone(&search) as Arc<dyn WebSearchService>,
        news: search as Arc<dyn NewsSearchService>,
        market: Arc::new(YahooMarketData::new(config.quote_cache_ttl)),
    };

    let run_timeout = config.run_timeout;
    let engine = ResearchEngine::new(collaborators, config).context("engine construction")?;

    info!(query = %args.query, "starting research run");

    // The timeout aborts the whole run; a partially-applied context is
    // never observed by the caller
    let result = match tokio::time::timeout(
        run_timeout,
        engine.run_research(&args.query, args.entity.as_deref()),
    )
    .await
    {
        Ok(result) => result?,
        Err(_) => bail!("research run timed out after {}s", run_timeout.as_secs()),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&result);
    }

    Ok(())
}

fn print_report(result: &PipelineResult) {
    println!("{}", result.report);
    println!("{}", indicator_table(result));

    if !result.risk.is_clear() {
        println!("\nRisk warnings:");
        for warning in &result.risk.warnings {
            println!("  - {warning}");
        }
    }
}

fn indicator_table(result: &PipelineResult) -> Table {
    let snapshot = &result.indicators;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Indicator", "Value"]);

    let rows = [
        ("Price", format_rupee(snapshot.current_price)),
        ("RSI (14d)", format_number(snapshot.rsi_14)),
        ("MA 50", format_rupee(snapshot.moving_avg_50)),
        ("MA 200", format_rupee(snapshot.moving_avg_200)),
        ("Support", format_rupee(snapshot.support_level)),
        ("Resistance", format_rupee(snapshot.resistance_level)),
        ("P/E", format_number(snapshot.pe_ratio)),
        ("Beta", format_number(snapshot.beta)),
        (
            "52w Range",
            format!(
                "{} - {}",
                format_rupee(snapshot.week_52_low),
                format_rupee(snapshot.week_52_high)
            ),
        ),
    ];
    for (name, value) in rows {
        table.add_row(vec![name.to_string(), value]);
    }
    table
}
