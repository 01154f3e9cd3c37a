//! Prompt templates for the narrative backend
//!
//! One minijinja template per narrative call, compiled once into a shared
//! environment. Search hits are pre-rendered into plain text blocks before
//! templating so the templates stay free of nested loops.

use minijinja::Environment;
use research_core::{ResearchError, Result, SearchHit};

const COMPANY_INTRO: &str = "\
You are an equity research assistant. Create a concise COMPANY INTRODUCTION for {{ entity }}.

COMPANY OVERVIEW SEARCH RESULTS:
{{ overview_hits }}

BUSINESS SEGMENTS SEARCH RESULTS:
{{ business_hits }}

LOCATIONS SEARCH RESULTS:
{{ location_hits }}

Cover: a 2-3 sentence overview (what it is, when founded, parent group if any),
key activities and business segments as bullet points, major locations, and
quick facts (industry, ownership type, exchange listing). This is an
introduction, not analysis. Keep it under 250 words.";

const SECTOR_IDENTIFY: &str = "\
You are a financial sector analyst.

Company: {{ entity }}

COMPANY INTRODUCTION (from previous research):
{{ intro }}

Based on the introduction, identify the PRIMARY sector this company belongs to
(e.g. Defence, Auto, IT, Pharma, Banking, FMCG) and craft a web search query
for that sector's trends in India.

Respond in JSON format:
{\"sector\": \"primary sector name\", \"search_query\": \"search query for sector trends\"}";

const SECTOR_SUMMARY: &str = "\
You are a sector analyst. Based on the search results below, provide a sector
analysis for the sector a company operates in.

Primary sector: {{ sector }}
Company in question: {{ entity }}

Search results:
{{ hits }}

Provide growth trends (market size, growth rate, key drivers) and a 2-3
sentence outlook with an explicit sentiment (positive/negative/neutral).
Keep it 150-200 words.";

const COMPANY_RESEARCH: &str = "\
You are a company research analyst. The search results below come from
trusted financial websites only.

Company: {{ entity }}

Search results:
{{ hits }}

Summarize: recent financial performance (revenue, profit if mentioned), key
news or developments, and stock price movement if mentioned. 3-4 sentences,
facts from the results only.";

const POLICY_IMPACT: &str = "\
You are a policy analyst. Based on the news results, identify government
policies or regulations that might impact this company.

Company: {{ entity }}
Sector: {{ sector }}

News results:
{{ hits }}

Address: recent policy changes affecting the sector, regulations or sanctions
to be aware of, and government incentives or subsidies. If nothing significant
appears, say \"No major policy changes identified.\" Keep it to 2-3 sentences.";

const INVESTOR_SENTIMENT: &str = "\
Provide an INVESTOR SENTIMENT analysis for {{ entity }}.
This is an Indian stock; all prices must be in Indian Rupees (₹), not dollars.

SENTIMENT SEARCH RESULTS:
{{ sentiment_hits }}

INSTITUTIONAL HOLDINGS RESULTS:
{{ holdings_hits }}

ANALYST RECOMMENDATION RESULTS:
{{ analyst_hits }}

Cover: overall sentiment (bullish/bearish/neutral), analyst buy/sell/hold
ratings with target range in ₹, FII/DII holding trends, market buzz, and a
1-10 sentiment score with justification. Keep it 150-200 words, data driven.";

const EXTRACT_INDICATORS: &str = "\
You are a technical analyst extracting structured data.
This is an Indian stock traded on NSE/BSE; all prices are in ₹.

KNOWN VALUES (authoritative, computed from market data — reuse verbatim):
{{ known }}

WEB SEARCH RESULTS (use only to fill fields that are null above):
{{ hits }}

BACKGROUND RESEARCH (context only, never overrides the known values):
{{ background }}

Respond in JSON with exactly these keys, using the known values whenever they
are not null and extracting from the search results otherwise. Use null for
anything unavailable:
{\"current_price\": null, \"rsi_14\": null, \"pe_ratio\": null, \"eps\": null,
 \"moving_avg_50\": null, \"moving_avg_200\": null, \"support_level\": null,
 \"resistance_level\": null, \"target_low\": null, \"target_avg\": null,
 \"target_high\": null, \"beta\": null, \"week_52_high\": null, \"week_52_low\": null}";

const NEGATIVE_NEWS: &str = "\
You are screening for red flags about {{ entity }}.

News search results:
{{ hits }}

Decide whether any result reports genuinely negative news about the company:
fraud, scam, major loss, bankruptcy, regulatory investigation, or a serious
warning. A routine dip or neutral coverage does not count.

Respond in JSON format:
{\"negative_news_found\": false, \"negative_news_summary\": \"\"}";

const EXTRACT_ENTITY: &str = "\
Extract the Indian company or stock name from this query:
\"{{ query }}\"

This is for Indian stocks (NSE/BSE) only. Return the FULL Indian company name.
Examples:
- \"Tell me about Reliance stock\" -> Reliance Industries Limited
- \"HAL stock\" -> Hindustan Aeronautics Limited (NOT Halliburton)
- \"SBI stock\" -> State Bank of India

Respond in JSON format: {\"entity\": \"full company name or Unknown\"}";

const RECOMMENDATION: &str = "\
You are a senior investment advisor with STRICT risk management.
Provide a comprehensive INVESTMENT SUGGESTION for {{ entity }} as of {{ date }}.

=== RISK FLAGS (critical - must address) ===
{{ risk_context }}

=== COMPANY INTRODUCTION ===
{{ intro }}

=== SECTOR ANALYSIS ===
{{ sector_analysis }}

=== COMPANY RESEARCH ===
{{ research }}

=== POLICY ANALYSIS ===
{{ policy }}

=== INVESTOR SENTIMENT ===
{{ sentiment }}

=== TECHNICAL ANALYSIS ===
{{ technical }}

Rules, in priority order:
1. Negative news detected -> recommend AVOID / DO NOT BUY.
2. Overbought -> recommend WAIT for a correction before buying.
3. Speculative zone -> recommend only for aggressive investors, with stop-loss.
4. Oversold -> may present as a potential buying opportunity.

Give an action (BUY/SELL/HOLD/WAIT), suitability per investment horizon,
strategy per risk profile, an entry view, and the key risks to watch.
Finish with a clear 2-3 sentence verdict.";

const SECTOR_OVERVIEW: &str = "\
You are a financial analyst specializing in Indian stock markets.

User query: \"{{ query }}\"
Sector: {{ sector }}
Current date: {{ date }}

LATEST NEWS:
{{ news_hits }}

SECTOR TRENDS:
{{ trend_hits }}

Provide a GENERAL OVERVIEW of the sector: its current state, recent
developments, and what is driving growth or decline. Keep it around 200 words.";

const SECTOR_SENTIMENT: &str = "\
Provide an INVESTOR SENTIMENT analysis for the {{ sector }} sector in India.

GENERAL OVERVIEW:
{{ overview }}

SENTIMENT SEARCH RESULTS:
{{ hits }}

Cover: overall sentiment (bullish/bearish/neutral), analyst outlook, FII/DII
flows, and a 1-10 sentiment score with justification. Keep it around 150 words.";

const SECTOR_TECHNICAL: &str = "\
Provide a technical analysis and risk assessment for the {{ sector }} sector
in India. All prices must be in ₹.

VALUATION RESULTS:
{{ valuation_hits }}

SECTOR RISK RESULTS:
{{ risk_hits }}

Cover: whether the sector looks overvalued or undervalued, the key risks it
faces, and any critical warnings. Keep it around 200 words.";

const SECTOR_SUGGESTION: &str = "\
You are a financial advisor for Indian stock markets.

User query: \"{{ query }}\"
Sector: {{ sector }}

GENERAL OVERVIEW:
{{ overview }}

INVESTOR SENTIMENT:
{{ sentiment }}

TECHNICAL ANALYSIS:
{{ technical }}

RISK WARNINGS:
{{ warnings }}

TOP COMPANIES SEARCH RESULTS:
{{ company_hits }}

Provide: a recommendation (BUY/HOLD/AVOID/CAUTIOUS), reasons to invest,
reasons to be cautious, 3-5 top companies to consider, and an investment
strategy for the sector. Keep it around 300 words.";

/// Compiled prompt environment shared by all stages
#[derive(Debug)]
pub struct Prompts {
    env: Environment<'static>,
}

impl Prompts {
    /// Compile the built-in templates
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        let templates = [
            ("company_intro", COMPANY_INTRO),
            ("sector_identify", SECTOR_IDENTIFY),
            ("sector_summary", SECTOR_SUMMARY),
            ("company_research", COMPANY_RESEARCH),
            ("policy_impact", POLICY_IMPACT),
            ("investor_sentiment", INVESTOR_SENTIMENT),
            ("extract_indicators", EXTRACT_INDICATORS),
            ("negative_news", NEGATIVE_NEWS),
            ("extract_entity", EXTRACT_ENTITY),
            ("recommendation", RECOMMENDATION),
            ("sector_overview", SECTOR_OVERVIEW),
            ("sector_sentiment", SECTOR_SENTIMENT),
            ("sector_technical", SECTOR_TECHNICAL),
            ("sector_suggestion", SECTOR_SUGGESTION),
        ];
        for (name, source) in templates {
            env.add_template(name, source)
                .map_err(|e| ResearchError::Config(format!("invalid template {name}: {e}")))?;
        }
        Ok(Self { env })
    }

    /// Render a template with the given variables
    pub fn render(&self, name: &str, vars: minijinja::Value) -> Result<String> {
        let template = self
            .env
            .get_template(name)
            .map_err(|e| ResearchError::Pipeline(format!("unknown template {name}: {e}")))?;
        template
            .render(vars)
            .map_err(|e| ResearchError::Pipeline(format!("render failed for {name}: {e}")))
    }
}

/// Render search hits as a plain text block for prompt embedding
pub fn render_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "(no results)".to_string();
    }
    hits.iter()
        .map(|h| format!("- {}: {} ({})", h.title, h.snippet, h.url))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Shorthand for building template variables
pub use minijinja::context as vars;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_templates_compile() {
        assert!(Prompts::new().is_ok());
    }

    #[test]
    fn test_render_with_variables() {
        let prompts = Prompts::new().unwrap();
        let text = prompts
            .render(
                "negative_news",
                vars! { entity => "Tata Motors", hits => "(no results)" },
            )
            .unwrap();
        assert!(text.contains("Tata Motors"));
        assert!(text.contains("negative_news_found"));
    }

    #[test]
    fn test_render_hits_formats_lines() {
        let hits = vec![SearchHit {
            title: "Results".to_string(),
            snippet: "Quarterly profit up".to_string(),
            url: "https://example.com".to_string(),
        }];
        let block = render_hits(&hits);
        assert!(block.contains("Results"));
        assert!(block.contains("https://example.com"));

        assert_eq!(render_hits(&[]), "(no results)");
    }

    #[test]
    fn test_unknown_template_is_an_error() {
        let prompts = Prompts::new().unwrap();
        assert!(prompts.render("nope", vars! {}).is_err());
    }
}
