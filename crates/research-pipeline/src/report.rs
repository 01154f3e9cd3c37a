//! Terminal result aggregate and report assembly

use chrono::{DateTime, Utc};
use research_quant::{IndicatorSnapshot, RiskFlags};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which pipeline produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineKind {
    Company,
    Sector,
}

/// One labeled report section, in pipeline order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSection {
    pub title: String,
    pub body: String,
}

impl ReportSection {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Terminal aggregate of one research run
///
/// Contains every stage narrative exactly once, the merged indicator
/// snapshot, the rule-derived risk flags, and the composite report text.
/// Nothing here persists beyond the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub query: String,
    pub entity: String,
    pub kind: PipelineKind,
    pub sections: Vec<ReportSection>,
    pub indicators: IndicatorSnapshot,
    pub risk: RiskFlags,
    pub report: String,
    pub generated_at: DateTime<Utc>,
}

impl PipelineResult {
    /// Assemble a result, composing the report from the ordered sections
    pub fn new(
        query: impl Into<String>,
        entity: impl Into<String>,
        kind: PipelineKind,
        sections: Vec<ReportSection>,
        indicators: IndicatorSnapshot,
        risk: RiskFlags,
    ) -> Self {
        let entity = entity.into();
        let report = compose_report(&entity, kind, &sections);
        Self {
            run_id: Uuid::new_v4(),
            query: query.into(),
            entity,
            kind,
            sections,
            indicators,
            risk,
            report,
            generated_at: Utc::now(),
        }
    }
}

/// Concatenate every section exactly once, in order, each clearly labeled
fn compose_report(entity: &str, kind: PipelineKind, sections: &[ReportSection]) -> String {
    let heading = match kind {
        PipelineKind::Company => format!("# 📊 Complete Stock Analysis: {entity}"),
        PipelineKind::Sector => format!("# 🏭 {entity} Sector Analysis"),
    };

    let mut report = heading;
    for section in sections {
        report.push_str("\n\n---\n\n## ");
        report.push_str(&section.title);
        report.push_str("\n\n");
        report.push_str(&section.body);
    }
    report.push('\n');
    report
}

/// Format a nullable price in rupees, two decimals
pub fn format_rupee(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("₹{v:.2}"),
        None => "N/A".to_string(),
    }
}

/// Format a nullable plain number, two decimals
pub fn format_number(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_contains_each_section_once_in_order() {
        let sections = vec![
            ReportSection::new("Company Introduction", "intro body"),
            ReportSection::new("Sector Analysis", "sector body"),
        ];
        let result = PipelineResult::new(
            "query",
            "Tata Motors",
            PipelineKind::Company,
            sections,
            IndicatorSnapshot::default(),
            RiskFlags::default(),
        );

        assert_eq!(result.report.matches("intro body").count(), 1);
        assert_eq!(result.report.matches("sector body").count(), 1);
        let intro_pos = result.report.find("Company Introduction").unwrap();
        let sector_pos = result.report.find("Sector Analysis").unwrap();
        assert!(intro_pos < sector_pos);
    }

    #[test]
    fn test_sector_heading() {
        let result = PipelineResult::new(
            "q",
            "Defence",
            PipelineKind::Sector,
            vec![],
            IndicatorSnapshot::default(),
            RiskFlags::default(),
        );
        assert!(result.report.starts_with("# 🏭 Defence Sector Analysis"));
    }

    #[test]
    fn test_rupee_formatting() {
        assert_eq!(format_rupee(Some(1234.5)), "₹1234.50");
        assert_eq!(format_rupee(None), "N/A");
        assert_eq!(format_number(Some(1.234)), "1.23");
    }
}
