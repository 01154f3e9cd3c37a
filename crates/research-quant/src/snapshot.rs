//! Indicator snapshot record and merge policy
//!
//! The snapshot is the single structured record both sourcing tiers
//! produce: the provider tier from quotes and computed indicators, the
//! extracted tier from narrative JSON. Every numeric field is
//! independently nullable, and merging applies strict provider
//! precedence per field.

use research_core::QuoteSummary;
use serde::{Deserialize, Deserializer, Serialize};

/// Fully enumerated nullable indicator record
///
/// Deserialization at the narrative boundary is lenient: numbers may
/// arrive as JSON strings, and anything unparsable coalesces to null
/// rather than failing the whole record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IndicatorSnapshot {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub current_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub moving_avg_50: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub moving_avg_200: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rsi_14: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub support_level: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub resistance_level: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pe_ratio: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub eps: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub beta: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub target_low: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub target_avg: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub target_high: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub week_52_high: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub week_52_low: Option<f64>,
}

impl IndicatorSnapshot {
    /// Fill quote-level fields from the market data provider
    pub fn apply_quote(mut self, quote: &QuoteSummary) -> Self {
        self.current_price = quote.current_price.or(self.current_price);
        self.pe_ratio = quote.pe_ratio.or(self.pe_ratio);
        self.eps = quote.eps.or(self.eps);
        self.beta = quote.beta.or(self.beta);
        self.week_52_high = quote.week_52_high.or(self.week_52_high);
        self.week_52_low = quote.week_52_low.or(self.week_52_low);
        self.target_low = quote.target_low.or(self.target_low);
        self.target_avg = quote.target_avg.or(self.target_avg);
        self.target_high = quote.target_high.or(self.target_high);
        self
    }

    /// Names of the fields still null, used to scope gap-filling searches
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let mut check = |name, value: &Option<f64>| {
            if value.is_none() {
                missing.push(name);
            }
        };
        check("current_price", &self.current_price);
        check("moving_avg_50", &self.moving_avg_50);
        check("moving_avg_200", &self.moving_avg_200);
        check("rsi_14", &self.rsi_14);
        check("support_level", &self.support_level);
        check("resistance_level", &self.resistance_level);
        check("pe_ratio", &self.pe_ratio);
        check("eps", &self.eps);
        check("beta", &self.beta);
        check("target_low", &self.target_low);
        check("target_avg", &self.target_avg);
        check("target_high", &self.target_high);
        check("week_52_high", &self.week_52_high);
        check("week_52_low", &self.week_52_low);
        missing
    }

    /// Whether every field is null
    pub fn is_unpopulated(&self) -> bool {
        self.missing_fields().len() == 14
    }

    /// Parse a narrative-produced JSON object into a snapshot
    ///
    /// Unknown keys are ignored; unparsable values become null.
    pub fn from_extracted(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

/// Merge two snapshots: per field, `provider` wins whenever non-null
pub fn merge(provider: &IndicatorSnapshot, extracted: &IndicatorSnapshot) -> IndicatorSnapshot {
    IndicatorSnapshot {
        current_price: provider.current_price.or(extracted.current_price),
        moving_avg_50: provider.moving_avg_50.or(extracted.moving_avg_50),
        moving_avg_200: provider.moving_avg_200.or(extracted.moving_avg_200),
        rsi_14: provider.rsi_14.or(extracted.rsi_14),
        support_level: provider.support_level.or(extracted.support_level),
        resistance_level: provider.resistance_level.or(extracted.resistance_level),
        pe_ratio: provider.pe_ratio.or(extracted.pe_ratio),
        eps: provider.eps.or(extracted.eps),
        beta: provider.beta.or(extracted.beta),
        target_low: provider.target_low.or(extracted.target_low),
        target_avg: provider.target_avg.or(extracted.target_avg),
        target_high: provider.target_high.or(extracted.target_high),
        week_52_high: provider.week_52_high.or(extracted.week_52_high),
        week_52_low: provider.week_52_low.or(extracted.week_52_low),
    }
}

/// Accept a number, a numeric string, or anything else as null
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_provider_precedence() {
        let provider = IndicatorSnapshot {
            rsi_14: Some(65.0),
            pe_ratio: None,
            ..IndicatorSnapshot::default()
        };
        let extracted = IndicatorSnapshot {
            rsi_14: Some(40.0),
            pe_ratio: Some(22.0),
            ..IndicatorSnapshot::default()
        };

        let merged = merge(&provider, &extracted);
        assert_eq!(merged.rsi_14, Some(65.0));
        assert_eq!(merged.pe_ratio, Some(22.0));
    }

    #[test]
    fn test_merge_both_null_stays_null() {
        let merged = merge(&IndicatorSnapshot::default(), &IndicatorSnapshot::default());
        assert!(merged.is_unpopulated());
    }

    #[test]
    fn test_lenient_parse_accepts_strings_and_drops_junk() {
        let value = json!({
            "rsi_14": "71.3",
            "pe_ratio": 38,
            "beta": "not disclosed",
            "target_avg": null,
            "unexpected": true
        });

        let snapshot = IndicatorSnapshot::from_extracted(&value);
        assert_eq!(snapshot.rsi_14, Some(71.3));
        assert_eq!(snapshot.pe_ratio, Some(38.0));
        assert!(snapshot.beta.is_none());
        assert!(snapshot.target_avg.is_none());
    }

    #[test]
    fn test_lenient_parse_handles_thousands_separators() {
        let value = json!({ "week_52_high": "1,234.50" });
        let snapshot = IndicatorSnapshot::from_extracted(&value);
        assert_eq!(snapshot.week_52_high, Some(1234.5));
    }

    #[test]
    fn test_apply_quote_fills_quote_fields() {
        let quote = QuoteSummary {
            ticker: "TCS".to_string(),
            current_price: Some(4100.0),
            week_52_high: Some(4500.0),
            week_52_low: Some(3200.0),
            ..QuoteSummary::default()
        };

        let snapshot = IndicatorSnapshot::default().apply_quote(&quote);
        assert_eq!(snapshot.current_price, Some(4100.0));
        assert_eq!(snapshot.week_52_high, Some(4500.0));
        assert!(snapshot.pe_ratio.is_none());
    }

    #[test]
    fn test_missing_fields_tracks_gaps() {
        let snapshot = IndicatorSnapshot {
            rsi_14: Some(50.0),
            ..IndicatorSnapshot::default()
        };
        let missing = snapshot.missing_fields();
        assert!(!missing.contains(&"rsi_14"));
        assert!(missing.contains(&"pe_ratio"));
        assert_eq!(missing.len(), 13);
    }
}
