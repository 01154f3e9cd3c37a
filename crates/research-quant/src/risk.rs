//! Rule-based risk flag engine
//!
//! Flags are derived from indicator thresholds and a negative-news
//! boolean only. Narrative text never feeds back into this layer, so a
//! bullish-sounding report cannot suppress a warning.

use serde::{Deserialize, Serialize};

use crate::snapshot::IndicatorSnapshot;

/// RSI level above which a stock counts as overbought
pub const RSI_OVERBOUGHT: f64 = 70.0;
/// RSI level below which a stock counts as oversold
pub const RSI_OVERSOLD: f64 = 30.0;
/// P/E ratio above which valuation counts as expensive
pub const PE_EXPENSIVE: f64 = 40.0;
/// Beta above which a stock counts as speculative
pub const BETA_SPECULATIVE: f64 = 1.5;
/// 52-week range over current price above which a stock counts as speculative
pub const RANGE_SPECULATIVE: f64 = 0.5;

/// Shown when no rule fired; never an empty or absent list
pub const NO_FLAGS: &str = "✅ No major risk flags detected";

/// Boolean risk flags plus the ordered warning lines they produce
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RiskFlags {
    pub overbought: bool,
    pub oversold: bool,
    pub negative_news: bool,
    pub speculative: bool,
    pub warnings: Vec<String>,
}

impl RiskFlags {
    /// Whether no warning fired at all
    pub fn is_clear(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Warning block for the report: either the warning lines or an
    /// explicit all-clear line
    pub fn summary(&self) -> String {
        if self.is_clear() {
            NO_FLAGS.to_string()
        } else {
            self.warnings.join("\n\n")
        }
    }
}

/// Evaluate the risk rules over a merged snapshot
///
/// Warnings are emitted in a fixed order: overbought, oversold, expensive
/// valuation, negative news (alert then avoid), speculative.
pub fn evaluate(
    snapshot: &IndicatorSnapshot,
    negative_news_detected: bool,
    negative_news_summary: Option<&str>,
) -> RiskFlags {
    let mut flags = RiskFlags::default();

    if let Some(rsi) = snapshot.rsi_14 {
        if rsi > RSI_OVERBOUGHT {
            flags.overbought = true;
            flags.warnings.push(
                "⚠️ **OVERBOUGHT (RSI > 70)** - Stock may be due for correction. \
                 Wait for pullback before buying."
                    .to_string(),
            );
        } else if rsi < RSI_OVERSOLD {
            flags.oversold = true;
            flags.warnings.push(
                "🟢 **OVERSOLD (RSI < 30)** - Stock may be undervalued. \
                 Potential buying opportunity."
                    .to_string(),
            );
        }
    }

    if snapshot.pe_ratio.is_some_and(|pe| pe > PE_EXPENSIVE) {
        flags.warnings.push(
            "💰 **EXPENSIVE VALUATION (P/E > 40)** - Stock is trading at high valuation. \
             A lot of growth is already priced in."
                .to_string(),
        );
    }

    if negative_news_detected {
        flags.negative_news = true;
        let summary = negative_news_summary
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("Negative news detected");
        flags
            .warnings
            .push(format!("🚨 **NEGATIVE NEWS ALERT** - {summary}"));
        flags.warnings.push(
            "⛔ **AVOID NOW** - Do not invest until the situation clarifies!".to_string(),
        );
    }

    if is_speculative(snapshot) {
        flags.speculative = true;
        flags.warnings.push(
            "⚡ **SPECULATIVE ZONE** - High volatility/beta. Only for aggressive investors."
                .to_string(),
        );
    }

    tracing::debug!(
        overbought = flags.overbought,
        oversold = flags.oversold,
        negative_news = flags.negative_news,
        speculative = flags.speculative,
        warning_count = flags.warnings.len(),
        "risk rules evaluated"
    );

    flags
}

fn is_speculative(snapshot: &IndicatorSnapshot) -> bool {
    if snapshot.beta.is_some_and(|b| b > BETA_SPECULATIVE) {
        return true;
    }
    match (
        snapshot.week_52_high,
        snapshot.week_52_low,
        snapshot.current_price,
    ) {
        (Some(high), Some(low), Some(price)) if price != 0.0 => {
            (high - low) / price > RANGE_SPECULATIVE
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_rsi(rsi: f64) -> IndicatorSnapshot {
        IndicatorSnapshot {
            rsi_14: Some(rsi),
            ..IndicatorSnapshot::default()
        }
    }

    #[test]
    fn test_overbought_threshold() {
        let flags = evaluate(&snapshot_with_rsi(71.0), false, None);
        assert!(flags.overbought);
        assert!(!flags.oversold);
        assert_eq!(flags.warnings.len(), 1);

        // The boundary itself does not trip the rule
        let flags = evaluate(&snapshot_with_rsi(70.0), false, None);
        assert!(!flags.overbought);
    }

    #[test]
    fn test_oversold_threshold() {
        let flags = evaluate(&snapshot_with_rsi(25.0), false, None);
        assert!(flags.oversold);
        assert!(!flags.overbought);
    }

    #[test]
    fn test_overbought_oversold_mutually_exclusive() {
        for rsi in [0.0, 15.0, 30.0, 50.0, 70.0, 85.0, 100.0] {
            let flags = evaluate(&snapshot_with_rsi(rsi), false, None);
            assert!(!(flags.overbought && flags.oversold), "rsi={rsi}");
        }
    }

    #[test]
    fn test_null_rsi_raises_nothing() {
        let flags = evaluate(&IndicatorSnapshot::default(), false, None);
        assert!(!flags.overbought);
        assert!(!flags.oversold);
        assert!(flags.is_clear());
        assert_eq!(flags.summary(), NO_FLAGS);
    }

    #[test]
    fn test_expensive_valuation_is_warning_only() {
        let snapshot = IndicatorSnapshot {
            pe_ratio: Some(55.0),
            ..IndicatorSnapshot::default()
        };
        let flags = evaluate(&snapshot, false, None);
        assert!(!flags.overbought && !flags.oversold && !flags.speculative);
        assert_eq!(flags.warnings.len(), 1);
        assert!(flags.warnings[0].contains("EXPENSIVE VALUATION"));
    }

    #[test]
    fn test_negative_news_adds_two_warnings() {
        let flags = evaluate(
            &IndicatorSnapshot::default(),
            true,
            Some("Regulator opened an investigation"),
        );
        assert!(flags.negative_news);
        assert_eq!(flags.warnings.len(), 2);
        assert!(flags.warnings[0].contains("Regulator opened an investigation"));
        assert!(flags.warnings[1].contains("AVOID NOW"));
    }

    #[test]
    fn test_speculative_from_beta() {
        let snapshot = IndicatorSnapshot {
            beta: Some(1.8),
            ..IndicatorSnapshot::default()
        };
        assert!(evaluate(&snapshot, false, None).speculative);
    }

    #[test]
    fn test_speculative_from_wide_52_week_range() {
        let snapshot = IndicatorSnapshot {
            current_price: Some(100.0),
            week_52_high: Some(160.0),
            week_52_low: Some(80.0),
            ..IndicatorSnapshot::default()
        };
        // (160 - 80) / 100 = 0.8 > 0.5
        assert!(evaluate(&snapshot, false, None).speculative);

        let narrow = IndicatorSnapshot {
            current_price: Some(100.0),
            week_52_high: Some(110.0),
            week_52_low: Some(90.0),
            ..IndicatorSnapshot::default()
        };
        assert!(!evaluate(&narrow, false, None).speculative);
    }

    #[test]
    fn test_speculative_requires_all_range_inputs() {
        let snapshot = IndicatorSnapshot {
            week_52_high: Some(160.0),
            week_52_low: Some(80.0),
            ..IndicatorSnapshot::default()
        };
        assert!(!evaluate(&snapshot, false, None).speculative);
    }

    #[test]
    fn test_warning_order_is_fixed() {
        let snapshot = IndicatorSnapshot {
            rsi_14: Some(75.0),
            pe_ratio: Some(50.0),
            beta: Some(2.0),
            ..IndicatorSnapshot::default()
        };
        let flags = evaluate(&snapshot, true, Some("fraud probe"));

        assert_eq!(flags.warnings.len(), 5);
        assert!(flags.warnings[0].contains("OVERBOUGHT"));
        assert!(flags.warnings[1].contains("EXPENSIVE VALUATION"));
        assert!(flags.warnings[2].contains("NEGATIVE NEWS"));
        assert!(flags.warnings[3].contains("AVOID NOW"));
        assert!(flags.warnings[4].contains("SPECULATIVE"));
    }
}
