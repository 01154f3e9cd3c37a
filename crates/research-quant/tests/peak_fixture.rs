//! End-to-end fixture: a run-up into a peak must trip the overbought rule

use research_quant::{evaluate, indicators};

/// 20 strictly-increasing closes followed by 20 strictly-decreasing ones
fn hill_series() -> Vec<f64> {
    let up: Vec<f64> = (0..20).map(|i| 100.0 + f64::from(i) * 2.0).collect();
    let peak = *up.last().expect("non-empty");
    let down: Vec<f64> = (1..=20).map(|i| peak - f64::from(i) * 2.0).collect();
    let mut series = up;
    series.extend(down);
    series
}

#[test]
fn overbought_at_the_peak() {
    let series = hill_series();

    // At the peak day every trailing delta is a gain
    let closes_at_peak = &series[..20];
    let rsi = indicators::rsi(closes_at_peak, 14).expect("enough observations");
    assert!(rsi > 70.0, "rsi at peak was {rsi}");
    assert!(rsi <= 100.0);

    let snapshot = research_quant::IndicatorSnapshot {
        current_price: closes_at_peak.last().copied(),
        rsi_14: Some(rsi),
        ..research_quant::IndicatorSnapshot::default()
    };
    let flags = evaluate(&snapshot, false, None);

    assert!(flags.overbought);
    assert!(!flags.oversold);
    let overbought_warnings = flags
        .warnings
        .iter()
        .filter(|w| w.contains("OVERBOUGHT"))
        .count();
    assert_eq!(overbought_warnings, 1);
    assert_eq!(flags.warnings.len(), 1);
}

#[test]
fn oversold_after_the_slide() {
    let series = hill_series();

    // Well into the decline every trailing delta is a loss
    let rsi = indicators::rsi(&series, 14).expect("enough observations");
    assert!(rsi < 30.0, "rsi after slide was {rsi}");

    let snapshot = research_quant::IndicatorSnapshot {
        rsi_14: Some(rsi),
        ..research_quant::IndicatorSnapshot::default()
    };
    let flags = evaluate(&snapshot, false, None);
    assert!(flags.oversold);
    assert!(!flags.overbought);
}
