//! Technical indicator calculation
//!
//! Pure functions over an ordered daily OHLC series; no I/O. Each
//! indicator returns `None` when the series is too short to support it,
//! and the caller treats that the same as any other missing field.

use research_core::OhlcBar;

use crate::snapshot::IndicatorSnapshot;

/// Window for the short-term moving average
pub const MA_SHORT: usize = 50;
/// Window for the long-term moving average
pub const MA_LONG: usize = 200;
/// RSI lookback period
pub const RSI_PERIOD: usize = 14;
/// Window over which support/resistance extrema are taken
const EXTREMA_WINDOW: usize = 60;
/// Buffer applied below recent lows / above recent highs
const EXTREMA_BUFFER: f64 = 0.05;

/// Arithmetic mean of the last `n` closes; `None` below `n` observations
pub fn moving_average(closes: &[f64], n: usize) -> Option<f64> {
    if n == 0 || closes.len() < n {
        return None;
    }
    let tail = &closes[closes.len() - n..];
    Some(tail.iter().sum::<f64>() / n as f64)
}

/// Simple-mean RSI over the trailing `period` price changes
///
/// Gains and losses are averaged arithmetically over the last `period`
/// deltas; an average loss of zero pins the oscillator at 100. Requires
/// `period + 1` observations.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let deltas: Vec<f64> = closes
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .collect();
    let tail = &deltas[deltas.len() - period..];

    let avg_gain = tail.iter().map(|d| d.max(0.0)).sum::<f64>() / period as f64;
    let avg_loss = tail.iter().map(|d| (-d).max(0.0)).sum::<f64>() / period as f64;

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Price floor: recent-low extremum with a downward buffer
pub fn support_level(bars: &[OhlcBar]) -> Option<f64> {
    let window = tail(bars, EXTREMA_WINDOW);
    window
        .iter()
        .map(|b| b.low)
        .fold(None, |acc: Option<f64>, low| {
            Some(acc.map_or(low, |a| a.min(low)))
        })
        .map(|min_low| min_low * (1.0 - EXTREMA_BUFFER))
}

/// Price ceiling: recent-high extremum with an upward buffer
pub fn resistance_level(bars: &[OhlcBar]) -> Option<f64> {
    let window = tail(bars, EXTREMA_WINDOW);
    window
        .iter()
        .map(|b| b.high)
        .fold(None, |acc: Option<f64>, high| {
            Some(acc.map_or(high, |a| a.max(high)))
        })
        .map(|max_high| max_high * (1.0 + EXTREMA_BUFFER))
}

/// Compute the indicator fields derivable from price history alone
///
/// The result is a partial [`IndicatorSnapshot`]: valuation and analyst
/// fields stay null and are filled by the quote or extraction tiers.
pub fn compute(bars: &[OhlcBar]) -> IndicatorSnapshot {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    IndicatorSnapshot {
        current_price: closes.last().copied(),
        moving_avg_50: moving_average(&closes, MA_SHORT),
        moving_avg_200: moving_average(&closes, MA_LONG),
        rsi_14: rsi(&closes, RSI_PERIOD),
        support_level: support_level(bars),
        resistance_level: resistance_level(bars),
        ..IndicatorSnapshot::default()
    }
}

fn tail(bars: &[OhlcBar], n: usize) -> &[OhlcBar] {
    &bars[bars.len().saturating_sub(n)..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bar(day: u32, open: f64, high: f64, low: f64, close: f64) -> OhlcBar {
        OhlcBar {
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
                + chrono::Duration::days(i64::from(day)),
            open,
            high,
            low,
            close,
            volume: 1_000,
        }
    }

    fn bars_from_closes(closes: &[f64]) -> Vec<OhlcBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| bar(i as u32, c, c + 1.0, c - 1.0, c))
            .collect()
    }

    #[test]
    fn test_moving_average_needs_n_observations() {
        let closes = vec![10.0; 49];
        assert!(moving_average(&closes, 50).is_none());

        let closes = vec![10.0; 50];
        assert_eq!(moving_average(&closes, 50), Some(10.0));
    }

    #[test]
    fn test_moving_average_constant_series() {
        let closes = vec![123.45; 300];
        let ma = moving_average(&closes, 200).unwrap();
        assert!((ma - 123.45).abs() < 1e-9);
    }

    #[test]
    fn test_moving_average_uses_only_the_tail() {
        // 10 closes of 1.0 followed by 5 closes of 2.0
        let mut closes = vec![1.0; 10];
        closes.extend(vec![2.0; 5]);
        assert_eq!(moving_average(&closes, 5), Some(2.0));
    }

    #[test]
    fn test_rsi_needs_period_plus_one() {
        let closes: Vec<f64> = (0..15).map(f64::from).collect();
        assert!(rsi(&closes[..14], 14).is_none());
        assert!(rsi(&closes, 14).is_some());
    }

    #[test]
    fn test_rsi_all_gains_is_pinned_at_100() {
        let closes: Vec<f64> = (1..=20).map(f64::from).collect();
        assert_eq!(rsi(&closes, 14), Some(100.0));
    }

    #[test]
    fn test_rsi_all_losses_is_zero() {
        let closes: Vec<f64> = (1..=20).rev().map(f64::from).collect();
        let value = rsi(&closes, 14).unwrap();
        assert!(value.abs() < 1e-9);
    }

    #[test]
    fn test_rsi_constant_series_is_100() {
        // No losses at all, so the average loss is zero
        let closes = vec![50.0; 30];
        assert_eq!(rsi(&closes, 14), Some(100.0));
    }

    #[test]
    fn test_rsi_stays_in_range() {
        // Alternating moves of different sizes
        let mut closes = vec![100.0];
        for i in 1..120 {
            let step = if i % 3 == 0 { -2.5 } else { 1.0 };
            closes.push(closes[i - 1] + step);
        }
        let value = rsi(&closes, 14).unwrap();
        assert!((0.0..=100.0).contains(&value));
    }

    #[test]
    fn test_support_below_resistance() {
        let bars = bars_from_closes(&(1..=80).map(f64::from).collect::<Vec<_>>());
        let support = support_level(&bars).unwrap();
        let resistance = resistance_level(&bars).unwrap();
        assert!(support <= resistance);
    }

    #[test]
    fn test_support_resistance_buffers() {
        let bars = vec![bar(0, 100.0, 110.0, 90.0, 105.0)];
        assert_eq!(support_level(&bars), Some(90.0 * 0.95));
        assert_eq!(resistance_level(&bars), Some(110.0 * 1.05));
    }

    #[test]
    fn test_empty_series_yields_nothing() {
        let snapshot = compute(&[]);
        assert!(snapshot.current_price.is_none());
        assert!(snapshot.rsi_14.is_none());
        assert!(snapshot.support_level.is_none());
        assert!(snapshot.resistance_level.is_none());
    }

    #[test]
    fn test_compute_on_year_of_data() {
        let closes: Vec<f64> = (0..260).map(|i| 100.0 + f64::from(i) * 0.1).collect();
        let bars = bars_from_closes(&closes);
        let snapshot = compute(&bars);

        assert_eq!(snapshot.current_price, closes.last().copied());
        assert!(snapshot.moving_avg_50.is_some());
        assert!(snapshot.moving_avg_200.is_some());
        // Strictly rising closes keep the oscillator pinned high
        assert_eq!(snapshot.rsi_14, Some(100.0));
        assert!(snapshot.support_level.unwrap() <= snapshot.resistance_level.unwrap());
        // Valuation fields are not derivable from price history
        assert!(snapshot.pe_ratio.is_none());
        assert!(snapshot.beta.is_none());
    }
}
