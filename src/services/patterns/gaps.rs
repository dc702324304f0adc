//! Price gaps between consecutive bars, classified by the trend that led into them.

use super::best_per_type;
use crate::types::{KeyPoint, OhlcPoint, Pattern, PatternBias, PatternType, Timeframe};

const SCAN_BARS: usize = 20;
const GAP_THRESHOLD: f64 = 0.005;
const TREND_BARS: usize = 10;
const TREND_THRESHOLD: f64 = 0.03;
const EXHAUSTION_THRESHOLD: f64 = 0.15;
const FILLED_PENALTY: f64 = 15.0;

pub fn detect(bars: &[OhlcPoint], timeframe: Timeframe) -> Vec<Pattern> {
    let n = bars.len();
    let first = n.saturating_sub(SCAN_BARS).max(TREND_BARS + 1);
    let Some(price) = bars.last().map(|b| b.close) else {
        return Vec::new();
    };

    let found = (first..n)
        .filter_map(|i| classify(bars, i, price, timeframe))
        .collect();
    best_per_type(found)
}

fn classify(bars: &[OhlcPoint], i: usize, price: f64, timeframe: Timeframe) -> Option<Pattern> {
    let prev = &bars[i - 1];
    let bar = &bars[i];

    // +1 for a gap up, -1 for a gap down; `edge` is the far side of the gap.
    let (direction, edge, size) = if bar.low > prev.high * (1.0 + GAP_THRESHOLD) {
        (1.0, prev.high, (bar.low - prev.high) / prev.high)
    } else if bar.high < prev.low * (1.0 - GAP_THRESHOLD) {
        (-1.0, prev.low, (prev.low - bar.high) / prev.low)
    } else {
        return None;
    };

    let trend_from = bars[i - 1 - TREND_BARS].close;
    if trend_from <= 0.0 {
        return None;
    }
    let trend = (prev.close - trend_from) / trend_from;
    let with_trend = trend * direction;

    let (pattern_type, base) = if trend.abs() < TREND_THRESHOLD {
        (PatternType::BreakawayGap, 70.0)
    } else if with_trend >= EXHAUSTION_THRESHOLD {
        (PatternType::ExhaustionGap, 60.0)
    } else if with_trend >= TREND_THRESHOLD {
        (PatternType::RunawayGap, 65.0)
    } else {
        (PatternType::CommonGap, 50.0)
    };

    let filled = bars[i + 1..].iter().any(|b| {
        if direction > 0.0 {
            b.low <= edge
        } else {
            b.high >= edge
        }
    });
    let size_bonus = (size * 200.0).min(10.0);
    let confidence = base + size_bonus - if filled { FILLED_PENALTY } else { 0.0 };

    let gap_bias = if direction > 0.0 {
        PatternBias::Bullish
    } else {
        PatternBias::Bearish
    };
    let against_gap = if direction > 0.0 {
        PatternBias::Bearish
    } else {
        PatternBias::Bullish
    };

    let (bias, target, stop) = match pattern_type {
        PatternType::BreakawayGap | PatternType::RunawayGap => (
            gap_bias,
            Some(price * (1.0 + direction * 0.05)),
            Some(edge * (1.0 - direction * 0.01)),
        ),
        // Exhaustion gaps tend to close: target the gap edge, stop beyond the gap bar.
        PatternType::ExhaustionGap => {
            let extreme = if direction > 0.0 { bar.high } else { bar.low };
            (
                against_gap,
                Some(edge),
                Some(extreme * (1.0 + direction * 0.01)),
            )
        }
        _ => (PatternBias::Neutral, Some(edge), None),
    };

    let mut pattern = Pattern::new(
        pattern_type,
        confidence,
        i - 1,
        i,
        timeframe,
        format!(
            "{:.2}% gap {} after {:+.1}% {}-bar move{}",
            size * 100.0,
            if direction > 0.0 { "up" } else { "down" },
            trend * 100.0,
            TREND_BARS,
            if filled { ", since filled" } else { "" }
        ),
    )
    .with_bias(bias)
    .with_key_points(vec![KeyPoint::new(i - 1, edge), KeyPoint::new(i, bar.open)]);
    if let Some(target) = target {
        pattern = pattern.with_target(target);
    }
    if let Some(stop) = stop {
        pattern = pattern.with_stop(stop);
    }
    Some(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(i: usize, close: f64) -> OhlcPoint {
        OhlcPoint {
            time: i as i64 * 86_400_000,
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume: 1_000.0,
        }
    }

    fn series_with_gap(step: f64, gap: f64) -> Vec<OhlcPoint> {
        let mut bars: Vec<OhlcPoint> = (0..30).map(|i| bar(i, 100.0 + step * i as f64)).collect();
        let last = bars[29].close;
        for i in 30..35 {
            bars.push(bar(i, last + gap + (i - 30) as f64 * 0.2));
        }
        bars
    }

    #[test]
    fn test_breakaway_gap_from_flat_base() {
        let found = detect(&series_with_gap(0.0, 5.0), Timeframe::Day1);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern_type, PatternType::BreakawayGap);
        assert_eq!(found[0].bias, PatternBias::Bullish);
        assert!(found[0].confidence >= 70.0);
    }

    #[test]
    fn test_runaway_gap_in_trend() {
        let found = detect(&series_with_gap(0.5, 5.0), Timeframe::Day1);
        assert_eq!(found[0].pattern_type, PatternType::RunawayGap);
    }

    #[test]
    fn test_filled_gap_penalised() {
        let mut bars = series_with_gap(0.0, 5.0);
        bars.push(bar(35, 100.0));
        let found = detect(&bars, Timeframe::Day1);
        let gap = found
            .iter()
            .find(|p| p.pattern_type == PatternType::BreakawayGap)
            .unwrap();
        assert!(gap.confidence < 70.0);
    }

    #[test]
    fn test_no_gap() {
        let bars: Vec<OhlcPoint> = (0..40).map(|i| bar(i, 100.0 + i as f64 * 0.1)).collect();
        assert!(detect(&bars, Timeframe::Day1).is_empty());
    }
}
