//! Double and triple tops/bottoms.

use super::{relative_spread, trailing, Pivots};
use crate::types::{KeyPoint, OhlcPoint, Pattern, PatternType, Timeframe};

const WINDOW: usize = 60;
const PIVOT_ORDER: usize = 3;
/// Matching extremes must agree within this fraction.
const LEVEL_TOLERANCE: f64 = 0.02;
const MIN_SEPARATION: usize = 5;
/// Extremes must stand at least this far from the level between them.
const MIN_DEPTH: f64 = 0.02;

#[derive(Clone, Copy, PartialEq)]
enum Side {
    Top,
    Bottom,
}

pub fn detect(bars: &[OhlcPoint], timeframe: Timeframe) -> Vec<Pattern> {
    let Some((offset, window)) = trailing(bars, bars.len().min(WINDOW)) else {
        return Vec::new();
    };
    let pivots = Pivots::find(window, PIVOT_ORDER);

    let mut found = Vec::new();
    for side in [Side::Top, Side::Bottom] {
        let extremes = match side {
            Side::Top => &pivots.peaks,
            Side::Bottom => &pivots.troughs,
        };
        if extremes.len() >= 3 {
            found.extend(measure(window, offset, &extremes[extremes.len() - 3..], side, timeframe));
        }
        if extremes.len() >= 2 {
            found.extend(measure(window, offset, &extremes[extremes.len() - 2..], side, timeframe));
        }
    }
    found
}

/// Evaluate the most recent 2 or 3 extremes as a reversal formation.
fn measure(
    window: &[OhlcPoint],
    offset: usize,
    extremes: &[(usize, f64)],
    side: Side,
    timeframe: Timeframe,
) -> Option<Pattern> {
    if extremes
        .windows(2)
        .any(|pair| pair[1].0 - pair[0].0 < MIN_SEPARATION)
    {
        return None;
    }

    let prices: Vec<f64> = extremes.iter().map(|e| e.1).collect();
    let spread = relative_spread(&prices)?;
    if spread > LEVEL_TOLERANCE {
        return None;
    }
    let level = prices.iter().sum::<f64>() / prices.len() as f64;

    let first = extremes.first()?.0;
    let last = extremes.last()?.0;
    let between = &window[first..=last];
    let price = window.last()?.close;
    let triple = extremes.len() == 3;

    let (pattern_type, neckline, height) = match side {
        Side::Top => {
            let neckline = between.iter().map(|b| b.low).reduce(f64::min)?;
            let t = if triple {
                PatternType::TripleTop
            } else {
                PatternType::DoubleTop
            };
            (t, neckline, level - neckline)
        }
        Side::Bottom => {
            let neckline = between.iter().map(|b| b.high).reduce(f64::max)?;
            let t = if triple {
                PatternType::TripleBottom
            } else {
                PatternType::DoubleBottom
            };
            (t, neckline, neckline - level)
        }
    };
    if neckline <= 0.0 || height / level < MIN_DEPTH {
        return None;
    }

    let similarity = 1.0 - spread / LEVEL_TOLERANCE;
    let near_neckline = (price - neckline).abs() / neckline <= LEVEL_TOLERANCE;
    let base = if triple { 65.0 } else { 60.0 };
    let confidence =
        (base + similarity * 15.0 + if near_neckline { 10.0 } else { 0.0 }).min(85.0);

    let (target, stop) = match side {
        Side::Top => (neckline - height, prices.iter().copied().fold(f64::MIN, f64::max) * 1.01),
        Side::Bottom => (neckline + height, prices.iter().copied().fold(f64::MAX, f64::min) * 0.99),
    };

    Some(
        Pattern::new(
            pattern_type,
            confidence,
            offset + first,
            offset + window.len() - 1,
            timeframe,
            format!(
                "{} extremes near {:.2}, neckline {:.2}",
                extremes.len(),
                level,
                neckline
            ),
        )
        .with_key_points(
            extremes
                .iter()
                .map(|&(i, p)| KeyPoint::new(offset + i, p))
                .collect(),
        )
        .with_target(target)
        .with_stop(stop),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(anchors: &[(usize, f64)]) -> Vec<OhlcPoint> {
        let mut bars = Vec::new();
        for pair in anchors.windows(2) {
            let ((i0, p0), (i1, p1)) = (pair[0], pair[1]);
            for i in i0..i1 {
                let t = (i - i0) as f64 / (i1 - i0) as f64;
                let close = p0 + t * (p1 - p0);
                bars.push(OhlcPoint {
                    time: i as i64 * 86_400_000,
                    open: close,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume: 1_000.0,
                });
            }
        }
        bars
    }

    #[test]
    fn test_double_top() {
        let bars = path(&[(0, 90.0), (20, 110.0), (35, 100.0), (50, 110.5), (60, 101.0)]);
        let found = detect(&bars, Timeframe::Day1);
        let dt = found
            .iter()
            .find(|p| p.pattern_type == PatternType::DoubleTop)
            .expect("double top");
        let target = dt.target_price.unwrap();
        assert!(target < 100.0 && target > 85.0, "target {}", target);
        assert!(dt.confidence >= 70.0);
    }

    #[test]
    fn test_triple_bottom() {
        let bars = path(&[
            (0, 110.0),
            (10, 100.0),
            (20, 106.0),
            (30, 100.2),
            (40, 106.0),
            (50, 99.9),
            (60, 105.0),
        ]);
        let found = detect(&bars, Timeframe::Day1);
        assert!(found.iter().any(|p| p.pattern_type == PatternType::TripleBottom));
        assert!(found.iter().any(|p| p.pattern_type == PatternType::DoubleBottom));
    }

    #[test]
    fn test_uneven_peaks_rejected() {
        let bars = path(&[(0, 90.0), (20, 110.0), (35, 100.0), (50, 120.0), (60, 101.0)]);
        assert!(!detect(&bars, Timeframe::Day1)
            .iter()
            .any(|p| p.pattern_type == PatternType::DoubleTop));
    }
}
