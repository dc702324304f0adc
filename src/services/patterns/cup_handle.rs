//! Cup and handle, plus the inverted form.

use super::{best_per_type, trailing};
use crate::types::{KeyPoint, OhlcPoint, Pattern, PatternType, Timeframe};

const WINDOWS: [usize; 3] = [50, 75, 100];
const RIM_TOLERANCE: f64 = 0.03;
const MIN_DEPTH: f64 = 0.10;
const MAX_DEPTH: f64 = 0.35;
const TIGHT_HANDLE: f64 = 0.10;

pub fn detect(bars: &[OhlcPoint], timeframe: Timeframe) -> Vec<Pattern> {
    let mut found = Vec::new();
    for size in WINDOWS {
        let Some((offset, window)) = trailing(bars, size) else {
            continue;
        };
        found.extend(cup(window, offset, timeframe));
        found.extend(inverted_cup(window, offset, timeframe));
    }
    best_per_type(found)
}

/// Index of the extreme of `f` over `bars[range]`, as an index into `bars`.
fn extreme_in(
    bars: &[OhlcPoint],
    range: std::ops::Range<usize>,
    f: impl Fn(&OhlcPoint) -> f64,
    highest: bool,
) -> Option<(usize, f64)> {
    let start = range.start;
    bars[range]
        .iter()
        .enumerate()
        .map(|(i, b)| (start + i, f(b)))
        .reduce(|best, cur| {
            let better = if highest { cur.1 > best.1 } else { cur.1 < best.1 };
            if better {
                cur
            } else {
                best
            }
        })
}

fn cup(window: &[OhlcPoint], offset: usize, timeframe: Timeframe) -> Option<Pattern> {
    let handle_len = window.len() / 4;
    let cup_len = window.len() - handle_len;
    let third = cup_len / 3;

    let (left_i, left_rim) = extreme_in(window, 0..third, |b| b.high, true)?;
    let (bottom_i, bottom) = extreme_in(window, 0..cup_len, |b| b.low, false)?;
    if bottom_i < third || bottom_i >= 2 * third {
        return None;
    }
    let (right_i, right_rim) = extreme_in(window, 2 * third..cup_len, |b| b.high, true)?;
    if (right_rim - left_rim).abs() / left_rim > RIM_TOLERANCE {
        return None;
    }

    let rim = left_rim.max(right_rim);
    let depth = (rim - bottom) / rim;
    if !(MIN_DEPTH..=MAX_DEPTH).contains(&depth) {
        return None;
    }

    let handle = &window[cup_len..];
    let handle_high = handle.iter().map(|b| b.high).reduce(f64::max)?;
    let handle_low = handle.iter().map(|b| b.low).reduce(f64::min)?;
    // A handle that breaks above the rim or retraces below the cup midpoint is not a handle.
    if handle_high > rim * (1.0 + RIM_TOLERANCE) || handle_low < bottom + (rim - bottom) / 2.0 {
        return None;
    }
    let handle_range = (handle_high - handle_low) / handle_high;
    let confidence = if handle_range < TIGHT_HANDLE {
        75.0 + (1.0 - handle_range / TIGHT_HANDLE) * 10.0
    } else {
        60.0
    };

    Some(
        Pattern::new(
            PatternType::CupAndHandle,
            confidence,
            offset + left_i,
            offset + window.len() - 1,
            timeframe,
            format!(
                "{:.1}% deep cup with rim {:.2}, handle range {:.1}%",
                depth * 100.0,
                rim,
                handle_range * 100.0
            ),
        )
        .with_key_points(vec![
            KeyPoint::new(offset + left_i, left_rim),
            KeyPoint::new(offset + bottom_i, bottom),
            KeyPoint::new(offset + right_i, right_rim),
        ])
        .with_target(rim * (1.0 + depth))
        .with_stop(handle_low * 0.99),
    )
}

fn inverted_cup(window: &[OhlcPoint], offset: usize, timeframe: Timeframe) -> Option<Pattern> {
    let handle_len = window.len() / 4;
    let cup_len = window.len() - handle_len;
    let third = cup_len / 3;

    let (left_i, left_rim) = extreme_in(window, 0..third, |b| b.low, false)?;
    let (top_i, top) = extreme_in(window, 0..cup_len, |b| b.high, true)?;
    if top_i < third || top_i >= 2 * third {
        return None;
    }
    let (right_i, right_rim) = extreme_in(window, 2 * third..cup_len, |b| b.low, false)?;
    if (right_rim - left_rim).abs() / left_rim > RIM_TOLERANCE {
        return None;
    }

    let rim = left_rim.min(right_rim);
    if rim <= 0.0 {
        return None;
    }
    let depth = (top - rim) / rim;
    if !(MIN_DEPTH..=MAX_DEPTH).contains(&depth) {
        return None;
    }

    let handle = &window[cup_len..];
    let handle_high = handle.iter().map(|b| b.high).reduce(f64::max)?;
    let handle_low = handle.iter().map(|b| b.low).reduce(f64::min)?;
    if handle_low < rim * (1.0 - RIM_TOLERANCE) || handle_high > top - (top - rim) / 2.0 {
        return None;
    }
    let handle_range = (handle_high - handle_low) / handle_high;
    let confidence = if handle_range < TIGHT_HANDLE {
        75.0 + (1.0 - handle_range / TIGHT_HANDLE) * 10.0
    } else {
        60.0
    };

    Some(
        Pattern::new(
            PatternType::InverseCupAndHandle,
            confidence,
            offset + left_i,
            offset + window.len() - 1,
            timeframe,
            format!(
                "{:.1}% inverted cup from rim {:.2}, handle range {:.1}%",
                depth * 100.0,
                rim,
                handle_range * 100.0
            ),
        )
        .with_key_points(vec![
            KeyPoint::new(offset + left_i, left_rim),
            KeyPoint::new(offset + top_i, top),
            KeyPoint::new(offset + right_i, right_rim),
        ])
        .with_target(rim * (1.0 - depth))
        .with_stop(handle_high * 1.01),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(i: usize, close: f64) -> OhlcPoint {
        OhlcPoint {
            time: i as i64 * 86_400_000,
            open: close,
            high: close + 0.3,
            low: close - 0.3,
            close,
            volume: 1_000.0,
        }
    }

    /// U-shaped cup from 100 down to 80 over 75 bars, then a shallow handle.
    fn cup_series() -> Vec<OhlcPoint> {
        let mut bars: Vec<OhlcPoint> = (0..75)
            .map(|i| {
                let x = (i as f64 - 37.0) / 37.0;
                bar(i, 80.0 + 20.0 * x * x)
            })
            .collect();
        for (k, i) in (75..100).enumerate() {
            bars.push(bar(i, 97.0 + if k % 2 == 0 { 1.0 } else { 0.0 }));
        }
        bars
    }

    #[test]
    fn test_cup_and_handle() {
        let found = detect(&cup_series(), Timeframe::Day1);
        let cup = found
            .iter()
            .find(|p| p.pattern_type == PatternType::CupAndHandle)
            .expect("cup and handle");
        let rim = 100.3;
        let depth = (rim - 79.7) / rim;
        assert!((cup.target_price.unwrap() - rim * (1.0 + depth)).abs() < 0.5);
        assert!(cup.confidence >= 75.0);
    }

    #[test]
    fn test_flat_series_has_no_cup() {
        let bars: Vec<OhlcPoint> = (0..100).map(|i| bar(i, 100.0)).collect();
        assert!(detect(&bars, Timeframe::Day1).is_empty());
    }
}
