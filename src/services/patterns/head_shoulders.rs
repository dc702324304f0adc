//! Head and shoulders, regular and inverse.

use super::{trailing, Pivots};
use crate::types::{KeyPoint, OhlcPoint, Pattern, PatternType, Timeframe};

const MIN_BARS: usize = 50;
const WINDOW: usize = 60;
const PIVOT_ORDER: usize = 3;
/// Head must clear both shoulders by this fraction.
const HEAD_PROMINENCE: f64 = 0.02;
/// Shoulders must match within this fraction.
const SHOULDER_TOLERANCE: f64 = 0.05;
/// Price this close to the neckline puts the pattern in play.
const NECKLINE_PROXIMITY: f64 = 0.02;

pub fn detect(bars: &[OhlcPoint], timeframe: Timeframe) -> Vec<Pattern> {
    if bars.len() < MIN_BARS {
        return Vec::new();
    }
    let Some((offset, window)) = trailing(bars, bars.len().min(WINDOW)) else {
        return Vec::new();
    };
    let pivots = Pivots::find(window, PIVOT_ORDER);

    let mut found = Vec::new();
    found.extend(top(window, offset, &pivots, timeframe));
    found.extend(inverse(window, offset, &pivots, timeframe));
    found
}

fn top(
    window: &[OhlcPoint],
    offset: usize,
    pivots: &Pivots,
    timeframe: Timeframe,
) -> Option<Pattern> {
    let price = window.last()?.close;

    // Most recent qualifying triple wins.
    pivots.peaks.windows(3).rev().find_map(|triple| {
        let [(ls_i, ls), (head_i, head), (rs_i, rs)] = [triple[0], triple[1], triple[2]];
        if head <= ls * (1.0 + HEAD_PROMINENCE) || head <= rs * (1.0 + HEAD_PROMINENCE) {
            return None;
        }
        let shoulder_diff = (ls - rs).abs() / ls.max(rs);
        if shoulder_diff > SHOULDER_TOLERANCE {
            return None;
        }

        let left_trough = lowest_low(&window[ls_i..=head_i])?;
        let right_trough = lowest_low(&window[head_i..=rs_i])?;
        let neckline = (left_trough + right_trough) / 2.0;
        let height = head - neckline;
        if height <= 0.0 {
            return None;
        }

        let symmetry = 1.0 - shoulder_diff / SHOULDER_TOLERANCE;
        let in_play = (price - neckline).abs() / neckline <= NECKLINE_PROXIMITY;
        let confidence = 65.0 + symmetry * 10.0 + if in_play { 10.0 } else { 0.0 };

        Some(
            Pattern::new(
                PatternType::HeadAndShoulders,
                confidence,
                offset + ls_i,
                offset + window.len() - 1,
                timeframe,
                format!(
                    "Head {:.2} over shoulders {:.2}/{:.2}, neckline {:.2}",
                    head, ls, rs, neckline
                ),
            )
            .with_key_points(vec![
                KeyPoint::new(offset + ls_i, ls),
                KeyPoint::new(offset + head_i, head),
                KeyPoint::new(offset + rs_i, rs),
            ])
            .with_target(neckline - height)
            .with_stop(head),
        )
    })
}

fn inverse(
    window: &[OhlcPoint],
    offset: usize,
    pivots: &Pivots,
    timeframe: Timeframe,
) -> Option<Pattern> {
    let price = window.last()?.close;

    pivots.troughs.windows(3).rev().find_map(|triple| {
        let [(ls_i, ls), (head_i, head), (rs_i, rs)] = [triple[0], triple[1], triple[2]];
        if head >= ls * (1.0 - HEAD_PROMINENCE) || head >= rs * (1.0 - HEAD_PROMINENCE) {
            return None;
        }
        let shoulder_diff = (ls - rs).abs() / ls.max(rs);
        if shoulder_diff > SHOULDER_TOLERANCE {
            return None;
        }

        let left_peak = highest_high(&window[ls_i..=head_i])?;
        let right_peak = highest_high(&window[head_i..=rs_i])?;
        let neckline = (left_peak + right_peak) / 2.0;
        let height = neckline - head;
        if height <= 0.0 {
            return None;
        }

        let symmetry = 1.0 - shoulder_diff / SHOULDER_TOLERANCE;
        let in_play = (price - neckline).abs() / neckline <= NECKLINE_PROXIMITY;
        let confidence = 65.0 + symmetry * 10.0 + if in_play { 10.0 } else { 0.0 };

        Some(
            Pattern::new(
                PatternType::InverseHeadAndShoulders,
                confidence,
                offset + ls_i,
                offset + window.len() - 1,
                timeframe,
                format!(
                    "Head {:.2} under shoulders {:.2}/{:.2}, neckline {:.2}",
                    head, ls, rs, neckline
                ),
            )
            .with_key_points(vec![
                KeyPoint::new(offset + ls_i, ls),
                KeyPoint::new(offset + head_i, head),
                KeyPoint::new(offset + rs_i, rs),
            ])
            .with_target(neckline + height)
            .with_stop(head),
        )
    })
}

fn lowest_low(bars: &[OhlcPoint]) -> Option<f64> {
    bars.iter().map(|b| b.low).reduce(f64::min)
}

fn highest_high(bars: &[OhlcPoint]) -> Option<f64> {
    bars.iter().map(|b| b.high).reduce(f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Piecewise-linear close path through `(index, price)` anchors.
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
    fn test_head_and_shoulders() {
        let bars = path(&[
            (0, 90.0),
            (10, 100.0),
            (20, 92.0),
            (30, 110.0),
            (40, 92.0),
            (50, 100.0),
            (60, 93.0),
        ]);
        let found = detect(&bars, Timeframe::Day1);
        let hs = found
            .iter()
            .find(|p| p.pattern_type == PatternType::HeadAndShoulders)
            .expect("head and shoulders");
        // Neckline 91.5, head 110.5.
        assert!((hs.target_price.unwrap() - 72.5).abs() < 0.01);
        assert_eq!(hs.key_points.len(), 3);
        assert!(hs.confidence >= 75.0);
    }

    #[test]
    fn test_inverse_head_and_shoulders() {
        let bars = path(&[
            (0, 110.0),
            (10, 100.0),
            (20, 108.0),
            (30, 90.0),
            (40, 108.0),
            (50, 100.0),
            (60, 107.0),
        ]);
        let found = detect(&bars, Timeframe::Day1);
        let ihs = found
            .iter()
            .find(|p| p.pattern_type == PatternType::InverseHeadAndShoulders)
            .expect("inverse head and shoulders");
        assert!(ihs.target_price.unwrap() > 108.0);
    }

    #[test]
    fn test_needs_fifty_bars() {
        let bars = path(&[(0, 90.0), (10, 100.0), (20, 92.0), (30, 110.0), (40, 95.0)]);
        assert!(detect(&bars, Timeframe::Day1).is_empty());
    }
}
