//! Rising and falling wedges.

use super::{best_per_type, trailing, Pivots, FLAT_SLOPE};
use crate::services::indicators::{fit_points, mean};
use crate::types::{closes, OhlcPoint, Pattern, PatternType, Timeframe};

const WINDOWS: [usize; 2] = [30, 45];
const PIVOT_ORDER: usize = 3;
const MIN_FIT: f64 = 0.7;
/// Wedge targets are a fixed percentage move from the current close.
const TARGET_PCT: f64 = 0.10;

pub fn detect(bars: &[OhlcPoint], timeframe: Timeframe) -> Vec<Pattern> {
    let mut found = Vec::new();
    for size in WINDOWS {
        let Some((offset, window)) = trailing(bars, size) else {
            continue;
        };
        found.extend(classify(window, offset, timeframe));
    }
    best_per_type(found)
}

fn classify(window: &[OhlcPoint], offset: usize, timeframe: Timeframe) -> Option<Pattern> {
    let pivots = Pivots::find(window, PIVOT_ORDER);
    if pivots.peaks.len() < 2 || pivots.troughs.len() < 2 {
        return None;
    }
    let upper = fit_points(&pivots.peaks)?;
    let lower = fit_points(&pivots.troughs)?;
    if upper.r.abs() <= MIN_FIT || lower.r.abs() <= MIN_FIT {
        return None;
    }

    let avg_close = mean(&closes(window))?;
    if avg_close <= 0.0 {
        return None;
    }
    let upper_slope = upper.slope / avg_close;
    let lower_slope = lower.slope / avg_close;

    // Converging: the trailing side must be at least 10% steeper than the leading one.
    let rising = upper_slope > FLAT_SLOPE
        && lower_slope > FLAT_SLOPE
        && lower_slope > upper_slope * 1.1;
    let falling = upper_slope < -FLAT_SLOPE
        && lower_slope < -FLAT_SLOPE
        && upper_slope < lower_slope * 1.1;
    if !rising && !falling {
        return None;
    }

    let last = window.len() - 1;
    let price = window[last].close;
    let fit_quality = (upper.r.abs() + lower.r.abs()) / 2.0;
    let convergence = ((upper_slope - lower_slope).abs() / upper_slope.abs().max(lower_slope.abs()))
        .clamp(0.0, 1.0);
    let confidence = (55.0 + 20.0 * fit_quality + 10.0 * convergence).min(85.0);

    let (pattern_type, target, stop, description) = if rising {
        (
            PatternType::RisingWedge,
            price * (1.0 - TARGET_PCT),
            upper.predict(last as f64) * 1.01,
            "Rising wedge: support climbing faster than resistance",
        )
    } else {
        (
            PatternType::FallingWedge,
            price * (1.0 + TARGET_PCT),
            lower.predict(last as f64) * 0.99,
            "Falling wedge: resistance dropping faster than support",
        )
    };

    Some(
        Pattern::new(
            pattern_type,
            confidence,
            offset + pivots.first_index(),
            offset + last,
            timeframe,
            description,
        )
        .with_key_points(pivots.key_points(offset))
        .with_target(target)
        .with_stop(stop),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zigzag(n: usize, top: impl Fn(f64) -> f64, bottom: impl Fn(f64) -> f64) -> Vec<OhlcPoint> {
        (0..n)
            .map(|i| {
                let x = i as f64;
                let phase = i % 10;
                let t = if phase <= 5 {
                    phase as f64 / 5.0
                } else {
                    (10 - phase) as f64 / 5.0
                };
                let (hi, lo) = (top(x), bottom(x));
                let mid = lo + t * (hi - lo);
                OhlcPoint {
                    time: i as i64 * 86_400_000,
                    open: mid,
                    high: mid + 0.2 * (1.0 - t),
                    low: mid - 0.2 * t,
                    close: mid,
                    volume: 1_000.0,
                }
            })
            .collect()
    }

    #[test]
    fn test_rising_wedge() {
        let bars = zigzag(45, |x| 110.0 + 0.1 * x, |x| 95.0 + 0.3 * x);
        let found = detect(&bars, Timeframe::Day1);
        let wedge = found
            .iter()
            .find(|p| p.pattern_type == PatternType::RisingWedge)
            .expect("rising wedge");
        let price = bars.last().unwrap().close;
        assert!((wedge.target_price.unwrap() - price * 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_falling_wedge() {
        let bars = zigzag(45, |x| 120.0 - 0.3 * x, |x| 100.0 - 0.1 * x);
        let found = detect(&bars, Timeframe::Day1);
        assert!(found.iter().any(|p| p.pattern_type == PatternType::FallingWedge));
    }

    #[test]
    fn test_channel_is_not_a_wedge() {
        let bars = zigzag(45, |x| 110.0 + 0.2 * x, |x| 100.0 + 0.2 * x);
        assert!(detect(&bars, Timeframe::Day1).is_empty());
    }
}
