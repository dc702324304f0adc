//! Rectangles: horizontal consolidation between flat support and resistance.

use super::{relative_spread, trailing, Pivots};
use crate::types::{OhlcPoint, Pattern, PatternType, Timeframe};

const WINDOW: usize = 30;
const PIVOT_ORDER: usize = 3;
const FLAT_BAND: f64 = 0.015;
const MIN_HEIGHT: f64 = 0.02;
const MAX_HEIGHT: f64 = 0.10;
/// Bars before the rectangle used to decide continuation direction.
const PRIOR_TREND_BARS: usize = 20;
const MIN_PRIOR_BARS: usize = 10;

pub fn detect(bars: &[OhlcPoint], timeframe: Timeframe) -> Vec<Pattern> {
    trailing(bars, WINDOW)
        .and_then(|(offset, window)| classify(bars, window, offset, timeframe))
        .into_iter()
        .collect()
}

fn classify(
    bars: &[OhlcPoint],
    window: &[OhlcPoint],
    offset: usize,
    timeframe: Timeframe,
) -> Option<Pattern> {
    if offset < MIN_PRIOR_BARS {
        return None;
    }
    let pivots = Pivots::find(window, PIVOT_ORDER);
    if pivots.peaks.len() < 2 || pivots.troughs.len() < 2 {
        return None;
    }

    let peak_prices = pivots.peak_prices();
    let trough_prices = pivots.trough_prices();
    let top_spread = relative_spread(&peak_prices)?;
    let bottom_spread = relative_spread(&trough_prices)?;
    if top_spread > FLAT_BAND || bottom_spread > FLAT_BAND {
        return None;
    }

    let top = peak_prices.iter().sum::<f64>() / peak_prices.len() as f64;
    let bottom = trough_prices.iter().sum::<f64>() / trough_prices.len() as f64;
    let height_pct = (top - bottom) / bottom;
    if !(MIN_HEIGHT..=MAX_HEIGHT).contains(&height_pct) {
        return None;
    }

    let prior_start = offset.saturating_sub(PRIOR_TREND_BARS);
    let prior_from = bars[prior_start].close;
    let prior_to = bars[offset - 1].close;
    if prior_from <= 0.0 || prior_to == prior_from {
        return None;
    }
    let bullish = prior_to > prior_from;

    let touches = (pivots.peaks.len() + pivots.troughs.len()) as f64;
    let flatness = 1.0 - top_spread.max(bottom_spread) / FLAT_BAND;
    let confidence = (60.0 + (touches - 4.0) * 3.0 + flatness * 10.0).min(85.0);
    let height = top - bottom;

    let (pattern_type, target, stop) = if bullish {
        (PatternType::BullishRectangle, top + height, bottom * 0.99)
    } else {
        (PatternType::BearishRectangle, bottom - height, top * 1.01)
    };

    Some(
        Pattern::new(
            pattern_type,
            confidence,
            offset + pivots.first_index(),
            offset + window.len() - 1,
            timeframe,
            format!(
                "Range {:.2}-{:.2} ({:.1}% tall) after {} trend",
                bottom,
                top,
                height_pct * 100.0,
                if bullish { "rising" } else { "falling" }
            ),
        )
        .with_key_points(pivots.key_points(offset))
        .with_target(target)
        .with_stop(stop),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(i: usize, close: f64, spread: f64) -> OhlcPoint {
        OhlcPoint {
            time: i as i64 * 86_400_000,
            open: close,
            high: close + spread,
            low: close - spread,
            close,
            volume: 1_000.0,
        }
    }

    fn with_prior(step: f64) -> Vec<OhlcPoint> {
        let mut bars: Vec<OhlcPoint> = (0..20)
            .map(|i| bar(i, 100.0 + step * (i as f64 - 20.0), 0.3))
            .collect();
        for k in 0..30 {
            let phase = k % 8;
            let t = if phase <= 4 {
                phase as f64 / 4.0
            } else {
                (8 - phase) as f64 / 4.0
            };
            bars.push(bar(20 + k, 100.0 + 5.0 * t, 0.2));
        }
        bars
    }

    #[test]
    fn test_bullish_rectangle_after_uptrend() {
        let found = detect(&with_prior(0.5), Timeframe::Day1);
        assert_eq!(found.len(), 1);
        let rect = &found[0];
        assert_eq!(rect.pattern_type, PatternType::BullishRectangle);
        assert!((rect.target_price.unwrap() - 110.6).abs() < 0.01);
    }

    #[test]
    fn test_bearish_rectangle_after_downtrend() {
        let found = detect(&with_prior(-0.5), Timeframe::Day1);
        assert_eq!(found[0].pattern_type, PatternType::BearishRectangle);
    }

    #[test]
    fn test_no_history_no_rectangle() {
        let bars: Vec<OhlcPoint> = with_prior(0.5).into_iter().skip(15).collect();
        assert!(detect(&bars, Timeframe::Day1).is_empty());
    }
}
