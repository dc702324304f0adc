//! Bull/bear flags and pennants: a sharp pole followed by a tight pause.

use super::best_per_type;
use crate::services::indicators::linear_regression_indexed;
use crate::types::{closes, highs, lows, KeyPoint, OhlcPoint, Pattern, PatternType, Timeframe};

const POLE_BARS: usize = 15;
const CONSOLIDATION_BARS: [usize; 2] = [5, 10];
const MIN_POLE_R: f64 = 0.7;
const MIN_POLE_MOVE: f64 = 0.03;
const FLAG_MAX_RANGE: f64 = 0.05;
const PENNANT_MAX_RANGE: f64 = 0.10;
const FLAG_TARGET_PCT: f64 = 0.08;
const PENNANT_TARGET_PCT: f64 = 0.10;

pub fn detect(bars: &[OhlcPoint], timeframe: Timeframe) -> Vec<Pattern> {
    let found = CONSOLIDATION_BARS
        .iter()
        .filter_map(|&len| detect_with(bars, len, timeframe))
        .collect();
    best_per_type(found)
}

fn detect_with(bars: &[OhlcPoint], cons_len: usize, timeframe: Timeframe) -> Option<Pattern> {
    let n = bars.len();
    if n < POLE_BARS + cons_len {
        return None;
    }

    let cons_start = n - cons_len;
    let pole_start = cons_start - POLE_BARS;
    let pole = &bars[pole_start..cons_start];
    let consolidation = &bars[cons_start..];

    let pole_closes = closes(pole);
    let pole_fit = linear_regression_indexed(&pole_closes)?;
    let pole_open = pole_closes.first().copied()?;
    let pole_close = pole_closes.last().copied()?;
    if pole_open <= 0.0 {
        return None;
    }
    let pole_move = (pole_close - pole_open) / pole_open;
    if pole_fit.r.abs() <= MIN_POLE_R || pole_move.abs() < MIN_POLE_MOVE {
        return None;
    }
    let bullish = pole_move > 0.0;
    if bullish != (pole_fit.slope > 0.0) {
        return None;
    }

    let cons_highs = highs(consolidation);
    let cons_lows = lows(consolidation);
    let cons_high = cons_highs.iter().copied().fold(f64::MIN, f64::max);
    let cons_low = cons_lows.iter().copied().fold(f64::MAX, f64::min);
    if cons_low <= 0.0 {
        return None;
    }
    let range = (cons_high - cons_low) / cons_low;

    let converging = match (
        linear_regression_indexed(&cons_highs),
        linear_regression_indexed(&cons_lows),
    ) {
        (Some(upper), Some(lower)) => upper.slope < 0.0 && lower.slope > 0.0,
        _ => false,
    };

    let (pattern_type, limit, target_pct) = if converging && range < PENNANT_MAX_RANGE {
        let t = if bullish {
            PatternType::BullPennant
        } else {
            PatternType::BearPennant
        };
        (t, PENNANT_MAX_RANGE, PENNANT_TARGET_PCT)
    } else if range < FLAG_MAX_RANGE {
        let t = if bullish {
            PatternType::BullFlag
        } else {
            PatternType::BearFlag
        };
        (t, FLAG_MAX_RANGE, FLAG_TARGET_PCT)
    } else {
        return None;
    };

    let tightness = 1.0 - range / limit;
    let trend_quality = (pole_fit.r.abs() - MIN_POLE_R) / (1.0 - MIN_POLE_R);
    let confidence = (60.0 + 20.0 * trend_quality + 15.0 * tightness).min(90.0);

    let price = consolidation.last()?.close;
    let (target, stop) = if bullish {
        (price * (1.0 + target_pct), cons_low)
    } else {
        (price * (1.0 - target_pct), cons_high)
    };

    Some(
        Pattern::new(
            pattern_type,
            confidence,
            pole_start,
            n - 1,
            timeframe,
            format!(
                "{:.1}% pole over {} bars, {}-bar consolidation within {:.1}%",
                pole_move * 100.0,
                POLE_BARS,
                cons_len,
                range * 100.0
            ),
        )
        .with_key_points(vec![
            KeyPoint::new(pole_start, pole_open),
            KeyPoint::new(cons_start - 1, pole_close),
            KeyPoint::new(n - 1, price),
        ])
        .with_target(target)
        .with_stop(stop),
    )
}
