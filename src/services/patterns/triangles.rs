//! Ascending, descending and symmetrical triangles.

use super::{best_per_type, relative_spread, trailing, Pivots, FLAT_SLOPE};
use crate::services::indicators::{fit_points, linear_regression_indexed, mean, LinearFit};
use crate::types::{closes, OhlcPoint, Pattern, PatternBias, PatternType, Timeframe};

const WINDOWS: [usize; 3] = [30, 45, 60];
const PIVOT_ORDER: usize = 3;
/// Peak highs (or trough lows) of a flat side stay within this band.
const FLAT_BAND: f64 = 0.015;

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

/// Line through one side's pivots with their prices. A side with fewer than
/// two pivots (a flat or strictly monotone edge) is fitted through every bar.
fn side_fit(pivots: &[(usize, f64)], values: Vec<f64>) -> Option<(LinearFit, Vec<f64>)> {
    if pivots.len() >= 2 {
        let fit = fit_points(pivots)?;
        return Some((fit, pivots.iter().map(|p| p.1).collect()));
    }
    let fit = linear_regression_indexed(&values)?;
    Some((fit, values))
}

fn classify(window: &[OhlcPoint], offset: usize, timeframe: Timeframe) -> Option<Pattern> {
    let pivots = Pivots::find(window, PIVOT_ORDER);
    let highs: Vec<f64> = window.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = window.iter().map(|b| b.low).collect();
    let (resistance, peak_prices) = side_fit(&pivots.peaks, highs)?;
    let (support, trough_prices) = side_fit(&pivots.troughs, lows)?;
    let avg_close = mean(&closes(window))?;
    if avg_close <= 0.0 {
        return None;
    }

    let res_slope = resistance.slope / avg_close;
    let sup_slope = support.slope / avg_close;
    let last = window.len() - 1;
    let price = window[last].close;
    let start = offset + pivots.first_index();
    let end = offset + last;
    let pivot_count = (pivots.peaks.len() + pivots.troughs.len()) as f64;
    let pivot_bonus = ((pivot_count - 4.0) * 2.5).clamp(0.0, 10.0);
    let key_points = pivots.key_points(offset);

    if res_slope.abs() < FLAT_SLOPE && sup_slope > FLAT_SLOPE && support.r >= 0.8 {
        if relative_spread(&peak_prices)? <= FLAT_BAND {
            let resistance_level = mean(&peak_prices)?;
            let confidence = (60.0 + 25.0 * support.r + pivot_bonus).min(95.0);
            return Some(
                Pattern::new(
                    PatternType::AscendingTriangle,
                    confidence,
                    start,
                    end,
                    timeframe,
                    format!(
                        "Flat resistance at {:.2} with rising support ({} lows)",
                        resistance_level,
                        trough_prices.len()
                    ),
                )
                .with_key_points(key_points)
                .with_target(resistance_level * 1.05)
                .with_stop(support.predict(last as f64) * 0.98),
            );
        }
    }

    if sup_slope.abs() < FLAT_SLOPE && res_slope < -FLAT_SLOPE && resistance.r <= -0.8 {
        if relative_spread(&trough_prices)? <= FLAT_BAND {
            let support_level = mean(&trough_prices)?;
            let confidence = (60.0 + 25.0 * resistance.r.abs() + pivot_bonus).min(95.0);
            return Some(
                Pattern::new(
                    PatternType::DescendingTriangle,
                    confidence,
                    start,
                    end,
                    timeframe,
                    format!(
                        "Flat support at {:.2} with falling resistance ({} highs)",
                        support_level,
                        peak_prices.len()
                    ),
                )
                .with_key_points(key_points)
                .with_target(support_level * 0.95)
                .with_stop(resistance.predict(last as f64) * 1.02),
            );
        }
    }

    if res_slope < -FLAT_SLOPE
        && sup_slope > FLAT_SLOPE
        && resistance.r.abs() >= 0.7
        && support.r.abs() >= 0.7
    {
        let first = pivots.first_index() as f64;
        let height = resistance.predict(first) - support.predict(first);
        if height <= 0.0 {
            return None;
        }
        let fit_quality = (resistance.r.abs() + support.r.abs()) / 2.0;
        let confidence = (55.0 + 25.0 * fit_quality + pivot_bonus).min(90.0);

        // Breakout direction follows the move into the pattern.
        let bullish = price >= window[0].close;
        let (bias, target, stop) = if bullish {
            (
                PatternBias::Bullish,
                price + height,
                support.predict(last as f64) * 0.98,
            )
        } else {
            (
                PatternBias::Bearish,
                price - height,
                resistance.predict(last as f64) * 1.02,
            )
        };

        return Some(
            Pattern::new(
                PatternType::SymmetricalTriangle,
                confidence,
                start,
                end,
                timeframe,
                format!("Converging trendlines, pattern height {:.2}", height),
            )
            .with_bias(bias)
            .with_key_points(key_points)
            .with_target(target)
            .with_stop(stop),
        );
    }

    None
}
