//! Per-timeframe technical snapshots, cross-timeframe alignment and divergence.

use std::collections::BTreeMap;

use tracing::debug;

use crate::services::indicators::{
    linear_regression_indexed, local_maxima, local_minima, macd, mean, rsi, rsi_series, sma,
};
use crate::types::{
    closes, volumes, AlignmentType, DivergenceSeverity, DivergenceType, MomentumBias,
    MtfAlignment, MtfDivergence, OhlcPoint, Timeframe, TimeframeData, TrendDirection,
    VolumeTrend,
};

/// Bars needed before any indicator is computed.
pub const MIN_BARS: usize = 20;
const TREND_WINDOW: usize = 10;
const TREND_THRESHOLD: f64 = 0.02;
const STRENGTH_WINDOW: usize = 20;
const RSI_PERIOD: usize = 14;
const RSI_BULLISH: f64 = 60.0;
const RSI_BEARISH: f64 = 40.0;
const VOLUME_WINDOW: usize = 10;
const LEVEL_WINDOW: usize = 50;
const LEVEL_PIVOT_ORDER: usize = 2;
const DIVERGENCE_WINDOW: usize = 20;

/// Computes `TimeframeData` for each timeframe and aggregates them.
#[derive(Debug, Clone, Copy, Default)]
pub struct MtfAnalyzer;

impl MtfAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Technical snapshot of one timeframe. With fewer than [`MIN_BARS`] bars
    /// the trend is `Unknown` and every indicator is `None`.
    pub fn analyze_timeframe(
        &self,
        ticker: &str,
        timeframe: Timeframe,
        bars: &[OhlcPoint],
    ) -> TimeframeData {
        let current_price = bars.last().map(|b| b.close).unwrap_or(0.0);
        if bars.len() < MIN_BARS {
            debug!(
                "{} {}: {} bars, not enough for analysis",
                ticker,
                timeframe,
                bars.len()
            );
            return TimeframeData::unknown(timeframe, bars.len(), current_price);
        }

        let close = closes(bars);
        let (trend_direction, trend_strength) = trend(&close);

        let rsi_value = rsi(&close, RSI_PERIOD);
        let rsi_trend = rsi_value.map(|v| {
            if v > RSI_BULLISH {
                MomentumBias::Bullish
            } else if v < RSI_BEARISH {
                MomentumBias::Bearish
            } else {
                MomentumBias::Neutral
            }
        });
        let macd_value = macd(&close);

        let (volume_trend, volume_ratio, volume_strength) = volume_profile(&volumes(bars));
        let light = light_pattern(bars, volume_trend);
        let (nearest_support, nearest_resistance) = nearest_levels(bars, current_price);
        let (bullish_divergence, bearish_divergence) = rsi_divergence(&close);

        let data = TimeframeData {
            timeframe,
            label: timeframe.label().to_string(),
            weight: timeframe.weight(),
            bars: bars.len(),
            current_price,
            sma_50: sma(&close, 50),
            sma_200: sma(&close, 200),
            trend_direction,
            trend_strength,
            rsi: rsi_value,
            rsi_trend,
            macd: macd_value.map(|m| m.macd),
            macd_signal: macd_value.map(|m| m.signal),
            macd_histogram: macd_value.map(|m| m.histogram),
            volume_trend,
            volume_ratio,
            volume_strength,
            pattern_detected: light.is_some(),
            pattern_name: light.map(|(name, _)| name.to_string()),
            pattern_confidence: light.map(|(_, c)| c).unwrap_or(0.0),
            nearest_support,
            nearest_resistance,
            bullish_divergence,
            bearish_divergence,
        };

        debug!(
            "{} {}: trend {} ({:.2}), rsi {:?}, volume {:?}",
            ticker,
            timeframe,
            data.trend_direction.label(),
            data.trend_strength,
            data.rsi,
            data.volume_trend
        );
        data
    }

    /// Bucket timeframes by trend and score their agreement.
    pub fn analyze_alignment(&self, data: &BTreeMap<Timeframe, TimeframeData>) -> MtfAlignment {
        let mut bullish = Vec::new();
        let mut bearish = Vec::new();
        let mut neutral = Vec::new();
        for tf_data in data.values() {
            match tf_data.trend_direction {
                TrendDirection::Up => bullish.push(tf_data.label.clone()),
                TrendDirection::Down => bearish.push(tf_data.label.clone()),
                TrendDirection::Sideways | TrendDirection::Unknown => {
                    neutral.push(tf_data.label.clone())
                }
            }
        }

        let total = data.len();
        let alignment_type = if total == 0 {
            AlignmentType::Neutral
        } else {
            let bull_frac = bullish.len() as f64 / total as f64;
            let bear_frac = bearish.len() as f64 / total as f64;
            if bullish.len() == total {
                AlignmentType::AllBullish
            } else if bearish.len() == total {
                AlignmentType::AllBearish
            } else if bull_frac >= 0.8 {
                AlignmentType::MostlyBullish
            } else if bear_frac >= 0.8 {
                AlignmentType::MostlyBearish
            } else if bullish.len() > bearish.len() {
                AlignmentType::MixedBullish
            } else if bearish.len() > bullish.len() {
                AlignmentType::MixedBearish
            } else {
                AlignmentType::Neutral
            }
        };

        let mut alignment_score = weighted_average(data, |d| match d.trend_direction {
            TrendDirection::Up => 5.0 + d.trend_strength * 5.0,
            TrendDirection::Down => 5.0 - d.trend_strength * 5.0,
            _ => 5.0,
        });
        if alignment_type == AlignmentType::AllBullish {
            alignment_score += 1.0;
        }
        let alignment_score = alignment_score.clamp(0.0, 10.0);

        let higher_tf_trend = majority(data, Timeframe::is_higher);
        let lower_tf_trend = majority(data, Timeframe::is_lower);
        let trend_agreement = higher_tf_trend == lower_tf_trend && higher_tf_trend.is_directional();

        let present: Vec<&TimeframeData> = data.values().collect();
        let conflicts = present
            .windows(2)
            .filter(|pair| pair[0].trend_direction.is_opposite(pair[1].trend_direction))
            .map(|pair| {
                format!(
                    "{} trend {} conflicts with {} trend {}",
                    pair[0].label,
                    pair[0].trend_direction.label(),
                    pair[1].label,
                    pair[1].trend_direction.label()
                )
            })
            .collect();

        let mut warnings: Vec<String> = Timeframe::ALL
            .iter()
            .filter(|tf| !data.contains_key(tf))
            .map(|tf| format!("{} data unavailable", tf.label()))
            .collect();
        warnings.extend(
            data.values()
                .filter(|d| d.trend_direction == TrendDirection::Unknown)
                .map(|d| format!("{}: insufficient data ({} bars)", d.label, d.bars)),
        );
        if higher_tf_trend.is_opposite(lower_tf_trend) {
            warnings.push(format!(
                "Higher timeframes trend {} while lower timeframes trend {}",
                higher_tf_trend.label(),
                lower_tf_trend.label()
            ));
        }

        MtfAlignment {
            is_aligned: matches!(
                alignment_type,
                AlignmentType::AllBullish
                    | AlignmentType::AllBearish
                    | AlignmentType::MostlyBullish
                    | AlignmentType::MostlyBearish
            ),
            alignment_score,
            alignment_type,
            bullish_timeframes: bullish,
            bearish_timeframes: bearish,
            neutral_timeframes: neutral,
            higher_tf_trend,
            lower_tf_trend,
            trend_agreement,
            conflicts,
            warnings,
        }
    }

    /// Group per-timeframe RSI divergences and add the daily/weekly momentum split.
    pub fn detect_mtf_divergences(
        &self,
        data: &BTreeMap<Timeframe, TimeframeData>,
    ) -> Vec<MtfDivergence> {
        let present_weight: f64 = data.values().map(|d| d.weight).sum();
        let mut divergences = Vec::new();
        if present_weight <= 0.0 {
            return divergences;
        }

        for divergence_type in [DivergenceType::Bullish, DivergenceType::Bearish] {
            let involved: Vec<&TimeframeData> = data
                .values()
                .filter(|d| match divergence_type {
                    DivergenceType::Bullish => d.bullish_divergence,
                    DivergenceType::Bearish => d.bearish_divergence,
                })
                .collect();
            if involved.is_empty() {
                continue;
            }

            let weight: f64 = involved.iter().map(|d| d.weight).sum();
            let severity = if weight >= 0.45 {
                DivergenceSeverity::Strong
            } else if weight >= 0.25 {
                DivergenceSeverity::Moderate
            } else {
                DivergenceSeverity::Weak
            };
            let labels: Vec<String> = involved.iter().map(|d| d.label.clone()).collect();
            let kind = match divergence_type {
                DivergenceType::Bullish => "Bullish",
                DivergenceType::Bearish => "Bearish",
            };

            divergences.push(MtfDivergence {
                divergence_type,
                description: format!("{} RSI divergence on {}", kind, labels.join(", ")),
                timeframes_involved: labels,
                severity,
                confirmation_score: (weight / present_weight).clamp(0.0, 1.0),
            });
        }

        if let (Some(daily), Some(weekly)) = (data.get(&Timeframe::Day1), data.get(&Timeframe::Week1))
        {
            if let (Some(daily_rsi), Some(weekly_rsi)) = (daily.rsi, weekly.rsi) {
                let spread = daily_rsi - weekly_rsi;
                if daily.trend_direction == TrendDirection::Up && weekly_rsi < 50.0 && spread > 10.0
                {
                    divergences.push(MtfDivergence {
                        divergence_type: DivergenceType::Bearish,
                        timeframes_involved: vec![daily.label.clone(), weekly.label.clone()],
                        severity: DivergenceSeverity::Moderate,
                        confirmation_score: (spread / 30.0).min(1.0),
                        description: format!(
                            "Daily uptrend with RSI {:.1} not confirmed by weekly RSI {:.1}",
                            daily_rsi, weekly_rsi
                        ),
                    });
                }
            }
        }

        divergences
    }
}

/// Weighted mean of `f` over the timeframes present, renormalised by their
/// total weight. 5.0 when nothing is present.
pub(crate) fn weighted_average(
    data: &BTreeMap<Timeframe, TimeframeData>,
    f: impl Fn(&TimeframeData) -> f64,
) -> f64 {
    let total_weight: f64 = data.values().map(|d| d.weight).sum();
    if total_weight <= 0.0 {
        return 5.0;
    }
    data.values().map(|d| f(d) * d.weight).sum::<f64>() / total_weight
}

/// Majority trend among the present timeframes selected by `group`.
fn majority(
    data: &BTreeMap<Timeframe, TimeframeData>,
    group: impl Fn(&Timeframe) -> bool,
) -> TrendDirection {
    let present: Vec<&TimeframeData> = data
        .iter()
        .filter(|(tf, _)| group(tf))
        .map(|(_, d)| d)
        .collect();
    if present.is_empty() {
        return TrendDirection::Unknown;
    }
    let up = present
        .iter()
        .filter(|d| d.trend_direction == TrendDirection::Up)
        .count();
    let down = present
        .iter()
        .filter(|d| d.trend_direction == TrendDirection::Down)
        .count();
    if up > down {
        TrendDirection::Up
    } else if down > up {
        TrendDirection::Down
    } else {
        TrendDirection::Sideways
    }
}

/// Recent 10-close mean against the 10 before it, and normalised slope of the
/// last 20 closes.
fn trend(close: &[f64]) -> (TrendDirection, f64) {
    let n = close.len();
    let recent = mean(&close[n - TREND_WINDOW..]);
    let earlier = mean(&close[n - 2 * TREND_WINDOW..n - TREND_WINDOW]);
    let direction = match (recent, earlier) {
        (Some(r), Some(e)) if e > 0.0 => {
            let change = (r - e) / e;
            if change >= TREND_THRESHOLD {
                TrendDirection::Up
            } else if change <= -TREND_THRESHOLD {
                TrendDirection::Down
            } else {
                TrendDirection::Sideways
            }
        }
        _ => TrendDirection::Sideways,
    };

    let tail = &close[n - STRENGTH_WINDOW..];
    let strength = match (linear_regression_indexed(tail), mean(tail)) {
        // A 10% move across the window saturates strength at 1.0.
        (Some(fit), Some(avg)) if avg > 0.0 => {
            (fit.slope.abs() * STRENGTH_WINDOW as f64 / avg * 10.0).clamp(0.0, 1.0)
        }
        _ => 0.0,
    };

    (direction, strength)
}

/// Trend, ratio and 0-1 strength of recent against earlier volume.
fn volume_profile(volume: &[f64]) -> (VolumeTrend, Option<f64>, f64) {
    let n = volume.len();
    if n < 2 * VOLUME_WINDOW {
        return (VolumeTrend::Stable, None, 0.0);
    }
    let recent = mean(&volume[n - VOLUME_WINDOW..]).unwrap_or(0.0);
    let earlier = mean(&volume[n - 2 * VOLUME_WINDOW..n - VOLUME_WINDOW]).unwrap_or(0.0);
    if earlier <= 0.0 {
        return (VolumeTrend::Stable, None, 0.0);
    }

    let ratio = recent / earlier;
    let trend = if ratio > 1.2 {
        VolumeTrend::Increasing
    } else if ratio < 0.8 {
        VolumeTrend::Decreasing
    } else {
        VolumeTrend::Stable
    };
    (trend, Some(ratio), (ratio - 1.0).abs().clamp(0.0, 1.0))
}

/// Quick structural read of the last 20 bars: name and 0-1 confidence.
fn light_pattern(bars: &[OhlcPoint], volume_trend: VolumeTrend) -> Option<(&'static str, f64)> {
    let n = bars.len();
    let last = bars.last()?;
    let prior = &bars[n.saturating_sub(21)..n - 1];
    let prior_high = prior.iter().map(|b| b.high).reduce(f64::max)?;
    let prior_low = prior.iter().map(|b| b.low).reduce(f64::min)?;
    let volume_backed = volume_trend == VolumeTrend::Increasing;

    if last.close > prior_high {
        return Some(("Breakout", if volume_backed { 0.85 } else { 0.7 }));
    }
    if last.close < prior_low {
        return Some(("Breakdown", if volume_backed { 0.85 } else { 0.7 }));
    }

    let first_half = &bars[n - 20..n - 10];
    let second_half = &bars[n - 10..];
    let high = |s: &[OhlcPoint]| s.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let low = |s: &[OhlcPoint]| s.iter().map(|b| b.low).fold(f64::MAX, f64::min);

    if high(second_half) > high(first_half) && low(second_half) > low(first_half) {
        return Some(("Higher highs and higher lows", 0.6));
    }
    if high(second_half) < high(first_half) && low(second_half) < low(first_half) {
        return Some(("Lower highs and lower lows", 0.6));
    }
    if last.close > 0.0 && (high(second_half) - low(second_half)) / last.close < 0.03 {
        return Some(("Consolidation", 0.5));
    }
    None
}

/// Closest swing low below and swing high above `price` in the last 50 bars,
/// falling back to the window extremes.
fn nearest_levels(bars: &[OhlcPoint], price: f64) -> (Option<f64>, Option<f64>) {
    let window = &bars[bars.len().saturating_sub(LEVEL_WINDOW)..];
    let highs: Vec<f64> = window.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = window.iter().map(|b| b.low).collect();

    let support = local_minima(&lows, LEVEL_PIVOT_ORDER)
        .into_iter()
        .map(|i| lows[i])
        .filter(|l| *l < price)
        .reduce(f64::max)
        .or_else(|| lows.iter().copied().reduce(f64::min).filter(|l| *l < price));

    let resistance = local_maxima(&highs, LEVEL_PIVOT_ORDER)
        .into_iter()
        .map(|i| highs[i])
        .filter(|h| *h > price)
        .reduce(f64::min)
        .or_else(|| highs.iter().copied().reduce(f64::max).filter(|h| *h > price));

    (support, resistance)
}

/// Price against RSI slope over the trailing window: (bullish, bearish).
fn rsi_divergence(close: &[f64]) -> (bool, bool) {
    let n = close.len();
    if n < DIVERGENCE_WINDOW + RSI_PERIOD {
        return (false, false);
    }
    let rsi_tail: Option<Vec<f64>> = rsi_series(close, RSI_PERIOD)[n - DIVERGENCE_WINDOW..]
        .iter()
        .copied()
        .collect();
    let price_tail = &close[n - DIVERGENCE_WINDOW..];

    let (Some(rsi_tail), Some(price_fit), Some(avg)) = (
        rsi_tail,
        linear_regression_indexed(price_tail),
        mean(price_tail),
    ) else {
        return (false, false);
    };
    let Some(rsi_fit) = linear_regression_indexed(&rsi_tail) else {
        return (false, false);
    };
    if avg <= 0.0 {
        return (false, false);
    }

    // Percent per bar for price, points per bar for RSI.
    slope_divergence(price_fit.slope / avg * 100.0, rsi_fit.slope)
}

/// Opposite slopes where the weaker one is under a tenth of the stronger.
pub(crate) fn slope_divergence(price_slope: f64, rsi_slope: f64) -> (bool, bool) {
    if price_slope == 0.0 || rsi_slope == 0.0 || price_slope.signum() == rsi_slope.signum() {
        return (false, false);
    }
    let (small, large) = if price_slope.abs() < rsi_slope.abs() {
        (price_slope.abs(), rsi_slope.abs())
    } else {
        (rsi_slope.abs(), price_slope.abs())
    };
    if small >= large * 0.1 {
        return (false, false);
    }
    (price_slope < 0.0, price_slope > 0.0)
}
