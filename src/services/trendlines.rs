//! Automatic support/resistance trendlines and price channels.
//!
//! Lines are fitted through swing lows (support) or swing highs (resistance)
//! of the trailing `lookback` bars, scored by touches, fit quality and breaks,
//! then de-duplicated so only distinct lines remain.

use tracing::debug;

use crate::config::TrendlineConfig;
use crate::services::indicators::{fit_points, local_maxima, local_minima, mean, std_dev};
use crate::types::{Channel, ChannelType, OhlcPoint, Trendline, TrendlineKind, TrendlineSet};

/// Neighbourhood, in bars on each side, for swing detection.
const PIVOT_ORDER: usize = 5;
const MAX_LINES_PER_SIDE: usize = 10;
const MAX_CHANNELS: usize = 5;
/// Lines overlapping more than this share of the shorter span are duplicates
/// when their slope and level also match.
const DUPLICATE_OVERLAP: f64 = 0.7;
const DUPLICATE_SLOPE: f64 = 0.1;
const CHANNEL_MIN_SIMILARITY: f64 = 0.9;
const CHANNEL_MAX_CV: f64 = 0.15;
const CHANNEL_MIN_OVERLAP: usize = 5;
/// Average slope per bar, relative to price, under which a channel is horizontal.
const CHANNEL_FLAT_SLOPE: f64 = 0.0005;

#[derive(Debug, Clone, Default)]
pub struct TrendlineDetector {
    config: TrendlineConfig,
}

impl TrendlineDetector {
    pub fn new(config: TrendlineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrendlineConfig {
        &self.config
    }

    /// Support and resistance lines over the last `lookback` bars, strongest
    /// first, at most ten per side. Indices refer to positions in `bars`.
    pub fn detect_all_trendlines(&self, bars: &[OhlcPoint], lookback: usize) -> TrendlineSet {
        let set = TrendlineSet {
            support: self.detect_side(bars, lookback, TrendlineKind::Support),
            resistance: self.detect_side(bars, lookback, TrendlineKind::Resistance),
        };
        debug!(
            "Trendlines: {} support, {} resistance over {} bars",
            set.support.len(),
            set.resistance.len(),
            bars.len().min(lookback)
        );
        set
    }

    /// Support/resistance pairs that run parallel with a steady gap.
    pub fn detect_channels(&self, bars: &[OhlcPoint], lookback: usize) -> Vec<Channel> {
        let set = self.detect_all_trendlines(bars, lookback);
        let mut channels = Vec::new();

        for support in &set.support {
            for resistance in &set.resistance {
                if let Some(channel) = pair_channel(support, resistance) {
                    channels.push(channel);
                }
            }
        }

        channels.sort_by(|a, b| b.strength.total_cmp(&a.strength));
        channels.truncate(MAX_CHANNELS);
        channels
    }

    fn detect_side(
        &self,
        bars: &[OhlcPoint],
        lookback: usize,
        kind: TrendlineKind,
    ) -> Vec<Trendline> {
        let offset = bars.len().saturating_sub(lookback);
        let window = &bars[offset..];
        if window.len() < PIVOT_ORDER * 2 + 1 {
            return Vec::new();
        }

        let values: Vec<f64> = window
            .iter()
            .map(|b| match kind {
                TrendlineKind::Support => b.low,
                TrendlineKind::Resistance => b.high,
            })
            .collect();
        let pivots: Vec<(usize, f64)> = match kind {
            TrendlineKind::Support => local_minima(&values, PIVOT_ORDER),
            TrendlineKind::Resistance => local_maxima(&values, PIVOT_ORDER),
        }
        .into_iter()
        .map(|i| (offset + i, values[i]))
        .collect();

        let mut candidates = Vec::new();
        for a in 0..pivots.len() {
            for b in a + 1..pivots.len() {
                if let Some(line) = self.evaluate(bars, &pivots[a..=b], kind) {
                    candidates.push(line);
                }
            }
        }

        candidates.sort_by(|a, b| b.strength.total_cmp(&a.strength));
        let mut lines: Vec<Trendline> = Vec::new();
        for candidate in candidates {
            if lines
                .iter()
                .any(|kept| is_duplicate(kept, &candidate, self.config.tolerance, bars.len()))
            {
                continue;
            }
            lines.push(candidate);
            if lines.len() == MAX_LINES_PER_SIDE {
                break;
            }
        }
        lines
    }

    /// Fit a line through `anchors` and score it against every bar from the
    /// first anchor to the end of the series.
    fn evaluate(
        &self,
        bars: &[OhlcPoint],
        anchors: &[(usize, f64)],
        kind: TrendlineKind,
    ) -> Option<Trendline> {
        let fit = fit_points(anchors)?;
        if fit.r.abs() < self.config.min_r_squared {
            return None;
        }

        let start = anchors.first()?.0;
        let last_anchor = anchors.last()?.0;
        let tol = self.config.tolerance;

        let mut touches = 0;
        let mut breaks = 0;
        let mut last_touch = last_anchor;
        for (idx, bar) in bars.iter().enumerate().skip(start) {
            let projected = fit.predict(idx as f64);
            if projected <= 0.0 {
                continue;
            }
            let value = match kind {
                TrendlineKind::Support => bar.low,
                TrendlineKind::Resistance => bar.high,
            };
            if (value - projected).abs() / projected <= tol {
                touches += 1;
                last_touch = last_touch.max(idx);
            }
            let broken = match kind {
                TrendlineKind::Support => bar.close < projected * (1.0 - tol),
                TrendlineKind::Resistance => bar.close > projected * (1.0 + tol),
            };
            if broken {
                breaks += 1;
            }
        }

        if touches < self.config.min_touches {
            return None;
        }

        let strength =
            (touches as f64 * 10.0 + fit.r * fit.r * 40.0 - breaks as f64 * 5.0).clamp(0.0, 100.0);

        Some(Trendline {
            slope: fit.slope,
            intercept: fit.intercept,
            start_idx: start,
            end_idx: last_touch,
            kind,
            touches,
            r_squared: fit.r,
            strength,
            breaks,
        })
    }
}

/// Same slope, same level at the end of the series and mostly the same span.
fn is_duplicate(a: &Trendline, b: &Trendline, tolerance: f64, len: usize) -> bool {
    let end = len.saturating_sub(1);
    let pa = a.price_at(end);
    let pb = b.price_at(end);
    let reference = pa.abs().max(pb.abs());
    if reference <= 0.0 {
        return false;
    }

    let slope_scale = a.slope.abs().max(b.slope.abs());
    let similar_slope = slope_scale < reference * 1e-5
        || (a.slope - b.slope).abs() <= slope_scale * DUPLICATE_SLOPE;
    let similar_level = (pa - pb).abs() / reference <= tolerance;

    let overlap_start = a.start_idx.max(b.start_idx);
    let overlap_end = a.end_idx.min(b.end_idx);
    let shorter = (a.end_idx - a.start_idx).min(b.end_idx - b.start_idx) + 1;
    let overlap = if overlap_end >= overlap_start {
        (overlap_end - overlap_start + 1) as f64 / shorter as f64
    } else {
        0.0
    };

    similar_slope && similar_level && overlap > DUPLICATE_OVERLAP
}

fn pair_channel(support: &Trendline, resistance: &Trendline) -> Option<Channel> {
    let start = support.start_idx.max(resistance.start_idx);
    let end = support.end_idx.min(resistance.end_idx);
    if end < start || end - start + 1 < CHANNEL_MIN_OVERLAP {
        return None;
    }

    let gaps: Vec<f64> = (start..=end)
        .map(|i| resistance.price_at(i) - support.price_at(i))
        .collect();
    if gaps.iter().any(|g| *g <= 0.0) {
        return None;
    }
    let width = mean(&gaps)?;
    let cv = std_dev(&gaps)? / width;
    if cv >= CHANNEL_MAX_CV {
        return None;
    }

    let mids: Vec<f64> = (start..=end)
        .map(|i| (resistance.price_at(i) + support.price_at(i)) / 2.0)
        .collect();
    let mid_price = mean(&mids)?;
    if mid_price <= 0.0 {
        return None;
    }

    let scale = support
        .slope
        .abs()
        .max(resistance.slope.abs())
        .max(mid_price * 1e-4);
    let slope_similarity = 1.0 - (support.slope - resistance.slope).abs() / scale;
    if slope_similarity <= CHANNEL_MIN_SIMILARITY {
        return None;
    }

    let avg_slope = (support.slope + resistance.slope) / 2.0 / mid_price;
    let channel_type = if avg_slope > CHANNEL_FLAT_SLOPE {
        ChannelType::Ascending
    } else if avg_slope < -CHANNEL_FLAT_SLOPE {
        ChannelType::Descending
    } else {
        ChannelType::Horizontal
    };

    let strength =
        ((support.strength + resistance.strength) / 2.0 * slope_similarity * (1.0 - cv))
            .clamp(0.0, 100.0);

    Some(Channel {
        support: support.clone(),
        resistance: resistance.clone(),
        channel_type,
        start_idx: start,
        end_idx: end,
        width,
        width_pct: width / mid_price * 100.0,
        slope_similarity,
        strength,
    })
}
