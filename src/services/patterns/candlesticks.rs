//! One to three candle formations on the trailing bars.
//!
//! Each rule yields a strength in 0.0-1.0; confidence is strength * 100
//! capped at 90, except dojis which sit on a lower 50-80 scale.

use crate::types::{KeyPoint, OhlcPoint, Pattern, PatternBias, PatternType, Timeframe};

const MAX_CONFIDENCE: f64 = 90.0;
const TARGET_PCT: f64 = 0.03;

struct Candidate {
    pattern_type: PatternType,
    strength: f64,
    /// Number of trailing bars forming the pattern.
    span: usize,
}

impl Candidate {
    fn new(pattern_type: PatternType, strength: f64, span: usize) -> Self {
        Self {
            pattern_type,
            strength: strength.clamp(0.0, 1.0),
            span,
        }
    }
}

pub fn detect(bars: &[OhlcPoint], timeframe: Timeframe) -> Vec<Pattern> {
    let n = bars.len();
    if n < 4 {
        return Vec::new();
    }

    let mut candidates = Vec::new();
    candidates.extend(single(bars));
    candidates.extend(double(&bars[n - 2], &bars[n - 1]));
    candidates.extend(triple(&bars[n - 3], &bars[n - 2], &bars[n - 1]));

    candidates
        .into_iter()
        .map(|c| to_pattern(bars, c, timeframe))
        .collect()
}

/// Three falling closes into the last bar.
fn prior_downtrend(bars: &[OhlcPoint]) -> bool {
    let n = bars.len();
    bars[n - 4].close > bars[n - 3].close && bars[n - 3].close > bars[n - 2].close
}

fn prior_uptrend(bars: &[OhlcPoint]) -> bool {
    let n = bars.len();
    bars[n - 4].close < bars[n - 3].close && bars[n - 3].close < bars[n - 2].close
}

fn single(bars: &[OhlcPoint]) -> Option<Candidate> {
    let c = bars.last()?;
    let range = c.range();
    if range <= 0.0 {
        return None;
    }
    let body_ratio = c.body() / range;
    let upper_ratio = c.upper_shadow() / range;
    let lower_ratio = c.lower_shadow() / range;

    if body_ratio < 0.1 {
        let strength = 1.0 - body_ratio * 10.0;
        let t = if upper_ratio < 0.1 && lower_ratio > 0.6 {
            PatternType::DragonflyDoji
        } else if lower_ratio < 0.1 && upper_ratio > 0.6 {
            PatternType::GravestoneDoji
        } else {
            PatternType::Doji
        };
        return Some(Candidate::new(t, strength, 1));
    }

    if body_ratio < 0.33 && lower_ratio > 0.66 && upper_ratio < 0.1 {
        let strength = 0.7 + (lower_ratio - 0.66);
        if prior_downtrend(bars) {
            return Some(Candidate::new(PatternType::Hammer, strength, 1));
        }
        if prior_uptrend(bars) {
            return Some(Candidate::new(PatternType::HangingMan, strength, 1));
        }
    }

    if body_ratio < 0.33 && upper_ratio > 0.66 && lower_ratio < 0.1 {
        let strength = 0.7 + (upper_ratio - 0.66);
        if prior_downtrend(bars) {
            return Some(Candidate::new(PatternType::InvertedHammer, strength, 1));
        }
        if prior_uptrend(bars) {
            return Some(Candidate::new(PatternType::ShootingStar, strength, 1));
        }
    }

    if body_ratio < 0.3 && upper_ratio > 0.25 && lower_ratio > 0.25 {
        return Some(Candidate::new(PatternType::SpinningTop, 0.6, 1));
    }

    None
}

fn double(prev: &OhlcPoint, cur: &OhlcPoint) -> Option<Candidate> {
    let prev_body = prev.body();
    let cur_body = cur.body();
    if prev_body <= 0.0 || cur_body <= 0.0 {
        return None;
    }

    // Engulfing
    if prev.is_bearish() && cur.is_bullish() && cur.open <= prev.close && cur.close >= prev.open
        && cur_body > prev_body
    {
        let strength = 0.7 + (cur_body / prev_body - 1.0).min(0.3);
        return Some(Candidate::new(PatternType::BullishEngulfing, strength, 2));
    }
    if prev.is_bullish() && cur.is_bearish() && cur.open >= prev.close && cur.close <= prev.open
        && cur_body > prev_body
    {
        let strength = 0.7 + (cur_body / prev_body - 1.0).min(0.3);
        return Some(Candidate::new(PatternType::BearishEngulfing, strength, 2));
    }

    // Harami: small opposite body inside the previous one.
    let prev_top = prev.open.max(prev.close);
    let prev_bottom = prev.open.min(prev.close);
    let inside = cur.open.max(cur.close) < prev_top && cur.open.min(cur.close) > prev_bottom;
    if inside {
        let strength = 0.7 + (1.0 - cur_body / prev_body) * 0.3;
        if prev.is_bearish() && cur.is_bullish() {
            return Some(Candidate::new(PatternType::BullishHarami, strength, 2));
        }
        if prev.is_bullish() && cur.is_bearish() {
            return Some(Candidate::new(PatternType::BearishHarami, strength, 2));
        }
    }

    // Piercing line / dark cloud cover: open beyond the prior close, recover past its midpoint.
    const PENETRATION: f64 = 0.5;
    if prev.is_bearish() && cur.is_bullish() && cur.open < prev.close && cur.close < prev.open {
        let penetration = (cur.close - prev.close) / prev_body;
        if penetration > PENETRATION {
            let strength = 0.7 + (penetration - PENETRATION) * (0.3 / (1.0 - PENETRATION));
            return Some(Candidate::new(PatternType::PiercingLine, strength, 2));
        }
    }
    if prev.is_bullish() && cur.is_bearish() && cur.open > prev.close && cur.close > prev.open {
        let penetration = (prev.close - cur.close) / prev_body;
        if penetration > PENETRATION {
            let strength = 0.7 + (penetration - PENETRATION) * (0.3 / (1.0 - PENETRATION));
            return Some(Candidate::new(PatternType::DarkCloudCover, strength, 2));
        }
    }

    None
}

fn triple(a: &OhlcPoint, b: &OhlcPoint, c: &OhlcPoint) -> Option<Candidate> {
    let a_body = a.body();
    if a_body <= 0.0 || a.range() <= 0.0 {
        return None;
    }
    let a_large = a_body / a.range() > 0.5;
    let b_small = b.body() < a_body * 0.3;

    if a_large && b_small && a.is_bearish() && c.is_bullish() {
        let penetration = (c.close - a.close) / a_body;
        if penetration > 0.3 {
            return Some(Candidate::new(PatternType::MorningStar, 0.7 + penetration * 0.3, 3));
        }
    }
    if a_large && b_small && a.is_bullish() && c.is_bearish() {
        let penetration = (a.close - c.close) / a_body;
        if penetration > 0.3 {
            return Some(Candidate::new(PatternType::EveningStar, 0.7 + penetration * 0.3, 3));
        }
    }

    let candles = [a, b, c];
    let solid = candles
        .iter()
        .all(|k| k.range() > 0.0 && k.body() / k.range() > 0.5);
    if !solid {
        return None;
    }
    let growth = usize::from(b.body() > a.body()) + usize::from(c.body() > b.body());

    let soldiers = candles.iter().all(|k| k.is_bullish())
        && b.close > a.close
        && c.close > b.close
        && b.open >= a.open
        && b.open <= a.close
        && c.open >= b.open
        && c.open <= b.close;
    if soldiers {
        return Some(Candidate::new(
            PatternType::ThreeWhiteSoldiers,
            0.7 + growth as f64 * 0.15,
            3,
        ));
    }

    let crows = candles.iter().all(|k| k.is_bearish())
        && b.close < a.close
        && c.close < b.close
        && b.open <= a.open
        && b.open >= a.close
        && c.open <= b.open
        && c.open >= b.close;
    if crows {
        return Some(Candidate::new(
            PatternType::ThreeBlackCrows,
            0.7 + growth as f64 * 0.15,
            3,
        ));
    }

    None
}

fn to_pattern(bars: &[OhlcPoint], candidate: Candidate, timeframe: Timeframe) -> Pattern {
    let n = bars.len();
    let start = n - candidate.span;
    let involved = &bars[start..];
    let price = bars[n - 1].close;

    let is_doji = matches!(
        candidate.pattern_type,
        PatternType::Doji | PatternType::DragonflyDoji | PatternType::GravestoneDoji
    );
    let confidence = if is_doji {
        50.0 + 30.0 * candidate.strength
    } else {
        (candidate.strength * 100.0).min(MAX_CONFIDENCE)
    };

    let pattern = Pattern::new(
        candidate.pattern_type,
        confidence,
        start,
        n - 1,
        timeframe,
        format!(
            "{} on the last {} candle(s)",
            candidate.pattern_type.name(),
            candidate.span
        ),
    )
    .with_key_points(
        involved
            .iter()
            .enumerate()
            .map(|(k, b)| KeyPoint::new(start + k, b.close))
            .collect(),
    );

    let low = involved.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let high = involved.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    match pattern.bias {
        PatternBias::Bullish => pattern
            .with_target(price * (1.0 + TARGET_PCT))
            .with_stop(low * 0.99),
        PatternBias::Bearish => pattern
            .with_target(price * (1.0 - TARGET_PCT))
            .with_stop(high * 1.01),
        PatternBias::Neutral => pattern,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> OhlcPoint {
        OhlcPoint {
            time: 0,
            open,
            high,
            low,
            close,
            volume: 1_000.0,
        }
    }

    fn falling_lead_in() -> Vec<OhlcPoint> {
        vec![
            candle(110.0, 111.0, 107.0, 108.0),
            candle(108.0, 109.0, 105.0, 106.0),
            candle(106.0, 107.0, 103.0, 104.0),
        ]
    }

    fn rising_lead_in() -> Vec<OhlcPoint> {
        vec![
            candle(100.0, 103.0, 99.0, 102.0),
            candle(102.0, 105.0, 101.0, 104.0),
            candle(104.0, 107.0, 103.0, 106.0),
        ]
    }

    fn types(bars: &[OhlcPoint]) -> Vec<PatternType> {
        detect(bars, Timeframe::Day1)
            .into_iter()
            .map(|p| p.pattern_type)
            .collect()
    }

    #[test]
    fn test_hammer_after_decline() {
        let mut bars = falling_lead_in();
        bars.push(candle(103.0, 104.0, 98.0, 103.9));
        assert!(types(&bars).contains(&PatternType::Hammer));
    }

    #[test]
    fn test_shooting_star_after_rally() {
        let mut bars = rising_lead_in();
        bars.push(candle(106.0, 112.0, 105.9, 106.8));
        assert!(types(&bars).contains(&PatternType::ShootingStar));
    }

    #[test]
    fn test_bullish_engulfing() {
        let mut bars = falling_lead_in();
        bars.push(candle(104.0, 104.5, 101.5, 102.0));
        bars.push(candle(101.5, 105.5, 101.0, 105.0));
        let found = detect(&bars, Timeframe::Day1);
        let engulfing = found
            .iter()
            .find(|p| p.pattern_type == PatternType::BullishEngulfing)
            .expect("engulfing");
        assert!(engulfing.confidence >= 70.0 && engulfing.confidence <= 90.0);
        assert_eq!(engulfing.start_idx, bars.len() - 2);
        assert!((engulfing.target_price.unwrap() - 105.0 * 1.03).abs() < 1e-9);
    }

    #[test]
    fn test_doji_confidence_scale() {
        let mut bars = rising_lead_in();
        bars.push(candle(106.0, 108.0, 104.0, 106.0));
        let found = detect(&bars, Timeframe::Day1);
        let doji = found
            .iter()
            .find(|p| p.pattern_type == PatternType::Doji)
            .expect("doji");
        assert_eq!(doji.confidence, 80.0);
        assert!(doji.target_price.is_none());
    }

    #[test]
    fn test_three_white_soldiers() {
        let mut bars = falling_lead_in();
        bars.push(candle(100.0, 102.2, 99.8, 102.0));
        bars.push(candle(101.5, 104.7, 101.3, 104.5));
        bars.push(candle(104.0, 107.7, 103.8, 107.5));
        assert!(types(&bars).contains(&PatternType::ThreeWhiteSoldiers));
    }

    #[test]
    fn test_morning_star() {
        let mut bars = rising_lead_in();
        bars.push(candle(110.0, 110.5, 99.5, 100.0));
        bars.push(candle(99.0, 99.8, 98.0, 99.2));
        bars.push(candle(100.0, 107.0, 99.5, 106.5));
        assert!(types(&bars).contains(&PatternType::MorningStar));
    }
}
