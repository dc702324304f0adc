//! Rounding tops and bottoms from a parabolic fit of closes.

use super::trailing;
use crate::services::indicators::quadratic_regression;
use crate::types::{closes, KeyPoint, OhlcPoint, Pattern, PatternType, Timeframe};

const MIN_BARS: usize = 50;
const WINDOW: usize = 60;
const MIN_R_SQUARED: f64 = 0.65;

pub fn detect(bars: &[OhlcPoint], timeframe: Timeframe) -> Vec<Pattern> {
    if bars.len() < MIN_BARS {
        return Vec::new();
    }
    trailing(bars, bars.len().min(WINDOW))
        .and_then(|(offset, window)| classify(window, offset, timeframe))
        .into_iter()
        .collect()
}

fn classify(window: &[OhlcPoint], offset: usize, timeframe: Timeframe) -> Option<Pattern> {
    let series = closes(window);
    let fit = quadratic_regression(&series)?;
    if fit.r_squared <= MIN_R_SQUARED || fit.a == 0.0 {
        return None;
    }

    // The turning point has to sit well inside the window, not at an edge.
    let len = series.len() as f64;
    let vertex = fit.vertex()?;
    if vertex < len * 0.2 || vertex > len * 0.8 {
        return None;
    }

    let first = *series.first()?;
    let last_close = *series.last()?;
    let extreme = fit.predict(vertex);
    let vertex_idx = offset + vertex.round() as usize;
    let confidence = (55.0 + fit.r_squared * 35.0).min(90.0);

    let (pattern_type, target, stop) = if fit.a > 0.0 {
        let rim = first.max(last_close);
        (
            PatternType::RoundingBottom,
            last_close + (rim - extreme),
            extreme * 0.98,
        )
    } else {
        let rim = first.min(last_close);
        (
            PatternType::RoundingTop,
            last_close - (extreme - rim),
            extreme * 1.02,
        )
    };

    Some(
        Pattern::new(
            pattern_type,
            confidence,
            offset,
            offset + series.len() - 1,
            timeframe,
            format!(
                "Parabolic fit R\u{b2} {:.2}, turning point near {:.2}",
                fit.r_squared, extreme
            ),
        )
        .with_key_points(vec![
            KeyPoint::new(offset, first),
            KeyPoint::new(vertex_idx, extreme),
            KeyPoint::new(offset + series.len() - 1, last_close),
        ])
        .with_target(target)
        .with_stop(stop),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(f: impl Fn(f64) -> f64) -> Vec<OhlcPoint> {
        (0..60)
            .map(|i| {
                let close = f(i as f64);
                OhlcPoint {
                    time: i as i64 * 86_400_000,
                    open: close,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume: 1_000.0,
                }
            })
            .collect()
    }

    #[test]
    fn test_rounding_bottom() {
        let bars = series(|x| 80.0 + 0.02 * (x - 30.0).powi(2));
        let found = detect(&bars, Timeframe::Week1);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern_type, PatternType::RoundingBottom);
        assert!(found[0].confidence > 85.0);
        assert!(found[0].target_price.unwrap() > bars.last().unwrap().close);
    }

    #[test]
    fn test_rounding_top() {
        let bars = series(|x| 120.0 - 0.02 * (x - 28.0).powi(2));
        let found = detect(&bars, Timeframe::Week1);
        assert_eq!(found[0].pattern_type, PatternType::RoundingTop);
    }

    #[test]
    fn test_straight_line_is_not_rounded() {
        let bars = series(|x| 100.0 + x);
        assert!(detect(&bars, Timeframe::Week1).is_empty());
    }
}
