//! Relative Strength Index (RSI).
//!
//! Momentum oscillator comparing the magnitude of recent gains to recent
//! losses, using Wilder smoothing. Values range from 0-100:
//! - Below 30: Oversold
//! - Above 70: Overbought

/// RSI series aligned with the input: the first `period` entries are `None`.
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() < period + 1 {
        return out;
    }

    let mut gains = Vec::with_capacity(closes.len() - 1);
    let mut losses = Vec::with_capacity(closes.len() - 1);
    for pair in closes.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(-change);
        }
    }

    let mut avg_gain = gains.iter().take(period).sum::<f64>() / period as f64;
    let mut avg_loss = losses.iter().take(period).sum::<f64>() / period as f64;
    out[period] = rsi_from_averages(avg_gain, avg_loss);

    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        out[i + 1] = rsi_from_averages(avg_gain, avg_loss);
    }

    out
}

/// Latest RSI value.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    rsi_series(closes, period).last().copied().flatten()
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        // Flat series has no momentum either way.
        if avg_gain == 0.0 {
            return Some(50.0);
        }
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uptrend(count: usize) -> Vec<f64> {
        (0..count)
            .map(|i| 100.0 + i as f64 * 1.5 + if i % 3 == 0 { -1.0 } else { 0.0 })
            .collect()
    }

    fn downtrend(count: usize) -> Vec<f64> {
        (0..count)
            .map(|i| 200.0 - i as f64 * 1.5 + if i % 3 == 0 { 1.0 } else { 0.0 })
            .collect()
    }

    #[test]
    fn test_rsi_insufficient_data() {
        assert_eq!(rsi(&uptrend(10), 14), None);
    }

    #[test]
    fn test_rsi_uptrend_high_value() {
        let value = rsi(&uptrend(50), 14).unwrap();
        assert!(value > 50.0, "RSI in uptrend should be > 50, got {}", value);
    }

    #[test]
    fn test_rsi_downtrend_low_value() {
        let value = rsi(&downtrend(50), 14).unwrap();
        assert!(value < 50.0, "RSI in downtrend should be < 50, got {}", value);
    }

    #[test]
    fn test_rsi_value_range() {
        for value in rsi_series(&uptrend(60), 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_rsi_series_alignment() {
        let series = rsi_series(&uptrend(30), 14);
        assert_eq!(series.len(), 30);
        assert!(series[..14].iter().all(|v| v.is_none()));
        assert!(series[14..].iter().all(|v| v.is_some()));
    }

    #[test]
    fn test_rsi_only_gains_is_100() {
        let closes: Vec<f64> = (0..20).map(|i| 10.0 + i as f64).collect();
        assert_eq!(rsi(&closes, 14), Some(100.0));
    }

    #[test]
    fn test_rsi_flat_series_is_neutral() {
        assert_eq!(rsi(&[42.0; 20], 14), Some(50.0));
    }

    #[test]
    fn test_rsi_custom_period() {
        assert!(rsi(&uptrend(10), 7).is_some());
    }
}
