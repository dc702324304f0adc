//! MACD (Moving Average Convergence Divergence).
//!
//! - MACD Line = EMA(fast) - EMA(slow)
//! - Signal Line = EMA(signal) of MACD Line
//! - Histogram = MACD Line - Signal Line

use super::moving_average::ema_series;

/// Latest MACD reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdValue {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD with the standard 12/26/9 periods.
pub fn macd(closes: &[f64]) -> Option<MacdValue> {
    macd_with(closes, 12, 26, 9)
}

pub fn macd_with(
    closes: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> Option<MacdValue> {
    if fast_period >= slow_period || closes.len() < slow_period + signal_period {
        return None;
    }

    let fast_ema = ema_series(closes, fast_period);
    let slow_ema = ema_series(closes, slow_period);
    if fast_ema.is_empty() || slow_ema.is_empty() {
        return None;
    }

    // Fast EMA starts earlier; align on the slow one.
    let offset = slow_period - fast_period;
    let macd_line: Vec<f64> = fast_ema
        .iter()
        .skip(offset)
        .zip(slow_ema.iter())
        .map(|(f, s)| f - s)
        .collect();

    let signal_line = ema_series(&macd_line, signal_period);
    let macd = *macd_line.last()?;
    let signal = *signal_line.last()?;

    Some(MacdValue {
        macd,
        signal,
        histogram: macd - signal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macd_insufficient_data() {
        let closes: Vec<f64> = (0..30).map(|i| i as f64).collect();
        assert!(macd(&closes).is_none());
    }

    #[test]
    fn test_macd_positive_in_accelerating_uptrend() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 + (i as f64).powf(1.3)).collect();
        let value = macd(&closes).unwrap();
        assert!(value.macd > 0.0);
        assert!((value.histogram - (value.macd - value.signal)).abs() < 1e-12);
    }

    #[test]
    fn test_macd_negative_in_downtrend() {
        let closes: Vec<f64> = (0..80).map(|i| 300.0 - i as f64 * 2.0).collect();
        let value = macd(&closes).unwrap();
        assert!(value.macd < 0.0);
    }

    #[test]
    fn test_macd_flat_series_is_zero() {
        let value = macd(&[10.0; 60]).unwrap();
        assert!(value.macd.abs() < 1e-12);
        assert!(value.histogram.abs() < 1e-12);
    }

    #[test]
    fn test_macd_rejects_inverted_periods() {
        let closes: Vec<f64> = (0..80).map(|i| i as f64).collect();
        assert!(macd_with(&closes, 26, 12, 9).is_none());
    }
}
