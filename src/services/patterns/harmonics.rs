//! Harmonic XABCD formations (Gartley, Butterfly, Bat, Crab, Cypher, Shark, AB=CD).
//!
//! Not implemented yet: Fibonacci leg-ratio matching is not performed, so this
//! always returns an empty list.

use crate::types::{OhlcPoint, Pattern, Timeframe};

pub fn detect(_bars: &[OhlcPoint], _timeframe: Timeframe) -> Vec<Pattern> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harmonic_detector_is_a_stub() {
        let bars: Vec<OhlcPoint> = (0..80)
            .map(|i| OhlcPoint {
                time: i,
                open: 100.0 + i as f64,
                high: 101.0 + i as f64,
                low: 99.0 + i as f64,
                close: 100.5 + i as f64,
                volume: 1.0,
            })
            .collect();
        assert!(detect(&bars, Timeframe::Hour4).is_empty());
    }
}
