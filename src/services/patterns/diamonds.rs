//! Diamond tops and bottoms.
//!
//! Not implemented yet: a broadening-then-contracting range is not detected,
//! so this always returns an empty list. The `DiamondTop`/`DiamondBottom`
//! variants and their win-rate entries exist so the detector can be filled
//! in without touching callers.

use crate::types::{OhlcPoint, Pattern, Timeframe};

pub fn detect(_bars: &[OhlcPoint], _timeframe: Timeframe) -> Vec<Pattern> {
    Vec::new()
}
