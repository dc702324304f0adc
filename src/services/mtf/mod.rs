//! Multi-timeframe analysis: per-timeframe snapshots, alignment, scoring,
//! entry timing, alerts and the orchestrating service.

pub mod alerts;
pub mod analyzer;
pub mod entry_timing;
pub mod scoring;
pub mod service;

pub use alerts::MtfAlertSystem;
pub use analyzer::MtfAnalyzer;
pub use entry_timing::{higher_timeframe_direction, MtfEntryTimingOptimizer};
pub use scoring::MtfScoringEngine;
pub use service::ComprehensiveMtfService;
