//! Alerts derived from a finished analysis. Generation only, nothing is delivered.

use crate::types::{
    AlertKind, AlertSeverity, AlignmentType, DivergenceSeverity, MtfAlert, MtfAnalysis,
    SignalType,
};

const HIGH_SCORE: f64 = 8.5;
const LOW_SCORE: f64 = 3.0;
const CRITICAL_ENTRY_CONFIDENCE: f64 = 0.7;

#[derive(Debug, Clone, Copy, Default)]
pub struct MtfAlertSystem;

impl MtfAlertSystem {
    pub fn new() -> Self {
        Self
    }

    /// Alerts sorted by severity, most severe first.
    pub fn generate(&self, analysis: &MtfAnalysis) -> Vec<MtfAlert> {
        let ticker = analysis.ticker.as_str();
        let alert = |kind, severity, message: String| MtfAlert {
            ticker: ticker.to_string(),
            kind,
            severity,
            message,
        };
        let mut alerts = Vec::new();

        let alignment = &analysis.alignment;
        if matches!(
            alignment.alignment_type,
            AlignmentType::AllBullish | AlignmentType::AllBearish
        ) {
            alerts.push(alert(
                AlertKind::FullAlignment,
                AlertSeverity::High,
                format!(
                    "{}: all {} timeframes {}",
                    ticker,
                    analysis.timeframe_data.len(),
                    alignment.alignment_type.label()
                ),
            ));
        }

        for divergence in &analysis.divergences {
            let severity = if divergence.severity == DivergenceSeverity::Strong {
                AlertSeverity::High
            } else {
                AlertSeverity::Medium
            };
            alerts.push(alert(
                AlertKind::Divergence,
                severity,
                format!("{}: {}", ticker, divergence.description),
            ));
        }

        let score = analysis.score.overall_score;
        if score >= HIGH_SCORE || score <= LOW_SCORE {
            alerts.push(alert(
                AlertKind::ScoreExtreme,
                AlertSeverity::High,
                format!(
                    "{}: MTF score {:.1} ({})",
                    ticker,
                    score,
                    analysis.recommendation.label()
                ),
            ));
        }

        let signal = &analysis.entry_timing.current_signal;
        if signal.signal_type != SignalType::Wait {
            let severity = if signal.confidence >= CRITICAL_ENTRY_CONFIDENCE {
                AlertSeverity::Critical
            } else {
                AlertSeverity::Medium
            };
            alerts.push(alert(
                AlertKind::EntrySignal,
                severity,
                format!(
                    "{}: {:?} on {} at {:.2}, stop {:.2}, target {:.2} ({:.0}% confidence)",
                    ticker,
                    signal.signal_type,
                    signal.entry_timeframe.label(),
                    signal.entry_price,
                    signal.stop_loss,
                    signal.take_profit,
                    signal.confidence * 100.0
                ),
            ));
        }

        for conflict in &alignment.conflicts {
            alerts.push(alert(
                AlertKind::TimeframeConflict,
                AlertSeverity::Low,
                format!("{}: {}", ticker, conflict),
            ));
        }

        if !analysis.missing_timeframes.is_empty() {
            let labels: Vec<&str> = analysis
                .missing_timeframes
                .iter()
                .map(|tf| tf.label())
                .collect();
            alerts.push(alert(
                AlertKind::MissingData,
                AlertSeverity::Info,
                format!("{}: no data for {}", ticker, labels.join(", ")),
            ));
        }

        // Stable sort keeps rule order within a severity.
        alerts.sort_by(|a, b| b.severity.cmp(&a.severity));
        alerts
    }
}
