//! KneadData QC Report
//!
//! Turns per-sample KneadData log files into a single QC table.
//!
//! This library provides shared functionality for:
//! - Pulling read counts and percentages out of free-form log text
//! - Deriving host-removal rate and estimated output size
//! - Threshold-based QC flagging
//! - Multi-sample report export

pub mod discovery;
pub mod error;
pub mod extract;
pub mod flagging;
pub mod patterns;
pub mod reporting;

pub use error::ExtractionError;
pub use extract::LogExtractor;
pub use flagging::{QcFlagger, QcThresholds};
pub use reporting::{QcReporter, ReportTable};

use serde::{Deserialize, Serialize};

/// Note written for a record that violates no threshold
pub const PASS_NOTE: &str = "Pass";

/// Metrics extracted from one KneadData log.
///
/// Rates and size are kept at full precision; [`QcMetrics::rounded`] gives the
/// two-decimal values written to the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcMetrics {
    pub raw_reads: u64,
    pub trimmed_reads: f64,
    pub final_reads: f64,
    pub trim_loss_pct: f64,
    pub paired_survival_pct: f64,
    pub host_removal_pct: f64,
    pub estimated_size_gb: f64,
}

impl QcMetrics {
    /// Percentages and size rounded to two decimal places
    pub fn rounded(&self) -> Self {
        Self {
            trim_loss_pct: round2(self.trim_loss_pct),
            paired_survival_pct: round2(self.paired_survival_pct),
            host_removal_pct: round2(self.host_removal_pct),
            estimated_size_gb: round2(self.estimated_size_gb),
            ..self.clone()
        }
    }
}

/// One row of the QC report.
///
/// `metrics` is `None` when extraction failed; `qc_note` then carries the
/// `Error: ...` message instead of a verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub sample_id: String,
    pub metrics: Option<QcMetrics>,
    pub qc_note: String,
}

impl LogRecord {
    /// Successfully extracted record, not yet flagged
    pub fn parsed(sample_id: String, metrics: QcMetrics) -> Self {
        Self {
            sample_id,
            metrics: Some(metrics),
            qc_note: String::new(),
        }
    }

    /// Record for a log that could not be extracted
    pub fn failed(sample_id: String, error: &ExtractionError) -> Self {
        Self {
            sample_id,
            metrics: None,
            qc_note: format!("Error: {}", error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.metrics.is_none()
    }

    pub fn is_pass(&self) -> bool {
        !self.is_error() && self.qc_note == PASS_NOTE
    }
}

/// Round to two decimal places, as reported in the QC table
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
