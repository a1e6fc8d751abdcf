//! Threshold-based QC flagging
//!
//! Four independent checks, evaluated in a fixed order. Trim loss is exclusive
//! (`>`) while host removal is inclusive (`>=`).

use crate::{LogRecord, QcMetrics, PASS_NOTE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// QC limits applied to every sample in a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcThresholds {
    pub max_trim_loss: f64,
    pub min_paired_survival: f64,
    pub max_host_removal: f64,
    pub min_file_size_gb: f64,
}

impl Default for QcThresholds {
    fn default() -> Self {
        Self {
            max_trim_loss: 30.0,       // % of pairs dropped by Trimmomatic
            min_paired_survival: 80.0, // % of pairs with both mates surviving
            max_host_removal: 30.0,    // % of post-TRF reads matching host
            min_file_size_gb: 5.0,     // estimated cleaned output size
        }
    }
}

impl QcThresholds {
    pub fn new(
        max_trim_loss: f64,
        min_paired_survival: f64,
        max_host_removal: f64,
        min_file_size_gb: f64,
    ) -> Self {
        Self {
            max_trim_loss,
            min_paired_survival,
            max_host_removal,
            min_file_size_gb,
        }
    }

    /// Load thresholds from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read thresholds file {}", path.display()))?;
        let thresholds = serde_json::from_str(&content)
            .with_context(|| format!("Invalid thresholds file {}", path.display()))?;
        Ok(thresholds)
    }
}

/// Applies [`QcThresholds`] to extracted records
pub struct QcFlagger {
    thresholds: QcThresholds,
}

impl Default for QcFlagger {
    fn default() -> Self {
        Self::new(QcThresholds::default())
    }
}

impl QcFlagger {
    pub fn new(thresholds: QcThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &QcThresholds {
        &self.thresholds
    }

    /// Violated-threshold fragments in check order
    pub fn violations(&self, metrics: &QcMetrics) -> Vec<String> {
        let t = &self.thresholds;
        let mut notes = Vec::new();

        if metrics.trim_loss_pct > t.max_trim_loss {
            notes.push(format!("High Trim Loss({:.1}%)", metrics.trim_loss_pct));
        }
        if metrics.paired_survival_pct < t.min_paired_survival {
            notes.push(format!("Low Paired({:.1}%)", metrics.paired_survival_pct));
        }
        if metrics.host_removal_pct >= t.max_host_removal {
            notes.push(format!("High Host({:.1}%)", metrics.host_removal_pct));
        }
        if metrics.estimated_size_gb < t.min_file_size_gb {
            notes.push(format!("Small File({:.1}GB)", metrics.estimated_size_gb));
        }

        notes
    }

    /// QC note for a set of metrics: `Pass` or `"; "`-joined fragments
    pub fn note(&self, metrics: &QcMetrics) -> String {
        let notes = self.violations(metrics);
        if notes.is_empty() {
            PASS_NOTE.to_string()
        } else {
            notes.join("; ")
        }
    }

    /// Annotate a record. Error records keep their existing note.
    pub fn flag(&self, mut record: LogRecord) -> LogRecord {
        if let Some(metrics) = &record.metrics {
            record.qc_note = self.note(metrics);
        }
        record
    }
}
