//! Metric extraction from KneadData summary logs
//!
//! Reads one log body, pulls the raw counts through the named markers in
//! [`crate::patterns`], then derives host-removal rate and estimated output
//! size. Failures never escape [`LogExtractor::extract`]: they become an error
//! row so one bad log cannot sink the batch.

use crate::patterns;
use crate::{ExtractionError, LogRecord, QcMetrics};
use log::{debug, warn};
use std::path::Path;

/// Average bytes per read-pair record in the cleaned FASTQ output
pub const BYTES_PER_READ: f64 = 300.0;

const BYTES_PER_GB: f64 = (1u64 << 30) as f64;

/// Raw facts collected before any derived metric is computed
#[derive(Debug, Clone, Copy, PartialEq)]
struct RawCounts {
    input_read_pairs: u64,
    paired_survival_pct: f64,
    trim_loss_pct: f64,
    trimmed_reads: f64,
    repeats_removed: u64,
    final_reads: f64,
}

/// Extractor for KneadData logs
pub struct LogExtractor {
    /// Pipeline infix separating the sample id from the rest of the filename
    pub pipeline_infix: String,
}

impl Default for LogExtractor {
    fn default() -> Self {
        Self {
            pipeline_infix: "_kneaddata".to_string(),
        }
    }
}

impl LogExtractor {
    pub fn new(pipeline_infix: impl Into<String>) -> Self {
        Self {
            pipeline_infix: pipeline_infix.into(),
        }
    }

    /// Derive a sample id from a log filename.
    ///
    /// Everything before the pipeline infix when present, otherwise the
    /// filename with `_summary.log` and then `.log` removed.
    pub fn sample_id(&self, filename: &str) -> String {
        if !self.pipeline_infix.is_empty() {
            if let Some((prefix, _)) = filename.split_once(self.pipeline_infix.as_str()) {
                return prefix.to_string();
            }
        }
        filename.replace("_summary.log", "").replace(".log", "")
    }

    /// Extract a record from log text. Never fails; see [`LogRecord::failed`].
    pub fn extract(&self, text: &str, filename: &str) -> LogRecord {
        let sample_id = self.sample_id(filename);
        match self.extract_metrics(text) {
            Ok(metrics) => LogRecord::parsed(sample_id, metrics),
            Err(e) => {
                warn!("Failed to extract metrics from {}: {}", filename, e);
                LogRecord::failed(sample_id, &e)
            }
        }
    }

    /// Read a log file and extract its record. Read failures become error rows.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> LogRecord {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        debug!("Reading {}", path.display());
        match std::fs::read_to_string(path) {
            Ok(text) => self.extract(&text, &filename),
            Err(e) => {
                let e = ExtractionError::from(e);
                warn!("Failed to read {}: {}", path.display(), e);
                LogRecord::failed(self.sample_id(&filename), &e)
            }
        }
    }

    /// Collect raw counts and derive metrics, propagating the first failure.
    ///
    /// Values are left unrounded so flagging sees exact rates.
    pub fn extract_metrics(&self, text: &str) -> Result<QcMetrics, ExtractionError> {
        let raw = RawCounts {
            input_read_pairs: patterns::input_read_pairs(text)?,
            paired_survival_pct: patterns::both_surviving_pct(text)?,
            trim_loss_pct: patterns::dropped_pct(text)?,
            trimmed_reads: patterns::trimmed_read_total(text)?,
            repeats_removed: patterns::repeats_removed_total(text)?,
            final_reads: patterns::final_read_total(text)?,
        };

        let raw_reads = raw
            .input_read_pairs
            .checked_mul(2)
            .ok_or(ExtractionError::Overflow {
                marker: patterns::INPUT_READ_PAIRS.name,
            })?;

        Ok(QcMetrics {
            raw_reads,
            trimmed_reads: raw.trimmed_reads,
            final_reads: raw.final_reads,
            trim_loss_pct: raw.trim_loss_pct,
            paired_survival_pct: raw.paired_survival_pct,
            host_removal_pct: host_removal_pct(
                raw.trimmed_reads,
                raw.repeats_removed,
                raw.final_reads,
            ),
            estimated_size_gb: estimated_size_gb(raw.final_reads),
        })
    }
}

/// Percentage of post-TRF reads removed as host.
///
/// 0.0 when repeat removal leaves nothing (or less than nothing) to divide by.
pub fn host_removal_pct(trimmed_reads: f64, repeats_removed: u64, final_reads: f64) -> f64 {
    let after_trf = trimmed_reads - repeats_removed as f64;
    if after_trf <= 0.0 {
        return 0.0;
    }
    (after_trf - final_reads) / after_trf * 100.0
}

/// Estimated size of the cleaned output in GiB
pub fn estimated_size_gb(final_reads: f64) -> f64 {
    final_reads * BYTES_PER_READ / BYTES_PER_GB
}
