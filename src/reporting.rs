//! Multi-sample QC reporting module
//!
//! Runs extraction and flagging over every discovered log, keeps the rows in
//! discovery order, and exports the table as a BOM-prefixed CSV.

use crate::discovery::discover_logs;
use crate::{LogExtractor, LogRecord, QcFlagger, QcMetrics, QcThresholds};
use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default report filename when no output path is given
pub const DEFAULT_OUTPUT: &str = "KneadData_QC_Report_Full.csv";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// QC rows in discovery order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportTable {
    pub records: Vec<LogRecord>,
}

impl ReportTable {
    /// Concatenate records without sorting or deduplicating
    pub fn aggregate<I: IntoIterator<Item = LogRecord>>(records: I) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> QcSummary {
        let total_samples = self.records.len();
        let passed_samples = self.records.iter().filter(|r| r.is_pass()).count();
        let error_samples = self.records.iter().filter(|r| r.is_error()).count();
        let flagged_samples = total_samples - passed_samples - error_samples;

        let pass_rate = if total_samples > 0 {
            (passed_samples as f64 / total_samples as f64) * 100.0
        } else {
            0.0
        };

        QcSummary {
            total_samples,
            passed_samples,
            flagged_samples,
            error_samples,
            pass_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcSummary {
    pub total_samples: usize,
    pub passed_samples: usize,
    pub flagged_samples: usize,
    pub error_samples: usize,
    pub pass_rate: f64,
}

#[derive(Debug, Serialize)]
struct SummaryReport<'a> {
    thresholds: &'a QcThresholds,
    summary: QcSummary,
}

/// One CSV row; `None` cells are written empty
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    #[serde(rename = "Sample_ID")]
    sample_id: &'a str,
    #[serde(rename = "Raw_Reads")]
    raw_reads: Option<u64>,
    #[serde(rename = "Trimmed_Reads")]
    trimmed_reads: Option<u64>,
    #[serde(rename = "Final_Reads")]
    final_reads: Option<u64>,
    #[serde(rename = "Trim_Loss(%)")]
    trim_loss_pct: Option<f64>,
    #[serde(rename = "Paired_Surv(%)")]
    paired_survival_pct: Option<f64>,
    #[serde(rename = "Host_Rem(%)")]
    host_removal_pct: Option<f64>,
    #[serde(rename = "Est_Size(GB)")]
    estimated_size_gb: Option<f64>,
    #[serde(rename = "QC_Note")]
    qc_note: &'a str,
}

impl<'a> From<&'a LogRecord> for ReportRow<'a> {
    fn from(record: &'a LogRecord) -> Self {
        let rounded = record.metrics.as_ref().map(QcMetrics::rounded);
        let m = rounded.as_ref();
        Self {
            sample_id: &record.sample_id,
            raw_reads: m.map(|m| m.raw_reads),
            // Whole reads; fractional averaging artifacts are truncated
            trimmed_reads: m.map(|m| m.trimmed_reads as u64),
            final_reads: m.map(|m| m.final_reads as u64),
            trim_loss_pct: m.map(|m| m.trim_loss_pct),
            paired_survival_pct: m.map(|m| m.paired_survival_pct),
            host_removal_pct: m.map(|m| m.host_removal_pct),
            estimated_size_gb: m.map(|m| m.estimated_size_gb),
            qc_note: &record.qc_note,
        }
    }
}

/// QC reporter for multi-sample KneadData runs
pub struct QcReporter {
    pub extractor: LogExtractor,
    pub flagger: QcFlagger,
}

impl Default for QcReporter {
    fn default() -> Self {
        Self {
            extractor: LogExtractor::default(),
            flagger: QcFlagger::default(),
        }
    }
}

impl QcReporter {
    pub fn new(extractor: LogExtractor, thresholds: QcThresholds) -> Self {
        Self {
            extractor,
            flagger: QcFlagger::new(thresholds),
        }
    }

    /// Extract and flag one log file
    pub fn process_file<P: AsRef<Path>>(&self, path: P) -> LogRecord {
        self.flagger.flag(self.extractor.extract_file(path))
    }

    /// Process files one at a time, keeping the given order
    pub fn build_table(&self, paths: &[PathBuf]) -> ReportTable {
        ReportTable::aggregate(paths.iter().map(|path| self.process_file(path)))
    }

    /// Discover, process and export.
    ///
    /// Returns `None` without touching `output` when the directory holds no
    /// matching logs.
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        log_dir: P,
        output: Q,
    ) -> Result<Option<ReportTable>> {
        let paths = discover_logs(log_dir)?;
        info!("Discovered {} log file(s)", paths.len());
        if paths.is_empty() {
            return Ok(None);
        }

        let table = self.build_table(&paths);
        self.export_csv(&table, output)?;
        Ok(Some(table))
    }

    /// Write the table as UTF-8 CSV with a byte-order mark
    pub fn export_csv<P: AsRef<Path>>(&self, table: &ReportTable, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create report {}", path.display()))?;
        let mut out = BufWriter::new(file);
        out.write_all(UTF8_BOM)?;

        let mut writer = csv::Writer::from_writer(out);
        for record in &table.records {
            writer.serialize(ReportRow::from(record))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to write report {}", path.display()))?;

        info!("Wrote {} row(s) to {}", table.len(), path.display());
        Ok(())
    }

    /// Export thresholds and batch summary to JSON
    pub fn export_json<P: AsRef<Path>>(&self, table: &ReportTable, path: P) -> Result<()> {
        let report = SummaryReport {
            thresholds: self.flagger.thresholds(),
            summary: table.summary(),
        };
        let json_content = serde_json::to_string_pretty(&report)?;
        std::fs::write(path.as_ref(), json_content)
            .with_context(|| format!("Failed to write summary {}", path.as_ref().display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtractionError;
    use std::fs;

    const PASSING_LOG: &str = "\
Input Read Pairs: 20000000 Both Surviving: 18000000 (90.00%) Dropped: 800000 (4.00%)
READ COUNT: trimmed pair1 : Total reads after trimming ( a.1.fastq ): 18000000.0
READ COUNT: trimmed pair2 : Total reads after trimming ( a.2.fastq ): 18000000.0
READ COUNT: final pair1 : Total reads after removing those found in reference database ( a_paired_1.fastq ): 17000000.0
READ COUNT: final pair2 : Total reads after removing those found in reference database ( a_paired_2.fastq ): 17000000.0
";

    fn read_report(path: &Path) -> String {
        let bytes = fs::read(path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap()
    }

    #[test]
    fn test_aggregate_keeps_order_and_duplicates() {
        let err = ExtractionError::Overflow { marker: "repeats removed" };
        let table = ReportTable::aggregate(vec![
            LogRecord::failed("S02".to_string(), &err),
            LogRecord::failed("S01".to_string(), &err),
            LogRecord::failed("S02".to_string(), &err),
        ]);
        let ids: Vec<_> = table.records.iter().map(|r| r.sample_id.as_str()).collect();
        assert_eq!(ids, vec!["S02", "S01", "S02"]);
    }

    #[test]
    fn test_summary_counts() {
        let metrics = QcMetrics {
            raw_reads: 10,
            trimmed_reads: 10.0,
            final_reads: 10.0,
            trim_loss_pct: 0.0,
            paired_survival_pct: 90.0,
            host_removal_pct: 0.0,
            estimated_size_gb: 0.0,
        };
        let flagger = QcFlagger::default();
        let pass = flagger.flag(LogRecord::parsed(
            "A".to_string(),
            QcMetrics {
                estimated_size_gb: 6.0,
                ..metrics.clone()
            },
        ));
        let flagged = flagger.flag(LogRecord::parsed("B".to_string(), metrics));
        let error = LogRecord::failed(
            "C".to_string(),
            &ExtractionError::Overflow { marker: "input read pairs" },
        );

        let summary = ReportTable::aggregate(vec![pass, flagged, error]).summary();
        assert_eq!(summary.total_samples, 3);
        assert_eq!(summary.passed_samples, 1);
        assert_eq!(summary.flagged_samples, 1);
        assert_eq!(summary.error_samples, 1);
        assert!((summary.pass_rate - 100.0 / 3.0).abs() < 1e-9);

        assert_eq!(ReportTable::default().summary().pass_rate, 0.0);
    }

    #[test]
    fn test_run_writes_csv_with_error_rows() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("S01_kneaddata_summary.log"), PASSING_LOG).unwrap();
        fs::write(
            dir.path().join("S02_kneaddata_summary.log"),
            "READ COUNT: trimmed pair1 : Total reads ( x.fastq ): 1.2.3\n",
        )
        .unwrap();
        fs::write(dir.path().join("S03_summary.log"), "").unwrap();
        let output = dir.path().join("report.csv");

        let table = QcReporter::default()
            .run(dir.path(), &output)
            .unwrap()
            .expect("table");
        assert_eq!(table.len(), 3);

        let content = read_report(&output);
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines[0],
            "Sample_ID,Raw_Reads,Trimmed_Reads,Final_Reads,Trim_Loss(%),Paired_Surv(%),Host_Rem(%),Est_Size(GB),QC_Note"
        );
        assert_eq!(lines[1], "S01,40000000,36000000,34000000,4.0,90.0,5.56,9.5,Pass");
        assert!(lines[2].starts_with("S02,,,,,,,,Error:"));
        assert_eq!(
            lines[3],
            "S03,0,0,0,0.0,0.0,0.0,0.0,Low Paired(0.0%); Small File(0.0GB)"
        );
    }

    #[test]
    fn test_host_removal_just_below_limit_is_not_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let log = "\
READ COUNT: trimmed pair1 : Total reads after trimming ( a.1.fastq ): 100000.0
READ COUNT: final pair1 : Total reads after removing those found in reference database ( a_paired_1.fastq ): 70004.0
";
        fs::write(dir.path().join("S07_kneaddata_summary.log"), log).unwrap();
        let output = dir.path().join("report.csv");

        let table = QcReporter::default()
            .run(dir.path(), &output)
            .unwrap()
            .expect("table");
        // 29.996% host removal stays under the 30% limit
        assert_eq!(table.records[0].qc_note, "Low Paired(0.0%); Small File(0.0GB)");

        let content = read_report(&output);
        let row = content.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "S07,0,100000,70004,0.0,0.0,30.0,0.02,Low Paired(0.0%); Small File(0.0GB)"
        );
    }

    #[test]
    fn test_run_on_missing_directory_finds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.csv");

        let result = QcReporter::default()
            .run(dir.path().join("no_such_dir"), &output)
            .unwrap();
        assert!(result.is_none());
        assert!(!output.exists());
    }

    #[test]
    fn test_run_with_no_logs_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.txt"), "nothing here").unwrap();
        let output = dir.path().join("report.csv");

        let result = QcReporter::default().run(dir.path(), &output).unwrap();
        assert!(result.is_none());
        assert!(!output.exists());
    }

    #[test]
    fn test_export_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("missing").join("report.csv");
        let result = QcReporter::default().export_csv(&ReportTable::default(), &output);
        assert!(result.is_err());
    }

    #[test]
    fn test_export_json_summary() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("S01_summary.log"), PASSING_LOG).unwrap();
        let reporter = QcReporter::new(LogExtractor::default(), QcThresholds::new(1.0, 80.0, 30.0, 5.0));
        let table = reporter.build_table(&[dir.path().join("S01_summary.log")]);

        let json_path = dir.path().join("summary.json");
        reporter.export_json(&table, &json_path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(value["thresholds"]["max_trim_loss"], 1.0);
        assert_eq!(value["summary"]["total_samples"], 1);
        assert_eq!(value["summary"]["flagged_samples"], 1);
    }
}
