//! KneadData QC Report Tool
//!
//! Scans a directory of KneadData logs and writes one QC row per sample

use anyhow::Result;
use clap::parser::ValueSource;
use clap::{Arg, ArgMatches, Command};
use kneaddata_qc_report::reporting::DEFAULT_OUTPUT;
use kneaddata_qc_report::{LogExtractor, QcReporter, QcThresholds};
use log::info;
use std::path::PathBuf;

fn main() -> Result<()> {
    env_logger::init();

    let matches = Command::new("kneaddata-qc-report")
        .version("0.1.0")
        .about("Build a per-sample QC report from KneadData logs")
        .author("Megan Johnson")
        .arg(
            Arg::new("log_dir")
                .index(1)
                .value_name("LOG_DIR")
                .help("Directory containing *_summary.log (or *_console.log) files")
                .default_value("./"),
        )
        .arg(
            Arg::new("output")
                .index(2)
                .value_name("CSV")
                .help("Output CSV report")
                .default_value(DEFAULT_OUTPUT),
        )
        .arg(
            Arg::new("thresholds")
                .long("thresholds")
                .value_name("JSON")
                .help("JSON file with QC thresholds; explicit threshold flags take precedence"),
        )
        .arg(
            Arg::new("max_trim_loss")
                .long("max-trim-loss")
                .value_name("PERCENT")
                .help("Flag samples whose trim loss exceeds this")
                .default_value("30.0"),
        )
        .arg(
            Arg::new("min_paired_survival")
                .long("min-paired-survival")
                .value_name("PERCENT")
                .help("Flag samples whose paired survival is below this")
                .default_value("80.0"),
        )
        .arg(
            Arg::new("max_host_removal")
                .long("max-host-removal")
                .value_name("PERCENT")
                .help("Flag samples whose host removal reaches this")
                .default_value("30.0"),
        )
        .arg(
            Arg::new("min_file_size")
                .long("min-file-size")
                .value_name("GB")
                .help("Flag samples whose estimated output is smaller than this")
                .default_value("5.0"),
        )
        .arg(
            Arg::new("infix")
                .long("infix")
                .value_name("TEXT")
                .help("Pipeline infix separating the sample id in log filenames")
                .default_value("_kneaddata"),
        )
        .arg(
            Arg::new("summary_json")
                .long("summary-json")
                .value_name("JSON")
                .help("Also write a JSON batch summary"),
        )
        .get_matches();

    if matches.value_source("output") == Some(ValueSource::DefaultValue) {
        println!("Usage: kneaddata-qc-report <log_dir> <output_csv>");
    }

    let log_dir = PathBuf::from(string_arg(&matches, "log_dir")?);
    let output_file = PathBuf::from(string_arg(&matches, "output")?);
    let thresholds = resolve_thresholds(&matches)?;
    let infix = string_arg(&matches, "infix")?;

    info!("Thresholds: {:?}", thresholds);

    let reporter = QcReporter::new(LogExtractor::new(infix), thresholds);

    println!("Analyzing logs in: {}", log_dir.display());
    let table = match reporter.run(&log_dir, &output_file)? {
        Some(table) => table,
        None => {
            println!("Found 0 log files.");
            println!("No valid log files found to analyze.");
            return Ok(());
        }
    };
    println!("Found {} log files.", table.len());

    if let Some(summary_path) = matches.get_one::<String>("summary_json") {
        reporter.export_json(&table, summary_path)?;
        println!("💾 Summary saved to: {}", summary_path);
    }

    let summary = table.summary();
    println!("{}", "=".repeat(60));
    println!("Successfully saved QC report to: {}", output_file.display());
    println!("{}", "=".repeat(60));
    println!("📊 Summary Statistics:");
    println!("  Total samples: {}", summary.total_samples);
    println!("  Passed samples: {}", summary.passed_samples);
    println!("  Flagged samples: {}", summary.flagged_samples);
    println!("  Errored samples: {}", summary.error_samples);
    println!("  Pass rate: {:.1}%", summary.pass_rate);

    Ok(())
}

fn string_arg(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Missing argument: {}", id))
}

/// Defaults, then the thresholds file, then any flag given on the command line
fn resolve_thresholds(matches: &ArgMatches) -> Result<QcThresholds> {
    let mut thresholds = match matches.get_one::<String>("thresholds") {
        Some(path) => QcThresholds::from_json_file(path)?,
        None => QcThresholds::default(),
    };

    let from_file = matches.contains_id("thresholds");
    let overrides: [(&str, &mut f64); 4] = [
        ("max_trim_loss", &mut thresholds.max_trim_loss),
        ("min_paired_survival", &mut thresholds.min_paired_survival),
        ("max_host_removal", &mut thresholds.max_host_removal),
        ("min_file_size", &mut thresholds.min_file_size_gb),
    ];
    for (id, slot) in overrides {
        let explicit = matches.value_source(id) == Some(ValueSource::CommandLine);
        if explicit || !from_file {
            *slot = string_arg(matches, id)?.parse()?;
        }
    }

    Ok(thresholds)
}
