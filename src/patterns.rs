//! Named log markers
//!
//! Each KneadData fact comes from one marker matched against the whole log
//! body. Single-valued markers take the first match; count families sum every
//! match. A marker that never matches yields the fact's zero value.

use crate::ExtractionError;
use log::debug;
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

/// A labelled regex with a single `value` capture
pub struct Marker {
    pub name: &'static str,
    regex: LazyLock<Regex>,
}

impl Marker {
    /// Parse the `value` capture of the first match, `None` if the marker is absent
    pub fn first<T: FromStr>(&self, text: &str) -> Result<Option<T>, ExtractionError> {
        match self.regex.captures(text) {
            Some(caps) => {
                let value = self.parse(&caps)?;
                debug!("{} matched", self.name);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Parse the `value` capture of every match, in text order
    pub fn all<T: FromStr>(&self, text: &str) -> Result<Vec<T>, ExtractionError> {
        let values = self
            .regex
            .captures_iter(text)
            .map(|caps| self.parse(&caps))
            .collect::<Result<Vec<T>, _>>()?;
        debug!("{} matched {} time(s)", self.name, values.len());
        Ok(values)
    }

    fn parse<T: FromStr>(&self, caps: &regex::Captures<'_>) -> Result<T, ExtractionError> {
        let raw = caps.name("value").map_or("", |m| m.as_str());
        raw.parse().map_err(|_| ExtractionError::InvalidNumber {
            marker: self.name,
            value: raw.to_string(),
        })
    }
}

pub static INPUT_READ_PAIRS: Marker = Marker {
    name: "input read pairs",
    regex: LazyLock::new(|| Regex::new(r"Input Read Pairs: (?P<value>\d+)").unwrap()),
};

pub static BOTH_SURVIVING: Marker = Marker {
    name: "both surviving",
    regex: LazyLock::new(|| {
        Regex::new(r"Both Surviving: \d+ \((?P<value>[\d\.]+)%\)").unwrap()
    }),
};

pub static DROPPED: Marker = Marker {
    name: "dropped",
    regex: LazyLock::new(|| Regex::new(r"Dropped: \d+ \((?P<value>[\d\.]+)%\)").unwrap()),
};

pub static TRIMMED_READ_COUNT: Marker = Marker {
    name: "trimmed read count",
    regex: LazyLock::new(|| {
        Regex::new(r"READ COUNT: trimmed (?:pair|orphan)[12] .*?:\s*(?P<value>[\d\.]+)").unwrap()
    }),
};

pub static FINAL_READ_COUNT: Marker = Marker {
    name: "final read count",
    regex: LazyLock::new(|| {
        Regex::new(r"READ COUNT: final (?:pair|orphan)[12] .*?:\s*(?P<value>[\d\.]+)").unwrap()
    }),
};

pub static REPEATS_REMOVED: Marker = Marker {
    name: "repeats removed",
    regex: LazyLock::new(|| {
        Regex::new(r"Total number of sequences with repeats removed from file .*?:\s*(?P<value>\d+)")
            .unwrap()
    }),
};

/// `Input Read Pairs: N`, 0 when absent
pub fn input_read_pairs(text: &str) -> Result<u64, ExtractionError> {
    Ok(INPUT_READ_PAIRS.first(text)?.unwrap_or(0))
}

/// Percentage from `Both Surviving: N (P%)`, 0.0 when absent
pub fn both_surviving_pct(text: &str) -> Result<f64, ExtractionError> {
    Ok(BOTH_SURVIVING.first(text)?.unwrap_or(0.0))
}

/// Percentage from `Dropped: N (P%)`, 0.0 when absent
pub fn dropped_pct(text: &str) -> Result<f64, ExtractionError> {
    Ok(DROPPED.first(text)?.unwrap_or(0.0))
}

/// Sum of the trimmed pair1/pair2/orphan1/orphan2 counts
pub fn trimmed_read_total(text: &str) -> Result<f64, ExtractionError> {
    Ok(TRIMMED_READ_COUNT.all::<f64>(text)?.into_iter().sum())
}

/// Sum of the final pair1/pair2/orphan1/orphan2 counts
pub fn final_read_total(text: &str) -> Result<f64, ExtractionError> {
    Ok(FINAL_READ_COUNT.all::<f64>(text)?.into_iter().sum())
}

/// Sum of all TRF repeat-removal counts, 0 when absent
pub fn repeats_removed_total(text: &str) -> Result<u64, ExtractionError> {
    REPEATS_REMOVED
        .all::<u64>(text)?
        .into_iter()
        .try_fold(0u64, |acc, n| acc.checked_add(n))
        .ok_or(ExtractionError::Overflow {
            marker: REPEATS_REMOVED.name,
        })
}
