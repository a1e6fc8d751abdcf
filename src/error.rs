//! Per-file extraction errors
//!
//! These never abort a batch: each one is folded into an `Error: ...` row.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid number '{value}' in {marker} marker")]
    InvalidNumber { marker: &'static str, value: String },

    #[error("{marker} count overflows")]
    Overflow { marker: &'static str },
}
