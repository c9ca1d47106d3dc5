//! Readers for reference k-mer sets and sequencing reads.
//!
//! This module provides parsers for:
//!
//! - **K-mer set JSON files**: named reference sketches with their k-mers
//! - **Reference FASTA files**: one sketch per record, built by k-mer extraction
//! - **Read files**: FASTA or FASTQ, plain or gzip compressed, or stdin
//!
//! ## Example
//!
//! ```rust,no_run
//! use kmer_tally::parsing::reads::ReadSource;
//! use kmer_tally::parsing::sketch::load_sketch_file;
//! use std::path::Path;
//!
//! let sketches = load_sketch_file(Path::new("references.json")).unwrap();
//! let source = ReadSource::open(Path::new("reads.fq.gz")).unwrap();
//! for read in source.sequences() {
//!     let read = read.unwrap();
//!     println!("{} bp", read.len());
//! }
//! # let _ = sketches;
//! ```

pub mod fasta;
pub mod reads;
pub mod sketch;

use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Too many sketches: {0} exceeds maximum allowed ({max})", max = crate::utils::validation::MAX_SKETCHES)]
    TooManySketches(usize),
}

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
pub(crate) fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Lower-cased file name with any compression suffix removed
pub(crate) fn uncompressed_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    name.strip_suffix(".gz")
        .or_else(|| name.strip_suffix(".bgz"))
        .map_or_else(|| name.clone(), str::to_string)
}
