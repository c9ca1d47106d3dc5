//! Reference FASTA to k-mer sketches, using noodles.
//!
//! Each FASTA record becomes one [`ReferenceSketch`] named after the record
//! and holding its distinct k-mers in first-seen order. Windows containing
//! anything other than A, C, G or T are skipped. A record shorter than k
//! yields a single empty placeholder k-mer and never matches.
//!
//! Supported extensions:
//! - `.fa`, `.fasta`, `.fna` (uncompressed)
//! - `.fa.gz`, `.fasta.gz`, `.fna.gz` (gzip compressed)
//! - `.fa.bgz`, `.fasta.bgz`, `.fna.bgz` (bgzip compressed)

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ahash::AHashSet;
use flate2::read::MultiGzDecoder;
use noodles::fasta;
use tracing::debug;

use super::{is_gzipped, ParseError};
use crate::core::sketch::ReferenceSketch;
use crate::utils::validation::{check_sketch_limit, is_nucleotide_kmer, normalize_sequence};

/// Check if the path has a FASTA extension
pub fn is_fasta_file(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();

    // Check for gzipped FASTA
    if path_str.ends_with(".fa.gz")
        || path_str.ends_with(".fasta.gz")
        || path_str.ends_with(".fna.gz")
        || path_str.ends_with(".fa.bgz")
        || path_str.ends_with(".fasta.bgz")
        || path_str.ends_with(".fna.bgz")
    {
        return true;
    }

    // Check for uncompressed FASTA
    matches!(
        path.extension()
            .and_then(OsStr::to_str)
            .map(str::to_lowercase)
            .as_deref(),
        Some("fa" | "fasta" | "fna")
    )
}

/// Build one sketch per record of a (possibly compressed) reference FASTA.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles` if
/// parsing fails, `ParseError::InvalidFormat` if no records are found, or
/// `ParseError::TooManySketches` if the limit is exceeded.
pub fn extract_sketches(path: &Path, ksize: usize) -> Result<Vec<ReferenceSketch>, ParseError> {
    let file = File::open(path)?;
    let sketches = if is_gzipped(path) {
        let mut reader = fasta::io::Reader::new(BufReader::new(MultiGzDecoder::new(file)));
        sketches_from_reader(&mut reader, ksize)?
    } else {
        let mut reader = fasta::io::Reader::new(BufReader::new(file));
        sketches_from_reader(&mut reader, ksize)?
    };
    debug!(
        "Extracted {} reference sketches (k={ksize}) from {}",
        sketches.len(),
        path.display()
    );
    Ok(sketches)
}

/// Build sketches from a noodles FASTA reader
///
/// # Errors
///
/// Same as [`extract_sketches`], minus file opening.
pub fn sketches_from_reader<R: BufRead>(
    reader: &mut fasta::io::Reader<R>,
    ksize: usize,
) -> Result<Vec<ReferenceSketch>, ParseError> {
    let mut sketches = Vec::new();

    for result in reader.records() {
        let record = result
            .map_err(|e| ParseError::Noodles(format!("Failed to parse FASTA record: {e}")))?;

        // Check sketch limit for DOS protection
        if check_sketch_limit(sketches.len()).is_some() {
            return Err(ParseError::TooManySketches(sketches.len()));
        }

        let name = String::from_utf8_lossy(record.name()).to_string();
        let sequence = normalize_sequence(record.sequence().as_ref());
        let index = sketches.len();
        sketches.push(ReferenceSketch::new(
            index,
            name,
            ksize,
            distinct_kmers(&sequence, ksize),
        ));
    }

    if sketches.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No sequences found in FASTA file".to_string(),
        ));
    }

    Ok(sketches)
}

/// Distinct ACGT-only k-mers of `sequence` in first-seen order.
///
/// A sequence shorter than `ksize` yields one empty placeholder.
pub fn distinct_kmers(sequence: &[u8], ksize: usize) -> Vec<String> {
    if ksize == 0 || sequence.len() < ksize {
        return vec![String::new()];
    }

    let mut seen: AHashSet<&[u8]> = AHashSet::new();
    sequence
        .windows(ksize)
        .filter(|kmer| is_nucleotide_kmer(kmer) && seen.insert(*kmer))
        .map(|kmer| String::from_utf8_lossy(kmer).into_owned())
        .collect()
}
