//! K-mer set files: JSON documents holding named reference sketches.
//!
//! ```json
//! {
//!   "version": "1.0.0",
//!   "created_at": "2024-01-01T00:00:00+00:00",
//!   "sketches": [
//!     { "name": "genome_a", "ksize": 21, "kmers": ["ACGT...", "..."] }
//!   ]
//! }
//! ```
//!
//! Sketch indices are not stored; they are assigned by position on load.
//! K-mers are upper-cased on load so lower-case (soft-masked) input matches
//! upper-cased reads.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{is_gzipped, ParseError};
use crate::core::sketch::ReferenceSketch;
use crate::utils::validation::MAX_SKETCHES;

/// K-mer set file version for compatibility checking
pub const SKETCH_FILE_VERSION: &str = "1.0.0";

/// Serializable k-mer set file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SketchFile {
    pub version: String,
    #[serde(default)]
    pub created_at: String,
    pub sketches: Vec<ReferenceSketch>,
}

impl SketchFile {
    /// Wrap `sketches` with the current version and timestamp
    pub fn new(sketches: Vec<ReferenceSketch>) -> Self {
        Self {
            version: SKETCH_FILE_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            sketches,
        }
    }
}

/// Load reference sketches from a (possibly gzipped) k-mer set file.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Json` if
/// it is not a valid k-mer set document, or `ParseError::TooManySketches` if
/// the limit is exceeded.
pub fn load_sketch_file(path: &Path) -> Result<Vec<ReferenceSketch>, ParseError> {
    let file = File::open(path)?;
    let sketches = if is_gzipped(path) {
        parse_sketch_reader(BufReader::new(GzDecoder::new(file)))?
    } else {
        parse_sketch_reader(BufReader::new(file))?
    };
    debug!(
        "Loaded {} sketches from {}",
        sketches.len(),
        path.display()
    );
    Ok(sketches)
}

/// Parse sketches from a JSON string.
///
/// # Errors
///
/// Same as [`parse_sketch_reader`].
pub fn parse_sketch_json(json: &str) -> Result<Vec<ReferenceSketch>, ParseError> {
    parse_sketch_reader(json.as_bytes())
}

/// Parse sketches from any reader, assigning indices and upper-casing k-mers.
///
/// # Errors
///
/// Returns `ParseError::Json` for malformed documents or
/// `ParseError::TooManySketches` if the sketch limit is exceeded.
pub fn parse_sketch_reader<R: Read>(reader: R) -> Result<Vec<ReferenceSketch>, ParseError> {
    let data: SketchFile = serde_json::from_reader(reader)?;

    // Version check (warn but don't fail)
    if data.version != SKETCH_FILE_VERSION {
        warn!(
            "K-mer set version mismatch (expected {SKETCH_FILE_VERSION}, found {})",
            data.version
        );
    }

    if data.sketches.len() > MAX_SKETCHES {
        return Err(ParseError::TooManySketches(data.sketches.len()));
    }

    let sketches = data
        .sketches
        .into_iter()
        .enumerate()
        .map(|(index, mut sketch)| {
            sketch.index = index;
            for kmer in &mut sketch.kmers {
                kmer.make_ascii_uppercase();
            }
            sketch
        })
        .collect();

    Ok(sketches)
}

/// Write sketches as a pretty-printed k-mer set file.
///
/// # Errors
///
/// Returns `ParseError::Io` or `ParseError::Json` if writing fails.
pub fn save_sketch_file(path: &Path, sketches: &[ReferenceSketch]) -> Result<(), ParseError> {
    let data = SketchFile::new(sketches.to_vec());
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &data)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
