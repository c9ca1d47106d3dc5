//! Command-line interface for kmer-tally.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **classify**: Count per-reference k-mer hits over a read file
//! - **query**: Show which references may contain individual k-mers
//! - **inspect**: Summarize the references and the filter tree built from them
//! - **extract**: Turn a reference FASTA into a k-mer set file
//!
//! ## Usage
//!
//! ```text
//! # Build a k-mer set from reference genomes
//! kmer-tally extract genomes.fa -k 21 -o refs.json
//!
//! # Classify reads on 8 threads
//! kmer-tally classify reads.fq.gz -r refs.json -t 8
//!
//! # Pipe reads in, CSV out
//! zcat reads.fq.gz | kmer-tally classify - -r refs.json --format csv
//!
//! # Which references contain a k-mer?
//! kmer-tally query ACGTACGTACGTACGTACGTA -r refs.json
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};

use crate::core::sketch::ReferenceSketch;
use crate::core::types::{ClassifierConfig, FilterBackend, DEFAULT_FP_RATE};
use crate::parsing::fasta::{extract_sketches, is_fasta_file};
use crate::parsing::sketch::load_sketch_file;
use crate::utils::validation::validate_kmer_size;

pub mod classify;
pub mod extract;
pub mod inspect;
pub mod query;

#[derive(Parser)]
#[command(name = "kmer-tally")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Classify sequencing reads against reference k-mer sets")]
#[command(
    long_about = "kmer-tally counts, for every reference, how many k-mers of your reads it contains.\n\nReferences are indexed in a binary tree of bloom filters so each k-mer is tested against a handful of filters instead of every reference:\n- Exact pre-filter drops k-mers found in no reference\n- Tree walk resolves the rest to candidate references\n- Reads are processed by a pool of worker threads"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count per-reference k-mer hits over a read file
    Classify(classify::ClassifyArgs),

    /// Look up individual k-mers
    Query(query::QueryArgs),

    /// Show reference and filter tree statistics
    Inspect(inspect::InspectArgs),

    /// Build a k-mer set file from a reference FASTA
    Extract(extract::ExtractArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
    Csv,
}

/// Reference options shared by every command that builds an index
#[derive(Args, Debug)]
pub struct ReferenceArgs {
    /// Reference k-mer set (JSON, optionally gzipped) or reference FASTA (needs -k)
    #[arg(short, long)]
    pub references: PathBuf,

    /// K-mer size; required for FASTA references, checked against k-mer set files
    #[arg(short, long)]
    pub ksize: Option<usize>,

    /// Target false-positive rate of every tree filter
    #[arg(long, default_value_t = DEFAULT_FP_RATE)]
    pub fp_rate: f64,

    /// Tree filter backend
    #[arg(long, value_enum, default_value_t = FilterBackend::Bloom)]
    pub filter: FilterBackend,
}

impl ReferenceArgs {
    /// Load the reference sketches named on the command line
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed, or a FASTA is given without `-k`.
    pub fn load(&self) -> anyhow::Result<Vec<ReferenceSketch>> {
        let path = &self.references;
        if is_fasta_file(path) {
            let Some(k) = self.ksize else {
                bail!(
                    "A k-mer size (-k) is required to index reference FASTA {}",
                    path.display()
                );
            };
            validate_kmer_size(k)?;
            extract_sketches(path, k)
                .with_context(|| format!("Failed to read reference FASTA {}", path.display()))
        } else {
            load_sketch_file(path)
                .with_context(|| format!("Failed to load k-mer set {}", path.display()))
        }
    }

    /// Library configuration for these options
    pub fn config(&self) -> ClassifierConfig {
        let config = ClassifierConfig::default().with_fp_rate(self.fp_rate);
        match self.ksize {
            Some(k) => config.with_ksize(k),
            None => config,
        }
    }
}

/// Buffered writer for `path`, or stdout when no path is given
///
/// # Errors
///
/// Returns an error if the output file cannot be created.
pub fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}
