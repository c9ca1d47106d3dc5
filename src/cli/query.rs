use std::io::Write;

use anyhow::Context;
use clap::Args;
use serde::Serialize;

use crate::cli::{open_output, OutputFormat, ReferenceArgs};
use crate::core::sketch::ReferenceSketch;
use crate::core::types::FilterBackend;
use crate::filter::{ApproxSet, BloomFilter, ExactSet};
use crate::index::ReferenceIndex;
use crate::utils::validation::normalize_sequence;

#[derive(Args)]
pub struct QueryArgs {
    /// K-mers to look up (case-insensitive)
    #[arg(required = true)]
    pub kmers: Vec<String>,

    #[command(flatten)]
    pub reference: ReferenceArgs,
}

#[derive(Debug, Serialize)]
struct KmerMatches {
    kmer: String,
    references: Vec<String>,
}

/// Execute query subcommand
///
/// # Errors
///
/// Returns an error if the references cannot be loaded or indexed.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: QueryArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let sketches = args.reference.load()?;

    let results = match args.reference.filter {
        FilterBackend::Bloom => query_with::<BloomFilter>(&args, &sketches, verbose)?,
        FilterBackend::Exact => query_with::<ExactSet>(&args, &sketches, verbose)?,
    };

    let mut out = open_output(None)?;
    match format {
        OutputFormat::Text => {
            for result in &results {
                if result.references.is_empty() {
                    writeln!(out, "{}: no match", result.kmer)?;
                } else {
                    writeln!(out, "{}: {}", result.kmer, result.references.join(", "))?;
                }
            }
        }
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(&results)?)?;
        }
        OutputFormat::Tsv => {
            writeln!(out, "kmer\treferences")?;
            for result in &results {
                writeln!(out, "{}\t{}", result.kmer, result.references.join(","))?;
            }
        }
        OutputFormat::Csv => {
            writeln!(out, "kmer,references")?;
            for result in &results {
                writeln!(out, "{},\"{}\"", result.kmer, result.references.join(";"))?;
            }
        }
    }
    out.flush()?;

    Ok(())
}

fn query_with<F: ApproxSet>(
    args: &QueryArgs,
    sketches: &[ReferenceSketch],
    verbose: bool,
) -> anyhow::Result<Vec<KmerMatches>> {
    let index = ReferenceIndex::<F>::build(sketches, &args.reference.config())
        .context("Failed to build reference index")?;

    let results = args
        .kmers
        .iter()
        .map(|kmer| {
            let kmer = normalize_sequence(kmer.as_bytes());
            if verbose && kmer.len() != index.ksize() {
                eprintln!(
                    "Note: {} has length {}, references use k={}",
                    String::from_utf8_lossy(&kmer),
                    kmer.len(),
                    index.ksize()
                );
            }
            let references = index
                .query(&kmer)
                .into_iter()
                .filter_map(|i| index.source_name(i).map(str::to_string))
                .collect();
            KmerMatches {
                kmer: String::from_utf8_lossy(&kmer).into_owned(),
                references,
            }
        })
        .collect();

    Ok(results)
}
