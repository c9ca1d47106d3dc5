use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::cli::{open_output, OutputFormat};
use crate::parsing::fasta::extract_sketches;
use crate::parsing::sketch::save_sketch_file;
use crate::utils::validation::validate_kmer_size;

#[derive(Args)]
pub struct ExtractArgs {
    /// Reference FASTA (optionally gzipped), one reference per record
    #[arg(required = true)]
    pub input: PathBuf,

    /// K-mer size
    #[arg(short, long)]
    pub ksize: usize,

    /// Output k-mer set file (JSON)
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Execute extract subcommand
///
/// # Errors
///
/// Returns an error if the k-mer size is invalid, the FASTA cannot be read,
/// or the output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ExtractArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let k = validate_kmer_size(args.ksize)?;

    let sketches = extract_sketches(&args.input, k)
        .with_context(|| format!("Failed to read reference FASTA {}", args.input.display()))?;

    if verbose {
        for sketch in &sketches {
            eprintln!("{}: {} distinct {k}-mers", sketch.source_name, sketch.usable_len());
        }
    }

    save_sketch_file(&args.output, &sketches)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    let total: usize = sketches.iter().map(|s| s.usable_len()).sum();
    let mut out = open_output(None)?;
    match format {
        OutputFormat::Text => {
            writeln!(
                out,
                "Wrote {} references ({total} {k}-mers) to {}",
                sketches.len(),
                args.output.display()
            )?;
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "output": args.output.display().to_string(),
                "ksize": k,
                "references": sketches.len(),
                "kmers": total,
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
        }
        OutputFormat::Tsv | OutputFormat::Csv => {
            let sep = if matches!(format, OutputFormat::Tsv) { '\t' } else { ',' };
            writeln!(out, "name{sep}kmers")?;
            for sketch in &sketches {
                writeln!(out, "{}{sep}{}", sketch.source_name, sketch.usable_len())?;
            }
        }
    }
    out.flush()?;

    Ok(())
}
