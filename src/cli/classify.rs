use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::debug;

use crate::classify::{ClassificationPipeline, ClassificationReport};
use crate::cli::{open_output, OutputFormat, ReferenceArgs};
use crate::core::sketch::ReferenceSketch;
use crate::core::types::{ClassifierConfig, FilterBackend, DEFAULT_QUEUE_CAPACITY};
use crate::filter::{ApproxSet, BloomFilter, ExactSet};
use crate::index::ReferenceIndex;
use crate::parsing::reads::ReadSource;

#[derive(Args)]
pub struct ClassifyArgs {
    /// Reads (FASTA or FASTQ, optionally gzipped). Use '-' for stdin
    #[arg(required = true)]
    pub reads: PathBuf,

    #[command(flatten)]
    pub reference: ReferenceArgs,

    /// Number of worker threads (default: one per core)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Reads buffered between the reader and the workers (0 = unbounded)
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only report references with at least this many hits
    #[arg(long, default_value_t = 0)]
    pub min_count: u64,
}

/// Execute classify subcommand
///
/// # Errors
///
/// Returns an error if references or reads cannot be read, the index cannot
/// be built, or a worker fails.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ClassifyArgs, format: OutputFormat, _verbose: bool) -> anyhow::Result<()> {
    let sketches = args.reference.load()?;

    let mut config = args
        .reference
        .config()
        .with_queue_capacity(args.queue_capacity);
    if let Some(threads) = args.threads {
        config = config.with_workers(threads);
    }

    debug!("Using {} filters", args.reference.filter);

    let report = match args.reference.filter {
        FilterBackend::Bloom => classify_with::<BloomFilter>(&args, &sketches, &config)?,
        FilterBackend::Exact => classify_with::<ExactSet>(&args, &sketches, &config)?,
    }
    .with_min_count(args.min_count);

    let mut out = open_output(args.output.as_deref())?;
    match format {
        OutputFormat::Text => report.write_text(&mut out)?,
        OutputFormat::Json => report.write_json(&mut out)?,
        OutputFormat::Tsv => report.write_tsv(&mut out)?,
        OutputFormat::Csv => report.write_csv(&mut out)?,
    }
    out.flush()?;

    Ok(())
}

fn classify_with<F: ApproxSet>(
    args: &ClassifyArgs,
    sketches: &[ReferenceSketch],
    config: &ClassifierConfig,
) -> anyhow::Result<ClassificationReport> {
    let index = ReferenceIndex::<F>::build(sketches, config)
        .context("Failed to build reference index")?;

    let source = ReadSource::open(&args.reads)
        .with_context(|| format!("Failed to open reads {}", args.reads.display()))?;

    let outcome = ClassificationPipeline::new(&index, config)
        .run(source.sequences())
        .context("Classification failed")?;

    Ok(ClassificationReport::new(sketches, &outcome))
}
