use std::io::Write;

use anyhow::Context;
use clap::Args;

use crate::cli::{open_output, OutputFormat, ReferenceArgs};
use crate::core::sketch::ReferenceSketch;
use crate::core::types::FilterBackend;
use crate::filter::{ApproxSet, BloomFilter, ExactSet};
use crate::index::ReferenceIndex;

#[derive(Args)]
pub struct InspectArgs {
    #[command(flatten)]
    pub reference: ReferenceArgs,

    /// List every reference, not just the first 25
    #[arg(long)]
    pub all_references: bool,
}

/// Execute inspect subcommand
///
/// # Errors
///
/// Returns an error if the references cannot be loaded or indexed.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: InspectArgs, format: OutputFormat, _verbose: bool) -> anyhow::Result<()> {
    let sketches = args.reference.load()?;
    match args.reference.filter {
        FilterBackend::Bloom => inspect_with::<BloomFilter>(&args, &sketches, format),
        FilterBackend::Exact => inspect_with::<ExactSet>(&args, &sketches, format),
    }
}

fn inspect_with<F: ApproxSet>(
    args: &InspectArgs,
    sketches: &[ReferenceSketch],
    format: OutputFormat,
) -> anyhow::Result<()> {
    let index = ReferenceIndex::<F>::build(sketches, &args.reference.config())
        .context("Failed to build reference index")?;
    let tree = index.tree();
    let levels = tree.level_stats();
    let mut out = open_output(None)?;

    match format {
        OutputFormat::Text => {
            writeln!(out, "References: {}", index.len())?;
            writeln!(out, "K-mer size: {}", index.ksize())?;
            writeln!(out, "Distinct k-mers: {}", index.fast_index().len())?;
            writeln!(
                out,
                "Filters: {} (fp rate {})",
                args.reference.filter,
                index.fp_rate()
            )?;
            writeln!(
                out,
                "Tree: depth {}, {} nodes, {} filter bits",
                tree.depth(),
                tree.node_count(),
                tree.filter_bits()
            )?;

            writeln!(out, "\nLevels:")?;
            writeln!(
                out,
                "{:>5} {:>8} {:>8} {:>14} {:>14}",
                "Depth", "Nodes", "Leaves", "Items", "Bits"
            )?;
            for level in &levels {
                writeln!(
                    out,
                    "{:>5} {:>8} {:>8} {:>14} {:>14}",
                    level.depth, level.nodes, level.leaves, level.items, level.filter_bits
                )?;
            }

            let shown = if args.all_references {
                sketches
            } else {
                &sketches[..sketches.len().min(25)]
            };
            writeln!(out, "\n{:>6} {:<30} {:>12}", "Index", "Name", "K-mers")?;
            writeln!(out, "{}", "-".repeat(50))?;
            for sketch in shown {
                writeln!(
                    out,
                    "{:>6} {:<30} {:>12}",
                    sketch.index,
                    sketch.source_name,
                    sketch.usable_len()
                )?;
            }
            if shown.len() < sketches.len() {
                writeln!(
                    out,
                    "\n... and {} more references (use --all-references to show all)",
                    sketches.len() - shown.len()
                )?;
            }
        }
        OutputFormat::Json => {
            let levels: Vec<_> = levels
                .iter()
                .map(|level| {
                    serde_json::json!({
                        "depth": level.depth,
                        "nodes": level.nodes,
                        "leaves": level.leaves,
                        "items": level.items,
                        "filter_bits": level.filter_bits,
                    })
                })
                .collect();
            let references: Vec<_> = sketches
                .iter()
                .map(|sketch| {
                    serde_json::json!({
                        "index": sketch.index,
                        "name": sketch.source_name,
                        "kmers": sketch.usable_len(),
                    })
                })
                .collect();
            let output = serde_json::json!({
                "references": index.len(),
                "ksize": index.ksize(),
                "distinct_kmers": index.fast_index().len(),
                "filter": args.reference.filter,
                "fp_rate": index.fp_rate(),
                "tree": {
                    "depth": tree.depth(),
                    "nodes": tree.node_count(),
                    "filter_bits": tree.filter_bits(),
                    "levels": levels,
                },
                "sketches": references,
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
        }
        OutputFormat::Tsv | OutputFormat::Csv => {
            let sep = if matches!(format, OutputFormat::Tsv) { '\t' } else { ',' };
            writeln!(out, "index{sep}name{sep}kmers")?;
            for sketch in sketches {
                writeln!(
                    out,
                    "{}{sep}{}{sep}{}",
                    sketch.index,
                    sketch.source_name,
                    sketch.usable_len()
                )?;
            }
        }
    }
    out.flush()?;

    Ok(())
}
