use std::io::{self, Write};

use serde::Serialize;

use super::pipeline::{PipelineOutcome, PipelineStats};
use crate::core::sketch::ReferenceSketch;

/// Hit count for one reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub index: usize,
    pub source_name: String,
    pub count: u64,
}

/// Per-reference hit counts, in reference order
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub entries: Vec<ReportEntry>,
    pub total_hits: u64,
    pub stats: PipelineStats,
    pub elapsed_secs: f64,
}

impl ClassificationReport {
    /// Pair every count in `outcome` with the name of its reference
    pub fn new(sketches: &[ReferenceSketch], outcome: &PipelineOutcome) -> Self {
        let entries: Vec<ReportEntry> = sketches
            .iter()
            .zip(&outcome.counts)
            .map(|(sketch, &count)| ReportEntry {
                index: sketch.index,
                source_name: sketch.source_name.clone(),
                count,
            })
            .collect();
        let total_hits = entries.iter().map(|e| e.count).sum();

        Self {
            entries,
            total_hits,
            stats: outcome.stats,
            elapsed_secs: outcome.stats.elapsed.as_secs_f64(),
        }
    }

    /// Drop entries whose count is below `min_count`
    #[must_use]
    pub fn with_min_count(mut self, min_count: u64) -> Self {
        self.entries.retain(|e| e.count >= min_count);
        self
    }

    /// Count for the reference named `source_name`, if present
    #[must_use]
    pub fn count_for(&self, source_name: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.source_name == source_name)
            .map(|e| e.count)
    }

    /// Human-readable table with a summary header
    ///
    /// # Errors
    ///
    /// Returns any error raised by `out`.
    pub fn write_text<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Classification Results")?;
        writeln!(out, "{}", "=".repeat(60))?;
        writeln!(
            out,
            "Reads: {} ({} shorter than k)",
            self.stats.reads, self.stats.reads_too_short
        )?;
        writeln!(
            out,
            "K-mers: {} ({} passed pre-filter)",
            self.stats.kmers, self.stats.prefilter_hits
        )?;
        writeln!(out, "Total hits: {}", self.total_hits)?;
        writeln!(out, "Elapsed: {:.2}s\n", self.elapsed_secs)?;

        let width = self
            .entries
            .iter()
            .map(|e| e.source_name.len())
            .max()
            .unwrap_or(0)
            .max("Reference".len());
        writeln!(out, "{:<width$}  {:>12}  {:>7}", "Reference", "Hits", "Share")?;
        writeln!(out, "{}", "-".repeat(width + 23))?;
        for entry in &self.entries {
            writeln!(
                out,
                "{:<width$}  {:>12}  {:>6.2}%",
                entry.source_name,
                entry.count,
                self.share(entry.count) * 100.0
            )?;
        }
        Ok(())
    }

    /// `source_name<TAB>count`, one line per reference
    ///
    /// # Errors
    ///
    /// Returns any error raised by `out`.
    pub fn write_tsv<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.write_delimited(out, b'\t')
    }

    /// `source_name,count`, one line per reference; names are quoted when needed
    ///
    /// # Errors
    ///
    /// Returns any error raised by `out`.
    pub fn write_csv<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.write_delimited(out, b',')
    }

    /// Pretty-printed JSON of the whole report
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_json<W: Write>(&self, out: &mut W) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)
    }

    fn write_delimited<W: Write>(&self, out: &mut W, delimiter: u8) -> io::Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .from_writer(out);
        writer.write_record(["source_name", "count"])?;
        for entry in &self.entries {
            writer.serialize(DelimitedRow {
                source_name: &entry.source_name,
                count: entry.count,
            })?;
        }
        writer.flush()
    }

    fn share(&self, count: u64) -> f64 {
        if self.total_hits == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            count as f64 / self.total_hits as f64
        }
    }
}

#[derive(Serialize)]
struct DelimitedRow<'e> {
    source_name: &'e str,
    count: u64,
}
