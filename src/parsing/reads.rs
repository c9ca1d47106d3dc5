//! Streaming read input: FASTA or FASTQ, plain or gzip compressed, file or stdin.
//!
//! The format comes from the file extension when it names one (`.fa`, `.fasta`,
//! `.fna`, `.fq`, `.fastq`, optionally followed by `.gz`/`.bgz`). Otherwise the
//! first byte decides: `>` for FASTA, `@` for FASTQ. Gzip input is recognised by
//! extension or by its magic bytes, so compressed stdin works too.
//!
//! Sequences are yielded one at a time, upper-cased, without buffering the
//! whole file.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use flate2::bufread::MultiGzDecoder;
use noodles::{fasta, fastq};
use tracing::debug;

use super::{is_gzipped, uncompressed_name, ParseError};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Read file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFormat {
    Fasta,
    Fastq,
}

impl ReadFormat {
    /// Format implied by a file name, ignoring compression suffixes
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = uncompressed_name(path);
        let ext = name.rsplit_once('.').map(|(_, ext)| ext)?;
        match ext {
            "fa" | "fasta" | "fna" | "fas" => Some(Self::Fasta),
            "fq" | "fastq" => Some(Self::Fastq),
            _ => None,
        }
    }

    /// Format implied by the first byte of the content
    pub fn sniff(first: u8) -> Option<Self> {
        match first {
            b'>' => Some(Self::Fasta),
            b'@' => Some(Self::Fastq),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReadFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fasta => write!(f, "FASTA"),
            Self::Fastq => write!(f, "FASTQ"),
        }
    }
}

/// An opened source of reads with a known format
pub struct ReadSource {
    format: Option<ReadFormat>,
    reader: Box<dyn BufRead>,
}

impl std::fmt::Debug for ReadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadSource")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl ReadSource {
    /// Open a read file, or stdin when `path` is `-`.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` if the file cannot be opened or read, or
    /// `ParseError::UnsupportedFormat` if the format cannot be determined.
    pub fn open(path: &Path) -> Result<Self, ParseError> {
        if path.as_os_str() == "-" {
            return Self::from_reader(Box::new(BufReader::new(io::stdin())), None);
        }

        let file = BufReader::new(File::open(path)?);
        let reader: Box<dyn BufRead> = if is_gzipped(path) {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(file)
        };
        Self::from_reader(reader, ReadFormat::from_path(path))
    }

    /// Wrap an arbitrary reader, sniffing gzip and the format where needed.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` on read failure or
    /// `ParseError::UnsupportedFormat` if the first byte is neither `>` nor `@`.
    pub fn from_reader(
        mut reader: Box<dyn BufRead>,
        format: Option<ReadFormat>,
    ) -> Result<Self, ParseError> {
        if reader.fill_buf()?.starts_with(&GZIP_MAGIC) {
            reader = Box::new(BufReader::new(MultiGzDecoder::new(reader)));
        }

        let format = match format {
            Some(format) => Some(format),
            None => match reader.fill_buf()?.first() {
                // Empty input: no reads, any format will do
                None => None,
                Some(&first) => Some(ReadFormat::sniff(first).ok_or_else(|| {
                    ParseError::UnsupportedFormat(format!(
                        "expected FASTA ('>') or FASTQ ('@') input, found byte 0x{first:02x}"
                    ))
                })?),
            },
        };

        if let Some(format) = format {
            debug!("Reading {format} input");
        }
        Ok(Self { format, reader })
    }

    /// Detected format (`None` for empty input)
    pub fn format(&self) -> Option<ReadFormat> {
        self.format
    }

    /// Iterate over upper-cased read sequences
    pub fn sequences(self) -> ReadSequences {
        let records = match self.format {
            Some(ReadFormat::Fastq) => RecordReader::Fastq(
                fastq::io::Reader::new(self.reader),
                fastq::Record::default(),
            ),
            Some(ReadFormat::Fasta) | None => {
                RecordReader::Fasta(fasta::io::Reader::new(self.reader), String::new())
            }
        };
        ReadSequences {
            records,
            done: false,
        }
    }
}

enum RecordReader {
    Fasta(fasta::io::Reader<Box<dyn BufRead>>, String),
    Fastq(fastq::io::Reader<Box<dyn BufRead>>, fastq::Record),
}

/// Iterator over the sequences of a [`ReadSource`]; stops after the first error
pub struct ReadSequences {
    records: RecordReader,
    done: bool,
}

impl ReadSequences {
    fn next_sequence(&mut self) -> Result<Option<Vec<u8>>, ParseError> {
        match &mut self.records {
            RecordReader::Fasta(reader, definition) => {
                definition.clear();
                if reader
                    .read_definition(definition)
                    .map_err(|e| noodles_error("FASTA", &e))?
                    == 0
                {
                    return Ok(None);
                }
                let mut sequence = Vec::new();
                reader
                    .read_sequence(&mut sequence)
                    .map_err(|e| noodles_error("FASTA", &e))?;
                sequence.make_ascii_uppercase();
                Ok(Some(sequence))
            }
            RecordReader::Fastq(reader, record) => {
                if reader
                    .read_record(record)
                    .map_err(|e| noodles_error("FASTQ", &e))?
                    == 0
                {
                    return Ok(None);
                }
                Ok(Some(record.sequence().to_ascii_uppercase()))
            }
        }
    }
}

impl Iterator for ReadSequences {
    type Item = Result<Vec<u8>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_sequence() {
            Ok(Some(sequence)) => Some(Ok(sequence)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn noodles_error(format: &str, e: &io::Error) -> ParseError {
    ParseError::Noodles(format!("Failed to parse {format} record: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn source(content: &'static [u8]) -> ReadSource {
        ReadSource::from_reader(Box::new(Cursor::new(content)), None).unwrap()
    }

    fn collect(source: ReadSource) -> Vec<Vec<u8>> {
        source.sequences().collect::<Result<_, _>>().unwrap()
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ReadFormat::from_path(Path::new("a.fq")), Some(ReadFormat::Fastq));
        assert_eq!(
            ReadFormat::from_path(Path::new("a.FASTQ.gz")),
            Some(ReadFormat::Fastq)
        );
        assert_eq!(
            ReadFormat::from_path(Path::new("dir/a.fa.bgz")),
            Some(ReadFormat::Fasta)
        );
        assert_eq!(ReadFormat::from_path(Path::new("reads.txt")), None);
        assert_eq!(ReadFormat::from_path(Path::new("reads")), None);
    }

    #[test]
    fn test_sniff_fasta() {
        let source = source(b">r1\nacgtAC\nGT\n>r2\nTTTT\n");
        assert_eq!(source.format(), Some(ReadFormat::Fasta));
        assert_eq!(collect(source), vec![b"ACGTACGT".to_vec(), b"TTTT".to_vec()]);
    }

    #[test]
    fn test_sniff_fastq() {
        let source = source(b"@r1\nACGT\n+\nIIII\n@r2\nggcc\n+\nIIII\n");
        assert_eq!(source.format(), Some(ReadFormat::Fastq));
        assert_eq!(collect(source), vec![b"ACGT".to_vec(), b"GGCC".to_vec()]);
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        let source = source(b"");
        assert_eq!(source.format(), None);
        assert!(collect(source).is_empty());
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result = ReadSource::from_reader(Box::new(Cursor::new(&b"ACGT\n"[..])), None);
        assert!(matches!(result, Err(ParseError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_malformed_fastq_reports_error_once() {
        let source = source(b"@r1\nACGT\n+\nIIII\nr2\nACGT\n+\nIIII\n");
        let results: Vec<_> = source.sequences().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ParseError::Noodles(_))));
    }

    #[test]
    fn test_open_gzipped_file() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let temp = NamedTempFile::with_suffix(".fq.gz").unwrap();
        let mut encoder = GzEncoder::new(File::create(temp.path()).unwrap(), Compression::default());
        encoder.write_all(b"@r1\nACGTACGT\n+\nIIIIIIII\n").unwrap();
        encoder.finish().unwrap();

        let source = ReadSource::open(temp.path()).unwrap();
        assert_eq!(source.format(), Some(ReadFormat::Fastq));
        assert_eq!(collect(source), vec![b"ACGTACGT".to_vec()]);
    }

    #[test]
    fn test_gzip_detected_by_magic() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b">r1\nAAAA\n").unwrap();
        let compressed = encoder.finish().unwrap();

        let source = ReadSource::from_reader(Box::new(Cursor::new(compressed)), None).unwrap();
        assert_eq!(source.format(), Some(ReadFormat::Fasta));
        assert_eq!(collect(source), vec![b"AAAA".to_vec()]);
    }
}
