use serde::{Deserialize, Serialize};

/// One reference genome reduced to its k-mers.
///
/// Sketches are immutable once loaded. The classification tree and the fast
/// lookup index only read from them; `index` is the sketch's position in the
/// reference list and doubles as the leaf label reported by the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSketch {
    /// Position in the global reference list
    #[serde(skip)]
    pub index: usize,

    /// Name reported in classification output
    #[serde(rename = "name")]
    pub source_name: String,

    /// K-mer length shared by every entry in `kmers`
    pub ksize: usize,

    /// Constituent k-mers. Empty strings stand for references shorter than `ksize`.
    pub kmers: Vec<String>,
}

impl ReferenceSketch {
    pub fn new(
        index: usize,
        source_name: impl Into<String>,
        ksize: usize,
        kmers: Vec<String>,
    ) -> Self {
        Self {
            index,
            source_name: source_name.into(),
            ksize,
            kmers,
        }
    }

    /// K-mers that can actually be inserted into a filter (zero-length ones skipped)
    pub fn usable_kmers(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.kmers
            .iter()
            .map(String::as_bytes)
            .filter(|kmer| !kmer.is_empty())
    }

    /// Number of usable k-mers
    #[must_use]
    pub fn usable_len(&self) -> usize {
        self.usable_kmers().count()
    }

    /// First usable k-mer whose length differs from `ksize`, if any
    #[must_use]
    pub fn find_mislength_kmer(&self) -> Option<&str> {
        self.kmers
            .iter()
            .map(String::as_str)
            .find(|kmer| !kmer.is_empty() && kmer.len() != self.ksize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kmers(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_usable_kmers_skip_empty() {
        let sketch = ReferenceSketch::new(0, "short", 4, kmers(&["", "ACGT", ""]));
        let usable: Vec<&[u8]> = sketch.usable_kmers().collect();
        assert_eq!(usable, vec![b"ACGT".as_ref()]);
        assert_eq!(sketch.usable_len(), 1);
    }

    #[test]
    fn test_find_mislength_kmer() {
        let ok = ReferenceSketch::new(0, "ok", 4, kmers(&["ACGT", "", "TTTT"]));
        assert!(ok.find_mislength_kmer().is_none());

        let bad = ReferenceSketch::new(1, "bad", 4, kmers(&["ACGT", "ACG"]));
        assert_eq!(bad.find_mislength_kmer(), Some("ACG"));
    }

    #[test]
    fn test_serde_uses_name_field() {
        let sketch = ReferenceSketch::new(7, "genome_a", 4, kmers(&["ACGT"]));
        let json = serde_json::to_string(&sketch).unwrap();
        assert!(json.contains("\"name\":\"genome_a\""));
        assert!(!json.contains("index"));

        let parsed: ReferenceSketch = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.index, 0);
        assert_eq!(parsed.source_name, "genome_a");
    }
}
