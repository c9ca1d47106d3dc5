//! Centralized validation and helper functions.

/// Maximum number of reference sketches allowed in a single file (DOS protection)
pub const MAX_SKETCHES: usize = 100_000;

/// Largest k-mer size accepted on the command line or in sketch files
pub const MAX_KMER_SIZE: usize = 255;

/// Out-of-range configuration values
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid k-mer size {0}: must be between 1 and {MAX_KMER_SIZE}")]
    InvalidKmerSize(usize),
    #[error("Invalid worker count {0}: at least one worker is required")]
    InvalidWorkerCount(usize),
    #[error("Invalid false-positive rate {0}: must be strictly between 0 and 1")]
    InvalidFalsePositiveRate(f64),
}

/// Validate a k-mer size.
///
/// # Examples
///
/// ```
/// use kmer_tally::utils::validation::validate_kmer_size;
///
/// assert!(validate_kmer_size(21).is_ok());
/// assert!(validate_kmer_size(0).is_err());
/// ```
///
/// # Errors
///
/// Returns `ValidationError::InvalidKmerSize` if `k` is zero or above `MAX_KMER_SIZE`.
pub fn validate_kmer_size(k: usize) -> Result<usize, ValidationError> {
    if k == 0 || k > MAX_KMER_SIZE {
        return Err(ValidationError::InvalidKmerSize(k));
    }
    Ok(k)
}

/// Validate the number of pipeline workers.
///
/// # Errors
///
/// Returns `ValidationError::InvalidWorkerCount` if `n` is zero.
pub fn validate_worker_count(n: usize) -> Result<usize, ValidationError> {
    if n == 0 {
        return Err(ValidationError::InvalidWorkerCount(n));
    }
    Ok(n)
}

/// Validate a target false-positive rate for filter sizing.
///
/// # Errors
///
/// Returns `ValidationError::InvalidFalsePositiveRate` unless `0 < rate < 1`.
pub fn validate_fp_rate(rate: f64) -> Result<f64, ValidationError> {
    if rate.is_nan() || rate <= 0.0 || rate >= 1.0 {
        return Err(ValidationError::InvalidFalsePositiveRate(rate));
    }
    Ok(rate)
}

/// Check if adding another sketch would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new sketch.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_sketch_limit(count: usize) -> Option<String> {
    if count >= MAX_SKETCHES {
        Some(format!(
            "Too many sketches: adding another would exceed maximum of {MAX_SKETCHES}"
        ))
    } else {
        None
    }
}

/// Check that a k-mer consists only of unambiguous nucleotides (A, C, G, T).
///
/// ```
/// use kmer_tally::utils::validation::is_nucleotide_kmer;
///
/// assert!(is_nucleotide_kmer(b"ACGT"));
/// assert!(!is_nucleotide_kmer(b"ACNT"));
/// ```
#[must_use]
pub fn is_nucleotide_kmer(kmer: &[u8]) -> bool {
    kmer.iter().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T'))
}

/// Upper-case a sequence into a new buffer.
#[must_use]
pub fn normalize_sequence(seq: &[u8]) -> Vec<u8> {
    seq.iter().map(u8::to_ascii_uppercase).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_kmer_size() {
        assert_eq!(validate_kmer_size(1), Ok(1));
        assert_eq!(validate_kmer_size(MAX_KMER_SIZE), Ok(MAX_KMER_SIZE));
        assert_eq!(
            validate_kmer_size(0),
            Err(ValidationError::InvalidKmerSize(0))
        );
        assert!(validate_kmer_size(MAX_KMER_SIZE + 1).is_err());
    }

    #[test]
    fn test_validate_worker_count() {
        assert!(validate_worker_count(1).is_ok());
        assert_eq!(
            validate_worker_count(0),
            Err(ValidationError::InvalidWorkerCount(0))
        );
    }

    #[test]
    fn test_validate_fp_rate() {
        assert!(validate_fp_rate(0.001).is_ok());
        assert!(validate_fp_rate(0.0).is_err());
        assert!(validate_fp_rate(1.0).is_err());
        assert!(validate_fp_rate(-0.5).is_err());
        assert!(validate_fp_rate(f64::NAN).is_err());
    }

    #[test]
    fn test_check_sketch_limit() {
        assert!(check_sketch_limit(0).is_none());
        assert!(check_sketch_limit(MAX_SKETCHES - 1).is_none());
        assert!(check_sketch_limit(MAX_SKETCHES).is_some());
    }

    #[test]
    fn test_normalize_sequence() {
        assert_eq!(normalize_sequence(b"acgtN"), b"ACGTN".to_vec());
    }
}
