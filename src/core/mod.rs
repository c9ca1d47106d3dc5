//! Core data types for read classification.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`ReferenceSketch`]: A reference genome reduced to its k-mers, with a
//!   position in the reference list and a display name
//! - [`ClassifierConfig`]: k-mer size, worker count, false-positive rate and
//!   queue capacity consumed by index construction and the pipeline
//! - [`FilterBackend`]: Which approximate-membership set backs the tree
//!
//! ## K-mers
//!
//! K-mers are fixed-length substrings compared byte for byte. Parsers upper-case
//! both reference k-mers and read sequences so that soft-masked (lowercase)
//! bases still match; no reverse-complement canonicalization is applied.
//!
//! [`ReferenceSketch`]: sketch::ReferenceSketch
//! [`ClassifierConfig`]: types::ClassifierConfig
//! [`FilterBackend`]: types::FilterBackend

pub mod sketch;
pub mod types;
