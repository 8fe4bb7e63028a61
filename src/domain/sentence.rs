// ============================================================
// Layer 3 — LabeledSentence Domain Type
// ============================================================
// Represents one training example in domain terms:
// a token sequence paired with a label sequence of the
// same length. This is the core concept of sequence
// labelling: every token carries exactly one BIO tag.
//
// Example:
//   tokens: ["Anna", "flew", "to", "Oslo"]
//   labels: ["B-PER", "O",   "O",  "B-LOC"]
//
// Reference: Rust Book §5 (Structs)

use serde::{Deserialize, Serialize};

/// A raw labelled sentence as parsed from the corpus file,
/// before any tokenisation or padding.
///
/// Invariant: tokens.len() == labels.len().
/// The corpus loader enforces this at parse time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledSentence {
    /// The surface tokens, one per position
    pub tokens: Vec<String>,

    /// The label strings, aligned index-by-index with tokens
    pub labels: Vec<String>,
}

impl LabeledSentence {
    /// Create a new LabeledSentence.
    ///
    /// # Panics
    /// Panics if tokens and labels have different lengths —
    /// a sentence that violates the alignment invariant can
    /// never be encoded correctly downstream.
    pub fn new(tokens: Vec<String>, labels: Vec<String>) -> Self {
        assert_eq!(
            tokens.len(),
            labels.len(),
            "token/label length mismatch: {} vs {}",
            tokens.len(),
            labels.len()
        );
        Self { tokens, labels }
    }

    /// Number of token positions in this sentence
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True if the sentence contains no tokens
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
