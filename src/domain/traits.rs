// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// By programming against traits instead of concrete types,
// we can swap implementations without changing the code
// that uses them. For example:
//   - NerCorpusLoader implements SequenceSource
//   - A future ConllLoader could also implement SequenceSource
//   - The application layer only sees SequenceSource
//     and works with both without any changes
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use crate::domain::sentence::LabeledSentence;
use anyhow::Result;

// ─── SequenceSource ───────────────────────────────────────────────────────────
/// Any component that can produce labelled sentences.
///
/// Implementations:
///   - NerCorpusLoader → parses the token/label text format
pub trait SequenceSource {
    /// Load every labelled sentence from this source.
    fn load_all(&self) -> Result<Vec<LabeledSentence>>;
}
