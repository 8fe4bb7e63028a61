// ============================================================
// Layer 4 — NER Corpus Loader
// ============================================================
// Parses the labelled corpus text format:
//
//   one "token label" pair per line, whitespace separated,
//   with a blank line between sentences:
//
//     Anna B-PER
//     flew O
//     to O
//     Oslo B-LOC
//     <blank>
//     ...
//
// Every label is checked against the schema at parse time,
// so a typo in the corpus fails fast with a line number
// instead of producing a garbage class id deep inside the
// training loop.
//
// Reference: Rust Book §8 (Collections)
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::domain::schema::LabelSchema;
use crate::domain::sentence::LabeledSentence;
use crate::domain::traits::SequenceSource;

/// Loads labelled sentences from a single corpus file.
/// Implements the SequenceSource trait from Layer 3.
pub struct NerCorpusLoader {
    /// Path to the corpus file
    path: PathBuf,

    /// Schema used to validate labels at parse time
    schema: LabelSchema,
}

impl NerCorpusLoader {
    /// Create a new loader for the given corpus file
    pub fn new(path: impl Into<PathBuf>, schema: LabelSchema) -> Self {
        Self { path: path.into(), schema }
    }
}

impl SequenceSource for NerCorpusLoader {
    fn load_all(&self) -> Result<Vec<LabeledSentence>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read corpus file '{}'", self.path.display()))?;

        let mut sentences = Vec::new();
        let mut tokens: Vec<String> = Vec::new();
        let mut labels: Vec<String> = Vec::new();

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();

            // A blank line closes the current sentence
            if line.is_empty() {
                if !tokens.is_empty() {
                    sentences.push(LabeledSentence::new(
                        std::mem::take(&mut tokens),
                        std::mem::take(&mut labels),
                    ));
                }
                continue;
            }

            let mut parts = line.split_whitespace();
            let (token, label) = match (parts.next(), parts.next(), parts.next()) {
                (Some(t), Some(l), None) => (t, l),
                _ => bail!(
                    "{}:{}: expected 'token label', got '{}'",
                    self.path.display(),
                    line_no + 1,
                    line
                ),
            };

            if self.schema.id(label).is_none() {
                bail!(
                    "{}:{}: label '{}' is not in the schema",
                    self.path.display(),
                    line_no + 1,
                    label
                );
            }

            tokens.push(token.to_string());
            labels.push(label.to_string());
        }

        // Corpus files don't always end with a blank line
        if !tokens.is_empty() {
            sentences.push(LabeledSentence::new(tokens, labels));
        }

        tracing::info!(
            "Loaded {} sentences from '{}'",
            sentences.len(),
            self.path.display()
        );
        Ok(sentences)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn test_schema() -> LabelSchema {
        let map: HashMap<String, usize> = [("B-PER", 0), ("I-PER", 1), ("B-LOC", 2), ("O", 3)]
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        LabelSchema::from_map(map).unwrap()
    }

    fn write_corpus(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn test_parses_two_sentences() {
        let f = write_corpus("Anna B-PER\nflew O\n\nOslo B-LOC\n");
        let loader = NerCorpusLoader::new(f.path(), test_schema());

        let sentences = loader.load_all().unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].tokens, vec!["Anna", "flew"]);
        assert_eq!(sentences[0].labels, vec!["B-PER", "O"]);
        assert_eq!(sentences[1].tokens, vec!["Oslo"]);
    }

    #[test]
    fn test_last_sentence_without_trailing_blank() {
        let f = write_corpus("Anna B-PER\nflew O");
        let loader = NerCorpusLoader::new(f.path(), test_schema());
        assert_eq!(loader.load_all().unwrap().len(), 1);
    }

    #[test]
    fn test_consecutive_blank_lines() {
        let f = write_corpus("Anna B-PER\n\n\n\nOslo B-LOC\n\n");
        let loader = NerCorpusLoader::new(f.path(), test_schema());
        assert_eq!(loader.load_all().unwrap().len(), 2);
    }

    #[test]
    fn test_rejects_malformed_line() {
        let f = write_corpus("Anna\n");
        let loader = NerCorpusLoader::new(f.path(), test_schema());
        assert!(loader.load_all().is_err());
    }

    #[test]
    fn test_rejects_unknown_label() {
        let f = write_corpus("Anna B-ORG\n");
        let loader = NerCorpusLoader::new(f.path(), test_schema());
        let err = loader.load_all().unwrap_err().to_string();
        assert!(err.contains("B-ORG"));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let loader = NerCorpusLoader::new("/no/such/corpus.txt", test_schema());
        assert!(loader.load_all().is_err());
    }
}
