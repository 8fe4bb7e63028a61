// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Loads the vocabulary of the pretrained model. The
// pretrained-model identifier names a directory containing a
// HuggingFace-format tokenizer.json; its content is consumed
// opaquely — this code never looks inside the vocabulary
// beyond id lookups.

use anyhow::Result;
use std::path::PathBuf;
use tokenizers::Tokenizer;

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load the tokenizer from <dir>/tokenizer.json
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.dir.join("tokenizer.json");
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_wordlevel_tokenizer() {
        let dir  = tempfile::tempdir().unwrap();
        let json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": null,
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": { "[PAD]": 0, "[UNK]": 1, "Oslo": 2 },
                "unk_token": "[UNK]"
            }
        });
        std::fs::write(
            dir.path().join("tokenizer.json"),
            serde_json::to_string(&json).unwrap(),
        ).unwrap();

        let tokenizer = TokenizerStore::new(dir.path()).load().unwrap();
        assert_eq!(tokenizer.token_to_id("Oslo"), Some(2));
        assert_eq!(tokenizer.get_vocab_size(true), 3);
    }

    #[test]
    fn test_missing_tokenizer_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TokenizerStore::new(dir.path()).load().is_err());
    }
}
