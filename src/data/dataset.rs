// ============================================================
// Layer 4 — Encoded Samples and Dataset
// ============================================================
// Turns a LabeledSentence into the fixed-shape numeric form
// the model consumes, and wraps a Vec of those samples in
// Burn's Dataset trait so the DataLoader can batch them.
//
// Encoding steps per sentence:
//   1. token  → vocab id (UNK fallback for unknown tokens)
//   2. label  → class id via the schema
//   3. truncate both to max_seq_len
//   4. pad with [PAD] / label 0, attention mask 1 → 0
//
// Subword alignment is deliberately out of scope here: one
// surface token maps to one vocab id, the convention the
// char-level corpus format assumes.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

use anyhow::{anyhow, Result};
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use crate::domain::schema::LabelSchema;
use crate::domain::sentence::LabeledSentence;

/// One fully encoded and padded training sample.
/// All three vectors have length max_seq_len and are
/// aligned index-by-index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NerSample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub labels:         Vec<u32>,
}

impl NerSample {
    /// Encode a labelled sentence into a fixed-shape sample.
    pub fn encode(
        sentence:    &LabeledSentence,
        tokenizer:   &Tokenizer,
        schema:      &LabelSchema,
        max_seq_len: usize,
    ) -> Result<Self> {
        let unk_id = tokenizer.token_to_id("[UNK]").unwrap_or(0);
        let pad_id = tokenizer.token_to_id("[PAD]").unwrap_or(0);

        let mut input_ids = Vec::with_capacity(max_seq_len);
        let mut labels    = Vec::with_capacity(max_seq_len);

        for (token, label) in sentence.tokens.iter().zip(&sentence.labels) {
            if input_ids.len() == max_seq_len {
                break;
            }
            input_ids.push(tokenizer.token_to_id(token).unwrap_or(unk_id));
            labels.push(
                schema
                    .id(label)
                    .ok_or_else(|| anyhow!("label '{}' is not in the schema", label))?
                    as u32,
            );
        }

        // Attention mask: 1 for real tokens, 0 for padding
        let mut attention_mask = vec![1u32; input_ids.len()];

        // Pad all three vectors to max_seq_len.
        // Padded label positions carry class 0 but are excluded
        // from the loss by the attention mask.
        while input_ids.len() < max_seq_len {
            input_ids.push(pad_id);
            attention_mask.push(0);
            labels.push(0);
        }

        Ok(Self { input_ids, attention_mask, labels })
    }

    /// Number of non-padding positions in this sample
    pub fn real_len(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m == 1).count()
    }
}

/// Encode a whole corpus, skipping empty sentences.
pub fn encode_corpus(
    sentences:   &[LabeledSentence],
    tokenizer:   &Tokenizer,
    schema:      &LabelSchema,
    max_seq_len: usize,
) -> Result<Vec<NerSample>> {
    sentences
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| NerSample::encode(s, tokenizer, schema, max_seq_len))
        .collect()
}

pub struct NerDataset {
    samples: Vec<NerSample>,
}

impl NerDataset {
    pub fn new(samples: Vec<NerSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<NerSample> for NerDataset {
    fn get(&self, index: usize) -> Option<NerSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
