// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Runs the current model over the held-out set once per epoch
// and reports quality metrics. The training loop only hands it
// the epoch number and a read-only model; everything the
// evaluator measures and logs is its own business.
//
// Metrics per epoch:
//   - token accuracy over non-padding positions
//   - entity-level precision / recall / F1 from BIO span
//     decoding, per entity type and micro-averaged
//
// A predicted span counts as correct only when type, start
// and end all match a gold span exactly.
//
// Reference: Burn Book §5 (Training)
//            Ramshaw & Marcus (1995) BIO chunking

use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};

use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;

use crate::data::batcher::{NerBatch, NerBatcher};
use crate::data::dataset::NerSample;
use crate::domain::schema::LabelSchema;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::BertNerModel;

// ─── EvalReport ───────────────────────────────────────────────────────────────
/// The outcome of one evaluation pass, kept in memory so a
/// caller can inspect which epochs were evaluated and how
/// the model progressed.
#[derive(Debug, Clone)]
pub struct EvalReport {
    pub epoch:          usize,
    pub token_accuracy: f64,
    pub precision:      f64,
    pub recall:         f64,
    pub f1:             f64,
}

// ─── NerEvaluator ─────────────────────────────────────────────────────────────
/// Owns the held-out samples and evaluates the model on them
/// at the end of every epoch. Read-only with respect to the
/// model: a forward pass on the inference backend, no
/// gradients, no parameter updates.
pub struct NerEvaluator<B: Backend> {
    samples:    Vec<NerSample>,
    schema:     LabelSchema,
    batcher:    NerBatcher<B>,
    batch_size: usize,
    metrics:    Option<MetricsLogger>,
    history:    Vec<EvalReport>,
}

impl<B: Backend> NerEvaluator<B> {
    pub fn new(
        samples:    Vec<NerSample>,
        schema:     LabelSchema,
        device:     B::Device,
        batch_size: usize,
    ) -> Self {
        Self {
            samples,
            schema,
            batcher: NerBatcher::new(device),
            batch_size: batch_size.max(1),
            metrics: None,
            history: Vec::new(),
        }
    }

    /// Attach a CSV metrics logger; one row is appended per pass.
    pub fn with_metrics(mut self, metrics: MetricsLogger) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Evaluate the model after the given (1-indexed) epoch.
    pub fn evaluate(&mut self, epoch: usize, model: &BertNerModel<B>) -> Result<()> {
        tracing::info!("Evaluating epoch {} on {} held-out samples", epoch, self.samples.len());

        let mut token_total   = 0usize;
        let mut token_correct = 0usize;
        // Per entity type: (gold spans, predicted spans, exact matches)
        let mut by_type: HashMap<String, SpanCounts> = HashMap::new();

        for chunk in self.samples.chunks(self.batch_size) {
            let batch: NerBatch<B> = self.batcher.batch(chunk.to_vec(), &self.batcher.device);
            let [batch_size, seq_len] = batch.input_ids.dims();

            let logits = model.forward(batch.input_ids, batch.attention_mask.clone());
            let preds  = logits.argmax(2).reshape([batch_size * seq_len]);

            let preds  = to_ints(preds)?;
            let golds  = to_ints(batch.labels.reshape([batch_size * seq_len]))?;
            let mask   = to_ints(batch.attention_mask.reshape([batch_size * seq_len]))?;

            for row in 0..batch_size {
                let lo = row * seq_len;
                let hi = lo + seq_len;
                // Only the real (unpadded) prefix of the row carries labels
                let real_len = mask[lo..hi].iter().filter(|&&m| m == 1).count();

                let pred_row = &preds[lo..lo + real_len];
                let gold_row = &golds[lo..lo + real_len];

                token_total   += real_len;
                token_correct += pred_row
                    .iter()
                    .zip(gold_row)
                    .filter(|(p, g)| p == g)
                    .count();

                let pred_spans = decode_spans(pred_row, &self.schema);
                let gold_spans = decode_spans(gold_row, &self.schema);
                for span in &gold_spans {
                    by_type.entry(span.0.clone()).or_default().gold += 1;
                }
                for span in &pred_spans {
                    let counts = by_type.entry(span.0.clone()).or_default();
                    counts.predicted += 1;
                    if gold_spans.contains(span) {
                        counts.correct += 1;
                    }
                }
            }
        }

        let report = self.summarise(epoch, token_total, token_correct, &by_type);
        if let Some(metrics) = &self.metrics {
            metrics.log(&EpochMetrics {
                epoch:     report.epoch,
                token_acc: report.token_accuracy,
                precision: report.precision,
                recall:    report.recall,
                f1:        report.f1,
            })?;
        }
        self.history.push(report);
        Ok(())
    }

    /// All reports produced so far, in evaluation order
    pub fn history(&self) -> &[EvalReport] {
        &self.history
    }

    fn summarise(
        &self,
        epoch:         usize,
        token_total:   usize,
        token_correct: usize,
        by_type:       &HashMap<String, SpanCounts>,
    ) -> EvalReport {
        let mut micro = SpanCounts::default();

        // Per-type breakdown, sorted for stable log output
        let mut types: Vec<(&String, &SpanCounts)> = by_type.iter().collect();
        types.sort_by_key(|(name, _)| name.as_str());
        for (name, counts) in types {
            let (p, r, f1) = counts.prf();
            tracing::info!(
                "  {}: precision {:.4}, recall {:.4}, f1 {:.4} ({} gold, {} predicted)",
                name, p, r, f1, counts.gold, counts.predicted,
            );
            micro.gold      += counts.gold;
            micro.predicted += counts.predicted;
            micro.correct   += counts.correct;
        }

        let token_accuracy = if token_total > 0 {
            token_correct as f64 / token_total as f64
        } else {
            0.0
        };
        let (precision, recall, f1) = micro.prf();

        tracing::info!(
            "epoch {}: token accuracy {:.4}, micro precision {:.4}, recall {:.4}, f1 {:.4}",
            epoch, token_accuracy, precision, recall, f1,
        );

        EvalReport { epoch, token_accuracy, precision, recall, f1 }
    }
}

// ─── Span counting ────────────────────────────────────────────────────────────
#[derive(Debug, Default, Clone)]
struct SpanCounts {
    gold:      usize,
    predicted: usize,
    correct:   usize,
}

impl SpanCounts {
    /// (precision, recall, f1), each 0.0 when its denominator is 0
    fn prf(&self) -> (f64, f64, f64) {
        let p = if self.predicted > 0 {
            self.correct as f64 / self.predicted as f64
        } else {
            0.0
        };
        let r = if self.gold > 0 {
            self.correct as f64 / self.gold as f64
        } else {
            0.0
        };
        let f1 = if p + r > 0.0 { 2.0 * p * r / (p + r) } else { 0.0 };
        (p, r, f1)
    }
}

/// Decode a class-id sequence into (entity type, start, end) spans
/// under the BIO convention. Only a B- tag opens a span; an I- tag
/// extends the open span when its type matches, otherwise it is
/// ignored. End positions are inclusive.
pub fn decode_spans(ids: &[i32], schema: &LabelSchema) -> HashSet<(String, usize, usize)> {
    let mut spans = HashSet::new();
    // (type, start) of the span currently being built
    let mut open: Option<(String, usize)> = None;

    for (pos, &id) in ids.iter().enumerate() {
        let label = schema.label(id as usize).unwrap_or("O");

        if let Some(entity) = label.strip_prefix("B-") {
            if let Some((ty, start)) = open.take() {
                spans.insert((ty, start, pos - 1));
            }
            open = Some((entity.to_string(), pos));
        } else if let Some(entity) = label.strip_prefix("I-") {
            match &open {
                Some((ty, _)) if ty == entity => {} // span continues
                _ => open = None,                   // stray I- tag
            }
        } else {
            // "O" or any non-BIO label closes the open span
            if let Some((ty, start)) = open.take() {
                spans.insert((ty, start, pos - 1));
            }
        }
    }

    if let Some((ty, start)) = open {
        spans.insert((ty, start, ids.len() - 1));
    }

    spans
}

/// Pull an Int tensor back to host memory as plain i32 values.
fn to_ints<B: Backend>(tensor: Tensor<B, 1, Int>) -> Result<Vec<i32>> {
    tensor
        .into_data()
        .convert::<i32>()
        .to_vec::<i32>()
        .map_err(|e| anyhow!("Cannot read tensor data: {:?}", e))
}
