// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains the Burn framework specific training
// code: the encoder model, the training driver, and the
// evaluator.
//
//   model.rs     — The transformer token-classification model:
//                  • Token + positional embeddings
//                  • Multi-head self-attention with padding mask
//                  • Feed-forward networks (GELU activation)
//                  • Layer normalisation and residuals
//                  • Per-token tag head over the label classes
//                  • Masked cross-entropy loss
//
//   trainer.rs   — The training driver
//                  Device selection, optimizer construction,
//                  the epoch/batch loop, loss logging, and the
//                  single end-of-run checkpoint
//
//   evaluator.rs — Per-epoch held-out evaluation
//                  Token accuracy and entity-level
//                  precision/recall/F1 via BIO span decoding
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need
//            Devlin et al. (2019) BERT

/// Transformer encoder token-classification model
pub mod model;

/// The training driver: epoch loop, logging, checkpointing
pub mod trainer;

/// Held-out evaluation invoked once per epoch
pub mod evaluator;
