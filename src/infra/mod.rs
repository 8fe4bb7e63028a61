// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence concerns:
//
//   checkpoint.rs      — The final model checkpoint. Uses
//                        Burn's CompactRecorder for the
//                        parameters and stores the verbatim
//                        TrainConfig next to them so the
//                        model can be rebuilt later.
//
//   tokenizer_store.rs — Loads the pretrained vocabulary
//                        (tokenizer.json) so training uses
//                        the same token ids the pretrained
//                        encoder was built with.
//
//   metrics.rs         — Appends evaluation metrics to a
//                        CSV file, one row per epoch.
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Final checkpoint saving and loading
pub mod checkpoint;

/// Pretrained tokenizer loading
pub mod tokenizer_store;

/// Evaluation metrics CSV logger
pub mod metrics;
