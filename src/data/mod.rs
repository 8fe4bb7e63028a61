// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the raw corpus file to device-ready
// tensor batches, in this order:
//
//   corpus file (token/label lines)
//       │
//       ▼
//   NerCorpusLoader   → parses sentences, validates labels
//       │
//       ▼
//   NerSample::encode → vocab ids, class ids, pad + mask
//       │
//       ▼
//   NerDataset        → implements Burn's Dataset trait
//       │
//       ▼
//   NerBatcher        → stacks samples into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Each module is responsible for exactly one step.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Parses the token/label corpus format
pub mod loader;

/// Sample encoding and Burn's Dataset trait
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
