// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Persists the trained model using Burn's CompactRecorder.
//
// What gets written, once, at the end of a run:
//   1. bert_ner_model.mpk.gz — all learned parameters
//   2. bert_ner_model.json   — the verbatim run configuration
//
// The pair is self-describing: the stored configuration is
// enough to rebuild an identical model and load the weights
// into it, with no external information. Loading fails if
// the architecture in the config does not match the record.
//
// Burn's CompactRecorder:
//   - Serialises model parameters to MessagePack format
//   - Compresses with gzip for smaller file size
//   - Type-safe: loading fails if architecture doesn't match
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::{BertNerConfig, BertNerModel};

/// Fixed file stem for the one checkpoint a run produces.
/// The recorder appends its own extension to the weights file.
const CHECKPOINT_STEM: &str = "bert_ner_model";

/// Manages saving and loading of the final checkpoint.
/// All files are stored in the configured model directory.
pub struct CheckpointManager {
    /// Path to the model output directory
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager, creating the model
    /// directory if it does not exist yet. Idempotent: safe
    /// to call when the directory is already there.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create model directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Path stem of the weights record (extension added by the recorder)
    pub fn checkpoint_path(&self) -> PathBuf {
        self.dir.join(CHECKPOINT_STEM)
    }

    /// Path of the stored configuration file
    pub fn config_path(&self) -> PathBuf {
        self.dir.join(format!("{CHECKPOINT_STEM}.json"))
    }

    /// Save the model parameters together with the configuration
    /// that produced them.
    pub fn save<B: AutodiffBackend>(
        &self,
        model: &BertNerModel<B>,
        cfg:   &TrainConfig,
    ) -> Result<()> {
        let path = self.checkpoint_path();

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        // The configuration travels with the weights so inference
        // can rebuild the exact architecture later
        fs::write(self.config_path(), serde_json::to_string_pretty(cfg)?)
            .with_context(|| {
                format!("Cannot write config to '{}'", self.config_path().display())
            })?;

        tracing::debug!("Saved checkpoint at stem '{}'", path.display());
        Ok(())
    }

    /// Load the stored configuration back.
    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.config_path();
        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. Has a model been trained here?",
                    path.display()
                )
            })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Rebuild the model described by the stored configuration
    /// and load the saved weights into it.
    pub fn load_model<B: Backend>(&self, device: &B::Device) -> Result<BertNerModel<B>> {
        let cfg  = self.load_config()?;
        let path = self.checkpoint_path();

        let model = BertNerConfig::new(
            cfg.vocab_size, cfg.max_seq_len, cfg.hidden_size, cfg.num_heads,
            cfg.num_layers, cfg.intermediate_size, cfg.dropout, cfg.class_num,
        )
        .init(device);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        // load_record() returns a new model with the loaded weights
        Ok(model.load_record(record))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::module::AutodiffModule;

    type TB = Autodiff<NdArray>;

    fn tiny_config(model_path: &str) -> TrainConfig {
        TrainConfig {
            model_path:        model_path.to_string(),
            train_data_path:   "data/train.txt".to_string(),
            valid_data_path:   "data/valid.txt".to_string(),
            schema_path:       "data/schema.json".to_string(),
            pretrained_path:   "bert-base-chinese".to_string(),
            epochs:            1,
            batch_size:        2,
            max_seq_len:       8,
            lr:                1e-4,
            optimizer:         "adam".to_string(),
            hidden_size:       16,
            num_heads:         2,
            num_layers:        1,
            intermediate_size: 32,
            dropout:           0.0,
            vocab_size:        32,
            class_num:         5,
        }
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let dir  = tempfile::tempdir().unwrap();
        let cfg  = tiny_config(dir.path().to_str().unwrap());
        let ckpt = CheckpointManager::new(dir.path()).unwrap();

        let device = Default::default();
        let model: BertNerModel<TB> = BertNerConfig::new(
            cfg.vocab_size, cfg.max_seq_len, cfg.hidden_size, cfg.num_heads,
            cfg.num_layers, cfg.intermediate_size, cfg.dropout, cfg.class_num,
        )
        .init(&device);

        ckpt.save(&model, &cfg).unwrap();

        // The stored config is a verbatim copy of the input
        assert_eq!(ckpt.load_config().unwrap(), cfg);

        // The reloaded model computes exactly what the saved one did
        let loaded: BertNerModel<NdArray> = ckpt.load_model(&device).unwrap();

        let ids  = Tensor::<NdArray, 1, Int>::from_ints(
            [1, 2, 3, 4, 0, 0, 0, 0].as_slice(), &device,
        ).reshape([1, 8]);
        let mask = Tensor::<NdArray, 1, Int>::from_ints(
            [1, 1, 1, 1, 0, 0, 0, 0].as_slice(), &device,
        ).reshape([1, 8]);

        let original = model.valid().forward(ids.clone(), mask.clone()).into_data();
        let restored = loaded.forward(ids, mask).into_data();
        assert_eq!(original, restored);
    }

    #[test]
    fn test_new_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CheckpointManager::new(dir.path()).is_ok());
        // Calling again on the existing directory must also succeed
        assert!(CheckpointManager::new(dir.path()).is_ok());
    }

    #[test]
    fn test_load_config_without_checkpoint_fails() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        assert!(ckpt.load_config().is_err());
    }
}
