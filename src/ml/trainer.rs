// ============================================================
// Layer 5 — Training Driver
// ============================================================
// Sequences one full training run: device selection, model and
// optimizer construction, the epoch/batch loop, per-epoch
// evaluation, and the single end-of-run checkpoint.
//
// Key Burn 0.20 insight:
//   - Training uses the Autodiff backend for gradients
//   - model.valid() returns the model on the inner backend,
//     which disables dropout for evaluation
//   - every loss.backward() yields a fresh gradient container,
//     so per-batch gradient isolation needs no explicit clear
//
// Control flow is a strict two-level counted loop (epochs,
// then batches) with no other states; the device choice is
// made once at the top, never per batch.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{bail, Result};
use std::sync::Arc;
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::{NerBatch, NerBatcher}, dataset::NerDataset};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::evaluator::NerEvaluator;
use crate::ml::model::{BertNerConfig, BertNerModel};

pub type TrainBackend      = burn::backend::Autodiff<burn::backend::Wgpu>;
pub type TrainInnerBackend = burn::backend::Wgpu;

/// The trained model plus the batch-source handle handed back
/// to the caller for post-inspection.
pub type TrainBatchSource = Arc<dyn DataLoader<TrainBackend, NerBatch<TrainBackend>>>;

/// Run one full training run on the default compute device.
///
/// Returns the trained model and the batch source it was
/// trained from.
pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: NerDataset,
    evaluator:     &mut NerEvaluator<TrainInnerBackend>,
    ckpt:          &CheckpointManager,
) -> Result<(BertNerModel<TrainBackend>, TrainBatchSource)> {
    // The device is resolved exactly once per run; batches and
    // parameters follow it from here on
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop::<TrainBackend>(cfg, train_dataset, evaluator, ckpt, device)
}

/// Backend-generic training loop. Split from run_training so the
/// whole run can be exercised on a CPU backend.
pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: NerDataset,
    evaluator:     &mut NerEvaluator<B::InnerBackend>,
    ckpt:          &CheckpointManager,
    device:        B::Device,
) -> Result<(BertNerModel<B>, Arc<dyn DataLoader<B, NerBatch<B>>>)> {
    // The optimizer is chosen by name from the configuration;
    // anything unknown is a fatal configuration error
    match cfg.optimizer.as_str() {
        "adam" => {
            // m = β1*m + (1-β1)*g        (mean)
            // v = β2*v + (1-β2)*g²       (variance)
            // θ = θ - lr * m / (√v + ε)  (update)
            let optim = AdamConfig::new().with_epsilon(1e-8).init();
            fit(cfg, train_dataset, evaluator, ckpt, device, optim)
        }
        "sgd" => {
            let optim = SgdConfig::new().init();
            fit(cfg, train_dataset, evaluator, ckpt, device, optim)
        }
        other => bail!("unknown optimizer '{}': expected 'adam' or 'sgd'", other),
    }
}

fn fit<B, O>(
    cfg:           &TrainConfig,
    train_dataset: NerDataset,
    evaluator:     &mut NerEvaluator<B::InnerBackend>,
    ckpt:          &CheckpointManager,
    device:        B::Device,
    mut optim:     O,
) -> Result<(BertNerModel<B>, Arc<dyn DataLoader<B, NerBatch<B>>>)>
where
    B: AutodiffBackend,
    O: Optimizer<BertNerModel<B>, B>,
{
    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = BertNerConfig::new(
        cfg.vocab_size, cfg.max_seq_len, cfg.hidden_size, cfg.num_heads,
        cfg.num_layers, cfg.intermediate_size, cfg.dropout, cfg.class_num,
    );
    let mut model: BertNerModel<B> = model_cfg.init(&device);
    tracing::info!(
        "Model ready: {} layers, hidden_size={}, {} classes",
        cfg.num_layers, cfg.hidden_size, cfg.class_num,
    );

    // ── Training data loader ──────────────────────────────────────────────────
    // Shuffling is the loader's concern; the loop below consumes
    // batches strictly in the order the loader yields them.
    let batch_size   = cfg.batch_size.max(1);
    let sample_count = train_dataset.sample_count();
    let batch_count  = (sample_count + batch_size - 1) / batch_size;
    let interval     = log_interval(batch_count);

    let batcher = NerBatcher::<B>::new(device.clone());
    let train_loader = DataLoaderBuilder::new(batcher)
        .batch_size(batch_size)
        .shuffle(42)
        .num_workers(1)
        .build(train_dataset);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        tracing::info!("epoch {} begin", epoch);

        // Per-batch losses for this epoch only; reduced to a mean
        // below and then discarded
        let mut train_loss: Vec<f64> = Vec::with_capacity(batch_count);

        for (index, batch) in train_loader.iter().enumerate() {
            let (loss, _logits) = model.forward_loss(
                batch.input_ids,
                batch.attention_mask,
                batch.labels,
            );
            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

            // Backward pass + optimizer update over exactly this
            // batch's gradients
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);

            train_loss.push(loss_val);
            if index % interval == 0 {
                tracing::info!("batch loss {:.6}", loss_val);
            }
        }

        tracing::info!("epoch {} average loss: {:.6}", epoch, mean_loss(&train_loss));

        // model.valid() → inner backend, dropout disabled.
        // The evaluator logs its own findings; the driver does not
        // look at them.
        evaluator.evaluate(epoch, &model.valid())?;
    }

    // ── Save checkpoint ───────────────────────────────────────────────────────
    // Unconditional: a zero-epoch run still writes the freshly
    // initialised parameters plus the config that produced them
    ckpt.save(&model, cfg)?;
    tracing::info!("Model saved at '{}'", ckpt.checkpoint_path().display());

    Ok((model, train_loader))
}

/// Batch-loss logging interval: half an epoch, with a floor of 1
/// so 0- and 1-batch epochs never divide by zero.
pub fn log_interval(batch_count: usize) -> usize {
    (batch_count / 2).max(1)
}

/// Arithmetic mean of the recorded per-batch losses.
/// NaN for an empty epoch, which only happens with an empty dataset.
pub fn mean_loss(losses: &[f64]) -> f64 {
    if losses.is_empty() {
        f64::NAN
    } else {
        losses.iter().sum::<f64>() / losses.len() as f64
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::NerSample;
    use crate::domain::schema::LabelSchema;
    use burn::backend::{Autodiff, NdArray};
    use burn::data::dataloader::batcher::Batcher;
    use std::collections::HashMap;

    type TB = Autodiff<NdArray>;

    const SEQ_LEN: usize = 8;

    fn tiny_config(model_path: &str, epochs: usize) -> TrainConfig {
        TrainConfig {
            model_path:        model_path.to_string(),
            train_data_path:   "data/train.txt".to_string(),
            valid_data_path:   "data/valid.txt".to_string(),
            schema_path:       "data/schema.json".to_string(),
            pretrained_path:   "bert-base-chinese".to_string(),
            epochs,
            batch_size:        2,
            max_seq_len:       SEQ_LEN,
            lr:                1e-3,
            optimizer:         "adam".to_string(),
            hidden_size:       16,
            num_heads:         2,
            num_layers:        1,
            intermediate_size: 32,
            dropout:           0.0,
            vocab_size:        16,
            class_num:         3,
        }
    }

    fn test_schema() -> LabelSchema {
        let map: HashMap<String, usize> = [("B-ENT", 0), ("I-ENT", 1), ("O", 2)]
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        LabelSchema::from_map(map).unwrap()
    }

    fn sample(seed: u32) -> NerSample {
        NerSample {
            input_ids:      vec![1 + seed % 8, 2, 3 + seed % 4, 4, 0, 0, 0, 0],
            attention_mask: vec![1, 1, 1, 1, 0, 0, 0, 0],
            labels:         vec![0, 1, 2, 2, 0, 0, 0, 0],
        }
    }

    fn samples(n: u32) -> Vec<NerSample> {
        (0..n).map(sample).collect()
    }

    fn evaluator() -> NerEvaluator<NdArray> {
        NerEvaluator::new(samples(2), test_schema(), Default::default(), 2)
    }

    #[test]
    fn test_log_interval_guards_small_epochs() {
        // The raw total/2 modulus would divide by zero here
        assert_eq!(log_interval(0), 1);
        assert_eq!(log_interval(1), 1);
        assert_eq!(log_interval(2), 1);
        assert_eq!(log_interval(3), 1);
        assert_eq!(log_interval(10), 5);
        assert_eq!(log_interval(101), 50);
    }

    #[test]
    fn test_mean_loss_matches_direct_mean() {
        let losses = [0.5, 1.5, 2.5, 0.25];
        let direct = losses.iter().sum::<f64>() / losses.len() as f64;
        assert!((mean_loss(&losses) - direct).abs() < 1e-12);
        assert!(mean_loss(&[]).is_nan());
    }

    #[test]
    fn test_evaluator_invoked_once_per_epoch_in_order() {
        let dir  = tempfile::tempdir().unwrap();
        let cfg  = tiny_config(dir.path().to_str().unwrap(), 2);
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let mut evaluator = evaluator();

        train_loop::<TB>(
            &cfg,
            NerDataset::new(samples(4)),
            &mut evaluator,
            &ckpt,
            Default::default(),
        )
        .unwrap();

        let epochs: Vec<usize> = evaluator.history().iter().map(|r| r.epoch).collect();
        assert_eq!(epochs, vec![1, 2]);

        // Exactly one checkpoint, written after both epochs finished
        assert!(dir.path().join("bert_ner_model.mpk.gz").exists());
        assert!(dir.path().join("bert_ner_model.json").exists());
        let weight_files = std::fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .ends_with(".mpk.gz")
            })
            .count();
        assert_eq!(weight_files, 1);
    }

    #[test]
    fn test_zero_epochs_skips_training_but_writes_checkpoint() {
        let dir  = tempfile::tempdir().unwrap();
        let cfg  = tiny_config(dir.path().to_str().unwrap(), 0);
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let mut evaluator = evaluator();

        train_loop::<TB>(
            &cfg,
            NerDataset::new(samples(4)),
            &mut evaluator,
            &ckpt,
            Default::default(),
        )
        .unwrap();

        // No epochs ran, the evaluator was never called, and the
        // save still happened
        assert!(evaluator.history().is_empty());
        assert!(dir.path().join("bert_ner_model.mpk.gz").exists());
    }

    #[test]
    fn test_single_batch_epoch_does_not_fault() {
        // 1 sample with batch_size 2 → a 1-batch epoch, the case the
        // unguarded cadence arithmetic used to break on
        let dir  = tempfile::tempdir().unwrap();
        let cfg  = tiny_config(dir.path().to_str().unwrap(), 1);
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let mut evaluator = evaluator();

        train_loop::<TB>(
            &cfg,
            NerDataset::new(samples(1)),
            &mut evaluator,
            &ckpt,
            Default::default(),
        )
        .unwrap();

        assert_eq!(evaluator.history().len(), 1);
    }

    #[test]
    fn test_unknown_optimizer_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = tiny_config(dir.path().to_str().unwrap(), 1);
        cfg.optimizer = "rmsprop".to_string();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let mut evaluator = evaluator();

        let err = train_loop::<TB>(
            &cfg,
            NerDataset::new(samples(2)),
            &mut evaluator,
            &ckpt,
            Default::default(),
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("rmsprop"));
    }

    #[test]
    fn test_sgd_optimizer_runs() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = tiny_config(dir.path().to_str().unwrap(), 1);
        cfg.optimizer = "sgd".to_string();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let mut evaluator = evaluator();

        train_loop::<TB>(
            &cfg,
            NerDataset::new(samples(4)),
            &mut evaluator,
            &ckpt,
            Default::default(),
        )
        .unwrap();
        assert_eq!(evaluator.history().len(), 1);
    }

    #[test]
    fn test_per_batch_gradients_do_not_accumulate() {
        // Two identical forward/backward passes must produce
        // identical gradients: each backward() starts from a clean
        // container, nothing is carried over from the previous one.
        let device = Default::default();
        let model: BertNerModel<TB> =
            BertNerConfig::new(16, SEQ_LEN, 16, 2, 1, 32, 0.0, 3).init(&device);
        let batcher = NerBatcher::<TB>::new(device);
        let batch   = batcher.batch(samples(2), &Default::default());

        let (loss1, _) = model.forward_loss(
            batch.input_ids.clone(),
            batch.attention_mask.clone(),
            batch.labels.clone(),
        );
        let grads1 = loss1.backward();
        let g1 = model.tag_head.weight.grad(&grads1).unwrap();

        let (loss2, _) = model.forward_loss(
            batch.input_ids,
            batch.attention_mask,
            batch.labels,
        );
        let grads2 = loss2.backward();
        let g2 = model.tag_head.weight.grad(&grads2).unwrap();

        assert_eq!(g1.into_data(), g2.into_data());
    }
}
