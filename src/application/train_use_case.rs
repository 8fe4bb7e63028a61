// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load label schema          (Layer 3 - domain)
//   Step 2: Load pretrained tokenizer  (Layer 6 - infra)
//   Step 3: Finalise the run config    (derived sizes)
//   Step 4: Load + encode the corpora  (Layer 4 - data)
//   Step 5: Build evaluator            (Layer 5 - ml)
//   Step 6: Open checkpoint manager    (Layer 6 - infra)
//   Step 7: Run the training driver    (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::{encode_corpus, NerDataset},
    loader::NerCorpusLoader,
};
use crate::domain::schema::LabelSchema;
use crate::domain::traits::SequenceSource;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    tokenizer_store::TokenizerStore,
};
use crate::ml::evaluator::NerEvaluator;
use crate::ml::model::BertNerModel;
use crate::ml::trainer::{run_training, TrainBackend, TrainBatchSource, TrainInnerBackend};

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings for a training run. Constructed once before the
// run and read-only afterwards; the only mutation is the
// injection of the derived sizes (class_num, vocab_size) before
// training starts. Serialisable so it can be stored inside the
// checkpoint and reloaded for inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub model_path:        String,
    pub train_data_path:   String,
    pub valid_data_path:   String,
    pub schema_path:       String,
    pub pretrained_path:   String,
    pub epochs:            usize,
    pub batch_size:        usize,
    pub max_seq_len:       usize,
    pub lr:                f64,
    pub optimizer:         String,
    pub hidden_size:       usize,
    pub num_heads:         usize,
    pub num_layers:        usize,
    pub intermediate_size: usize,
    pub dropout:           f64,
    pub vocab_size:        usize,
    pub class_num:         usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model_path:        "model_output".to_string(),
            train_data_path:   "data/train.txt".to_string(),
            valid_data_path:   "data/valid.txt".to_string(),
            schema_path:       "data/schema.json".to_string(),
            pretrained_path:   "bert-base-chinese".to_string(),
            epochs:            10,
            batch_size:        16,
            max_seq_len:       100,
            lr:                1e-4,
            optimizer:         "adam".to_string(),
            hidden_size:       256,
            num_heads:         8,
            num_layers:        4,
            intermediate_size: 1024,
            dropout:           0.1,
            vocab_size:        21128,
            class_num:         9,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the full training pipeline.
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    /// Create a new TrainUseCase with the given configuration
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end.
    /// Returns the trained model and the batch source it was
    /// trained from.
    pub fn execute(&self) -> Result<(BertNerModel<TrainBackend>, TrainBatchSource)> {
        // ── Step 1: Label schema ──────────────────────────────────────────────
        // Needed first: it fixes the width of the tag head
        tracing::info!("Loading label schema from '{}'", self.config.schema_path);
        let schema = LabelSchema::from_file(&self.config.schema_path)?;

        // ── Step 2: Pretrained tokenizer ──────────────────────────────────────
        // The identifier names a directory with a tokenizer.json;
        // training must use the pretrained encoder's vocabulary ids
        let tokenizer = TokenizerStore::new(&self.config.pretrained_path).load()?;

        // ── Step 3: Finalise the run config ───────────────────────────────────
        // Inject the sizes derived from the schema and vocabulary.
        // From here on the config is read-only.
        let mut cfg = self.config.clone();
        cfg.class_num  = schema.class_num();
        cfg.vocab_size = tokenizer.get_vocab_size(true);
        tracing::info!(
            "Run config: {} classes, vocab size {}, {} epochs",
            cfg.class_num, cfg.vocab_size, cfg.epochs,
        );

        // ── Step 4: Load and encode the corpora ───────────────────────────────
        let train_sentences =
            NerCorpusLoader::new(&cfg.train_data_path, schema.clone()).load_all()?;
        let valid_sentences =
            NerCorpusLoader::new(&cfg.valid_data_path, schema.clone()).load_all()?;

        let train_samples = encode_corpus(&train_sentences, &tokenizer, &schema, cfg.max_seq_len)?;
        let valid_samples = encode_corpus(&valid_sentences, &tokenizer, &schema, cfg.max_seq_len)?;
        tracing::info!(
            "Encoded {} training and {} validation samples",
            train_samples.len(),
            valid_samples.len(),
        );
        let train_dataset = NerDataset::new(train_samples);

        // ── Step 5: Evaluator over the held-out set ───────────────────────────
        let metrics = MetricsLogger::new(&cfg.model_path)?;
        let mut evaluator = NerEvaluator::<TrainInnerBackend>::new(
            valid_samples,
            schema.clone(),
            Default::default(),
            cfg.batch_size,
        )
        .with_metrics(metrics);

        // ── Step 6: Checkpoint manager ────────────────────────────────────────
        // Creates the model directory if it is not there yet
        let ckpt = CheckpointManager::new(&cfg.model_path)?;

        // ── Step 7: Run the training driver (Layer 5) ─────────────────────────
        run_training(&cfg, train_dataset, &mut evaluator, &ckpt)
    }
}
