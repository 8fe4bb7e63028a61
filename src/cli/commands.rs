// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the `train` subcommand and all its configurable
// flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

/// The top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune the NER model on a labelled corpus
    Train(TrainArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory to write the final checkpoint and metrics into
    #[arg(long, default_value = "model_output")]
    pub model_path: String,

    /// Labelled training corpus (token/label lines, blank line
    /// between sentences)
    #[arg(long, default_value = "data/train.txt")]
    pub train_data: String,

    /// Held-out corpus the evaluator runs on after every epoch
    #[arg(long, default_value = "data/valid.txt")]
    pub valid_data: String,

    /// JSON file mapping label strings to class ids
    #[arg(long, default_value = "data/schema.json")]
    pub schema: String,

    /// Pretrained model identifier: a directory containing the
    /// tokenizer.json whose vocabulary the encoder was built with
    #[arg(long, default_value = "bert-base-chinese")]
    pub pretrained_model: String,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Number of samples processed together in one forward pass
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Maximum number of tokens per input sequence
    #[arg(long, default_value_t = 100)]
    pub max_seq_len: usize,

    /// Learning rate for the optimizer
    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,

    /// Optimizer update rule: "adam" or "sgd"
    #[arg(long, default_value = "adam")]
    pub optimizer: String,

    /// Hidden dimension of the transformer encoder
    #[arg(long, default_value_t = 256)]
    pub hidden_size: usize,

    /// Number of attention heads in multi-head attention
    /// (hidden_size must be divisible by num_heads)
    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    /// Number of stacked encoder layers
    #[arg(long, default_value_t = 4)]
    pub num_layers: usize,

    /// Inner dimension of the feed-forward network
    #[arg(long, default_value_t = 1024)]
    pub intermediate_size: usize,

    /// Dropout probability during training
    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
///
/// vocab_size and class_num are placeholders here; the use case
/// injects the real values from the tokenizer and the schema
/// before the run starts.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            model_path:        a.model_path,
            train_data_path:   a.train_data,
            valid_data_path:   a.valid_data,
            schema_path:       a.schema,
            pretrained_path:   a.pretrained_model,
            epochs:            a.epochs,
            batch_size:        a.batch_size,
            max_seq_len:       a.max_seq_len,
            lr:                a.lr,
            optimizer:         a.optimizer,
            hidden_size:       a.hidden_size,
            num_heads:         a.num_heads,
            num_layers:        a.num_layers,
            intermediate_size: a.intermediate_size,
            dropout:           a.dropout,
            vocab_size:        0,
            class_num:         0,
        }
    }
}
