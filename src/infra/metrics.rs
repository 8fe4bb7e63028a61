// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records evaluation metrics to a CSV file after each epoch.
//
// Metrics recorded per row:
//   - epoch:     the epoch number (1, 2, 3, ...)
//   - token_acc: fraction of non-padding tokens tagged correctly
//   - precision: entity-level micro precision
//   - recall:    entity-level micro recall
//   - f1:        entity-level micro F1
//
// Output file: <model_path>/metrics.csv
//
// The per-batch training loss trace is deliberately NOT
// written here: it is reduced to a per-epoch mean, logged,
// and discarded.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single evaluation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Fraction of non-padding tokens tagged with the gold class
    pub token_acc: f64,

    /// Entity-level micro precision over decoded spans
    pub precision: f64,

    /// Entity-level micro recall over decoded spans
    pub recall: f64,

    /// Harmonic mean of precision and recall
    pub f1: f64,
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    /// Full path to the CSV file
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");

        // Write CSV header only if file is new.
        // This allows appending to an existing log across runs.
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,token_acc,precision,recall,f1")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch,
            m.token_acc,
            m.precision,
            m.recall,
            m.f1,
        )?;

        Ok(())
    }

    /// Return the path to the metrics CSV file
    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
