// ============================================================
// Layer 3 — Label Schema
// ============================================================
// The bijective mapping between label strings ("B-PER", "O")
// and the class ids the model predicts (0, 1, 2, ...).
//
// The schema lives in a JSON file next to the training data:
//   { "B-LOCATION": 0, "I-LOCATION": 1, ..., "O": 8 }
//
// The number of entries determines the width of the model's
// tag head, so the schema must be loaded before the model
// is built.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Label string <-> class id mapping loaded from schema JSON.
#[derive(Debug, Clone)]
pub struct LabelSchema {
    label_to_id: HashMap<String, usize>,
    id_to_label: Vec<String>,
}

impl LabelSchema {
    /// Load the schema from a JSON file of {label: id} pairs.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read schema file '{}'", path.display()))?;

        let map: HashMap<String, usize> = serde_json::from_str(&json)
            .with_context(|| format!("Invalid schema JSON in '{}'", path.display()))?;

        Self::from_map(map)
    }

    /// Build a schema from an in-memory map.
    ///
    /// Ids must be dense: exactly 0..n-1 with no gaps or
    /// duplicates, because they index the tag head's output
    /// dimension directly.
    pub fn from_map(map: HashMap<String, usize>) -> Result<Self> {
        if map.is_empty() {
            bail!("label schema is empty");
        }

        let n = map.len();
        let mut id_to_label = vec![String::new(); n];

        for (label, &id) in &map {
            if id >= n {
                bail!("label '{}' has id {} outside 0..{}", label, id, n);
            }
            if !id_to_label[id].is_empty() {
                bail!("duplicate id {} for labels '{}' and '{}'", id, id_to_label[id], label);
            }
            id_to_label[id] = label.clone();
        }

        Ok(Self { label_to_id: map, id_to_label })
    }

    /// Number of distinct classes (the tag head width)
    pub fn class_num(&self) -> usize {
        self.id_to_label.len()
    }

    /// Class id for a label string, if the label is known
    pub fn id(&self, label: &str) -> Option<usize> {
        self.label_to_id.get(label).copied()
    }

    /// Label string for a class id, if the id is in range
    pub fn label(&self, id: usize) -> Option<&str> {
        self.id_to_label.get(id).map(|s| s.as_str())
    }
}
