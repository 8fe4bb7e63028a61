// ============================================================
// Layer 4 — NER Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<NerSample>
// into device-ready tensors.
//
// How batching works here:
//   Input:  Vec of N NerSamples, each with sequences of length S
//   Output: NerBatch with three tensors of shape [N, S]
//
//   We flatten each field into one long Vec, then reshape:
//   [s1_t1, s1_t2, ..., s1_tS, s2_t1, ..., sN_tS] → [N, S]
//
// All sequences are already padded to the same length in
// NerSample, so no dynamic padding is needed here.
//
// The batcher holds the target device: this is the single
// point where batch tensors land on the accelerator, once
// per batch as the loader produces them.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::NerSample;

// ─── NerBatch ─────────────────────────────────────────────────────────────────
/// A batch of NER samples ready for the model forward pass.
/// All tensors have batch_size as their first dimension.
///
/// B is the Burn Backend (e.g. Wgpu, NdArray) —
/// generic so the same batcher works on any device.
#[derive(Debug, Clone)]
pub struct NerBatch<B: Backend> {
    /// Token ID sequences — shape: [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// Attention masks — shape: [batch_size, seq_len]
    /// 1 = real token, 0 = padding
    pub attention_mask: Tensor<B, 2, Int>,

    /// Per-token class ids — shape: [batch_size, seq_len]
    pub labels: Tensor<B, 2, Int>,
}

// ─── NerBatcher ───────────────────────────────────────────────────────────────
/// The batcher struct — holds the target device so tensors
/// are created on the correct GPU/CPU.
#[derive(Clone, Debug)]
pub struct NerBatcher<B: Backend> {
    /// The device to create tensors on
    pub device: B::Device,
}

impl<B: Backend> NerBatcher<B> {
    /// Create a new batcher for the given device
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<B, NerSample, NerBatch<B>> for NerBatcher<B> {
    /// Convert a Vec of NerSamples into a single NerBatch.
    fn batch(&self, items: Vec<NerSample>, _device: &B::Device) -> NerBatch<B> {
        let batch_size = items.len();
        // All sequences have the same length (pre-padded)
        let seq_len    = items[0].input_ids.len();

        // Flatten each field into one Vec<i32> in sample order
        // (Burn uses i32 for Int tensors)
        let input_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.input_ids.iter().map(|&x| x as i32))
            .collect();

        let mask_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.attention_mask.iter().map(|&x| x as i32))
            .collect();

        let label_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.labels.iter().map(|&x| x as i32))
            .collect();

        // Tensor::from_ints creates a 1D tensor from a slice,
        // then .reshape() gives it the 2D shape [batch, seq]
        let input_ids = Tensor::<B, 1, Int>::from_ints(
            input_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let attention_mask = Tensor::<B, 1, Int>::from_ints(
            mask_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let labels = Tensor::<B, 1, Int>::from_ints(
            label_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        NerBatch { input_ids, attention_mask, labels }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    fn sample(ids: [u32; 4], mask: [u32; 4], labels: [u32; 4]) -> NerSample {
        NerSample {
            input_ids:      ids.to_vec(),
            attention_mask: mask.to_vec(),
            labels:         labels.to_vec(),
        }
    }

    #[test]
    fn test_batch_shapes() {
        let batcher = NerBatcher::<NdArray>::new(Default::default());
        let batch = batcher.batch(vec![
            sample([5, 6, 0, 0], [1, 1, 0, 0], [1, 2, 0, 0]),
            sample([7, 0, 0, 0], [1, 0, 0, 0], [3, 0, 0, 0]),
        ], &Default::default());

        assert_eq!(batch.input_ids.dims(),      [2, 4]);
        assert_eq!(batch.attention_mask.dims(), [2, 4]);
        assert_eq!(batch.labels.dims(),         [2, 4]);
    }

    #[test]
    fn test_batch_preserves_sample_order() {
        let batcher = NerBatcher::<NdArray>::new(Default::default());
        let batch = batcher.batch(vec![
            sample([5, 6, 7, 8], [1, 1, 1, 1], [0, 1, 2, 3]),
            sample([9, 0, 0, 0], [1, 0, 0, 0], [2, 0, 0, 0]),
        ], &Default::default());

        let ids: Vec<i32> = batch
            .input_ids
            .into_data()
            .convert::<i32>()
            .to_vec()
            .unwrap();
        assert_eq!(ids, vec![5, 6, 7, 8, 9, 0, 0, 0]);
    }
}
