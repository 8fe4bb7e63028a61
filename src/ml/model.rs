use burn::{
    nn::{
        attention::{MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::backend::AutodiffBackend,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct BertNerConfig {
    pub vocab_size:        usize,
    pub max_seq_len:       usize,
    pub hidden_size:       usize,
    pub num_heads:         usize,
    pub num_layers:        usize,
    pub intermediate_size: usize,
    pub dropout:           f64,
    pub class_num:         usize,
}

impl BertNerConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> BertNerModel<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.hidden_size).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_seq_len, self.hidden_size).init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let final_norm = LayerNormConfig::new(self.hidden_size).init(device);
        let tag_head   = LinearConfig::new(self.hidden_size, self.class_num).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();
        BertNerModel {
            token_embedding, position_embedding, layers,
            final_norm, tag_head, dropout,
            max_seq_len: self.max_seq_len,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.hidden_size, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.hidden_size, self.intermediate_size).init(device);
        let ffn_linear2 = LinearConfig::new(self.intermediate_size, self.hidden_size).init(device);
        let norm1   = LayerNormConfig::new(self.hidden_size).init(device);
        let norm2   = LayerNormConfig::new(self.hidden_size).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    pub fn forward(&self, x: Tensor<B, 3>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        use burn::nn::attention::MhaInput;
        let attn_input  = MhaInput::self_attn(x.clone()).mask_pad(pad_mask);
        let attn_output = self.self_attn.forward(attn_input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct BertNerModel<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub tag_head:           Linear<B>,
    pub dropout:            Dropout,
    pub max_seq_len:        usize,
}

impl<B: Backend> BertNerModel<B> {
    /// input_ids, attention_mask: [batch, seq_len] → logits: [batch, seq_len, class_num]
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Tensor<B, 3> {
        let [batch_size, seq_len] = input_ids.dims();

        let tok_emb = self.token_embedding.forward(input_ids);

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        // Padding positions are excluded from attention entirely
        let pad_mask = attention_mask.equal_elem(0);

        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for layer in &self.layers {
            x = layer.forward(x, pad_mask.clone());
        }
        let x = self.final_norm.forward(x); // [batch, seq_len, hidden_size]

        // One logit per class per token
        self.tag_head.forward(x) // [batch, seq_len, class_num]
    }

    /// Training-mode forward: (input_ids, attention_mask, labels) → scalar loss.
    /// The loss is a mean over non-padding positions only.
    pub fn forward_loss(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
        labels:         Tensor<B, 2, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 3>)
    where
        B: AutodiffBackend,
    {
        let logits = self.forward(input_ids, attention_mask.clone());
        let loss   = masked_cross_entropy(logits.clone(), labels, attention_mask);
        (loss, logits)
    }
}

/// Cross-entropy over [batch, seq, class] logits with per-position
/// targets, averaged over positions where the attention mask is 1.
/// Padding positions contribute nothing to the loss.
pub fn masked_cross_entropy<B: Backend>(
    logits:         Tensor<B, 3>,
    labels:         Tensor<B, 2, Int>,
    attention_mask: Tensor<B, 2, Int>,
) -> Tensor<B, 1> {
    let [batch_size, seq_len, _classes] = logits.dims();

    // Negative log-likelihood of the gold class at every position
    let log_probs = burn::tensor::activation::log_softmax(logits, 2);
    let nll = log_probs
        .gather(2, labels.unsqueeze_dim::<3>(2))
        .reshape([batch_size, seq_len])
        .neg();

    // Zero out padding, then normalise by the real token count
    let mask = attention_mask.float();
    (nll * mask.clone()).sum() / mask.sum()
}
