//! Candle-based sentence embedder.
//!
//! Runs a BERT encoder on the CPU, mean-pools the token states over the
//! attention mask and normalizes the result.

use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::cache::{resolve_model_files, ModelCache, ModelFiles};
use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingModel, ModelInfo};

/// Token limit per input. Context strings past it are truncated.
pub const MAX_SEQ_LENGTH: usize = 256;

pub struct CandleEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    info: ModelInfo,
}

impl CandleEmbedder {
    /// Load the model named by `cache`, downloading it on first use.
    pub fn load(cache: &ModelCache) -> Result<Self, EmbeddingError> {
        let files = resolve_model_files(cache)?;
        Self::load_from_files(&files, cache.model_name())
    }

    pub fn load_from_files(files: &ModelFiles, name: &str) -> Result<Self, EmbeddingError> {
        info!(model = name, "Loading embedding model");
        let device = Device::Cpu;

        let raw_config = std::fs::read_to_string(&files.config)?;
        let config: BertConfig = serde_json::from_str(&raw_config)
            .map_err(|e| EmbeddingError::InvalidConfig(e.to_string()))?;
        let dimension = hidden_size(&raw_config)?;

        let tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        // SAFETY: the weights file is not modified while mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[files.weights.clone()], DType::F32, &device)?
        };
        let model = BertModel::load(vb, &config)?;

        info!(model = name, dim = dimension, "Embedding model ready");

        Ok(Self {
            model,
            tokenizer,
            device,
            info: ModelInfo {
                name: name.to_string(),
                dimension,
                max_sequence_length: MAX_SEQ_LENGTH,
            },
        })
    }

    fn mean_pooling(&self, states: &Tensor, attention_mask: &Tensor) -> Result<Tensor, EmbeddingError> {
        let mask = attention_mask
            .unsqueeze(2)?
            .broadcast_as(states.shape())?
            .to_dtype(DType::F32)?;
        let summed = states.broadcast_mul(&mask)?.sum(1)?;
        let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;
        Ok(summed.broadcast_div(&counts)?)
    }
}

fn hidden_size(raw_config: &str) -> Result<usize, EmbeddingError> {
    let value: serde_json::Value = serde_json::from_str(raw_config)
        .map_err(|e| EmbeddingError::InvalidConfig(e.to_string()))?;
    value
        .get("hidden_size")
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .ok_or_else(|| EmbeddingError::InvalidConfig("hidden_size missing".to_string()))
}

impl EmbeddingModel for CandleEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or(EmbeddingError::EmptyOutput)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .min(MAX_SEQ_LENGTH);

        let mut ids = Vec::with_capacity(texts.len() * seq_len);
        let mut mask = Vec::with_capacity(texts.len() * seq_len);
        for encoding in &encodings {
            let take = encoding.get_ids().len().min(seq_len);
            ids.extend_from_slice(&encoding.get_ids()[..take]);
            mask.extend_from_slice(&encoding.get_attention_mask()[..take]);
            ids.extend(std::iter::repeat(0).take(seq_len - take));
            mask.extend(std::iter::repeat(0).take(seq_len - take));
        }

        let input_ids = Tensor::from_vec(ids, (texts.len(), seq_len), &self.device)?;
        let attention_mask = Tensor::from_vec(mask, (texts.len(), seq_len), &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;

        let states = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled: Vec<Vec<f32>> = self.mean_pooling(&states, &attention_mask)?.to_vec2()?;

        debug!(count = pooled.len(), "Embedded batch");
        Ok(pooled.into_iter().map(Embedding::new).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_embedder() -> CandleEmbedder {
        let cache = ModelCache::from_settings(&searchme_types::EmbeddingSettings::default());
        CandleEmbedder::load(&cache).unwrap()
    }

    #[test]
    fn test_hidden_size_parsing() {
        assert_eq!(hidden_size(r#"{"hidden_size": 384}"#).unwrap(), 384);
        assert!(hidden_size(r#"{"vocab_size": 10}"#).is_err());
    }

    #[test]
    #[ignore = "requires model download"]
    fn test_embed_dimension() {
        let embedder = test_embedder();
        let emb = embedder.embed("File name: notes.txt | Type: text/plain").unwrap();
        assert_eq!(emb.dimension(), embedder.dimension());
    }

    #[test]
    #[ignore = "requires model download"]
    fn test_related_text_is_closer() {
        let embedder = test_embedder();
        let query = embedder.embed("budget spreadsheet").unwrap();
        let budget = embedder
            .embed("File name: q3.txt | Content: Q3 budget spreadsheet draft")
            .unwrap();
        let poem = embedder
            .embed("File name: poem.txt | Content: the sea at dawn")
            .unwrap();
        assert!(query.squared_distance(&budget) < query.squared_distance(&poem));
    }
}
