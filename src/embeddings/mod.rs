//! Embedding provider seam and deterministic test/fallback implementations.
//!
//! Real embedding models live outside this crate (remote APIs, local ONNX
//! runtimes); the pipeline only depends on the [`EmbeddingProvider`] trait.
//! Two implementations ship here:
//!
//! * [`MockEmbeddingProvider`] — deterministic hash-seeded unit vectors for
//!   tests and offline development.
//! * [`ProviderChain`] — tries an ordered list of candidate providers and
//!   degrades to zero vectors as a documented last resort, flagging the
//!   degradation in the response instead of failing the batch.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::RagError;

/// Result of a batch embedding request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// One vector per input text, positionally aligned.
    pub vectors: Vec<Vec<f32>>,
    /// Name of the model that produced the vectors.
    pub model: String,
    /// `true` when the vectors are placeholders rather than real embeddings.
    pub degraded: bool,
}

/// A collaborator that turns batches of texts into fixed-dimension vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name, used for logging and result attribution.
    fn name(&self) -> &str;

    /// Dimensionality of the vectors this provider produces.
    fn dimension(&self) -> usize;

    /// Embeds a batch of texts, returning one vector per input.
    async fn embed_batch(&self, texts: &[String]) -> Result<EmbeddingResponse, RagError>;
}

/// Deterministic embedding provider for tests and offline runs.
///
/// Each text hashes to a seed that drives a small PRNG, so identical texts
/// always map to identical unit vectors while distinct texts diverge.
#[derive(Clone, Debug)]
pub struct MockEmbeddingProvider {
    dimension: usize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self { dimension: 384 }
    }

    /// Overrides the vector dimensionality (default 384).
    #[must_use]
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish() | 1;

        let mut vector = Vec::with_capacity(self.dimension);
        for _ in 0..self.dimension {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let unit = ((state >> 32) as u32) as f32 / u32::MAX as f32;
            vector.push(unit * 2.0 - 1.0);
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn name(&self) -> &str {
        "mock-embedding"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<EmbeddingResponse, RagError> {
        Ok(EmbeddingResponse {
            vectors: texts.iter().map(|text| self.vector_for(text)).collect(),
            model: self.name().to_string(),
            degraded: false,
        })
    }
}

/// Tries candidate providers in order; the first success wins.
///
/// When every candidate fails, the chain emits zero-filled vectors of
/// `fallback_dimension` with `degraded: true` so callers can store chunks now
/// and re-embed later. The chain itself therefore never returns an error.
pub struct ProviderChain {
    providers: Vec<Arc<dyn EmbeddingProvider>>,
    fallback_dimension: usize,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn EmbeddingProvider>>, fallback_dimension: usize) -> Self {
        Self {
            providers,
            fallback_dimension,
        }
    }

    fn zero_fallback(&self, count: usize) -> EmbeddingResponse {
        EmbeddingResponse {
            vectors: vec![vec![0.0; self.fallback_dimension]; count],
            model: "zero-fallback".to_string(),
            degraded: true,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for ProviderChain {
    fn name(&self) -> &str {
        "provider-chain"
    }

    fn dimension(&self) -> usize {
        self.providers
            .first()
            .map(|provider| provider.dimension())
            .unwrap_or(self.fallback_dimension)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<EmbeddingResponse, RagError> {
        for provider in &self.providers {
            match provider.embed_batch(texts).await {
                Ok(response) => {
                    tracing::debug!(provider = provider.name(), "embedding provider succeeded");
                    return Ok(response);
                }
                Err(err) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %err,
                        "embedding provider failed, trying next candidate"
                    );
                }
            }
        }

        tracing::warn!(
            dimension = self.fallback_dimension,
            "all embedding providers failed, emitting zero-vector placeholders"
        );
        Ok(self.zero_fallback(texts.len()))
    }
}
