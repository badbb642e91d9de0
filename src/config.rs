//! Configuration types for chunking and retrieval.

use serde::{Deserialize, Serialize};

use crate::types::RagError;

/// Controls how documents are segmented into chunks.
///
/// `chunk_size` is a soft target, not a hard cap: a single paragraph longer
/// than the target is still emitted whole rather than split mid-paragraph.
/// All sizes are measured in Unicode scalar values (`char`s).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Number of trailing characters repeated at the start of the next chunk.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl ChunkingConfig {
    /// Creates a config with the given target size and overlap.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.chunk_size == 0 {
            return Err(RagError::InvalidConfig(
                "chunk_size must be greater than zero".into(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Controls context assembly for retrieval-augmented prompting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum number of chunks to pull into the context block.
    pub max_context_chunks: usize,
    /// Minimum cosine similarity for a chunk to qualify as context.
    pub min_similarity: f32,
    /// Maximum combined character length of the assembled context.
    pub max_context_length: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_context_chunks: 5,
            min_similarity: 0.7,
            max_context_length: 4000,
        }
    }
}

impl RetrievalConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.max_context_chunks == 0 {
            return Err(RagError::InvalidConfig(
                "max_context_chunks must be greater than zero".into(),
            ));
        }
        if !(-1.0..=1.0).contains(&self.min_similarity) {
            return Err(RagError::InvalidConfig(format!(
                "min_similarity ({}) must be within [-1, 1]",
                self.min_similarity
            )));
        }
        Ok(())
    }
}
