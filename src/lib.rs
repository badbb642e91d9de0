//! ```text
//! Extracted text ──► chunking::segmenter ──► Vec<Chunk>
//!                                │
//!                                └─► chunking::quality (score / best-k)
//!
//! Vec<Chunk> ──► embeddings::EmbeddingProvider ──► vectors (batched)
//!            └─► pipeline::IngestionPipeline ──► store::VectorStore
//!
//! Query ──► retrieval::ContextRetriever ──► RAG prompt with sources
//! ```
//!
pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod pipeline;
pub mod retrieval;
pub mod store;
pub mod types;

pub use chunking::{Chunk, best_k, clean_text, score_chunk, score_chunks, segment};
pub use config::{ChunkingConfig, RetrievalConfig};
pub use embeddings::{EmbeddingProvider, EmbeddingResponse, MockEmbeddingProvider, ProviderChain};
pub use pipeline::{IngestFailure, IngestReport, IngestRequest, IngestionPipeline};
pub use retrieval::{AugmentedQuery, ContextRetriever, RetrievedContext};
pub use store::{IndexStats, SearchHit, StoredChunk, VectorStore, cosine_similarity};
pub use types::{ExtractionError, RagError, from_legacy_extraction};
