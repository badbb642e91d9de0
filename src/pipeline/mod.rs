//! Document ingestion pipeline: segment, score, embed, store.
//!
//! [`IngestionPipeline`] is an explicit handle owning the vector store, the
//! embedding provider, and the chunking configuration. Construct one at
//! process start and share it; there is no hidden global state.
//!
//! Every internal fault — extraction, embedding, storage — is converted into a
//! structured [`IngestFailure`] carrying the original file metadata; no error
//! escapes [`IngestionPipeline::ingest`] in any other shape. A degraded
//! embedding batch is deliberately non-fatal: chunks are stored without
//! vectors and the report flags how many.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chunking::{Chunk, best_k, score_chunks, segment};
use crate::config::ChunkingConfig;
use crate::embeddings::EmbeddingProvider;
use crate::store::{IndexStats, VectorStore};
use crate::types::{ExtractionError, RagError};

/// One file to ingest.
///
/// Text extraction happens upstream; the request carries either the extracted
/// text or the typed error explaining why extraction failed.
#[derive(Clone, Debug)]
pub struct IngestRequest {
    /// Identifier the file's chunks are grouped under in the store.
    pub file_id: String,
    /// Free-form metadata echoed back in reports and stored with each chunk.
    pub file_metadata: serde_json::Value,
    /// Extracted text, or the upstream extraction failure.
    pub extraction: Result<String, ExtractionError>,
    /// When positive, only the `best_k` highest-quality chunks are returned
    /// in the report. Storage is unaffected by this filter.
    pub best_k: Option<usize>,
}

impl IngestRequest {
    /// Request built from successfully extracted text.
    pub fn from_text(file_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            file_metadata: serde_json::Value::Object(Default::default()),
            extraction: Ok(text.into()),
            best_k: None,
        }
    }

    /// Request built from an extractor's outcome.
    pub fn from_extraction(
        file_id: impl Into<String>,
        extraction: Result<String, ExtractionError>,
    ) -> Self {
        Self {
            file_id: file_id.into(),
            file_metadata: serde_json::Value::Object(Default::default()),
            extraction,
            best_k: None,
        }
    }

    /// Attaches file metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.file_metadata = metadata;
        self
    }

    /// Limits the report payload to the `k` highest-quality chunks.
    #[must_use]
    pub fn with_best_k(mut self, k: usize) -> Self {
        self.best_k = Some(k);
        self
    }
}

/// Fixed parameters the pipeline applied to a request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub best_k: Option<usize>,
}

/// Structured result of a successful ingestion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IngestReport {
    pub file_id: String,
    pub file_metadata: serde_json::Value,
    /// Character count of the extracted text.
    pub text_length: usize,
    /// Number of chunks produced and stored.
    pub total_chunks: usize,
    /// Number of chunks in `chunks` after best-k filtering.
    pub returned_chunks: usize,
    /// The (possibly filtered) chunk payload.
    pub chunks: Vec<Chunk>,
    /// Store-assigned ids for *all* stored chunks, in document order.
    pub chunk_ids: Vec<String>,
    /// `true` when best-k filtering trimmed the payload.
    pub quality_filtered: bool,
    /// Chunks stored without a real embedding (missing or zero-fallback).
    pub degraded_embeddings: usize,
    pub index_stats: IndexStats,
    pub processing: ProcessingStats,
}

/// Structured failure value for a single file's ingestion.
#[derive(Debug, Error)]
#[error("ingestion of '{file_id}' failed: {error}")]
pub struct IngestFailure {
    pub file_id: String,
    pub file_metadata: serde_json::Value,
    #[source]
    pub error: RagError,
}

/// Orchestrates extract (external) → segment → score → embed → store.
pub struct IngestionPipeline {
    store: VectorStore,
    embedder: Arc<dyn EmbeddingProvider>,
    config: ChunkingConfig,
}

impl IngestionPipeline {
    /// Builds a pipeline over the given store and embedding provider.
    pub fn new(
        store: VectorStore,
        embedder: Arc<dyn EmbeddingProvider>,
        config: ChunkingConfig,
    ) -> Result<Self, RagError> {
        config.validate()?;
        Ok(Self {
            store,
            embedder,
            config,
        })
    }

    /// The store this pipeline writes into.
    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    /// Ingests one file end to end.
    ///
    /// The only suspension point is the batched embedding call; segmentation
    /// and scoring run synchronously. Callers wanting a deadline should wrap
    /// this future in a timeout.
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestReport, IngestFailure> {
        let IngestRequest {
            file_id,
            file_metadata,
            extraction,
            best_k: requested_best_k,
        } = request;

        let fail = |error: RagError, file_metadata: &serde_json::Value| IngestFailure {
            file_id: file_id.clone(),
            file_metadata: file_metadata.clone(),
            error,
        };

        let text = match extraction {
            Ok(text) => text,
            Err(err) => return Err(fail(RagError::Extraction(err), &file_metadata)),
        };
        let text_length = text.chars().count();

        let mut chunks = segment(&text, &self.config);
        if chunks.is_empty() {
            return Err(fail(RagError::EmptyContent, &file_metadata));
        }
        let total_chunks = chunks.len();
        tracing::debug!(file_id = %file_id, total_chunks, "segmented document");

        score_chunks(&mut chunks);

        // One batched call for the whole document. A failed batch degrades to
        // chunks without embeddings rather than aborting the ingestion.
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let (model, batch_degraded) = match self.embedder.embed_batch(&texts).await {
            Ok(response) => {
                let model = response.model.clone();
                // Tolerate a short vector list: trailing chunks simply stay
                // without embeddings.
                for (chunk, vector) in chunks.iter_mut().zip(response.vectors) {
                    chunk.embedding = Some(vector);
                    chunk.embedding_model = Some(model.clone());
                }
                (model, response.degraded)
            }
            Err(err) => {
                tracing::warn!(
                    file_id = %file_id,
                    error = %err,
                    "embedding batch failed, storing chunks without embeddings"
                );
                (self.embedder.name().to_string(), true)
            }
        };

        let degraded_embeddings = if batch_degraded {
            total_chunks
        } else {
            chunks.iter().filter(|chunk| !chunk.has_embedding()).count()
        };

        let chunk_ids = self
            .store
            .insert(&file_id, &file_metadata, &chunks)
            .map_err(|err| fail(err, &file_metadata))?;

        // Best-k filtering trims only the response payload; every chunk stays
        // in the store and remains searchable.
        let (returned, quality_filtered) = match requested_best_k {
            Some(k) if k > 0 => (best_k(chunks, k), true),
            _ => (chunks, false),
        };

        tracing::info!(
            file_id = %file_id,
            total_chunks,
            returned = returned.len(),
            degraded_embeddings,
            "document ingested"
        );

        Ok(IngestReport {
            file_id,
            file_metadata,
            text_length,
            total_chunks,
            returned_chunks: returned.len(),
            chunks: returned,
            chunk_ids,
            quality_filtered,
            degraded_embeddings,
            index_stats: self.store.stats(),
            processing: ProcessingStats {
                chunk_size: self.config.chunk_size,
                chunk_overlap: self.config.chunk_overlap,
                embedding_model: model,
                embedding_dimension: self.embedder.dimension(),
                best_k: requested_best_k,
            },
        })
    }

    /// Ingests a batch of files sequentially.
    ///
    /// One file's failure is isolated to its own result entry and never aborts
    /// the remaining batch. Index mutations stay serialized through the
    /// store's lock.
    pub async fn ingest_batch(
        &self,
        requests: Vec<IngestRequest>,
    ) -> Vec<Result<IngestReport, IngestFailure>> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.ingest(request).await);
        }
        results
    }
}
