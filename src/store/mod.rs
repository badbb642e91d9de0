//! In-memory vector store for chunk records and their embeddings.
//!
//! [`VectorStore`] keeps three co-located maps — chunk records, embeddings,
//! and per-file chunk-id lists — behind a single `RwLock`, so concurrent
//! pipeline runs see consistent state without lost updates. It answers
//! nearest-neighbor queries with an exhaustive cosine-similarity scan; this is
//! exact, brute-force search and scales linearly with the number of stored
//! embeddings, not an approximate index.
//!
//! Entries live until explicit per-file removal or [`VectorStore::clear`];
//! there is no eviction or TTL, and nothing is persisted across restarts.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chunking::Chunk;
use crate::types::RagError;

/// Cosine similarity between two vectors.
///
/// Returns `0.0` when either vector has zero norm; that value guards the
/// divide-by-zero, it is not a true cosine.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// A chunk record as held by the store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Store-assigned unique identifier.
    pub id: String,
    /// Identifier of the source file this chunk belongs to.
    pub file_id: String,
    /// Caller-supplied metadata about the source file.
    pub file_metadata: serde_json::Value,
    /// The chunk text.
    pub text: String,
    /// Zero-based index of the chunk within its source document.
    pub chunk_index: usize,
    /// Character count of `text`.
    pub length: usize,
    /// Quality score at insert time; `0.0` if the chunk was never scored.
    pub quality_score: f64,
    /// Insertion timestamp.
    pub created_at: DateTime<Utc>,
}

/// A search result: a stored chunk annotated with its query similarity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk: StoredChunk,
    pub similarity: f32,
}

/// Counts describing the store's current contents.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_chunks: usize,
    pub total_embeddings: usize,
    pub total_files: usize,
    /// Known file ids, sorted for deterministic output.
    pub files: Vec<String>,
}

#[derive(Default)]
struct StoreState {
    chunks: HashMap<String, StoredChunk>,
    embeddings: HashMap<String, Vec<f32>>,
    file_chunks: HashMap<String, Vec<String>>,
    /// Dimensionality pinned by the first stored embedding.
    dimension: Option<usize>,
}

impl StoreState {
    /// Removes every chunk/embedding entry referenced by the file's id list.
    fn remove_file(&mut self, file_id: &str) -> Option<usize> {
        let chunk_ids = self.file_chunks.remove(file_id)?;
        let removed = chunk_ids.len();
        for chunk_id in chunk_ids {
            self.chunks.remove(&chunk_id);
            self.embeddings.remove(&chunk_id);
        }
        Some(removed)
    }
}

/// Shared handle to an in-memory similarity index.
///
/// Cloning is cheap and every clone refers to the same underlying state.
/// Construct one at process start and pass it into pipeline and retrieval
/// components; dropping the last handle tears the index down.
#[derive(Clone, Default)]
pub struct VectorStore {
    inner: Arc<RwLock<StoreState>>,
}

impl VectorStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a file's chunks, returning the freshly generated chunk ids.
    ///
    /// Each chunk receives a random UUID; chunks without embeddings are stored
    /// but do not participate in similarity search. Re-inserting a known
    /// `file_id` first removes the file's previous entries, so ingestion is an
    /// explicit replace rather than a leak of orphaned records.
    ///
    /// Fails with [`RagError::DimensionMismatch`] if any supplied embedding
    /// disagrees with the dimensionality pinned by the first stored embedding.
    pub fn insert(
        &self,
        file_id: &str,
        file_metadata: &serde_json::Value,
        chunks: &[Chunk],
    ) -> Result<Vec<String>, RagError> {
        let mut state = self.inner.write();

        // Validate dimensions before touching any map.
        let mut expected = state.dimension;
        for chunk in chunks {
            if let Some(embedding) = &chunk.embedding {
                match expected {
                    Some(dim) if embedding.len() != dim => {
                        return Err(RagError::DimensionMismatch {
                            expected: dim,
                            actual: embedding.len(),
                        });
                    }
                    Some(_) => {}
                    None => expected = Some(embedding.len()),
                }
            }
        }

        if let Some(replaced) = state.remove_file(file_id) {
            tracing::debug!(file_id, replaced, "replacing previously ingested file");
        }

        let mut chunk_ids = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let chunk_id = Uuid::new_v4().to_string();
            state.chunks.insert(
                chunk_id.clone(),
                StoredChunk {
                    id: chunk_id.clone(),
                    file_id: file_id.to_string(),
                    file_metadata: file_metadata.clone(),
                    text: chunk.text.clone(),
                    chunk_index: chunk.index,
                    length: chunk.length,
                    quality_score: chunk.quality_score.unwrap_or(0.0),
                    created_at: Utc::now(),
                },
            );
            if let Some(embedding) = &chunk.embedding {
                state.embeddings.insert(chunk_id.clone(), embedding.clone());
            }
            chunk_ids.push(chunk_id);
        }

        state.dimension = expected;
        state.file_chunks.insert(file_id.to_string(), chunk_ids.clone());

        tracing::debug!(file_id, chunks = chunk_ids.len(), "stored chunk batch");
        Ok(chunk_ids)
    }

    /// Brute-force cosine-similarity search over every stored embedding.
    ///
    /// Keeps hits with `similarity >= min_similarity`, sorted descending,
    /// truncated to `top_k`.
    pub fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        min_similarity: f32,
    ) -> Result<Vec<SearchHit>, RagError> {
        let state = self.inner.read();

        if let Some(dim) = state.dimension {
            if query_embedding.len() != dim {
                return Err(RagError::DimensionMismatch {
                    expected: dim,
                    actual: query_embedding.len(),
                });
            }
        }

        let mut hits: Vec<SearchHit> = state
            .embeddings
            .iter()
            .filter_map(|(chunk_id, embedding)| {
                let similarity = cosine_similarity(query_embedding, embedding);
                if similarity < min_similarity {
                    return None;
                }
                state.chunks.get(chunk_id).map(|chunk| SearchHit {
                    chunk: chunk.clone(),
                    similarity,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);

        tracing::debug!(hits = hits.len(), min_similarity, "similarity search");
        Ok(hits)
    }

    /// Returns a file's chunk records in stored order, empty if unknown.
    pub fn get_by_file(&self, file_id: &str) -> Vec<StoredChunk> {
        let state = self.inner.read();
        let Some(chunk_ids) = state.file_chunks.get(file_id) else {
            return Vec::new();
        };
        chunk_ids
            .iter()
            .filter_map(|chunk_id| state.chunks.get(chunk_id).cloned())
            .collect()
    }

    /// Removes a file and all of its chunk/embedding entries.
    ///
    /// Returns `false` when the file id is unknown, leaving state unchanged.
    pub fn remove(&self, file_id: &str) -> bool {
        let mut state = self.inner.write();
        match state.remove_file(file_id) {
            Some(removed) => {
                tracing::debug!(file_id, removed, "removed file chunks");
                true
            }
            None => false,
        }
    }

    /// Snapshot of the store's current counts.
    pub fn stats(&self) -> IndexStats {
        let state = self.inner.read();
        let mut files: Vec<String> = state.file_chunks.keys().cloned().collect();
        files.sort();
        IndexStats {
            total_chunks: state.chunks.len(),
            total_embeddings: state.embeddings.len(),
            total_files: state.file_chunks.len(),
            files,
        }
    }

    /// Empties the store unconditionally.
    ///
    /// Also unpins the embedding dimensionality: the next inserted embedding
    /// establishes a fresh one.
    pub fn clear(&self) {
        let mut state = self.inner.write();
        state.chunks.clear();
        state.embeddings.clear();
        state.file_chunks.clear();
        state.dimension = None;
        tracing::debug!("vector store cleared");
    }
}
