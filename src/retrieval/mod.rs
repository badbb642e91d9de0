//! Retrieval-augmented context assembly.
//!
//! [`ContextRetriever`] embeds a user query, searches the vector store, and
//! assembles the matching chunks into a length-capped context block with
//! per-source attribution, ready to be spliced into a generation prompt.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::RetrievalConfig;
use crate::embeddings::EmbeddingProvider;
use crate::store::VectorStore;
use crate::types::RagError;

/// Minimum characters worth keeping when truncating the final context chunk.
const TRUNCATION_FLOOR: usize = 100;

/// Attribution for one chunk included in the assembled context.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceRef {
    pub file_id: String,
    pub chunk_index: usize,
    pub similarity: f32,
    pub quality_score: f64,
}

/// Context retrieved for a query, with attribution.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RetrievedContext {
    /// `false` when no stored chunk cleared the similarity threshold.
    pub has_context: bool,
    /// The assembled context block, empty when `has_context` is false.
    pub context: String,
    pub sources: Vec<SourceRef>,
    /// Number of chunks that matched the query before length capping.
    pub matched_chunks: usize,
    /// Character count of `context`.
    pub total_context_length: usize,
}

/// A query paired with its retrieval-augmented prompt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AugmentedQuery {
    pub original_query: String,
    pub enhanced_prompt: String,
    pub context: RetrievedContext,
}

/// Retrieves relevant chunks for a query and formats them for prompting.
pub struct ContextRetriever {
    store: VectorStore,
    embedder: Arc<dyn EmbeddingProvider>,
    config: RetrievalConfig,
}

impl ContextRetriever {
    pub fn new(
        store: VectorStore,
        embedder: Arc<dyn EmbeddingProvider>,
        config: RetrievalConfig,
    ) -> Result<Self, RagError> {
        config.validate()?;
        Ok(Self {
            store,
            embedder,
            config,
        })
    }

    /// Embeds the query and assembles a context block from the best matches.
    ///
    /// The block is capped at `max_context_length` characters; when the cap
    /// lands inside a chunk, that chunk is truncated with an ellipsis if at
    /// least [`TRUNCATION_FLOOR`] characters remain, otherwise dropped.
    pub async fn retrieve(&self, query: &str) -> Result<RetrievedContext, RagError> {
        let response = self.embedder.embed_batch(&[query.to_string()]).await?;
        let Some(query_vector) = response.vectors.first() else {
            return Ok(RetrievedContext::default());
        };

        let hits = self.store.search(
            query_vector,
            self.config.max_context_chunks,
            self.config.min_similarity,
        )?;
        if hits.is_empty() {
            tracing::debug!(query_length = query.len(), "no relevant chunks found");
            return Ok(RetrievedContext::default());
        }

        let mut parts = Vec::new();
        let mut sources = Vec::new();
        let mut used = 0usize;

        for (position, hit) in hits.iter().enumerate() {
            let content_length = hit.chunk.text.chars().count();

            if used + content_length > self.config.max_context_length {
                let remaining = self.config.max_context_length - used;
                if remaining > TRUNCATION_FLOOR {
                    let truncated: String = hit.chunk.text.chars().take(remaining).collect();
                    parts.push(format_part(position, hit.similarity, &format!("{truncated}...")));
                }
                break;
            }

            parts.push(format_part(position, hit.similarity, &hit.chunk.text));
            used += content_length;
            sources.push(SourceRef {
                file_id: hit.chunk.file_id.clone(),
                chunk_index: hit.chunk.chunk_index,
                similarity: hit.similarity,
                quality_score: hit.chunk.quality_score,
            });
        }

        let context = parts.join("\n\n");
        let total_context_length = context.chars().count();
        tracing::debug!(
            matched = hits.len(),
            included = sources.len(),
            total_context_length,
            "assembled retrieval context"
        );

        Ok(RetrievedContext {
            has_context: true,
            context,
            sources,
            matched_chunks: hits.len(),
            total_context_length,
        })
    }

    /// Formats the final prompt from a query and its retrieved context.
    pub fn build_prompt(&self, query: &str, context: &RetrievedContext) -> String {
        if !context.has_context {
            return format!(
                "User question: {query}\n\n\
                 Note: No relevant document content was found to answer this \
                 question. Please answer based on your general knowledge and \
                 indicate that this answer is not based on the user's uploaded \
                 documents."
            );
        }

        let source_list = context
            .sources
            .iter()
            .map(|source| {
                format!(
                    "- {} (chunk {}, score: {:.3})",
                    source.file_id, source.chunk_index, source.similarity
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Answer the user's question based on the following document content.\n\n\
             Relevant document chunks:\n{context}\n\n\
             User question: {query}\n\n\
             Please answer based on the above document content. If the documents \
             do not contain directly relevant information, please indicate this.\n\n\
             Sources:\n{source_list}",
            context = context.context,
        )
    }

    /// Full retrieval flow: search, assemble context, format the prompt.
    pub async fn augment_query(&self, query: &str) -> Result<AugmentedQuery, RagError> {
        let context = self.retrieve(query).await?;
        let enhanced_prompt = self.build_prompt(query, &context);
        Ok(AugmentedQuery {
            original_query: query.to_string(),
            enhanced_prompt,
            context,
        })
    }
}

fn format_part(position: usize, similarity: f32, content: &str) -> String {
    format!(
        "Document Chunk {} (score: {:.3}):\n{}",
        position + 1,
        similarity,
        content
    )
}
