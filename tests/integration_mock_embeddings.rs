//! End-to-end ingestion and retrieval tests with mock embeddings.
//!
//! These tests drive the full pipeline — segment, score, embed, store,
//! retrieve — through the deterministic mock provider, suitable for CI.

use std::sync::Arc;

use chunksmith::{
    ChunkingConfig, ContextRetriever, EmbeddingProvider, ExtractionError, IngestRequest,
    IngestionPipeline, MockEmbeddingProvider, ProviderChain, RagError, RetrievalConfig,
    VectorStore, from_legacy_extraction,
};

fn sample_document() -> String {
    let mut paragraphs = Vec::new();
    paragraphs.push("Chapter 1. System Overview".to_string());
    for i in 0..6 {
        paragraphs.push(format!(
            "Paragraph {i} describes a distinct aspect of the document \
             processing system. It explains how text is segmented into \
             retrievable chunks, how each chunk is scored, and how the \
             resulting embeddings support similarity search across files."
        ));
    }
    paragraphs.join("\n\n")
}

fn make_pipeline(store: VectorStore) -> IngestionPipeline {
    IngestionPipeline::new(
        store,
        Arc::new(MockEmbeddingProvider::new().with_dimension(32)),
        ChunkingConfig::new(400, 50),
    )
    .unwrap()
}

#[tokio::test]
async fn ingest_then_search_round_trip() {
    let store = VectorStore::new();
    let pipeline = make_pipeline(store.clone());

    let report = pipeline
        .ingest(
            IngestRequest::from_text("manual.txt", sample_document())
                .with_metadata(serde_json::json!({"name": "manual.txt", "size": 4096})),
        )
        .await
        .unwrap();

    assert!(report.total_chunks > 1, "sample should span multiple chunks");
    assert_eq!(report.chunk_ids.len(), report.total_chunks);
    assert_eq!(report.degraded_embeddings, 0);

    // Searching with the embedding of a stored chunk's own text must surface
    // that chunk at full similarity.
    let embedder = MockEmbeddingProvider::new().with_dimension(32);
    let probe = report.chunks[0].text.clone();
    let query = embedder
        .embed_batch(&[probe.clone()])
        .await
        .unwrap()
        .vectors
        .remove(0);

    let hits = store.search(&query, 3, 0.0).unwrap();
    assert!(!hits.is_empty());
    assert_eq!(hits[0].chunk.text, probe);
    assert!((hits[0].similarity - 1.0).abs() < 1e-5);
    for window in hits.windows(2) {
        assert!(window[0].similarity >= window[1].similarity);
    }
}

#[tokio::test]
async fn best_k_trims_response_while_index_keeps_everything() {
    let store = VectorStore::new();
    let pipeline = make_pipeline(store.clone());

    let text = (0..5)
        .map(|i| format!("Section {i}. {}", "content ".repeat(40)))
        .collect::<Vec<_>>()
        .join("\n\n");

    let report = pipeline
        .ingest(IngestRequest::from_text("doc.txt", text).with_best_k(2))
        .await
        .unwrap();

    assert_eq!(report.total_chunks, 5);
    assert_eq!(report.returned_chunks, 2);
    assert!(report.quality_filtered);

    // The filter affects only the response payload: all five chunks remain
    // stored and searchable.
    assert_eq!(store.stats().total_chunks, 5);
    assert_eq!(store.get_by_file("doc.txt").len(), 5);

    let embedder = MockEmbeddingProvider::new().with_dimension(32);
    let query = embedder
        .embed_batch(&["Section 0.".to_string()])
        .await
        .unwrap()
        .vectors
        .remove(0);
    let hits = store.search(&query, 10, -1.0).unwrap();
    assert_eq!(hits.len(), 5);
}

#[tokio::test]
async fn removal_and_stats_accounting() {
    let store = VectorStore::new();
    let pipeline = make_pipeline(store.clone());

    pipeline
        .ingest(IngestRequest::from_text("a.txt", sample_document()))
        .await
        .unwrap();
    pipeline
        .ingest(IngestRequest::from_text("b.txt", sample_document()))
        .await
        .unwrap();

    let before = store.stats();
    assert_eq!(before.total_files, 2);
    assert_eq!(before.files, vec!["a.txt".to_string(), "b.txt".to_string()]);

    let removed_count = store.get_by_file("a.txt").len();
    assert!(store.remove("a.txt"));
    let after = store.stats();
    assert_eq!(after.total_chunks, before.total_chunks - removed_count);
    assert!(store.get_by_file("a.txt").is_empty());

    assert!(!store.remove("missing-file"));
    assert_eq!(store.stats(), after);

    store.clear();
    let cleared = store.stats();
    assert_eq!(cleared.total_chunks, 0);
    assert_eq!(cleared.total_embeddings, 0);
    assert_eq!(cleared.total_files, 0);
}

#[tokio::test]
async fn legacy_extraction_sentinel_fails_ingestion_cleanly() {
    let store = VectorStore::new();
    let pipeline = make_pipeline(store.clone());

    let extraction = from_legacy_extraction("[Error] PDF is encrypted: secret.pdf");
    let failure = pipeline
        .ingest(IngestRequest::from_extraction("secret.pdf", extraction))
        .await
        .unwrap_err();

    assert!(matches!(
        failure.error,
        RagError::Extraction(ExtractionError::Failed(_))
    ));
    assert_eq!(store.stats().total_chunks, 0);
}

#[tokio::test]
async fn degraded_provider_chain_still_stores_chunks() {
    struct AlwaysFailing;

    #[async_trait::async_trait]
    impl EmbeddingProvider for AlwaysFailing {
        fn name(&self) -> &str {
            "always-failing"
        }
        fn dimension(&self) -> usize {
            16
        }
        async fn embed_batch(
            &self,
            _texts: &[String],
        ) -> Result<chunksmith::EmbeddingResponse, RagError> {
            Err(RagError::Embedding {
                provider: "always-failing".into(),
                message: "model unavailable".into(),
            })
        }
    }

    let store = VectorStore::new();
    let chain = ProviderChain::new(vec![Arc::new(AlwaysFailing)], 16);
    let pipeline =
        IngestionPipeline::new(store.clone(), Arc::new(chain), ChunkingConfig::new(400, 0))
            .unwrap();

    let report = pipeline
        .ingest(IngestRequest::from_text("doc.txt", sample_document()))
        .await
        .unwrap();

    assert_eq!(report.degraded_embeddings, report.total_chunks);
    assert_eq!(report.processing.embedding_model, "zero-fallback");
    assert_eq!(store.stats().total_chunks, report.total_chunks);
}

#[tokio::test]
async fn retrieval_builds_prompt_from_ingested_content() {
    let store = VectorStore::new();
    let pipeline = make_pipeline(store.clone());

    pipeline
        .ingest(IngestRequest::from_text("manual.txt", sample_document()))
        .await
        .unwrap();

    let retriever = ContextRetriever::new(
        store,
        Arc::new(MockEmbeddingProvider::new().with_dimension(32)),
        RetrievalConfig {
            min_similarity: 0.9,
            ..Default::default()
        },
    )
    .unwrap();

    // Query with the exact text of a stored chunk: the mock embedder maps
    // identical text to identical vectors, so similarity is 1.0.
    let stored = pipeline.store().get_by_file("manual.txt");
    let query = stored[0].text.clone();
    let augmented = retriever.augment_query(&query).await.unwrap();

    assert!(augmented.context.has_context);
    assert!(augmented.enhanced_prompt.contains("Relevant document chunks:"));
    assert!(augmented.enhanced_prompt.contains("manual.txt"));
    assert!(!augmented.context.sources.is_empty());
    assert!(augmented.context.sources[0].similarity > 0.99);
}
