//! Shared error types for the chunksmith crate.

use thiserror::Error;

/// Error raised by an upstream text extractor.
///
/// Extraction itself (PDF/Word parsing, OCR, encoding detection) lives outside
/// this crate; callers hand the pipeline either extracted text or one of these
/// variants describing why extraction failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// The file extension is not handled by any configured extractor.
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    /// The extractor ran but found no usable text (e.g. a scanned PDF).
    #[error("no extractable text content found")]
    NoTextContent,

    /// The extractor failed outright.
    #[error("{0}")]
    Failed(String),
}

/// Top-level error type for chunking, storage, and pipeline operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// Upstream text extraction failed before the pipeline could run.
    #[error("text extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// Segmentation produced zero chunks for the supplied document.
    #[error("document produced no chunks")]
    EmptyContent,

    /// An embedding provider returned an error for a batch request.
    #[error("embedding provider '{provider}' failed: {message}")]
    Embedding { provider: String, message: String },

    /// An embedding's dimensionality disagrees with the one pinned by the
    /// vector store. Mixing dimensions would make cosine scores meaningless,
    /// so the offending vector is rejected instead.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A configuration value failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Converts the legacy string-sentinel extraction protocol into a typed result.
///
/// Older extractors signalled failure by returning a string starting with
/// `"[Error]"` instead of raising. This adapter recognizes that prefix and
/// maps it onto [`ExtractionError::Failed`] so downstream code can match on a
/// proper error value.
pub fn from_legacy_extraction(raw: impl Into<String>) -> Result<String, ExtractionError> {
    let raw = raw.into();
    match raw.strip_prefix("[Error]") {
        Some(message) => Err(ExtractionError::Failed(message.trim().to_string())),
        None => Ok(raw),
    }
}
