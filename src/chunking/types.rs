//! Chunk data model shared by the segmenter, scorer, and pipeline.

use serde::{Deserialize, Serialize};

/// A contiguous slice of a document's text, sized to fit retrieval limits.
///
/// Chunks are created by [`segment`](crate::chunking::segment) without a score
/// or embedding; the quality scorer and ingestion pipeline fill those in.
/// Within one segmentation call, `index` values are contiguous, zero-based,
/// and follow document order.
///
/// `start_char`/`end_char` are `char` offsets into the *cleaned* source text
/// (see [`clean_text`](crate::chunking::clean_text)), delimiting the region of
/// the document the chunk covers. An overlap-seeded chunk starts inside the
/// region covered by its predecessor, so adjacent ranges overlap by the
/// configured amount rather than double-counting emitted text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Zero-based position of this chunk within its document.
    pub index: usize,
    /// The chunk text.
    pub text: String,
    /// Character count of `text`.
    pub length: usize,
    /// Start offset (in chars) into the cleaned source text.
    pub start_char: usize,
    /// End offset (in chars) into the cleaned source text.
    pub end_char: usize,
    /// Quality score in `[0, 1]`, set by the scorer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    /// Embedding vector, set by the ingestion pipeline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Name of the model that produced `embedding`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
}

impl Chunk {
    /// Creates a chunk from its text and covered source region.
    ///
    /// `length` is derived from the text's character count.
    pub fn new(index: usize, text: impl Into<String>, start_char: usize, end_char: usize) -> Self {
        let text = text.into();
        let length = text.chars().count();
        Self {
            index,
            text,
            length,
            start_char,
            end_char,
            quality_score: None,
            embedding: None,
            embedding_model: None,
        }
    }

    /// Returns `true` once an embedding has been attached.
    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_tracks_char_count_not_bytes() {
        let chunk = Chunk::new(0, "文档处理", 0, 4);
        assert_eq!(chunk.length, 4);
        assert!(chunk.text.len() > 4);
    }

    #[test]
    fn optional_fields_skip_serialization_when_unset() {
        let chunk = Chunk::new(0, "hello", 0, 5);
        let json = serde_json::to_value(&chunk).unwrap();
        assert!(json.get("embedding").is_none());
        assert!(json.get("quality_score").is_none());
        assert_eq!(json["length"], 5);
    }
}
