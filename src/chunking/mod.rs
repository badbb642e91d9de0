//! Deterministic document segmentation and chunk quality scoring.
//!
//! The helpers in this module provide two core capabilities:
//!
//! * [`segmenter`] — pure, paragraph-aware segmentation of cleaned text into
//!   overlapping chunks.
//! * [`quality`] — a deterministic, explainable heuristic estimating each
//!   chunk's retrieval worth, plus best-k selection.

pub mod quality;
pub mod segmenter;
pub mod types;

pub use quality::{best_k, score_chunk, score_chunks};
pub use segmenter::{clean_text, segment};
pub use types::Chunk;
