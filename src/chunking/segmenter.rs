//! Paragraph-aware text segmentation with configurable overlap.
//!
//! Segmentation is a pure function of `(text, config)`: it cleans the raw
//! text, splits it on blank-line boundaries, then greedily packs paragraphs
//! into chunks near the target size, seeding each new chunk with the trailing
//! overlap of its predecessor so context survives chunk boundaries.

use std::sync::LazyLock;

use regex::Regex;

use crate::chunking::types::Chunk;
use crate::config::ChunkingConfig;

static EXCESS_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n").expect("valid regex"));
static TRAILING_LINE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+\n").expect("valid regex"));
static HORIZONTAL_WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));

/// Normalizes whitespace in raw document text.
///
/// Collapses runs of three or more newlines to a single blank line, strips
/// trailing horizontal whitespace before newlines, and collapses runs of
/// spaces/tabs to one space. The result is trimmed.
pub fn clean_text(text: &str) -> String {
    let text = EXCESS_BLANK_LINES.replace_all(text, "\n\n");
    let text = TRAILING_LINE_WHITESPACE.replace_all(&text, "\n");
    let text = HORIZONTAL_WHITESPACE_RUNS.replace_all(&text, " ");
    text.trim().to_string()
}

/// A paragraph of cleaned text, with `char` offsets into the cleaned source.
struct Paragraph<'a> {
    text: &'a str,
    chars: usize,
    start: usize,
    end: usize,
}

fn split_paragraphs(cleaned: &str) -> Vec<Paragraph<'_>> {
    let mut paragraphs = Vec::new();
    let mut offset = 0usize;
    for piece in cleaned.split("\n\n") {
        let piece_chars = piece.chars().count();
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            let leading = piece_chars - piece.trim_start().chars().count();
            let chars = trimmed.chars().count();
            let start = offset + leading;
            paragraphs.push(Paragraph {
                text: trimmed,
                chars,
                start,
                end: start + chars,
            });
        }
        // Account for the two-character "\n\n" separator consumed by split.
        offset += piece_chars + 2;
    }
    paragraphs
}

/// Growing chunk buffer used during greedy packing.
struct Buffer {
    text: String,
    length: usize,
    start: usize,
    end: usize,
}

impl Buffer {
    fn from_paragraph(para: &Paragraph<'_>) -> Self {
        Self {
            text: para.text.to_string(),
            length: para.chars,
            start: para.start,
            end: para.end,
        }
    }

    fn append(&mut self, para: &Paragraph<'_>) {
        self.text.push_str("\n\n");
        self.text.push_str(para.text);
        self.length += para.chars + 2;
        self.end = para.end;
    }
}

/// Returns the trailing `count` characters of `text`.
fn tail_chars(text: &str, count: usize) -> &str {
    debug_assert!(count > 0);
    match text.char_indices().rev().nth(count - 1) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

fn push_chunk(chunks: &mut Vec<Chunk>, buffer: Buffer) {
    let text = buffer.text.trim();
    if text.is_empty() {
        return;
    }
    chunks.push(Chunk::new(chunks.len(), text, buffer.start, buffer.end));
}

/// Splits cleaned document text into an ordered sequence of chunks.
///
/// `chunk_size` is a soft target: a single paragraph longer than the target is
/// emitted whole rather than split mid-paragraph. When `chunk_overlap` is
/// positive and an emitted chunk is longer than the overlap, the next chunk is
/// seeded with the emitted chunk's trailing overlap characters so neighboring
/// chunks share context.
///
/// Empty or whitespace-only input yields an empty sequence. The function is
/// deterministic and has no side effects.
pub fn segment(text: &str, config: &ChunkingConfig) -> Vec<Chunk> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let cleaned = clean_text(text);
    let paragraphs = split_paragraphs(&cleaned);

    let chunk_size = config.chunk_size;
    let overlap = config.chunk_overlap;

    let mut chunks: Vec<Chunk> = Vec::new();
    let mut buffer: Option<Buffer> = None;

    for para in &paragraphs {
        let Some(mut current) = buffer.take() else {
            buffer = Some(Buffer::from_paragraph(para));
            continue;
        };

        if current.length + para.chars > chunk_size {
            let seeded = if overlap > 0 && current.length > overlap {
                let tail = tail_chars(&current.text, overlap);
                Some(Buffer {
                    text: format!("{tail}\n\n{}", para.text),
                    length: overlap + para.chars + 2,
                    start: current.end.saturating_sub(overlap),
                    end: para.end,
                })
            } else {
                None
            };
            push_chunk(&mut chunks, current);
            buffer = Some(seeded.unwrap_or_else(|| Buffer::from_paragraph(para)));
        } else {
            current.append(para);
            buffer = Some(current);
        }
    }

    if let Some(current) = buffer {
        push_chunk(&mut chunks, current);
    }

    chunks
}
