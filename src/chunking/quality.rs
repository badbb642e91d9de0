//! Deterministic chunk quality scoring.
//!
//! The score is a weighted sum of five structural/statistical components,
//! each clamped to a sane sub-range before weighting:
//!
//! | component            | weight |
//! |----------------------|--------|
//! | length fit           | 30%    |
//! | information density  | 25%    |
//! | structure            | 20%    |
//! | sentence completeness| 15%    |
//! | token uniqueness     | 10%    |
//!
//! This is an explainable proxy for retrieval worth, not a learned ranker:
//! the same chunk always produces the same score.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::chunking::types::Chunk;

/// Ideal chunk length in characters for the length-fit component.
const IDEAL_LENGTH: f64 = 600.0;

/// Keywords whose presence suggests domain-relevant prose.
const DOMAIN_KEYWORDS: &[&str] = &[
    "系统", "功能", "技术", "方法", "应用", "实现", "处理", "管理", "分析",
];

static HEADING_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"第[一二三四五六七八九十\d]+[章节条]|Chapter|Section|\d+\.|[一二三四五]、")
        .expect("valid regex")
});
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[1-9]\.|[一二三四五]\.|[①②③④⑤]|•|-\s").expect("valid regex"));
static SENTENCE_TERMINATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?。！？]").expect("valid regex"));

fn is_content_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c.is_ascii_digit() || ('\u{4e00}'..='\u{9fff}').contains(&c)
}

fn is_scored_punctuation(c: char) -> bool {
    matches!(
        c,
        ',' | '.' | '!' | '?' | ';' | ':' | '，' | '。' | '！' | '？' | '；' | '：'
    )
}

/// Length fit: chunks near [`IDEAL_LENGTH`] score highest; extremes are
/// pinned to fixed floors/ceilings.
fn length_score(length: usize) -> f64 {
    if length < 50 {
        0.1
    } else if length > 2000 {
        0.6
    } else {
        (1.0 - (length as f64 - IDEAL_LENGTH).abs() / IDEAL_LENGTH).max(0.1)
    }
}

/// Information density: share of CJK/Latin/digit characters, blended with a
/// punctuation ratio that rewards the 2–15% band.
fn density_score(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let content = text.chars().filter(|c| is_content_char(*c)).count();
    let punctuation = text.chars().filter(|c| is_scored_punctuation(*c)).count();

    let info_density = content as f64 / total as f64;
    let punct_ratio = punctuation as f64 / total as f64;
    let punct_score = if (0.02..=0.15).contains(&punct_ratio) {
        1.0
    } else {
        (1.0 - (punct_ratio - 0.08).abs() * 10.0).max(0.3)
    };

    info_density * 0.7 + punct_score * 0.3
}

/// Structure: additive bonuses for headings, lists, multiple paragraphs, and
/// domain keywords, capped at 1.0.
fn structure_score(text: &str) -> f64 {
    let mut score: f64 = 0.0;
    if HEADING_MARKER.is_match(text) {
        score += 0.3;
    }
    if LIST_MARKER.is_match(text) {
        score += 0.3;
    }
    if text.split("\n\n").count() >= 2 {
        score += 0.2;
    }
    let keyword_hits = DOMAIN_KEYWORDS
        .iter()
        .filter(|keyword| text.contains(*keyword))
        .count();
    if keyword_hits >= 2 {
        score += 0.2;
    }
    score.min(1.0)
}

/// Completeness: share of sentence segments longer than ten characters.
///
/// Splitting keeps the trailing empty segment after a final terminator, so a
/// single well-terminated sentence scores 0.5 rather than 1.0.
fn completeness_score(text: &str) -> f64 {
    let segments: Vec<&str> = SENTENCE_TERMINATOR.split(text).collect();
    if segments.is_empty() {
        return 0.0;
    }
    let complete = segments
        .iter()
        .filter(|segment| segment.trim().chars().count() > 10)
        .count();
    complete as f64 / segments.len() as f64
}

/// Uniqueness: distinct whitespace-delimited tokens over total tokens.
fn uniqueness_score(text: &str) -> f64 {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return 0.0;
    }
    let distinct: HashSet<&str> = tokens.iter().copied().collect();
    distinct.len() as f64 / tokens.len() as f64
}

/// Computes the quality score for a chunk, clamped to `[0, 1]`.
///
/// Total over well-formed input: never fails, including for empty text.
pub fn score_chunk(chunk: &Chunk) -> f64 {
    let text = &chunk.text;
    let score = length_score(chunk.length) * 0.30
        + density_score(text) * 0.25
        + structure_score(text) * 0.20
        + completeness_score(text) * 0.15
        + uniqueness_score(text) * 0.10;
    score.clamp(0.0, 1.0)
}

/// Attaches a quality score to every chunk in place.
pub fn score_chunks(chunks: &mut [Chunk]) {
    for chunk in chunks {
        chunk.quality_score = Some(score_chunk(chunk));
    }
}

/// Returns the `min(k, len)` highest-scoring chunks.
///
/// Chunks without a score are scored first. The sort is stable and descending,
/// so ties keep their original document order.
pub fn best_k(mut chunks: Vec<Chunk>, k: usize) -> Vec<Chunk> {
    for chunk in &mut chunks {
        if chunk.quality_score.is_none() {
            chunk.quality_score = Some(score_chunk(chunk));
        }
    }
    chunks.sort_by(|a, b| {
        b.quality_score
            .partial_cmp(&a.quality_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    chunks.truncate(k);
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunk(text: &str) -> Chunk {
        let chars = text.chars().count();
        Chunk::new(0, text, 0, chars)
    }

    #[test]
    fn empty_chunk_scores_within_range() {
        let score = score_chunk(&chunk(""));
        assert!((0.0..=1.0).contains(&score));
        // Only the short-length floor contributes.
        assert!((score - 0.03).abs() < 1e-9);
    }

    #[test]
    fn well_formed_mixed_text_scores_above_half() {
        // ~600 chars, two paragraphs, a heading marker, and punctuation in the
        // rewarded band: the length component alone contributes ~0.3.
        let sentence = "本系统采用了先进的处理技术, 实现了文档的自动分析功能. ";
        let mut body = format!("Chapter 1. {}", sentence.repeat(10));
        body.push_str("\n\n");
        body.push_str(&sentence.repeat(10));
        let subject = chunk(&body);
        assert!(subject.length > 500 && subject.length < 700);

        let score = score_chunk(&subject);
        assert!(score > 0.5, "expected > 0.5, got {score}");
    }

    #[test]
    fn short_chunks_hit_the_length_floor() {
        assert!((length_score(10) - 0.1).abs() < f64::EPSILON);
        assert!((length_score(3000) - 0.6).abs() < f64::EPSILON);
        assert!((length_score(600) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn punctuation_band_scores_full_marks() {
        // 100 chars with 8 punctuation marks lands inside [0.02, 0.15].
        let text = format!("{}........", "a".repeat(92));
        let score = density_score(&text);
        let expected = (92.0 / 100.0) * 0.7 + 0.3;
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn completeness_counts_trailing_empty_segment() {
        // "a long enough sentence." splits into one >10-char segment plus the
        // empty remainder after the terminator.
        let score = completeness_score("a long enough sentence.");
        assert!((score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn repeated_tokens_lower_uniqueness() {
        assert!((uniqueness_score("alpha beta gamma") - 1.0).abs() < f64::EPSILON);
        assert!((uniqueness_score("echo echo echo echo") - 0.25).abs() < f64::EPSILON);
        assert_eq!(uniqueness_score(""), 0.0);
    }

    #[test]
    fn best_k_truncates_and_orders_descending() {
        let chunks = vec![
            chunk(&"a".repeat(600)),  // ideal length
            chunk("tiny"),            // short floor
            chunk(&"b".repeat(580)),  // near-ideal
        ];
        let top = best_k(chunks.clone(), 2);
        assert_eq!(top.len(), 2);
        assert!(top[0].quality_score >= top[1].quality_score);
        for selected in &top {
            assert!(chunks.iter().any(|c| c.text == selected.text));
        }
    }

    #[test]
    fn best_k_with_large_k_returns_all() {
        let chunks = vec![chunk("one"), chunk("two")];
        assert_eq!(best_k(chunks, 10).len(), 2);
    }

    #[test]
    fn best_k_is_stable_for_ties() {
        let first = chunk(&"same text ".repeat(60));
        let second = chunk(&"same text ".repeat(60));
        let top = best_k(vec![first.clone(), second], 2);
        assert_eq!(top[0].text, first.text);
        assert_eq!(
            top[0].quality_score, top[1].quality_score,
            "identical chunks must tie"
        );
    }

    proptest! {
        #[test]
        fn score_is_always_in_unit_interval(text in "\\PC{0,500}") {
            let score = score_chunk(&chunk(&text));
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
