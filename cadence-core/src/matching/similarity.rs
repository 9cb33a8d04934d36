//! Normalized string similarity scoring.
//!
//! Pure functions: identical inputs always produce identical scores, which
//! keeps match confidence deterministic and exhaustively testable.

use std::sync::LazyLock;

use regex::Regex;

/// Bracketed segments: "(Live)", "[Remastered]", "{Deluxe}".
static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[(\[{][^)\]}]*[)\]}]").expect("bracket pattern is valid"));

/// Separator words that carry no identity: "feat", "Official Video", etc.
static SEPARATOR_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(feat|ft|official|audio|video|lyrics)\b").expect("word pattern is valid")
});

/// Leftover punctuation that survives bracket stripping.
static STRAY_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-()\[\]{}]").expect("punctuation pattern is valid"));

/// Normalizes a track title for comparison.
///
/// Lowercases, strips bracketed segments and the fixed separator-word set,
/// drops stray hyphens and bracket characters, collapses whitespace and
/// trims. Idempotent.
pub fn normalize(s: &str) -> String {
    let lowered = s.to_lowercase();
    let without_brackets = BRACKETED.replace_all(&lowered, "");
    let without_words = SEPARATOR_WORDS.replace_all(&without_brackets, "");
    let without_punctuation = STRAY_PUNCTUATION.replace_all(&without_words, "");

    without_punctuation
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Similarity of two titles in [0, 1] after normalization.
///
/// `1 - editdist / max(len)` over normalized strings, using classic
/// single-character insert/delete/substitute edit distance; 1.0 when both
/// normalized strings are empty. Symmetric and deterministic.
pub fn score(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&normalize(a), &normalize(b))
}
