//! Keyword extraction for indexing and query tokenization.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Runs of word characters; matches are taken from already-lowercased text
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("word regex is valid"));

/// Tokens never kept as keywords
pub static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her",
        "was", "one", "our", "out", "has", "have", "his", "him", "how", "its", "may", "new",
        "now", "old", "see", "two", "who", "did", "get", "got", "let", "put", "say", "she",
        "too", "use", "via", "with", "from", "this", "that", "these", "those", "then", "than",
        "them", "they", "their", "there", "were", "will", "what", "when", "where", "which",
        "while", "your", "yours", "into", "onto", "over", "under", "about", "after", "before",
        "been", "being", "just", "also", "only", "very", "more", "most", "some", "such",
        "each", "other", "would", "could", "should",
    ]
    .into_iter()
    .collect()
});

fn lowercase_words(text: &str) -> impl Iterator<Item = String> + '_ {
    WORD_RE.find_iter(text).map(|m| m.as_str().to_lowercase())
}

/// Push `token` unless already present, keeping first-occurrence order
fn push_unique(tokens: &mut Vec<String>, seen: &mut HashSet<String>, token: String) {
    if seen.insert(token.clone()) {
        tokens.push(token);
    }
}

/// Derive the keyword list of a record from its name and caption.
///
/// Pure: lowercases, splits on word runs, drops tokens of two characters or
/// fewer and stop words, and deduplicates keeping first occurrence.
pub fn extract_keywords(name: &str, caption: Option<&str>) -> Vec<String> {
    let text = match caption {
        Some(caption) => format!("{} {}", name, caption),
        None => name.to_string(),
    }
    .to_lowercase();

    let mut keywords = Vec::new();
    let mut seen = HashSet::new();

    for token in lowercase_words(&text) {
        if token.chars().count() <= 2 || STOP_WORDS.contains(token.as_str()) {
            continue;
        }
        push_unique(&mut keywords, &mut seen, token);
    }

    keywords
}

/// Split a search query into lowercase tokens.
///
/// Same word split as [`extract_keywords`] but without the length and stop
/// word filters, so short and common terms stay searchable.
pub fn tokenize_query(query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();
    let mut tokens = Vec::new();
    let mut seen = HashSet::new();

    for token in lowercase_words(&lowered) {
        push_unique(&mut tokens, &mut seen, token);
    }

    tokens
}
