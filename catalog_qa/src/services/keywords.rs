use std::collections::HashSet;

/// Stop words stripped before lexical matching, mirroring the indexing side.
static STOP_WORDS: phf::Set<&'static str> = phf::phf_set! {
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for",
    "of", "is", "are", "was", "were", "be", "been", "being", "have",
    "has", "had", "do", "does", "did", "will", "would", "could", "should",
    "may", "might", "must", "can", "what", "which", "who", "when", "where",
    "why", "how", "as", "if", "from", "with", "by", "that", "this", "it",
};

/// Extract deduplicated keywords from free text.
///
/// Tokens are lower-cased, purely alphanumeric, longer than two characters,
/// and not stop words. First-appearance order is preserved so downstream
/// truncation is deterministic. Empty input yields an empty set.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for word in text.to_lowercase().split_whitespace() {
        if word.len() <= 2
            || !word.chars().all(char::is_alphanumeric)
            || STOP_WORDS.contains(word)
        {
            continue;
        }
        if seen.insert(word.to_string()) {
            keywords.push(word.to_string());
        }
    }

    keywords
}
