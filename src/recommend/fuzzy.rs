//! Order-insensitive fuzzy title similarity on a 0-100 scale.

use std::collections::BTreeSet;

/// Length of the longest common subsequence of two char slices.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // Two rows instead of the full matrix
    let mut prev_row: Vec<usize> = vec![0; b.len() + 1];
    let mut curr_row: Vec<usize> = vec![0; b.len() + 1];

    for a_char in a {
        for (j, b_char) in b.iter().enumerate() {
            curr_row[j + 1] = if a_char == b_char {
                prev_row[j] + 1
            } else {
                prev_row[j + 1].max(curr_row[j])
            };
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b.len()]
}

/// Insertions plus deletions needed to turn `a` into `b`.
pub fn indel_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    a_chars.len() + b_chars.len() - 2 * lcs_len(&a_chars, &b_chars)
}

/// Normalized indel similarity, rounded to the nearest integer.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let total = a_chars.len() + b_chars.len();
    if total == 0 {
        return 100;
    }
    let common = lcs_len(&a_chars, &b_chars);
    ((200.0 * common as f64) / total as f64).round() as u8
}

/// Lowercased, punctuation-free tokens of a title.
///
/// Punctuation is deleted rather than turned into a separator, so
/// `Spider-Man` and `Spiderman` produce the same token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet(BTreeSet<String>);

impl TokenSet {
    pub fn new(text: &str) -> Self {
        let normalized: String = text
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect();
        TokenSet(normalized.split_whitespace().map(String::from).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn join_sorted<'a>(tokens: impl Iterator<Item = &'a String>) -> String {
    tokens.map(|t| t.as_str()).collect::<Vec<_>>().join(" ")
}

fn with_prefix(prefix: &str, rest: &str) -> String {
    match (prefix.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{} {}", prefix, rest),
    }
}

/// Token-set ratio between two prepared token sets.
///
/// Compares the sorted intersection against each side's intersection plus
/// remainder, and the two remainders against each other, keeping the best.
pub fn token_set_ratio(a: &TokenSet, b: &TokenSet) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let intersection = join_sorted(a.0.intersection(&b.0));
    let only_a = join_sorted(a.0.difference(&b.0));
    let only_b = join_sorted(b.0.difference(&a.0));

    if !intersection.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100;
    }

    let combined_a = with_prefix(&intersection, &only_a);
    let combined_b = with_prefix(&intersection, &only_b);

    let mut best = ratio(&combined_a, &combined_b);
    if !intersection.is_empty() {
        best = best
            .max(ratio(&intersection, &combined_a))
            .max(ratio(&intersection, &combined_b));
    }
    best
}

/// Convenience wrapper tokenizing both titles.
pub fn title_similarity(a: &str, b: &str) -> u8 {
    token_set_ratio(&TokenSet::new(a), &TokenSet::new(b))
}
