//! Query-to-title relevance scoring.

use std::collections::HashSet;

/// Scores token overlap between a candidate title and the search query.
///
/// Both strings are lower-cased and split on whitespace. The raw score is
/// `|query tokens found in title| / |query tokens|`, then clamped to
/// `[0.1, 1.0]` — the score is never reported as exactly zero so that
/// downstream thresholds stay soft.
#[must_use]
pub fn relevance_score(title: &str, query: &str) -> f64 {
    let title_tokens: HashSet<String> = tokenize(title).collect();
    let query_tokens: Vec<String> = tokenize(query).collect();

    if query_tokens.is_empty() {
        return 0.1;
    }

    let overlap = query_tokens
        .iter()
        .filter(|t| title_tokens.contains(*t))
        .count();

    // Token counts are tiny (a handful of words); the cast is exact.
    #[allow(clippy::cast_precision_loss)]
    let raw = overlap as f64 / query_tokens.len() as f64;
    raw.clamp(0.1, 1.0)
}

/// Decides whether a title is relevant to the query.
///
/// Requires BOTH conditions: at least one query token longer than two
/// characters appears verbatim in the title, and the overlap score reaches
/// `floor`.
#[must_use]
pub fn is_relevant(title: &str, query: &str, floor: f64) -> bool {
    let title_tokens: HashSet<String> = tokenize(title).collect();
    let has_substantial_token = tokenize(query)
        .any(|t| t.len() > 2 && title_tokens.contains(&t));

    has_substantial_token && relevance_score(title, query) >= floor
}

fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split_whitespace().map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLOOR: f64 = 0.15;

    #[test]
    fn full_overlap_scores_one() {
        let score = relevance_score("Apple iPhone 13", "apple iphone 13");
        assert!((score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_overlap_is_fractional() {
        // 2 of 2 query tokens present.
        let score = relevance_score("Apple iPhone 13 128GB Blue", "iphone 13");
        assert!((score - 1.0).abs() < f64::EPSILON);

        // 1 of 3 query tokens present.
        let score = relevance_score("Apple iPhone Charger", "iphone 13 pro");
        assert!((score - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn no_overlap_clamps_to_tenth() {
        let score = relevance_score("Garden Hose 50ft", "iphone 13");
        assert!((score - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_query_clamps_to_tenth() {
        let score = relevance_score("Garden Hose 50ft", "   ");
        assert!((score - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let score = relevance_score("APPLE IPHONE 13", "apple iphone");
        assert!((score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn iphone_title_is_relevant() {
        assert!(is_relevant("Apple iPhone 13 128GB Blue", "iphone 13", FLOOR));
    }

    #[test]
    fn unrelated_title_is_not_relevant() {
        assert!(!is_relevant("Garden Hose 50ft", "iphone 13", FLOOR));
    }

    #[test]
    fn short_token_match_alone_is_not_relevant() {
        // Only the two-character token "13" matches; no query token longer
        // than two characters appears in the title.
        assert!(!is_relevant("13 Assorted Pencils", "iphone 13", FLOOR));
    }

    #[test]
    fn score_below_floor_is_not_relevant() {
        // "wireless" matches but is 1 of 8 tokens → 0.125 < 0.15.
        let query = "wireless noise cancelling over ear bluetooth headphones black";
        assert!(!is_relevant("Wireless Doorbell", query, FLOOR));
    }

    #[test]
    fn relevance_is_deterministic() {
        let a = relevance_score("Apple iPhone 13 128GB", "iphone 13");
        let b = relevance_score("Apple iPhone 13 128GB", "iphone 13");
        assert!((a - b).abs() < f64::EPSILON);
    }
}
