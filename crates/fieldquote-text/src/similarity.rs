//! Character-bigram Sørensen–Dice similarity over loose-normalized names.

use std::collections::HashMap;

use crate::normalize::normalize_loose;

fn bigrams(chars: &[char]) -> HashMap<(char, char), usize> {
    let mut grams = HashMap::new();
    for pair in chars.windows(2) {
        *grams.entry((pair[0], pair[1])).or_insert(0) += 1;
    }
    grams
}

/// Score two item names in `[0, 1]`. Empty names score 0, equal names 1.
pub fn similarity(a: &str, b: &str) -> f64 {
    let left = normalize_loose(a);
    let right = normalize_loose(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    if left == right {
        return 1.0;
    }

    let left: Vec<char> = left.chars().collect();
    let right: Vec<char> = right.chars().collect();
    let left_grams = bigrams(&left);
    let right_grams = bigrams(&right);

    let intersection: usize = left_grams
        .iter()
        .map(|(gram, count)| (*count).min(right_grams.get(gram).copied().unwrap_or(0)))
        .sum();
    let total = (left.len().saturating_sub(1)).max(1) + (right.len().saturating_sub(1)).max(1);

    (2 * intersection) as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_and_empty() {
        assert_eq!(similarity("Gate Valve", "gate  valve"), 1.0);
        assert_eq!(similarity("Gate Valve", "\"gate valve\" (brass)"), 1.0);
        assert_eq!(similarity("", "gate valve"), 0.0);
        assert_eq!(similarity("()", "()"), 0.0);
    }

    #[test]
    fn test_misspelling_scores_high() {
        let score = similarity("tee conector 2in", "Tee Connector 2''");
        // 13 shared bigrams over 15 + 14
        assert!((score - 26.0 / 29.0).abs() < 1e-12);
    }

    #[test]
    fn test_bounds_and_determinism() {
        let pairs = [
            ("a", "b"),
            ("a", "ab"),
            ("aaaa", "aa"),
            ("elbow 90 1/2", "elbow 45 1/2"),
            ("pvc pipe", "gi pipe"),
            ("x", "xxxxxxxx"),
        ];
        for (a, b) in pairs {
            let s = similarity(a, b);
            assert!((0.0..=1.0).contains(&s), "{} vs {} = {}", a, b, s);
            assert_eq!(s, similarity(a, b));
        }
    }

    #[test]
    fn test_symmetric_for_equal_lengths() {
        assert_eq!(
            similarity("elbow 90 1/2", "elbow 45 1/2"),
            similarity("elbow 45 1/2", "elbow 90 1/2")
        );
        assert_eq!(similarity("pvc tee", "pvc cap"), similarity("pvc cap", "pvc tee"));
    }

    #[test]
    fn test_repeated_bigrams_counted_by_multiplicity() {
        // "aaaa" has aa×3, "aa" has aa×1: intersection 1, total 3 + 1.
        assert_eq!(similarity("aaaa", "aa"), 0.5);
    }

    #[test]
    fn test_threshold_pair_exact() {
        let needle = "galvanized gate valve with brass handle wheel";
        let at = "qcvhpmcwpvbkdfwj wheel valve brass with galvanized handle";
        let below = "brass galvanized wvgh handle valve";
        assert_eq!(similarity(needle, at), 0.78);
        let s = similarity(needle, below);
        assert!(s < 0.78 && s > 0.779, "{}", s);
    }
}
