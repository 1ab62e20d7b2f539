//! Size token extraction (`2`, `3/4`, `1.5`) used as a hard filter.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::{normalize, strip_quotes};

/// Distinct size tokens of a name.
pub type SizeTokens = BTreeSet<String>;

// ASCII digits only: `\d` would also accept other scripts' digits.
static SIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?(?:/[0-9]+)?").unwrap());

/// Extract the set of numeric/fractional size tokens from a raw name.
pub fn extract_size_tokens(raw: &str) -> SizeTokens {
    let cleaned = strip_quotes(&normalize(raw));
    SIZE_RE
        .find_iter(&cleaned)
        .map(|m| strip_leading_zeros(m.as_str()))
        .collect()
}

/// `"02"` → `"2"`, `"007/8"` → `"7/8"`; a zero is kept when nothing but
/// a separator or the end follows it (`"0"`, `"0.5"`).
fn strip_leading_zeros(token: &str) -> String {
    let trimmed = token.trim_start_matches('0');
    if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        trimmed.to_string()
    } else {
        format!("0{}", trimmed)
    }
}

/// Regex matching `size` only as a standalone number, not inside a larger one.
pub fn size_boundary_pattern(size: &str) -> String {
    format!("(^|[^0-9]){}([^0-9]|$)", regex::escape(size))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> SizeTokens {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extracts_whole_and_fractional_sizes() {
        assert_eq!(extract_size_tokens("2\" x 3/4\" Tee"), set(&["2", "3/4"]));
        assert_eq!(extract_size_tokens("Pipe 1.5 x 6m"), set(&["1.5", "6"]));
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_size_tokens("").is_empty());
        assert!(extract_size_tokens("gate valve").is_empty());
    }

    #[test]
    fn test_leading_zeros() {
        assert_eq!(extract_size_tokens("size 02"), set(&["2"]));
        assert_eq!(extract_size_tokens("size 0"), set(&["0"]));
        assert_eq!(extract_size_tokens("size 000"), set(&["0"]));
        assert_eq!(extract_size_tokens("valve 0.5"), set(&["0.5"]));
        assert_eq!(extract_size_tokens("bend 007/8"), set(&["7/8"]));
    }

    #[test]
    fn test_duplicates_collapse() {
        assert_eq!(extract_size_tokens("2 x 2 x 02"), set(&["2"]));
    }

    #[test]
    fn test_boundary_pattern() {
        let re = Regex::new(&size_boundary_pattern("2")).unwrap();
        assert!(re.is_match("tee 2 inch"));
        assert!(re.is_match("2\" tee"));
        assert!(re.is_match("tee 2.5"));
        assert!(!re.is_match("tee 25"));
        assert!(!re.is_match("tee 12"));

        let re = Regex::new(&size_boundary_pattern("1.5")).unwrap();
        assert!(re.is_match("pipe 1.5m"));
        assert!(!re.is_match("pipe 1x5m"));

        let re = Regex::new(&size_boundary_pattern("3/4")).unwrap();
        assert!(re.is_match("valve 3/4"));
        assert!(!re.is_match("valve 13/4"));
    }
}
