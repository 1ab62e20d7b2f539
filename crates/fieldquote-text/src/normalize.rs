//! Item-name normalization into comparison keys.
//!
//! Three variants are produced from a raw name:
//! - base: smart quotes folded to ASCII, whitespace collapsed, lowercased
//! - strict: base without quotes or punctuation, stop-words dropped
//! - loose: base without quotes, parentheticals, or the phrase "one side"

use once_cell::sync::Lazy;
use regex::Regex;

/// Tokens dropped by the strict normalizer.
pub const STOP_WORDS: &[&str] = &["threaded", "thread"];

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static STRICT_DISALLOWED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9/ .x-]+").unwrap());
static PARENTHETICAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").unwrap());
static ONE_SIDE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bone\s+side\b").unwrap());

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

pub(crate) fn strip_quotes(text: &str) -> String {
    text.chars().filter(|c| *c != '"' && *c != '\'').collect()
}

/// Base key: smart quotes folded, whitespace collapsed, trimmed, lowercased.
pub fn normalize(raw: &str) -> String {
    let folded: String = raw
        .chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2019}' => '\'',
            other => other,
        })
        .collect();
    collapse_whitespace(&folded).to_lowercase()
}

/// Base key restricted to `[a-z0-9/ .x-]`, stop-words kept.
pub fn strict_chars(raw: &str) -> String {
    let unquoted = strip_quotes(&normalize(raw));
    collapse_whitespace(&STRICT_DISALLOWED_RE.replace_all(&unquoted, " "))
}

/// Strict key: [`strict_chars`] with stop-words removed.
pub fn normalize_strict(raw: &str) -> String {
    strict_chars(raw)
        .split(' ')
        .filter(|t| !STOP_WORDS.contains(t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Loose key: base key without quotes, `(...)` groups, or "one side".
pub fn normalize_loose(raw: &str) -> String {
    let unquoted = strip_quotes(&normalize(raw));
    let mut text = collapse_whitespace(&PARENTHETICAL_RE.replace_all(&unquoted, " "));
    // Dropping "one side" can splice a new occurrence together ("one one side side").
    loop {
        let next = collapse_whitespace(&ONE_SIDE_RE.replace_all(&text, " "));
        if next == text {
            return text;
        }
        text = next;
    }
}

/// Distinct alias keys mined from a canonical catalog name.
pub fn key_variants(canonical: &str) -> Vec<String> {
    let base = normalize(canonical);
    let candidates = [
        base.clone(),
        normalize_strict(canonical),
        normalize_loose(canonical),
        strip_quotes(&base),
    ];

    let mut keys: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let key = normalize(&candidate);
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "   ",
        "PVC Pipe 2\" x 3m",
        "  Tee   Connector\t2''  ",
        "\u{201C}Elbow\u{201D} 90\u{00B0} 1/2\u{2019}",
        "GI Nipple (one side threaded) 3/4",
        "one one side side valve",
        "Ball Valve (Brass) (PN16) 1\"",
        "Threaded Socket thread 1-1/2 x 3/4",
        "Ünïcödé Fitting ÄÖ 25mm",
        "((nested) paren)",
        "a (b c",
    ];

    #[test]
    fn test_base_normalization() {
        assert_eq!(normalize("  PVC   Pipe 2\"\tx 3m "), "pvc pipe 2\" x 3m");
        assert_eq!(normalize("\u{201C}Elbow\u{201D}"), "\"elbow\"");
        assert_eq!(normalize("Tap\u{2019}s"), "tap's");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_strict_normalization() {
        assert_eq!(normalize_strict("PVC Pipe 2\" x 3m"), "pvc pipe 2 x 3m");
        assert_eq!(
            normalize_strict("Threaded Socket, thread 1-1/2 x 3/4"),
            "socket 1-1/2 x 3/4"
        );
        assert_eq!(normalize_strict("Elbow 90\u{00B0} (GI)"), "elbow 90 gi");
        assert_eq!(normalize_strict("threaded"), "");
        assert_eq!(strict_chars("Threaded Socket, 1\""), "threaded socket 1");
        assert_eq!(strict_chars("  "), "");
    }

    #[test]
    fn test_loose_normalization() {
        assert_eq!(
            normalize_loose("GI Nipple (one side threaded) 3/4\""),
            "gi nipple 3/4"
        );
        assert_eq!(normalize_loose("Nipple one side 1\""), "nipple 1");
        assert_eq!(normalize_loose("Tee Connector 2''"), "tee connector 2");
        assert_eq!(normalize_loose("one one side side valve"), "valve");
    }

    #[test]
    fn test_normalizers_are_idempotent() {
        for sample in SAMPLES {
            let base = normalize(sample);
            assert_eq!(normalize(&base), base, "base: {:?}", sample);
            let strict = normalize_strict(sample);
            assert_eq!(normalize_strict(&strict), strict, "strict: {:?}", sample);
            let loose = normalize_loose(sample);
            assert_eq!(normalize_loose(&loose), loose, "loose: {:?}", sample);
        }
    }

    #[test]
    fn test_empty_inputs_stay_empty() {
        for raw in ["", "  \t\n ", "\"\"", "()"] {
            assert_eq!(normalize_loose(raw), "");
        }
        assert_eq!(normalize_strict("''"), "");
    }

    #[test]
    fn test_key_variants() {
        let keys = key_variants("GI Nipple 3/4\" (one side threaded)");
        assert_eq!(
            keys,
            vec![
                "gi nipple 3/4\" (one side threaded)",
                "gi nipple 3/4 one side",
                "gi nipple 3/4",
                "gi nipple 3/4 (one side threaded)",
            ]
        );
        assert!(key_variants("   ").is_empty());
        assert_eq!(key_variants("socket"), vec!["socket"]);
    }
}
