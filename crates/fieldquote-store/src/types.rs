//! Catalog rows, alias rows, and candidate queries.

use regex::Regex;
use serde::{Deserialize, Serialize};

use fieldquote_text::size_boundary_pattern;

/// A catalog price row after column-name translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// `None` when the stored value is NULL or not numeric.
    pub rate: Option<f64>,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, unit: Option<&str>, rate: Option<f64>) -> Self {
        Self {
            name: name.into(),
            unit: unit.map(String::from),
            rate,
        }
    }
}

/// One alias mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRow {
    /// Always a normalized key, never raw user text.
    pub input_key: String,
    pub canonical_name: String,
}

/// How substring patterns combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Every pattern must occur in the name.
    All,
    /// At least one pattern must occur in the name.
    Any,
}

/// Candidate fetch: substring patterns plus standalone-number size checks.
#[derive(Debug, Clone)]
pub struct NameQuery {
    /// Lowercase substrings matched against the lowercased name.
    pub patterns: Vec<String>,
    pub mode: MatchMode,
    /// Every size must appear as a standalone number.
    pub sizes: Vec<String>,
    pub limit: usize,
    /// Return rows sorted by name instead of in storage order.
    pub order_by_name: bool,
    /// Collapse rows sharing `(name, unit)` before the limit applies.
    pub distinct: bool,
}

impl NameQuery {
    /// Compile the size checks once for in-process matching.
    pub fn matcher(&self) -> NameMatcher<'_> {
        let sizes = self
            .sizes
            .iter()
            .map(|size| Regex::new(&size_boundary_pattern(size)).ok())
            .collect();
        NameMatcher { query: self, sizes }
    }
}

/// A [`NameQuery`] with its size patterns compiled.
pub struct NameMatcher<'a> {
    query: &'a NameQuery,
    /// `None` for a size whose pattern failed to compile; it never matches.
    sizes: Vec<Option<Regex>>,
}

impl NameMatcher<'_> {
    pub fn matches(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        let patterns = &self.query.patterns;
        let patterns_ok = patterns.is_empty()
            || match self.query.mode {
                MatchMode::All => patterns.iter().all(|p| lower.contains(p.as_str())),
                MatchMode::Any => patterns.iter().any(|p| lower.contains(p.as_str())),
            };
        patterns_ok
            && self
                .sizes
                .iter()
                .all(|re| re.as_ref().is_some_and(|re| re.is_match(&lower)))
    }
}

/// Wrap a substring in `%...%` with LIKE metacharacters escaped by `\`.
pub fn like_pattern(substring: &str) -> String {
    let mut out = String::with_capacity(substring.len() + 2);
    out.push('%');
    for c in substring.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}
