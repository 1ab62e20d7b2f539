//! Resolver types.

use serde::Serialize;

/// The `{name, unit, rate}` triple handed to pricing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedItem {
    pub name: String,
    pub unit: Option<String>,
    /// Missing or non-numeric catalog rates become 0.
    pub rate: f64,
}

/// Pipeline stage that produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    /// Exact normalized-key hit, possibly via an alias.
    ExactKey,
    /// Token/size filtered bigram similarity.
    Fuzzy,
}

/// Outcome of the best-effort alias write after a fuzzy match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "error")]
pub enum AliasWrite {
    Saved,
    Failed(String),
}

/// A resolution with the details of how it was reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub item: ResolvedItem,
    pub stage: MatchStage,
    /// Catalog source the row came from.
    pub source_id: String,
    /// Canonical name found in the alias store, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Similarity of the accepted fuzzy candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(rename = "aliasWrite", skip_serializing_if = "Option::is_none")]
    pub alias_write: Option<AliasWrite>,
}

/// One autocomplete entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Suggestion {
    pub name: String,
    pub unit: Option<String>,
}

/// Result of seeding the alias table from catalog names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Alias rows before seeding.
    pub before: i64,
    /// Catalog names read across all sources.
    pub scanned: usize,
    /// Distinct keys prepared for insertion.
    pub prepared: usize,
    /// Rows actually inserted (existing keys are kept).
    pub inserted: usize,
    pub after: i64,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
}

/// Rates that are absent or not finite count as 0.
pub fn numeric_coerce(rate: Option<f64>) -> f64 {
    match rate {
        Some(r) if r.is_finite() => r,
        _ => 0.0,
    }
}
