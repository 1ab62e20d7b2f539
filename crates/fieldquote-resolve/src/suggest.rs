//! Autocomplete suggestions over catalog names and learned aliases.

use std::collections::BTreeSet;

use tracing::debug;

use fieldquote_core::Result;
use fieldquote_store::{AliasStore, Catalog, MatchMode, NameQuery};
use fieldquote_text::{strict_chars, STOP_WORDS};

use crate::types::Suggestion;

/// Tokens shorter than this are ignored.
const MIN_SUGGEST_TOKEN_LEN: usize = 2;

/// Catalog and alias names containing any token of `query`, sorted by name
/// and deduplicated by `(name, unit)`.
pub fn suggest(
    catalog: &Catalog,
    aliases: &dyn AliasStore,
    query: &str,
    limit: usize,
) -> Result<Vec<Suggestion>> {
    let patterns = suggest_patterns(query);
    if patterns.is_empty() || limit == 0 {
        return Ok(Vec::new());
    }

    let name_query = NameQuery {
        patterns: patterns.clone(),
        mode: MatchMode::Any,
        sizes: Vec::new(),
        limit,
        order_by_name: true,
        distinct: true,
    };

    let mut found: BTreeSet<Suggestion> = BTreeSet::new();
    for source in catalog.sources() {
        for entry in source.search(&name_query)? {
            found.insert(Suggestion {
                name: entry.name,
                unit: entry.unit,
            });
        }
    }
    for name in aliases.canonical_names_like(&patterns, limit)? {
        found.insert(Suggestion { name, unit: None });
    }

    debug!("Suggestions for {:?}: {} candidates", query, found.len());
    Ok(found.into_iter().take(limit).collect())
}

/// Tokens of at least two chars that are not stop-words, or the whole
/// query (stop-words included) when none qualify.
fn suggest_patterns(query: &str) -> Vec<String> {
    let normalized = strict_chars(query);
    if normalized.is_empty() {
        return Vec::new();
    }
    let tokens: Vec<String> = normalized
        .split(' ')
        .filter(|t| t.chars().count() >= MIN_SUGGEST_TOKEN_LEN && !STOP_WORDS.contains(t))
        .map(String::from)
        .collect();
    if tokens.is_empty() {
        vec![normalized]
    } else {
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use fieldquote_store::{CatalogEntry, CatalogSource, MemoryAliasStore, MemoryCatalogSource};

    fn catalog() -> Catalog {
        let a = MemoryCatalogSource::with_entries(
            "a",
            vec![
                CatalogEntry::new("Tee Equal 2\"", Some("PC"), Some(900.0)),
                CatalogEntry::new("Gate Valve 2\"", Some("PC"), Some(4200.0)),
            ],
        );
        let b = MemoryCatalogSource::with_entries(
            "b",
            vec![
                CatalogEntry::new("Tee Equal 2\"", Some("PC"), Some(950.0)),
                CatalogEntry::new("Tee Reducer 2\" x 1\"", Some("PC"), Some(700.0)),
            ],
        );
        Catalog::new(vec![
            Arc::new(a) as Arc<dyn CatalogSource>,
            Arc::new(b) as Arc<dyn CatalogSource>,
        ])
    }

    #[test]
    fn test_suggest_patterns() {
        assert_eq!(suggest_patterns("Threaded Tee 2\""), vec!["tee"]);
        assert_eq!(suggest_patterns("x 2"), vec!["x 2"]);
        assert_eq!(suggest_patterns("Threaded"), vec!["threaded"]);
        assert_eq!(suggest_patterns("thread threaded"), vec!["thread threaded"]);
        assert!(suggest_patterns("  ").is_empty());
        assert!(suggest_patterns("\"\"").is_empty());
    }

    #[test]
    fn test_suggest_merges_sources_and_aliases() {
        let aliases = MemoryAliasStore::with_rows([("tea 2", "Tee Special 2\"")]);
        let found = suggest(&catalog(), &aliases, "tee", 20).unwrap();
        let names: Vec<&str> = found.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Tee Equal 2\"", "Tee Reducer 2\" x 1\"", "Tee Special 2\""]
        );
        assert_eq!(found[2].unit, None);
    }

    #[test]
    fn test_suggest_limit_and_empty() {
        let aliases = MemoryAliasStore::new();
        assert_eq!(suggest(&catalog(), &aliases, "tee valve", 2).unwrap().len(), 2);
        assert!(suggest(&catalog(), &aliases, "", 20).unwrap().is_empty());
    }

    #[test]
    fn test_suggest_stop_word_only_query() {
        let source = MemoryCatalogSource::with_entries(
            "a",
            vec![
                CatalogEntry::new("Threaded Socket 1\"", Some("PC"), Some(300.0)),
                CatalogEntry::new("Socket 1\"", Some("PC"), Some(250.0)),
            ],
        );
        let catalog = Catalog::new(vec![Arc::new(source) as Arc<dyn CatalogSource>]);
        let found = suggest(&catalog, &MemoryAliasStore::new(), "threaded", 20).unwrap();
        let names: Vec<&str> = found.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Threaded Socket 1\""]);
    }

    #[test]
    fn test_suggest_duplicate_rows_do_not_crowd_out_names() {
        let source = MemoryCatalogSource::new("a");
        for _ in 0..20 {
            source.push(CatalogEntry::new("Tee A", Some("PC"), Some(1.0)));
        }
        source.push(CatalogEntry::new("Tee B", Some("PC"), Some(1.0)));
        let catalog = Catalog::new(vec![Arc::new(source) as Arc<dyn CatalogSource>]);
        let found = suggest(&catalog, &MemoryAliasStore::new(), "tee", 20).unwrap();
        let names: Vec<&str> = found.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Tee A", "Tee B"]);
    }
}
