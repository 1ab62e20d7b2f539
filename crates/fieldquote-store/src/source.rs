//! Storage capabilities consumed by the resolver.

use std::sync::Arc;

use fieldquote_core::{Error, Result};
use tracing::debug;

use crate::types::{AliasRow, CatalogEntry, NameQuery};

/// Key → canonical-name cache shared by every resolution.
///
/// Keys are exact-match; callers are responsible for normalizing them.
pub trait AliasStore: Send + Sync {
    /// Canonical name stored under exactly `key`.
    fn lookup(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace the mapping for `key` (last write wins).
    fn upsert(&self, key: &str, canonical_name: &str) -> Result<()>;

    /// Insert rows whose key is not present yet. Returns rows inserted.
    fn insert_if_absent(&self, rows: &[AliasRow]) -> Result<usize>;

    fn count(&self) -> Result<i64>;

    /// Distinct canonical names containing any of `patterns`, sorted.
    fn canonical_names_like(&self, patterns: &[String], limit: usize) -> Result<Vec<String>>;
}

/// Read access to one catalog price table.
pub trait CatalogSource: Send + Sync {
    /// Identifier used by the priority policy.
    fn id(&self) -> &str;

    /// First row whose base- or strict-normalized name is in `keys`.
    fn find_exact(&self, keys: &[String]) -> Result<Option<CatalogEntry>>;

    /// Rows matching the substring patterns and size checks, in storage order.
    fn search(&self, query: &NameQuery) -> Result<Vec<CatalogEntry>>;

    /// Every non-blank name in the source.
    fn names(&self) -> Result<Vec<String>>;
}

/// Catalog sources in priority order. Earlier sources are more trusted and
/// win every tie.
#[derive(Clone, Default)]
pub struct Catalog {
    sources: Vec<Arc<dyn CatalogSource>>,
}

impl Catalog {
    /// Use `sources` in the order given.
    pub fn new(sources: Vec<Arc<dyn CatalogSource>>) -> Self {
        Self { sources }
    }

    /// Reorder `sources` by `priority`. Every listed id must exist; sources
    /// not listed are dropped.
    pub fn with_priority(
        sources: Vec<Arc<dyn CatalogSource>>,
        priority: &[String],
    ) -> Result<Self> {
        let mut ordered = Vec::with_capacity(priority.len());
        for id in priority {
            let source = sources
                .iter()
                .find(|s| s.id() == id)
                .ok_or_else(|| Error::Config(format!("unknown catalog source: {}", id)))?;
            ordered.push(source.clone());
        }
        Ok(Self { sources: ordered })
    }

    pub fn sources(&self) -> &[Arc<dyn CatalogSource>] {
        &self.sources
    }

    pub fn source_ids(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.id()).collect()
    }

    /// First exact hit across sources, with the id of the source it came from.
    pub fn find_exact(&self, keys: &[String]) -> Result<Option<(String, CatalogEntry)>> {
        if keys.is_empty() {
            return Ok(None);
        }
        for source in &self.sources {
            if let Some(entry) = source.find_exact(keys)? {
                debug!("Exact key hit in {}: {}", source.id(), entry.name);
                return Ok(Some((source.id().to_string(), entry)));
            }
        }
        Ok(None)
    }
}
