//! In-process alias store and catalog source.
//!
//! Same matching semantics as the SQLite adapters. Both can be switched into
//! a failing mode to exercise storage-error handling.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;

use fieldquote_core::{Error, Result};
use fieldquote_text::{normalize, normalize_strict};

use crate::source::{AliasStore, CatalogSource};
use crate::types::{AliasRow, CatalogEntry, MatchMode, NameQuery};

/// Alias store backed by a `HashMap`.
#[derive(Default)]
pub struct MemoryAliasStore {
    rows: RwLock<HashMap<String, String>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryAliasStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows<'a>(rows: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::new();
        {
            let mut map = store.rows.write();
            for (key, canonical) in rows {
                map.insert(key.to_string(), canonical.to_string());
            }
        }
        store
    }

    /// Make every subsequent write fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent read fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.rows.read().get(key).cloned()
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage("alias store rejected write".into()));
        }
        Ok(())
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Storage("alias store unavailable".into()));
        }
        Ok(())
    }
}

impl AliasStore for MemoryAliasStore {
    fn lookup(&self, key: &str) -> Result<Option<String>> {
        self.check_read()?;
        Ok(self.get(key))
    }

    fn upsert(&self, key: &str, canonical_name: &str) -> Result<()> {
        self.check_write()?;
        self.rows
            .write()
            .insert(key.to_string(), canonical_name.to_string());
        Ok(())
    }

    fn insert_if_absent(&self, rows: &[AliasRow]) -> Result<usize> {
        self.check_write()?;
        let mut map = self.rows.write();
        let mut inserted = 0;
        for row in rows {
            if !map.contains_key(&row.input_key) {
                map.insert(row.input_key.clone(), row.canonical_name.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn count(&self) -> Result<i64> {
        self.check_read()?;
        Ok(self.rows.read().len() as i64)
    }

    fn canonical_names_like(&self, patterns: &[String], limit: usize) -> Result<Vec<String>> {
        self.check_read()?;
        let query = NameQuery {
            patterns: patterns.to_vec(),
            mode: MatchMode::Any,
            sizes: Vec::new(),
            limit,
            order_by_name: false,
            distinct: false,
        };
        let matcher = query.matcher();
        let mut names: Vec<String> = self
            .rows
            .read()
            .values()
            .filter(|name| matcher.matches(name))
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names.truncate(limit);
        Ok(names)
    }
}

/// Catalog source backed by a `Vec`, searched in insertion order.
pub struct MemoryCatalogSource {
    id: String,
    entries: RwLock<Vec<CatalogEntry>>,
    unavailable: AtomicBool,
    searches: AtomicUsize,
}

impl MemoryCatalogSource {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_entries(id, Vec::new())
    }

    pub fn with_entries(id: impl Into<String>, entries: Vec<CatalogEntry>) -> Self {
        Self {
            id: id.into(),
            entries: RwLock::new(entries),
            unavailable: AtomicBool::new(false),
            searches: AtomicUsize::new(0),
        }
    }

    pub fn push(&self, entry: CatalogEntry) {
        self.entries.write().push(entry);
    }

    /// Make every subsequent read fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of candidate searches served so far.
    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("catalog source {} unavailable", self.id)));
        }
        Ok(())
    }
}

impl CatalogSource for MemoryCatalogSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn find_exact(&self, keys: &[String]) -> Result<Option<CatalogEntry>> {
        self.check()?;
        let entries = self.entries.read();
        Ok(entries
            .iter()
            .find(|e| {
                let base = normalize(&e.name);
                let strict = normalize_strict(&e.name);
                keys.iter().any(|k| *k == base || *k == strict)
            })
            .cloned())
    }

    fn search(&self, query: &NameQuery) -> Result<Vec<CatalogEntry>> {
        self.check()?;
        self.searches.fetch_add(1, Ordering::SeqCst);
        let matcher = query.matcher();
        let mut hits: Vec<CatalogEntry> = self
            .entries
            .read()
            .iter()
            .filter(|e| matcher.matches(&e.name))
            .cloned()
            .collect();
        if query.distinct {
            let mut seen = HashSet::new();
            hits.retain(|e| seen.insert((e.name.clone(), e.unit.clone())));
        }
        if query.order_by_name {
            hits.sort_by(|a, b| a.name.cmp(&b.name));
        }
        hits.truncate(query.limit);
        Ok(hits)
    }

    fn names(&self) -> Result<Vec<String>> {
        self.check()?;
        Ok(self
            .entries
            .read()
            .iter()
            .map(|e| e.name.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect())
    }
}
