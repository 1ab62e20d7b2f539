//! Item-name resolver: alias cache, exact normalized keys, fuzzy fallback.
//!
//! Stages run strictly in order and stop at the first success:
//! 1. empty guard on the base key
//! 2. alias lookup (base key first, then strict key)
//! 3. exact key lookup across sources in priority order
//! 4. fuzzy fallback: substring filters from the longest needle tokens,
//!    standalone size checks, bigram similarity, first source whose best
//!    candidate reaches the threshold wins
//!
//! A fuzzy acceptance teaches the alias store `normalize(raw) -> name` so
//! the next identical request is answered by stage 3.

use std::sync::Arc;

use tracing::{debug, warn};

use fieldquote_core::{MatchConfig, Result};
use fieldquote_store::{AliasStore, Catalog, CatalogEntry, CatalogSource, MatchMode, NameQuery};
use fieldquote_text::{
    extract_size_tokens, normalize, normalize_loose, normalize_strict, similarity, SizeTokens,
};

use crate::types::*;

/// Resolves free-text item names to catalog rows.
///
/// Holds no per-request state; one instance can serve concurrent callers.
pub struct Resolver {
    catalog: Catalog,
    aliases: Arc<dyn AliasStore>,
    config: MatchConfig,
}

/// A candidate that survived the size check, with its score.
struct Scored {
    entry: CatalogEntry,
    score: f64,
}

impl Resolver {
    pub fn new(catalog: Catalog, aliases: Arc<dyn AliasStore>, config: MatchConfig) -> Self {
        Self {
            catalog,
            aliases,
            config,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Resolve a raw name to `{name, unit, rate}`; `Ok(None)` when nothing
    /// matches anywhere.
    pub fn resolve_item(&self, raw: &str) -> Result<Option<ResolvedItem>> {
        Ok(self.resolve_detailed(raw)?.map(|r| r.item))
    }

    /// Like [`resolve_item`](Self::resolve_item), also reporting the stage,
    /// source, alias, score and alias write outcome.
    pub fn resolve_detailed(&self, raw: &str) -> Result<Option<Resolution>> {
        let base = normalize(raw);
        if base.is_empty() {
            return Ok(None);
        }
        let strict = normalize_strict(raw);

        let alias = self.lookup_alias(&base, &strict)?;
        let keys = candidate_keys(&base, &strict, alias.as_deref());

        if let Some((source_id, entry)) = self.catalog.find_exact(&keys)? {
            debug!("Resolved {:?} by exact key in {}: {}", raw, source_id, entry.name);
            return Ok(Some(Resolution {
                item: to_item(entry),
                stage: MatchStage::ExactKey,
                source_id,
                alias,
                score: None,
                alias_write: None,
            }));
        }

        let Some((source_id, best)) = self.fuzzy_match(raw)? else {
            debug!("No match for {:?}", raw);
            return Ok(None);
        };
        debug!(
            "Resolved {:?} by fuzzy match in {}: {} (score {:.4})",
            raw, source_id, best.entry.name, best.score
        );

        let alias_write = self.learn_alias(&base, &best.entry.name);
        Ok(Some(Resolution {
            item: to_item(best.entry),
            stage: MatchStage::Fuzzy,
            source_id,
            alias,
            score: Some(best.score),
            alias_write: Some(alias_write),
        }))
    }

    /// A row under the exact base key beats one under the strict key.
    fn lookup_alias(&self, base: &str, strict: &str) -> Result<Option<String>> {
        if let Some(canonical) = self.aliases.lookup(base)? {
            debug!("Alias hit (base key) {:?} -> {}", base, canonical);
            return Ok(Some(canonical));
        }
        if strict.is_empty() || strict == base {
            return Ok(None);
        }
        let canonical = self.aliases.lookup(strict)?;
        if let Some(c) = &canonical {
            debug!("Alias hit (strict key) {:?} -> {}", strict, c);
        }
        Ok(canonical)
    }

    fn fuzzy_match(&self, raw: &str) -> Result<Option<(String, Scored)>> {
        let needle = normalize_loose(raw);
        if needle.is_empty() {
            return Ok(None);
        }
        let patterns = filter_tokens(&needle, &self.config);
        let required = extract_size_tokens(raw);

        let mut modes = vec![MatchMode::All];
        if self.config.relaxed_token_pass && patterns.len() > 1 {
            modes.push(MatchMode::Any);
        }

        for mode in modes {
            let query = NameQuery {
                patterns: patterns.clone(),
                mode,
                sizes: required.iter().cloned().collect(),
                limit: self.config.candidate_limit,
                order_by_name: false,
                distinct: false,
            };

            let mut any_candidates = false;
            for source in self.catalog.sources() {
                let Some(best) = self.best_candidate(source.as_ref(), &query, &needle, &required)?
                else {
                    continue;
                };
                any_candidates = true;
                if best.score >= self.config.threshold {
                    return Ok(Some((source.id().to_string(), best)));
                }
                debug!(
                    "Best {:?} candidate in {} below threshold: {} ({:.4})",
                    mode,
                    source.id(),
                    best.entry.name,
                    best.score
                );
            }

            // The relaxed pass only runs where the strict pass saw no candidates at all.
            if any_candidates {
                break;
            }
        }
        Ok(None)
    }

    /// Highest-scoring candidate of one source; storage order breaks ties.
    fn best_candidate(
        &self,
        source: &dyn CatalogSource,
        query: &NameQuery,
        needle: &str,
        required: &SizeTokens,
    ) -> Result<Option<Scored>> {
        let mut best: Option<Scored> = None;
        for entry in source.search(query)? {
            if !required.is_subset(&extract_size_tokens(&entry.name)) {
                continue;
            }
            let score = similarity(needle, &entry.name);
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(Scored { entry, score });
            }
        }
        Ok(best)
    }

    /// Best effort: a failed write is logged and reported, never raised.
    fn learn_alias(&self, key: &str, canonical: &str) -> AliasWrite {
        match self.aliases.upsert(key, canonical) {
            Ok(()) => {
                debug!("Learned alias {:?} -> {}", key, canonical);
                AliasWrite::Saved
            }
            Err(e) => {
                warn!("Failed to save alias {:?} -> {}: {}", key, canonical, e);
                AliasWrite::Failed(e.to_string())
            }
        }
    }
}

/// Distinct non-empty exact-match keys for a query and its alias.
fn candidate_keys(base: &str, strict: &str, alias: Option<&str>) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(4);
    let mut push = |key: String| {
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    };
    push(base.to_string());
    push(strict.to_string());
    if let Some(alias) = alias {
        push(normalize(alias));
        push(normalize_strict(alias));
    }
    keys
}

/// Substring filters for the fuzzy stage: the longest `max_tokens` tokens of
/// at least `min_token_len` chars, or the whole needle when none qualify.
pub fn filter_tokens(needle: &str, config: &MatchConfig) -> Vec<String> {
    let mut tokens: Vec<&str> = needle
        .split(' ')
        .filter(|t| t.chars().count() >= config.min_token_len)
        .collect();
    // Stable: equal-length tokens keep their order in the needle.
    tokens.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    tokens.truncate(config.max_tokens);

    if tokens.is_empty() {
        vec![needle.to_string()]
    } else {
        tokens.into_iter().map(String::from).collect()
    }
}

fn to_item(entry: CatalogEntry) -> ResolvedItem {
    ResolvedItem {
        name: entry.name,
        unit: entry.unit,
        rate: numeric_coerce(entry.rate),
    }
}
