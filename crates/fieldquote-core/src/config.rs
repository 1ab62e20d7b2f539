//! Configuration and data directory management.
//!
//! Defaults reproduce the tuned production values: a 0.78 similarity
//! threshold, at most 4 filter tokens of 3+ chars, 200 candidate rows per
//! source, and the four catalog tables in trust order.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.78;
pub const DEFAULT_MAX_TOKENS: usize = 4;
pub const DEFAULT_MIN_TOKEN_LEN: usize = 3;
pub const DEFAULT_CANDIDATE_LIMIT: usize = 200;
pub const DEFAULT_SUGGESTION_LIMIT: usize = 20;
pub const DEFAULT_EXCAVATION_RATE: f64 = 3500.0;
pub const DEFAULT_LABOUR_RATIO: f64 = 0.10;
pub const DEFAULT_SUPERVISION_RATIO: f64 = 0.15;

/// Paths to all FieldQuote data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Database directory (`data/db/`).
    pub db_dir: PathBuf,
    /// Optional JSON configuration (`data/fieldquote.json`).
    pub config_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            db_dir: root.join("db"),
            config_file: root.join("fieldquote.json"),
            root,
        };
        std::fs::create_dir_all(&paths.db_dir)?;
        Ok(paths)
    }
}

/// One catalog price table and the local names of its columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTable {
    /// Stable identifier used in the priority list.
    pub id: String,
    pub table: String,
    pub name_column: String,
    pub unit_column: String,
    #[serde(default = "default_rate_column")]
    pub rate_column: String,
}

fn default_rate_column() -> String {
    "average_with_vat".into()
}

impl SourceTable {
    pub fn new(table: &str, name_column: &str, unit_column: &str) -> Self {
        Self {
            id: table.to_string(),
            table: table.to_string(),
            name_column: name_column.to_string(),
            unit_column: unit_column.to_string(),
            rate_column: default_rate_column(),
        }
    }

    /// The four production price tables, in trust order.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("trans_ocean", "item_name", "unit_of_measure"),
            Self::new("fitting_average", "item_name", "unit_of_measure"),
            Self::new("simba_pipes", "description", "unit"),
            Self::new("pipes_average_price", "description", "unit"),
        ]
    }

    /// Table and column names are interpolated into SQL, so they must be
    /// plain identifiers.
    pub fn validate(&self) -> Result<()> {
        for ident in [
            &self.table,
            &self.name_column,
            &self.unit_column,
            &self.rate_column,
        ] {
            if !is_identifier(ident) {
                return Err(Error::Config(format!(
                    "source '{}': '{}' is not a valid SQL identifier",
                    self.id, ident
                )));
            }
        }
        if self.id.trim().is_empty() {
            return Err(Error::Config("source id must not be empty".into()));
        }
        Ok(())
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Tunables for the resolver pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Minimum bigram Dice score for a fuzzy candidate to be accepted.
    pub threshold: f64,
    /// Longest N needle tokens used as substring filters.
    pub max_tokens: usize,
    /// Tokens shorter than this are not used as filters.
    pub min_token_len: usize,
    /// Candidate rows fetched per source in the fuzzy stage.
    pub candidate_limit: usize,
    /// Retry the fuzzy stage requiring any (not all) filter token when the
    /// strict pass found nothing in any source.
    pub relaxed_token_pass: bool,
    pub suggestion_limit: usize,
    /// Source ids in lookup order; the first hit wins in both the exact and
    /// fuzzy stages.
    pub source_priority: Vec<String>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
            max_tokens: DEFAULT_MAX_TOKENS,
            min_token_len: DEFAULT_MIN_TOKEN_LEN,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            relaxed_token_pass: true,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            source_priority: SourceTable::defaults().into_iter().map(|s| s.id).collect(),
        }
    }
}

impl MatchConfig {
    pub fn validate(&self, sources: &[SourceTable]) -> Result<()> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::Config(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        if self.max_tokens == 0 || self.candidate_limit == 0 || self.suggestion_limit == 0 {
            return Err(Error::Config(
                "max_tokens, candidate_limit and suggestion_limit must be positive".into(),
            ));
        }
        for (i, id) in self.source_priority.iter().enumerate() {
            if !sources.iter().any(|s| &s.id == id) {
                return Err(Error::Config(format!("unknown source in priority: {}", id)));
            }
            if self.source_priority[..i].contains(id) {
                return Err(Error::Config(format!("duplicate source in priority: {}", id)));
            }
        }
        Ok(())
    }
}

/// Markup charges applied on top of material cost.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteRates {
    /// Price per unit of trench distance.
    pub excavation_rate: f64,
    pub labour_ratio: f64,
    pub supervision_ratio: f64,
}

impl Default for QuoteRates {
    fn default() -> Self {
        Self {
            excavation_rate: DEFAULT_EXCAVATION_RATE,
            labour_ratio: DEFAULT_LABOUR_RATIO,
            supervision_ratio: DEFAULT_SUPERVISION_RATIO,
        }
    }
}

/// Layout of `fieldquote.json`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    sources: Option<Vec<SourceTable>>,
    matching: Option<MatchConfig>,
    rates: Option<QuoteRates>,
}

/// Top-level FieldQuote configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldQuoteConfig {
    pub data_paths: DataPaths,
    pub sources: Vec<SourceTable>,
    pub matching: MatchConfig,
    pub rates: QuoteRates,
}

impl FieldQuoteConfig {
    /// Create configuration from the data directory's JSON file, environment
    /// overrides, and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_paths = DataPaths::new(data_dir)?;

        let file: FileConfig = match std::fs::read_to_string(&data_paths.config_file) {
            Ok(s) => serde_json::from_str(&s)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileConfig::default(),
            Err(e) => return Err(e.into()),
        };

        let mut config = Self {
            data_paths,
            sources: file.sources.unwrap_or_else(SourceTable::defaults),
            matching: file.matching.unwrap_or_default(),
            rates: file.rates.unwrap_or_default(),
        };

        if let Ok(raw) = std::env::var("FIELDQUOTE_MATCH_THRESHOLD") {
            match raw.trim().parse::<f64>() {
                Ok(t) => config.matching.threshold = t,
                Err(_) => warn!("Ignoring FIELDQUOTE_MATCH_THRESHOLD={:?}: not a number", raw),
            }
        }
        if let Ok(raw) = std::env::var("FIELDQUOTE_SOURCE_PRIORITY") {
            config.matching.source_priority = parse_priority(&raw);
        }

        config.validate()?;
        info!(
            "Loaded config: {} sources, priority={:?}, threshold={}",
            config.sources.len(),
            config.matching.source_priority,
            config.matching.threshold
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for source in &self.sources {
            source.validate()?;
        }
        self.matching.validate(&self.sources)
    }
}

/// Parse a comma-separated priority list, e.g. `"simba_pipes,trans_ocean"`.
pub fn parse_priority(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let sources = SourceTable::defaults();
        let matching = MatchConfig::default();
        assert!(matching.validate(&sources).is_ok());
        assert_eq!(matching.threshold, 0.78);
        assert_eq!(matching.max_tokens, 4);
        assert_eq!(matching.candidate_limit, 200);
        assert_eq!(
            matching.source_priority,
            vec!["trans_ocean", "fitting_average", "simba_pipes", "pipes_average_price"]
        );
    }

    #[test]
    fn test_rejects_bad_identifier() {
        let mut source = SourceTable::new("trans_ocean", "item_name", "unit_of_measure");
        source.name_column = "item_name; DROP TABLE x".into();
        assert!(matches!(source.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_unknown_priority() {
        let matching = MatchConfig {
            source_priority: vec!["nope".into()],
            ..Default::default()
        };
        assert!(matching.validate(&SourceTable::defaults()).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let matching = MatchConfig {
            threshold: 1.5,
            ..Default::default()
        };
        assert!(matching.validate(&SourceTable::defaults()).is_err());
    }

    #[test]
    fn test_file_config_partial_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("fieldquote.json"),
            r#"{"matching": {"threshold": 0.9}, "rates": {"excavation_rate": 4000}}"#,
        )
        .unwrap();

        let config = FieldQuoteConfig::from_env(dir.path()).unwrap();
        assert_eq!(config.matching.max_tokens, 4);
        assert_eq!(config.rates.excavation_rate, 4000.0);
        assert_eq!(config.rates.labour_ratio, 0.10);
        assert_eq!(config.sources.len(), 4);
        assert!(config.data_paths.db_dir.exists());
    }

    #[test]
    fn test_priority_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("fieldquote.json"),
            r#"{"matching": {"source_priority": ["simba_pipes", "trans_ocean"]}}"#,
        )
        .unwrap();
        let config = FieldQuoteConfig::from_env(dir.path()).unwrap();
        assert_eq!(config.matching.source_priority, vec!["simba_pipes", "trans_ocean"]);
    }

    #[test]
    fn test_parse_priority() {
        assert_eq!(
            parse_priority(" simba_pipes , ,trans_ocean"),
            vec!["simba_pipes", "trans_ocean"]
        );
    }
}
