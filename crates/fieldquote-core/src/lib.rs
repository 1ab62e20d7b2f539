//! FieldQuote Core: error types, matching/pricing configuration, data paths.

pub mod config;
pub mod error;

pub use config::{DataPaths, FieldQuoteConfig, MatchConfig, QuoteRates, SourceTable};
pub use error::{Error, Result};
