//! FieldQuote Resolve: free-text item names to canonical catalog rows.
//!
//! Resolution stages: alias cache → exact normalized keys → fuzzy fallback.
//! Also hosts the suggestion search and alias seeding built on the same
//! catalog and alias abstractions.

pub mod resolver;
pub mod seed;
pub mod suggest;
pub mod types;

pub use resolver::{filter_tokens, Resolver};
pub use seed::seed_aliases;
pub use suggest::suggest;
pub use types::*;
