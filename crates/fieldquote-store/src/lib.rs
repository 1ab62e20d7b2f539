//! FieldQuote Store: alias cache and catalog source adapters.
//!
//! The resolver only sees the `AliasStore` and `CatalogSource` traits.
//! `SqliteStore` backs both with one SQLite database; the `memory` module
//! provides in-process doubles with the same semantics.

pub mod memory;
pub mod schema;
pub mod source;
pub mod sqlite;
pub mod types;

pub use memory::{MemoryAliasStore, MemoryCatalogSource};
pub use source::{AliasStore, Catalog, CatalogSource};
pub use sqlite::{SqliteCatalogSource, SqliteStore};
pub use types::*;
