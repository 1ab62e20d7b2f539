//! Database schema SQL.

use fieldquote_core::SourceTable;

/// Learned and seeded aliases: normalized input key → canonical catalog name.
pub const ALIAS_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS item_aliases (
    input_name TEXT PRIMARY KEY,
    canonical_name TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_item_aliases_canonical ON item_aliases(canonical_name);
"#;

/// Price table layout for one catalog source. The production tables are
/// owned by the import tooling; this is used for fresh databases and tests.
pub fn catalog_table_sql(source: &SourceTable) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    {name} TEXT,
    {unit} TEXT,
    {rate} REAL
);",
        table = source.table,
        name = source.name_column,
        unit = source.unit_column,
        rate = source.rate_column,
    )
}
