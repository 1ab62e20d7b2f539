//! Database validation: checks that the alias table and every configured
//! catalog table exist with the expected columns, and reports row counts.

use std::path::Path;

use rusqlite::Connection;
use tracing::info;

use fieldquote_core::{FieldQuoteConfig, SourceTable};

/// Row counts and problems found in one catalog table.
#[derive(Debug)]
pub struct SourceStatus {
    pub id: String,
    pub table: String,
    pub rows: i64,
    /// Rows whose rate is NULL or not numeric; they price at 0.
    pub unpriced_rows: i64,
}

/// Result of a validation run.
#[derive(Debug)]
pub struct ValidationReport {
    pub db_valid: bool,
    pub aliases: i64,
    /// Aliases whose canonical name no longer exists in any catalog table.
    pub stale_aliases: i64,
    pub sources: Vec<SourceStatus>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Validate the database under `config.data_paths.db_dir`.
pub fn validate(config: &FieldQuoteConfig) -> ValidationReport {
    let mut report = ValidationReport {
        db_valid: false,
        aliases: 0,
        stale_aliases: 0,
        sources: Vec::new(),
        warnings: Vec::new(),
        errors: Vec::new(),
    };

    let db_path = config.data_paths.db_dir.join("fieldquote.db");
    if !db_path.exists() {
        report
            .errors
            .push(format!("Database not found: {}", db_path.display()));
        return report;
    }

    let flags = rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY;
    let conn = match Connection::open_with_flags(&db_path, flags) {
        Ok(c) => c,
        Err(e) => {
            report.errors.push(format!("Failed to open database: {}", e));
            return report;
        }
    };

    check_columns(&conn, "item_aliases", &["input_name", "canonical_name"], &mut report.errors);
    for source in &config.sources {
        check_columns(
            &conn,
            &source.table,
            &[
                source.name_column.as_str(),
                source.unit_column.as_str(),
                source.rate_column.as_str(),
            ],
            &mut report.errors,
        );
    }
    if !report.errors.is_empty() {
        return report;
    }

    report.db_valid = true;
    report.aliases = count(&conn, "SELECT COUNT(*) FROM item_aliases").unwrap_or(0);

    for source in &config.sources {
        let status = source_status(&conn, source);
        if status.rows == 0 {
            report
                .warnings
                .push(format!("Catalog table {} is empty", source.table));
        }
        if status.unpriced_rows > 0 {
            report.warnings.push(format!(
                "{} rows in {} have no numeric rate",
                status.unpriced_rows, source.table
            ));
        }
        report.sources.push(status);
    }

    for source in &config.sources {
        if !config.matching.source_priority.contains(&source.id) {
            report.warnings.push(format!(
                "Source {} is not in the priority list and will not be consulted",
                source.id
            ));
        }
    }

    if !config.sources.is_empty() && report.aliases > 0 {
        let not_in_catalog: Vec<String> = config
            .sources
            .iter()
            .map(|s| {
                format!(
                    "NOT EXISTS (SELECT 1 FROM {} c WHERE c.{} = a.canonical_name)",
                    s.table, s.name_column
                )
            })
            .collect();
        let sql = format!(
            "SELECT COUNT(*) FROM item_aliases a WHERE {}",
            not_in_catalog.join(" AND ")
        );
        report.stale_aliases = count(&conn, &sql).unwrap_or(0);
        if report.stale_aliases > 0 {
            report.warnings.push(format!(
                "{} aliases point at names missing from every catalog table",
                report.stale_aliases
            ));
        }
    }

    info!(
        "Validated {}: {} aliases, {} sources",
        db_path.display(),
        report.aliases,
        report.sources.len()
    );
    report
}

/// Print a validation report to stdout.
pub fn print_report(report: &ValidationReport) {
    println!("=== FieldQuote Validation Report ===");
    println!();
    println!("Database valid:     {}", if report.db_valid { "YES" } else { "NO" });
    println!("Aliases:            {}", report.aliases);
    println!("Stale aliases:      {}", report.stale_aliases);
    for s in &report.sources {
        println!(
            "Source {:<20} {} rows ({} unpriced) in {}",
            s.id, s.rows, s.unpriced_rows, s.table
        );
    }

    if !report.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for w in &report.warnings {
            println!("  - {}", w);
        }
    }

    if !report.errors.is_empty() {
        println!();
        println!("Errors:");
        for e in &report.errors {
            println!("  - {}", e);
        }
    }

    println!();
    if report.errors.is_empty() && report.db_valid {
        println!("Status: READY FOR USE");
    } else {
        println!("Status: INVALID");
    }
}

// Internal helpers

fn check_columns(conn: &Connection, table: &str, required: &[&str], errors: &mut Vec<String>) {
    let columns = match get_column_names(conn, table) {
        Ok(c) => c,
        Err(e) => {
            errors.push(format!("Error checking table {}: {}", table, e));
            return;
        }
    };
    if columns.is_empty() {
        errors.push(format!("Missing required table: {}", table));
        return;
    }
    for col in required {
        if !columns.iter().any(|c| c == col) {
            errors.push(format!("{} table missing column: {}", table, col));
        }
    }
}

fn get_column_names(conn: &Connection, table: &str) -> Result<Vec<String>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let rows = stmt.query_map([table], |row| row.get::<_, String>(0))?;
    rows.collect()
}

fn source_status(conn: &Connection, source: &SourceTable) -> SourceStatus {
    let rows = count(conn, &format!("SELECT COUNT(*) FROM {}", source.table)).unwrap_or(0);
    let unpriced_rows = count(
        conn,
        &format!(
            "SELECT COUNT(*) FROM {} WHERE typeof({rate}) NOT IN ('integer', 'real') \
             AND NOT (typeof({rate}) = 'text' AND TRIM({rate}) GLOB '*[0-9]*')",
            source.table,
            rate = source.rate_column
        ),
    )
    .unwrap_or(0);
    SourceStatus {
        id: source.id.clone(),
        table: source.table.clone(),
        rows,
        unpriced_rows,
    }
}

fn count(conn: &Connection, sql: &str) -> Result<i64, rusqlite::Error> {
    conn.query_row(sql, [], |row| row.get(0))
}

/// Whether `data_dir` already holds a database file.
pub fn database_exists(data_dir: &Path) -> bool {
    data_dir.join("db").join("fieldquote.db").exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldquote_store::{AliasStore, SqliteStore};

    fn setup(dir: &Path) -> FieldQuoteConfig {
        let config = FieldQuoteConfig::from_env(dir).unwrap();
        let store = SqliteStore::open(&config.data_paths.db_dir).unwrap();
        store.ensure_catalog_tables(&config.sources).unwrap();
        store
            .insert_catalog_entry(&config.sources[0], "Gate Valve 2\"", Some("PC"), Some(4200.0))
            .unwrap();
        store
            .insert_catalog_entry(&config.sources[0], "Gate Valve 3\"", Some("PC"), None)
            .unwrap();
        store.upsert("gate valve 2", "Gate Valve 2\"").unwrap();
        store.upsert("old valve", "Discontinued Valve").unwrap();
        config
    }

    #[test]
    fn test_validate_valid_db() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path());
        assert!(database_exists(dir.path()));

        let report = validate(&config);
        assert!(report.db_valid, "{:?}", report.errors);
        assert_eq!(report.aliases, 2);
        assert_eq!(report.stale_aliases, 1);
        assert_eq!(report.sources.len(), 4);
        assert_eq!(report.sources[0].rows, 2);
        assert_eq!(report.sources[0].unpriced_rows, 1);
        assert!(report.warnings.iter().any(|w| w.contains("simba_pipes is empty")));
    }

    #[test]
    fn test_validate_missing_db() {
        let dir = tempfile::tempdir().unwrap();
        let config = FieldQuoteConfig::from_env(dir.path()).unwrap();
        assert!(!database_exists(dir.path()));
        let report = validate(&config);
        assert!(!report.db_valid);
        assert!(!report.errors.is_empty());
    }

    #[test]
    fn test_validate_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = setup(dir.path());
        config.sources[1].unit_column = "uom".into();
        let report = validate(&config);
        assert!(!report.db_valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e == "fitting_average table missing column: uom"));
    }
}
