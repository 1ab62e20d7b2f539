//! SQLite-backed alias store and catalog source adapters.
//!
//! One connection serves the alias table and all catalog tables. The
//! connection gets four SQL functions:
//! - `fq_normalize(text)` and `fq_normalize_strict(text)`: the Rust
//!   normalizers, so catalog names are keyed exactly like queries
//! - `fq_lower(text)`: Unicode lowercasing; the built-in `LOWER` only folds ASCII
//! - `regexp(pattern, text)`: backs the `REGEXP` operator used for size checks

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info};

use fieldquote_core::{Error, Result, SourceTable};
use fieldquote_text::{normalize, normalize_strict, size_boundary_pattern};

use crate::schema::{catalog_table_sql, ALIAS_SCHEMA_SQL};
use crate::source::{AliasStore, CatalogSource};
use crate::types::{like_pattern, AliasRow, CatalogEntry, MatchMode, NameQuery};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Rows per transaction when seeding aliases.
const ALIAS_BATCH_SIZE: usize = 1000;

fn db_err(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

/// SQLite store holding the alias cache and catalog price tables.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open or create the store.
    ///
    /// `db_dir` is the directory (e.g., `data/db/`). The file will be `db_dir/fieldquote.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("fieldquote.db");

        let conn = Connection::open(&db_path).map_err(db_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(db_err)?;

        let store = Self::from_connection(conn, db_path)?;
        info!(
            "SqliteStore initialized: {} aliases, path={}",
            store.count()?,
            store.db_path.display()
        );
        Ok(store)
    }

    fn from_connection(conn: Connection, db_path: PathBuf) -> Result<Self> {
        Self::register_functions(&conn)?;
        conn.execute_batch(ALIAS_SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    fn register_functions(conn: &Connection) -> Result<()> {
        let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

        conn.create_scalar_function("fq_normalize", 1, flags, |ctx| {
            Ok(ctx.get::<Option<String>>(0)?.map(|s| normalize(&s)))
        })
        .map_err(db_err)?;

        conn.create_scalar_function("fq_normalize_strict", 1, flags, |ctx| {
            Ok(ctx.get::<Option<String>>(0)?.map(|s| normalize_strict(&s)))
        })
        .map_err(db_err)?;

        conn.create_scalar_function("fq_lower", 1, flags, |ctx| {
            Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase()))
        })
        .map_err(db_err)?;

        // `X REGEXP Y` calls regexp(Y, X); the compiled pattern is cached per statement.
        conn.create_scalar_function("regexp", 2, flags, |ctx| {
            let re: Arc<Regex> =
                ctx.get_or_create_aux(0, |vr| -> std::result::Result<_, BoxError> {
                    Ok(Regex::new(vr.as_str()?)?)
                })?;
            let text = ctx.get::<Option<String>>(1)?;
            Ok(text.map(|t| re.is_match(&t)).unwrap_or(false))
        })
        .map_err(db_err)?;

        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    // ---------------------------------------------------------------
    // Catalog tables
    // ---------------------------------------------------------------

    /// Create the catalog tables if they do not exist.
    pub fn ensure_catalog_tables(&self, sources: &[SourceTable]) -> Result<()> {
        let conn = self.conn.lock();
        for source in sources {
            source.validate()?;
            conn.execute_batch(&catalog_table_sql(source)).map_err(db_err)?;
        }
        Ok(())
    }

    /// Insert one price row into a catalog table. Returns the new row id.
    pub fn insert_catalog_entry(
        &self,
        source: &SourceTable,
        name: &str,
        unit: Option<&str>,
        rate: Option<f64>,
    ) -> Result<i64> {
        source.validate()?;
        let sql = format!(
            "INSERT INTO {} ({}, {}, {}) VALUES (?1, ?2, ?3)",
            source.table, source.name_column, source.unit_column, source.rate_column
        );
        let conn = self.conn.lock();
        let id = conn
            .prepare_cached(&sql)
            .map_err(db_err)?
            .insert(params![name, unit, rate])
            .map_err(db_err)?;
        Ok(id)
    }

    /// Adapters for `sources`, in the order given.
    pub fn catalog_sources(
        self: &Arc<Self>,
        sources: &[SourceTable],
    ) -> Result<Vec<Arc<dyn CatalogSource>>> {
        sources
            .iter()
            .map(|table| {
                table.validate()?;
                Ok(Arc::new(SqliteCatalogSource {
                    store: Arc::clone(self),
                    table: table.clone(),
                }) as Arc<dyn CatalogSource>)
            })
            .collect()
    }

    /// Row count of a catalog table.
    pub fn count_rows(&self, source: &SourceTable) -> Result<i64> {
        source.validate()?;
        let conn = self.conn.lock();
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", source.table), [], |row| {
            row.get(0)
        })
        .map_err(db_err)
    }

    fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

impl AliasStore for SqliteStore {
    fn lookup(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let canonical = conn
            .prepare_cached("SELECT canonical_name FROM item_aliases WHERE input_name = ?1")
            .map_err(db_err)?
            .query_row(params![key], |row| row.get(0))
            .optional()
            .map_err(db_err)?;
        Ok(canonical)
    }

    fn upsert(&self, key: &str, canonical_name: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO item_aliases (input_name, canonical_name, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?3) \
             ON CONFLICT(input_name) DO UPDATE SET \
             canonical_name = excluded.canonical_name, updated_at = excluded.updated_at",
        )
        .map_err(db_err)?
        .execute(params![key, canonical_name, Self::now_millis()])
        .map_err(db_err)?;
        Ok(())
    }

    fn insert_if_absent(&self, rows: &[AliasRow]) -> Result<usize> {
        let now = Self::now_millis();
        let mut inserted = 0;
        let mut conn = self.conn.lock();
        for (i, batch) in rows.chunks(ALIAS_BATCH_SIZE).enumerate() {
            let tx = conn.transaction().map_err(db_err)?;
            {
                let mut stmt = tx
                    .prepare_cached(
                        "INSERT OR IGNORE INTO item_aliases \
                         (input_name, canonical_name, created_at, updated_at) \
                         VALUES (?1, ?2, ?3, ?3)",
                    )
                    .map_err(db_err)?;
                for row in batch {
                    inserted += stmt
                        .execute(params![row.input_key, row.canonical_name, now])
                        .map_err(db_err)?;
                }
            }
            tx.commit().map_err(db_err)?;
            debug!(
                "Alias batch {}: {}/{} rows processed",
                i + 1,
                i * ALIAS_BATCH_SIZE + batch.len(),
                rows.len()
            );
        }
        Ok(inserted)
    }

    fn count(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM item_aliases", [], |row| row.get(0))
            .map_err(db_err)
    }

    fn canonical_names_like(&self, patterns: &[String], limit: usize) -> Result<Vec<String>> {
        let likes: Vec<String> = patterns.iter().map(|p| like_pattern(p)).collect();
        let where_clause = if likes.is_empty() {
            String::new()
        } else {
            format!(
                "WHERE {}",
                vec!["fq_lower(canonical_name) LIKE ? ESCAPE '\\'"; likes.len()].join(" OR ")
            )
        };
        let sql = format!(
            "SELECT DISTINCT canonical_name FROM item_aliases {} ORDER BY canonical_name LIMIT {}",
            where_clause, limit
        );

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params_from_iter(likes.iter()), |row| row.get::<_, String>(0))
            .map_err(db_err)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(db_err)
    }
}

/// One catalog table viewed through the uniform `{name, unit, rate}` shape.
pub struct SqliteCatalogSource {
    store: Arc<SqliteStore>,
    table: SourceTable,
}

impl SqliteCatalogSource {
    fn select_prefix(&self) -> String {
        let t = &self.table;
        format!(
            "SELECT {} AS name, {} AS unit, {} AS rate FROM {}",
            t.name_column, t.unit_column, t.rate_column, t.table
        )
    }

    fn query_entries<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<CatalogEntry>> {
        let conn = self.store.conn.lock();
        let mut stmt = conn.prepare(sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params, |row| {
                Ok((
                    text_from_value(row.get_ref(0)?),
                    text_from_value(row.get_ref(1)?),
                    rate_from_value(row.get_ref(2)?),
                ))
            })
            .map_err(db_err)?;

        let mut entries = Vec::new();
        for row in rows {
            let (name, unit, rate) = row.map_err(db_err)?;
            if let Some(name) = name {
                entries.push(CatalogEntry { name, unit, rate });
            }
        }
        Ok(entries)
    }
}

impl CatalogSource for SqliteCatalogSource {
    fn id(&self) -> &str {
        &self.table.id
    }

    fn find_exact(&self, keys: &[String]) -> Result<Option<CatalogEntry>> {
        if keys.is_empty() {
            return Ok(None);
        }
        let placeholders = vec!["?"; keys.len()].join(", ");
        let sql = format!(
            "{} WHERE fq_normalize({name}) IN ({p}) \
             OR fq_normalize_strict({name}) IN ({p}) LIMIT 1",
            self.select_prefix(),
            name = self.table.name_column,
            p = placeholders
        );
        let entries = self.query_entries(&sql, params_from_iter(keys.iter().chain(keys.iter())))?;
        Ok(entries.into_iter().next())
    }

    fn search(&self, query: &NameQuery) -> Result<Vec<CatalogEntry>> {
        let name = &self.table.name_column;
        let mut clauses = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if !query.patterns.is_empty() {
            let joiner = match query.mode {
                MatchMode::All => " AND ",
                MatchMode::Any => " OR ",
            };
            let like = format!("fq_lower({}) LIKE ? ESCAPE '\\'", name);
            let likes = vec![like; query.patterns.len()];
            clauses.push(format!("({})", likes.join(joiner)));
            params.extend(query.patterns.iter().map(|p| like_pattern(p)));
        }
        for size in &query.sizes {
            clauses.push(format!("fq_lower({}) REGEXP ?", name));
            params.push(size_boundary_pattern(size));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let order_clause = if query.order_by_name { " ORDER BY name" } else { "" };
        let sql = if query.distinct {
            format!(
                "SELECT name, unit, MIN(rate) AS rate FROM ({}{}) GROUP BY name, unit{} LIMIT {}",
                self.select_prefix(),
                where_clause,
                order_clause,
                query.limit
            )
        } else {
            format!(
                "{}{}{} LIMIT {}",
                self.select_prefix(),
                where_clause,
                order_clause,
                query.limit
            )
        };
        self.query_entries(&sql, params_from_iter(params.iter()))
    }

    fn names(&self) -> Result<Vec<String>> {
        let name = &self.table.name_column;
        let sql = format!(
            "SELECT {name} FROM {table} WHERE {name} IS NOT NULL AND TRIM({name}) <> ''",
            name = name,
            table = self.table.table
        );
        let conn = self.store.conn.lock();
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| Ok(text_from_value(row.get_ref(0)?)))
            .map_err(db_err)?;

        let mut names = Vec::new();
        for row in rows {
            if let Some(n) = row.map_err(db_err)? {
                names.push(n.trim().to_string());
            }
        }
        Ok(names)
    }
}

fn text_from_value(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
    }
}

/// Rates arrive as REAL, INTEGER, or numeric TEXT depending on the import.
fn rate_from_value(value: ValueRef<'_>) -> Option<f64> {
    let rate = match value {
        ValueRef::Integer(i) => i as f64,
        ValueRef::Real(f) => f,
        ValueRef::Text(t) => std::str::from_utf8(t).ok()?.trim().parse().ok()?,
        ValueRef::Null | ValueRef::Blob(_) => return None,
    };
    rate.is_finite().then_some(rate)
}
