//! Alias seeding and suggestions against an on-disk SQLite store.

use std::sync::Arc;

use tempfile::TempDir;

use fieldquote_core::{MatchConfig, SourceTable};
use fieldquote_resolve::{seed_aliases, suggest, MatchStage, Resolver};
use fieldquote_store::{AliasStore, Catalog, SqliteStore};

fn seeded_store() -> (Arc<SqliteStore>, Catalog, TempDir) {
    let dir = TempDir::new().unwrap();
    let tables = SourceTable::defaults();
    let store = Arc::new(SqliteStore::open(dir.path()).unwrap());
    store.ensure_catalog_tables(&tables).unwrap();

    store
        .insert_catalog_entry(&tables[0], "Threaded Elbow 1\"", Some("PC"), Some(300.0))
        .unwrap();
    store
        .insert_catalog_entry(&tables[1], "Elbow 1\"", Some("PCS"), Some(280.0))
        .unwrap();
    store
        .insert_catalog_entry(&tables[2], "Gate Valve (Heavy) 2\"", Some("PC"), Some(4200.0))
        .unwrap();
    store
        .insert_catalog_entry(&tables[3], "  ", Some("PC"), Some(1.0))
        .unwrap();

    let catalog = Catalog::new(store.catalog_sources(&tables).unwrap());
    (store, catalog, dir)
}

#[test]
fn test_seed_prefers_higher_priority_source() {
    let (store, catalog, _dir) = seeded_store();
    let report = seed_aliases(&catalog, store.as_ref()).unwrap();

    assert_eq!(report.before, 0);
    assert_eq!(report.scanned, 3);
    assert_eq!(report.inserted, report.prepared);
    assert_eq!(report.after as usize, report.prepared);

    // "elbow 1" is the strict key of both elbows; the first source wins.
    assert_eq!(store.lookup("elbow 1").unwrap().as_deref(), Some("Threaded Elbow 1\""));
    assert_eq!(store.lookup("elbow 1\"").unwrap().as_deref(), Some("Elbow 1\""));
    assert_eq!(store.lookup("gate valve 2").unwrap().as_deref(), Some("Gate Valve (Heavy) 2\""));

    let again = seed_aliases(&catalog, store.as_ref()).unwrap();
    assert_eq!(again.inserted, 0);
    assert_eq!(again.after, report.after);
}

#[test]
fn test_seeded_alias_resolves_by_exact_key() {
    let (store, catalog, _dir) = seeded_store();
    seed_aliases(&catalog, store.as_ref()).unwrap();

    let resolver = Resolver::new(catalog, store, MatchConfig::default());
    let res = resolver.resolve_detailed("Gate Valve 2").unwrap().unwrap();
    assert_eq!(res.stage, MatchStage::ExactKey);
    assert_eq!(res.source_id, "simba_pipes");
    assert_eq!(res.item.rate, 4200.0);
}

#[test]
fn test_suggest_over_sqlite() {
    let (store, catalog, _dir) = seeded_store();
    store.upsert("elbow long", "Elbow Long Radius 1\"").unwrap();

    let found = suggest(&catalog, store.as_ref(), "elbow", 20).unwrap();
    let pairs: Vec<(&str, Option<&str>)> = found
        .iter()
        .map(|s| (s.name.as_str(), s.unit.as_deref()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("Elbow 1\"", Some("PCS")),
            ("Elbow Long Radius 1\"", None),
            ("Threaded Elbow 1\"", Some("PC")),
        ]
    );

    assert!(suggest(&catalog, store.as_ref(), "zzz", 20).unwrap().is_empty());
}

#[test]
fn test_suggest_stop_word_query_over_sqlite() {
    let (store, catalog, _dir) = seeded_store();
    let found = suggest(&catalog, store.as_ref(), "Threaded", 20).unwrap();
    let names: Vec<&str> = found.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Threaded Elbow 1\""]);
}

#[test]
fn test_suggest_skips_duplicate_rows_over_sqlite() {
    let (store, catalog, _dir) = seeded_store();
    let tables = SourceTable::defaults();
    for _ in 0..25 {
        store
            .insert_catalog_entry(&tables[1], "Elbow 1\"", Some("PCS"), Some(280.0))
            .unwrap();
    }
    store
        .insert_catalog_entry(&tables[1], "Elbow 2\"", Some("PCS"), Some(450.0))
        .unwrap();

    let found = suggest(&catalog, store.as_ref(), "elbow", 20).unwrap();
    let names: Vec<&str> = found.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Elbow 1\"", "Elbow 2\"", "Threaded Elbow 1\""]);
}
