//! Alias seeding: pre-populate the alias table from every catalog name.

use std::collections::HashSet;

use tracing::info;

use fieldquote_core::Result;
use fieldquote_store::{AliasRow, AliasStore, Catalog};
use fieldquote_text::key_variants;

use crate::types::SeedReport;

/// Derive alias keys from every catalog name and insert the ones not yet
/// present. Sources are visited in priority order, so the first canonical
/// name seen for a key wins; existing rows are never overwritten.
pub fn seed_aliases(catalog: &Catalog, aliases: &dyn AliasStore) -> Result<SeedReport> {
    let start = std::time::Instant::now();
    let mut report = SeedReport {
        before: aliases.count()?,
        ..Default::default()
    };
    info!("Starting alias seeding ({} existing aliases)", report.before);

    let mut seen: HashSet<String> = HashSet::new();
    let mut rows: Vec<AliasRow> = Vec::new();
    for source in catalog.sources() {
        let names = source.names()?;
        info!("Scanning {} names from {}", names.len(), source.id());
        report.scanned += names.len();

        for name in names {
            for key in key_variants(&name) {
                if seen.insert(key.clone()) {
                    rows.push(AliasRow {
                        input_key: key,
                        canonical_name: name.clone(),
                    });
                }
            }
        }
    }
    report.prepared = rows.len();

    report.inserted = aliases.insert_if_absent(&rows)?;
    report.after = aliases.count()?;
    report.duration_ms = start.elapsed().as_millis() as u64;

    info!(
        "Alias seeding complete: before={}, prepared={}, inserted={}, after={}, duration={}ms",
        report.before, report.prepared, report.inserted, report.after, report.duration_ms
    );
    Ok(report)
}
