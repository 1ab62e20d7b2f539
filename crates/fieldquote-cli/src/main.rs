//! FieldQuote: item-name resolution and quotation pricing CLI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use fieldquote_core::FieldQuoteConfig;
use fieldquote_quote::{price_order, Order};
use fieldquote_resolve::{seed_aliases, suggest, Resolver};
use fieldquote_store::{Catalog, SqliteStore};

pub mod validate;

fn resolve_data_dir() -> PathBuf {
    std::env::var("FIELDQUOTE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

/// Configuration, store and resolver for an initialized data directory.
struct Engine {
    config: FieldQuoteConfig,
    store: Arc<SqliteStore>,
    resolver: Resolver,
}

impl Engine {
    fn open(data_dir: &Path) -> anyhow::Result<Self> {
        if !validate::database_exists(data_dir) {
            anyhow::bail!(
                "No database in {}. Run 'fieldquote init' first.",
                data_dir.display()
            );
        }
        let config = FieldQuoteConfig::from_env(data_dir)?;
        let store = Arc::new(
            SqliteStore::open(&config.data_paths.db_dir)
                .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?,
        );
        let sources = store.catalog_sources(&config.sources)?;
        let catalog = Catalog::with_priority(sources, &config.matching.source_priority)?;
        info!("Catalog sources: {}", catalog.source_ids().join(", "));
        let resolver = Resolver::new(catalog, store.clone(), config.matching.clone());
        Ok(Self {
            config,
            store,
            resolver,
        })
    }
}

fn required_arg<'a>(args: &'a [String], usage: &str) -> &'a str {
    match args.get(2) {
        Some(arg) => arg,
        None => {
            eprintln!("Usage: {}", usage);
            std::process::exit(1);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON output on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    match command {
        "init" => {
            let data_dir = args.get(2).map(PathBuf::from).unwrap_or_else(resolve_data_dir);
            info!("Data directory: {}", data_dir.display());
            let config = FieldQuoteConfig::from_env(&data_dir)?;
            let store = SqliteStore::open(&config.data_paths.db_dir)?;
            store.ensure_catalog_tables(&config.sources)?;
            println!("Initialized {}", store.db_path().display());
            for source in &config.sources {
                println!("  {:<20} {} rows", source.id, store.count_rows(source)?);
            }
        }
        "resolve" => {
            let name = required_arg(&args, "fieldquote resolve <item-name>");
            let engine = Engine::open(&resolve_data_dir())?;
            print_json(&engine.resolver.resolve_detailed(name)?)?;
        }
        "suggest" => {
            let query = required_arg(&args, "fieldquote suggest <query>");
            let engine = Engine::open(&resolve_data_dir())?;
            let suggestions = suggest(
                engine.resolver.catalog(),
                engine.store.as_ref(),
                query,
                engine.config.matching.suggestion_limit,
            )?;
            print_json(&suggestions)?;
        }
        "quote" => {
            let path = required_arg(&args, "fieldquote quote <order.json>");
            let order: Order = serde_json::from_str(&std::fs::read_to_string(path)?)?;
            let engine = Engine::open(&resolve_data_dir())?;
            let quotation = price_order(&engine.resolver, &order, &engine.config.rates)?;
            print_json(&quotation)?;
        }
        "seed-aliases" => {
            let engine = Engine::open(&resolve_data_dir())?;
            let report = seed_aliases(engine.resolver.catalog(), engine.store.as_ref())?;
            print_json(&report)?;
        }
        "--validate" | "validate" => {
            let data_dir = args.get(2).map(PathBuf::from).unwrap_or_else(resolve_data_dir);
            let config = FieldQuoteConfig::from_env(&data_dir)?;
            let report = validate::validate(&config);
            validate::print_report(&report);
            std::process::exit(if report.db_valid { 0 } else { 1 });
        }
        "--help" | "-h" | "help" => {
            println!("FieldQuote: item-name resolution and quotation pricing");
            println!();
            println!("Usage: fieldquote <command>");
            println!();
            println!("Commands:");
            println!("  init [data-dir]          Create the alias and catalog tables");
            println!("  resolve <name>           Resolve an item name, print JSON");
            println!("  suggest <query>          Print matching catalog names");
            println!("  quote <order.json>       Price an order file, print the quotation");
            println!("  seed-aliases             Derive aliases from every catalog name");
            println!("  validate [data-dir]      Validate the database");
            println!("  help                     Show this help message");
            println!();
            println!("Environment:");
            println!("  FIELDQUOTE_DATA_DIR           Data directory (default: data)");
            println!("  FIELDQUOTE_MATCH_THRESHOLD    Fuzzy match threshold (default: 0.78)");
            println!("  FIELDQUOTE_SOURCE_PRIORITY    Comma-separated source ids in lookup order");
            println!("  RUST_LOG                      Log filter (default: info)");
        }
        other => {
            eprintln!("Unknown command: {}. Use 'fieldquote help' for usage.", other);
            std::process::exit(1);
        }
    }

    Ok(())
}
