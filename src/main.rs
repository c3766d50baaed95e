use anyhow::{Context, Result};
use eve_fittings::{
    catalog::{SearchResult, TypeId},
    cli::{Cli, Commands},
    config::Settings,
    fitting::{FittingView, NamedItem},
    registry::QueryKey,
    schema::{get_table, table_names},
    writer::{process_files, JsonLinesSink},
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).context("Failed to write output")?;
    writeln!(stdout)?;
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FitsResponse {
    query_id: Option<i64>,
    filter: BTreeMap<&'static str, Vec<NamedItem>>,
    fits: Vec<FittingView>,
}

#[derive(Serialize)]
struct ResolveResponse {
    id: i64,
    key: String,
}

#[derive(Serialize)]
struct SearchResponse {
    search: String,
    results: Vec<SearchResult>,
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    let settings = Settings::from_cli(&cli)?;
    init_tracing(settings.verbose);

    match cli.command {
        Commands::Init => {
            settings.open_fit_store()?;
            println!("Initialized {:?}", settings.db_path);
        }

        Commands::Process { inputs, output } => {
            let start = Instant::now();
            let catalog = settings.load_catalog()?;

            let stats = match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {:?}", path))?;
                    let mut sink = JsonLinesSink::new(BufWriter::new(file));
                    process_files(&catalog, &inputs, &mut sink)?
                }
                None => {
                    let mut store = settings.open_fit_store()?;
                    let stats = process_files(&catalog, &inputs, &mut store)?;
                    store.finalize()?;
                    stats
                }
            };

            println!(
                "\nAccepted {} of {} killmails ({} rejected, {} malformed) in {:.1}s",
                stats.accepted,
                stats.read,
                stats.rejected_total(),
                stats.malformed,
                start.elapsed().as_secs_f64()
            );
            for (reason, count) in &stats.rejected {
                println!("  {}: {}", reason, count);
            }
        }

        Commands::Fit { killmail } => {
            let catalog = settings.load_catalog()?;
            let store = settings.open_fit_store()?;
            let fitting = store
                .get(killmail)?
                .with_context(|| format!("No fitting stored for killmail {}", killmail))?;
            print_json(&fitting.hydrate(&catalog))?;
        }

        Commands::Fits { ship, items, limit } => {
            let catalog = settings.load_catalog()?;
            let mut filter: BTreeMap<&'static str, Vec<NamedItem>> = BTreeMap::new();
            let mut query: Vec<TypeId> = Vec::new();

            if let Some(ship) = ship.filter(|&id| id > 0) {
                query.push(ship);
                filter
                    .entry("ship")
                    .or_default()
                    .push(NamedItem::new(&catalog, ship));
            }
            for item in items.into_iter().filter(|&id| id > 0) {
                query.push(item);
                filter
                    .entry("item")
                    .or_default()
                    .push(NamedItem::new(&catalog, item));
            }

            let query_id = if query.is_empty() {
                None
            } else {
                let registry = settings.open_registry()?;
                let id = registry.resolve(query.iter().copied())?;
                info!(query_id = id, "resolved filter");
                Some(id)
            };

            let store = settings.open_fit_store()?;
            let fits = store
                .matching(&query, limit)?
                .iter()
                .map(|fitting| fitting.hydrate(&catalog))
                .collect();

            print_json(&FitsResponse {
                query_id,
                filter,
                fits,
            })?;
        }

        Commands::Resolve { items } => {
            let key = QueryKey::new(items)?;
            let registry = settings.open_registry()?;
            let id = registry.resolve_key(&key)?;
            print_json(&ResolveResponse {
                id,
                key: key.to_string(),
            })?;
        }

        Commands::Search { term } => {
            let catalog = settings.load_catalog()?;
            let term = term.join(" ");
            let results = catalog.search(&term);
            print_json(&SearchResponse {
                search: term.trim().to_lowercase(),
                results,
            })?;
        }

        Commands::ListTables { table: None } => {
            println!("Store tables:\n");
            for name in table_names() {
                println!("  {}", name);
            }
        }

        Commands::ListTables { table: Some(name) } => {
            let table = get_table(&name).with_context(|| {
                format!("Unknown table {:?}, expected one of {:?}", name, table_names())
            })?;
            println!("{}:\n", table.name);
            for column in table.columns {
                println!(
                    "  {:<10} {}{}{}",
                    column.name,
                    column.col_type.sql_type(),
                    if column.primary_key { " PRIMARY KEY" } else { "" },
                    if column.nullable { "" } else { " NOT NULL" }
                );
            }
            for index in table.indexes {
                let kind = if index.unique { "unique index" } else { "index" };
                println!("  {} on ({})", kind, index.columns.join(", "));
            }
        }
    }

    Ok(())
}
