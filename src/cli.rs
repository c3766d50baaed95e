use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::catalog::TypeId;

#[derive(Parser, Debug)]
#[command(name = "eve-fittings")]
#[command(
    version,
    about = "Extract ship fittings from killmails and resolve item filters to query ids"
)]
pub struct Cli {
    /// SQLite store for fittings and query ids
    #[arg(long, global = true, env = "FITTINGS_DB")]
    pub db: Option<PathBuf>,

    /// Catalog: directory with items.json and groups.json, or an SDE SQLite database
    #[arg(long, global = true, env = "FITTINGS_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Upper bound on how long a store call may wait for a lock, in milliseconds
    #[arg(long, global = true, env = "FITTINGS_STORE_TIMEOUT_MS", default_value_t = 60_000)]
    pub store_timeout_ms: u64,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the store's tables and indexes
    Init,

    /// Extract fittings from JSON-lines killmail files
    Process {
        /// Killmail files, one zkillboard package per line
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Write fittings as JSON lines here instead of the store
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show one stored fitting
    Fit {
        /// Killmail id
        killmail: i64,
    },

    /// List stored fittings that contain the given ship and items
    Fits {
        /// Ship type id
        #[arg(long)]
        ship: Option<TypeId>,

        /// Item type id (repeatable)
        #[arg(long = "item")]
        items: Vec<TypeId>,

        /// Maximum number of fittings to return
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// Resolve a set of item ids to its query id
    Resolve {
        #[arg(required = true)]
        items: Vec<TypeId>,
    },

    /// Search catalog groups and items by name
    Search {
        #[arg(required = true)]
        term: Vec<String>,
    },

    /// List the store's tables, or one table's columns and indexes
    ListTables {
        /// Table to describe
        table: Option<String>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fits_filter() {
        let cli = Cli::try_parse_from([
            "eve-fittings",
            "fits",
            "--ship",
            "587",
            "--item",
            "2046",
            "--item",
            "11293",
            "--db",
            "fits.db",
        ])
        .unwrap();

        assert_eq!(cli.db, Some(PathBuf::from("fits.db")));
        match cli.command {
            Commands::Fits { ship, items, limit } => {
                assert_eq!(ship, Some(587));
                assert_eq!(items, vec![2046, 11293]);
                assert_eq!(limit, 50);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_list_tables_with_name() {
        let cli = Cli::try_parse_from(["eve-fittings", "list-tables", "queries"]).unwrap();
        match cli.command {
            Commands::ListTables { table } => assert_eq!(table.as_deref(), Some("queries")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_process_requires_input() {
        assert!(Cli::try_parse_from(["eve-fittings", "process"]).is_err());
    }
}
