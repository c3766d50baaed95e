use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::Catalog;
use crate::cli::Cli;
use crate::registry::{QueryRegistry, SqliteQueryStore};
use crate::writer::{create_tables, open_connection, FitStore};

const DB_FILE: &str = "fittings.db";

/// Runtime settings resolved from flags, environment and platform defaults
#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: PathBuf,
    pub catalog_path: Option<PathBuf>,
    pub store_timeout: Duration,
    pub verbose: bool,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let db_path = match &cli.db {
            Some(path) => path.clone(),
            None => default_db_path()?,
        };

        Ok(Self {
            db_path,
            catalog_path: cli.catalog.clone(),
            store_timeout: Duration::from_millis(cli.store_timeout_ms),
            verbose: cli.verbose,
        })
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        let Some(path) = &self.catalog_path else {
            bail!("No catalog configured; pass --catalog or set FITTINGS_CATALOG");
        };
        Catalog::load(path).with_context(|| format!("Failed to load catalog from {:?}", path))
    }

    pub fn open_fit_store(&self) -> Result<FitStore> {
        FitStore::open(&self.db_path, self.store_timeout)
    }

    pub fn open_registry(&self) -> Result<QueryRegistry<SqliteQueryStore>> {
        let conn = open_connection(&self.db_path, self.store_timeout)
            .with_context(|| format!("Failed to open database {:?}", self.db_path))?;
        create_tables(&conn).context("Failed to create tables")?;
        Ok(QueryRegistry::with_timeout(
            SqliteQueryStore::new(conn),
            self.store_timeout,
        ))
    }
}

/// `fittings.db` in the platform data directory
fn default_db_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "eve-fittings")
        .context("Could not determine data directory")?;
    let data_dir: &Path = proj_dirs.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data directory")?;
    Ok(data_dir.join(DB_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_settings_from_flags() {
        let cli = Cli::try_parse_from([
            "eve-fittings",
            "--db",
            "/tmp/fits.db",
            "--store-timeout-ms",
            "250",
            "init",
        ])
        .unwrap();
        let settings = Settings::from_cli(&cli).unwrap();

        assert_eq!(settings.db_path, PathBuf::from("/tmp/fits.db"));
        assert_eq!(settings.store_timeout, Duration::from_millis(250));
        assert!(!settings.verbose);
    }

    #[test]
    fn test_missing_catalog_is_error() {
        let settings = Settings {
            db_path: PathBuf::from("unused.db"),
            catalog_path: None,
            store_timeout: Duration::from_secs(1),
            verbose: false,
        };
        assert!(settings.load_catalog().is_err());
    }
}
