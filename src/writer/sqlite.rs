use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::schema_gen::{generate_create_table, generate_indexes};
use super::FittingSink;
use crate::catalog::TypeId;
use crate::fitting::CanonicalFitting;
use crate::schema::{ALL_TABLES, FITS, FIT_ITEMS};

pub const BATCH_SIZE: usize = 1000;

/// Open (creating if needed) the local store with the busy timeout bounding
/// every blocking call.
pub fn open_connection(db_path: &Path, busy_timeout: Duration) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(busy_timeout)?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(conn)
}

/// Create every table and index that does not exist yet
pub fn create_tables(conn: &Connection) -> rusqlite::Result<()> {
    for schema in ALL_TABLES {
        conn.execute(&generate_create_table(schema), [])?;
        for index_sql in generate_indexes(schema) {
            conn.execute(&index_sql, [])?;
        }
    }
    Ok(())
}

/// Stored fittings, keyed by killmail id
pub struct FitStore {
    conn: Connection,
    pending: Vec<CanonicalFitting>,
}

impl FitStore {
    pub fn open(db_path: &Path, busy_timeout: Duration) -> Result<Self> {
        let conn = open_connection(db_path, busy_timeout)
            .with_context(|| format!("Failed to open database {:?}", db_path))?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        create_tables(&conn).context("Failed to create tables")?;
        Ok(Self {
            conn,
            pending: Vec::with_capacity(BATCH_SIZE),
        })
    }

    /// Write fittings in one transaction, replacing any with the same killmail id
    pub fn insert_batch(&mut self, batch: &[CanonicalFitting]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut insert_fit = tx.prepare_cached(&format!(
                "INSERT OR REPLACE INTO {} (killmail, ship, cost, data) VALUES (?1, ?2, ?3, ?4)",
                FITS.name
            ))?;
            let mut clear_items = tx.prepare_cached(&format!(
                "DELETE FROM {} WHERE killmail = ?1",
                FIT_ITEMS.name
            ))?;
            let mut insert_item = tx.prepare_cached(&format!(
                "INSERT INTO {} (killmail, item) VALUES (?1, ?2)",
                FIT_ITEMS.name
            ))?;

            for fitting in batch {
                let data = serde_json::to_string(fitting)
                    .with_context(|| format!("Failed to encode fitting {}", fitting.id))?;
                insert_fit.execute(params![fitting.id, fitting.ship, fitting.cost, data])?;
                clear_items.execute(params![fitting.id])?;
                for item in &fitting.query_items {
                    insert_item.execute(params![fitting.id, item])?;
                }
            }
        }
        tx.commit()?;
        debug!(count = batch.len(), "wrote fittings batch");
        Ok(())
    }

    pub fn get(&self, killmail: i64) -> Result<Option<CanonicalFitting>> {
        let data: Option<String> = self
            .conn
            .query_row(
                &format!("SELECT data FROM {} WHERE killmail = ?1", FITS.name),
                params![killmail],
                |row| row.get(0),
            )
            .optional()?;

        data.map(|data| {
            serde_json::from_str(&data)
                .with_context(|| format!("Corrupt fitting stored for killmail {}", killmail))
        })
        .transpose()
    }

    /// Newest fittings containing every one of `items`.
    ///
    /// An empty filter returns the newest fittings overall.
    pub fn matching(&self, items: &[TypeId], limit: usize) -> Result<Vec<CanonicalFitting>> {
        let mut items = items.to_vec();
        items.sort_unstable();
        items.dedup();

        let (sql, mut args): (String, Vec<i64>) = if items.is_empty() {
            (
                format!(
                    "SELECT data FROM {} ORDER BY killmail DESC LIMIT ?",
                    FITS.name
                ),
                Vec::new(),
            )
        } else {
            let placeholders = vec!["?"; items.len()].join(", ");
            (
                format!(
                    "SELECT f.data FROM {fits} f \
                     JOIN {fit_items} i ON i.killmail = f.killmail \
                     WHERE i.item IN ({placeholders}) \
                     GROUP BY f.killmail \
                     HAVING COUNT(DISTINCT i.item) = ? \
                     ORDER BY f.killmail DESC LIMIT ?",
                    fits = FITS.name,
                    fit_items = FIT_ITEMS.name,
                ),
                items
                    .iter()
                    .map(|&i| i64::from(i))
                    .chain([items.len() as i64])
                    .collect(),
            )
        };
        args.push(limit as i64);

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), |row| row.get::<_, String>(0))?;

        let mut fittings = Vec::new();
        for data in rows {
            let fitting = serde_json::from_str(&data?).context("Corrupt fitting in store")?;
            fittings.push(fitting);
        }
        Ok(fittings)
    }

    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", FITS.name), [], |row| {
                row.get(0)
            })?;
        Ok(count as u64)
    }

    /// Flush pending writes and optimize the database
    pub fn finalize(mut self) -> Result<()> {
        self.flush()?;
        self.conn.execute_batch("PRAGMA optimize;")?;
        Ok(())
    }
}

impl FittingSink for FitStore {
    fn accept(&mut self, fitting: CanonicalFitting) -> Result<()> {
        self.pending.push(fitting);
        if self.pending.len() >= BATCH_SIZE {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.pending);
        self.insert_batch(&batch)
    }
}
