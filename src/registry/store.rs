use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use super::{QueryKey, RegistryError};
use crate::schema::QUERIES;

/// Persistent side of the registry.
///
/// Implementations only need independent reads and writes. A row written by
/// `insert` must be visible to any later `find_by_key`/`contains_id`,
/// from this process or any other sharing the store.
pub trait QueryStore: Send + Sync {
    /// Id already registered for this key, if any
    fn find_by_key(&self, key: &QueryKey) -> Result<Option<i64>, RegistryError>;

    /// Whether some key already occupies this id
    fn contains_id(&self, id: i64) -> Result<bool, RegistryError>;

    fn insert(&self, id: i64, key: &QueryKey) -> Result<(), RegistryError>;
}

/// `queries` table in the local SQLite store
pub struct SqliteQueryStore {
    conn: Mutex<Connection>,
}

impl SqliteQueryStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl QueryStore for SqliteQueryStore {
    fn find_by_key(&self, key: &QueryKey) -> Result<Option<i64>, RegistryError> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare_cached(&format!("SELECT id FROM {} WHERE items = ?1", QUERIES.name))?;
        Ok(stmt
            .query_row(params![key.as_str()], |row| row.get(0))
            .optional()?)
    }

    fn contains_id(&self, id: i64) -> Result<bool, RegistryError> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare_cached(&format!("SELECT 1 FROM {} WHERE id = ?1", QUERIES.name))?;
        Ok(stmt.exists(params![id])?)
    }

    fn insert(&self, id: i64, key: &QueryKey) -> Result<(), RegistryError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&format!(
            "INSERT INTO {} (id, items) VALUES (?1, ?2)",
            QUERIES.name
        ))?;
        stmt.execute(params![id, key.as_str()])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::create_tables;

    fn store() -> SqliteQueryStore {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        SqliteQueryStore::new(conn)
    }

    #[test]
    fn test_insert_and_read_back() {
        let store = store();
        let key = QueryKey::new([587, 179]).unwrap();

        assert_eq!(store.find_by_key(&key).unwrap(), None);
        assert!(!store.contains_id(1).unwrap());

        store.insert(1, &key).unwrap();
        assert_eq!(store.find_by_key(&key).unwrap(), Some(1));
        assert!(store.contains_id(1).unwrap());
        assert!(!store.contains_id(2).unwrap());
    }

    #[test]
    fn test_duplicate_id_is_store_error() {
        let store = store();
        store.insert(1, &QueryKey::new([1]).unwrap()).unwrap();
        let err = store.insert(1, &QueryKey::new([2]).unwrap()).unwrap_err();
        assert!(matches!(err, RegistryError::Store(_)));
    }
}
