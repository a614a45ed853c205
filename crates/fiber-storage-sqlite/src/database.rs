//! SQLite-backed storage

use crate::storage::{ConfigRecord, Storage};
use crate::{migrations, Error, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Address book file on disk
pub struct SqliteStorage {
    path: Option<PathBuf>,
    conn: Mutex<Option<Connection>>,
}

impl SqliteStorage {
    /// Open (or create) the store at `path` and bring its schema up to date
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();

        if let Some(parent) = path_buf.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            &path_buf,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        migrations::run_migrations(&conn)?;

        tracing::debug!("Opened address book store at {}", path_buf.display());

        Ok(Self {
            path: Some(path_buf),
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Run `f` against the open connection
    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self.conn.lock();
        let conn = guard.as_ref().ok_or(Error::NotOpen)?;
        f(conn)
    }
}

fn to_row_id(id: u64) -> Result<i64> {
    i64::try_from(id).map_err(|_| Error::NotFound(id))
}

fn from_row_id(id: i64) -> Result<u64> {
    u64::try_from(id).map_err(|_| Error::Storage(format!("Negative row id: {}", id)))
}

impl Storage for SqliteStorage {
    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn insert_config(&mut self, config: ConfigRecord) -> Result<()> {
        let conn = self.conn.get_mut().as_mut().ok_or(Error::NotOpen)?;
        if config.is_empty() {
            return Err(Error::Config("Config record is empty".to_string()));
        }
        let tx = conn.transaction()?;

        let existing: i64 = tx.query_row("SELECT COUNT(*) FROM config", [], |row| row.get(0))?;
        if existing > 0 {
            return Err(Error::AlreadyInitialized);
        }

        for (key, value) in &config {
            tx.execute(
                "INSERT INTO config (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }
        tx.commit()?;

        Ok(())
    }

    fn get_config(&self) -> Result<Option<ConfigRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT key, value FROM config")?;
            let config = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                .collect::<std::result::Result<ConfigRecord, _>>()?;

            if config.is_empty() {
                Ok(None)
            } else {
                Ok(Some(config))
            }
        })
    }

    fn insert_value(&mut self, value: &[u8]) -> Result<u64> {
        self.with_conn(|conn| {
            conn.execute("INSERT INTO contacts (blob) VALUES (?1)", params![value])?;
            from_row_id(conn.last_insert_rowid())
        })
    }

    fn get_value(&self, id: u64) -> Result<Vec<u8>> {
        let row_id = to_row_id(id)?;
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT blob FROM contacts WHERE id = ?1",
                params![row_id],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?
            .ok_or(Error::NotFound(id))
        })
    }

    fn list_values(&self) -> Result<BTreeMap<u64, Vec<u8>>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, blob FROM contacts ORDER BY id ASC")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Vec<u8>>(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter()
                .map(|(id, blob)| Ok((from_row_id(id)?, blob)))
                .collect()
        })
    }

    fn update_value(&mut self, id: u64, value: &[u8]) -> Result<()> {
        let row_id = to_row_id(id)?;
        self.with_conn(|conn| {
            let rows = conn.execute(
                "UPDATE contacts SET blob = ?1 WHERE id = ?2",
                params![value, row_id],
            )?;
            if rows == 0 {
                return Err(Error::NotFound(id));
            }
            Ok(())
        })
    }

    fn delete_value(&mut self, id: u64) -> Result<()> {
        let row_id = to_row_id(id)?;
        self.with_conn(|conn| {
            let rows = conn.execute("DELETE FROM contacts WHERE id = ?1", params![row_id])?;
            if rows == 0 {
                return Err(Error::NotFound(id));
            }
            Ok(())
        })
    }

    fn count_values(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;
            from_row_id(count)
        })
    }

    fn close(&mut self) -> Result<()> {
        // The handle counts as closed even if SQLite reports an error below
        let path = self.path.take();
        if let Some(conn) = self.conn.get_mut().take() {
            conn.close().map_err(|(_, e)| Error::Database(e))?;
            if let Some(path) = path {
                tracing::debug!("Closed address book store at {}", path.display());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, SqliteStorage) {
        let dir = TempDir::new().unwrap();
        let storage = SqliteStorage::open(dir.path().join("data.dt")).unwrap();
        (dir, storage)
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".fiber").join("data.dt");
        let storage = SqliteStorage::open(&path).unwrap();
        assert_eq!(storage.path(), Some(path.as_path()));
        assert!(path.exists());
    }

    #[test]
    fn test_value_crud() {
        let (_dir, mut storage) = open_temp();

        let id = storage.insert_value(b"first").unwrap();
        assert_eq!(id, 1);
        assert_eq!(storage.get_value(id).unwrap(), b"first");

        storage.update_value(id, b"changed").unwrap();
        assert_eq!(storage.get_value(id).unwrap(), b"changed");

        storage.delete_value(id).unwrap();
        assert!(matches!(storage.get_value(id), Err(Error::NotFound(1))));
        assert!(matches!(storage.update_value(id, b"x"), Err(Error::NotFound(1))));
        assert!(matches!(storage.delete_value(id), Err(Error::NotFound(1))));
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let (_dir, mut storage) = open_temp();

        let a = storage.insert_value(b"a").unwrap();
        let b = storage.insert_value(b"b").unwrap();
        storage.delete_value(b).unwrap();
        let c = storage.insert_value(b"c").unwrap();

        assert!(a < b && b < c);
    }

    #[test]
    fn test_list_values_ordered() {
        let (_dir, mut storage) = open_temp();
        for blob in [b"x", b"y", b"z"] {
            storage.insert_value(blob).unwrap();
        }

        let values = storage.list_values().unwrap();
        let ids: Vec<u64> = values.keys().copied().collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(values[&2], b"y");
        assert_eq!(storage.count_values().unwrap(), 3);
    }

    #[test]
    fn test_config_written_once() {
        let (_dir, mut storage) = open_temp();
        assert!(storage.get_config().unwrap().is_none());

        let mut config = ConfigRecord::new();
        config.insert("secType".to_string(), "0".to_string());
        storage.insert_config(config.clone()).unwrap();
        assert_eq!(storage.get_config().unwrap(), Some(config.clone()));

        assert!(matches!(
            storage.insert_config(config),
            Err(Error::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_empty_config_rejected() {
        let (_dir, mut storage) = open_temp();
        assert!(matches!(
            storage.insert_config(ConfigRecord::new()),
            Err(Error::Config(_))
        ));
        assert!(storage.get_config().unwrap().is_none());
    }

    #[test]
    fn test_close_is_idempotent_and_blocks_access() {
        let (_dir, mut storage) = open_temp();
        storage.close().unwrap();
        storage.close().unwrap();

        assert!(storage.path().is_none());
        assert!(!storage.is_open());
        assert!(matches!(storage.list_values(), Err(Error::NotOpen)));
        assert!(matches!(storage.insert_value(b"x"), Err(Error::NotOpen)));
        assert!(matches!(storage.get_config(), Err(Error::NotOpen)));
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.dt");

        let mut storage = SqliteStorage::open(&path).unwrap();
        storage.insert_value(b"kept").unwrap();
        let removed = storage.insert_value(b"removed").unwrap();
        storage.delete_value(removed).unwrap();
        storage.close().unwrap();

        let mut storage = SqliteStorage::open(&path).unwrap();
        assert_eq!(storage.get_value(1).unwrap(), b"kept");
        // AUTOINCREMENT remembers the deleted id across sessions
        assert_eq!(storage.insert_value(b"new").unwrap(), 3);
    }
}
