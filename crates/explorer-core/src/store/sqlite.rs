use std::ops::ControlFlow;
use std::path::Path;

use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Direction, EntryStore, IndexQuery, StoreError};
use crate::models::{Entry, EntryId};

/// Bump when the table or index layout changes. Older (or absent) versions
/// are dropped and recreated on open.
pub const SCHEMA_VERSION: i64 = 1;

const COLUMNS: &str = "id, name, seen, owned, ignored, wishlisted";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) the store at `path` and run the schema upgrade.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            StoreError::Unavailable(format!("cannot open {}: {}", path.display(), e))
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Unavailable(format!("cannot open in-memory store: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(mut conn: Connection) -> Result<Self, StoreError> {
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version > SCHEMA_VERSION {
            return Err(StoreError::IncompatibleSchema {
                found: version,
                supported: SCHEMA_VERSION,
            });
        }
        if version < SCHEMA_VERSION {
            upgrade(&mut conn, version)?;
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn schema_version(&self) -> Result<i64, StoreError> {
        let conn = self.conn.lock();
        Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }
}

/// (Re)create the table and its indexes in one transaction.
fn upgrade(conn: &mut Connection, from_version: i64) -> Result<(), StoreError> {
    let tx = conn.transaction()?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS entries;
        CREATE TABLE entries (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            seen INTEGER NOT NULL,
            owned INTEGER NOT NULL,
            ignored INTEGER NOT NULL,
            wishlisted INTEGER NOT NULL
        );
        CREATE INDEX idx_name ON entries(name, id);
        CREATE INDEX idx_seen ON entries(seen, id);
        CREATE INDEX idx_owned ON entries(owned, id);
        CREATE INDEX idx_ignored ON entries(ignored, id);
        CREATE INDEX idx_wishlisted ON entries(wishlisted, id);
        PRAGMA user_version = {SCHEMA_VERSION};"
    ))?;
    tx.commit()?;

    tracing::info!(
        "Store schema upgraded from version {} to {}",
        from_version,
        SCHEMA_VERSION
    );
    Ok(())
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        id: row.get(0)?,
        name: row.get(1)?,
        seen: row.get(2)?,
        owned: row.get(3)?,
        ignored: row.get(4)?,
        wishlisted: row.get(5)?,
    })
}

fn key_value(query: &IndexQuery) -> Value {
    match query {
        IndexQuery::Name(name) => Value::Text(name.clone()),
        IndexQuery::Flag(_, value) => Value::Integer(i64::from(*value)),
    }
}

fn order(direction: Direction) -> &'static str {
    match direction {
        Direction::Ascending => "ASC",
        Direction::Descending => "DESC",
    }
}

const INSERT_SQL: &str = "INSERT OR REPLACE INTO entries (id, name, seen, owned, ignored, wishlisted)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

impl EntryStore for SqliteStore {
    fn put(&self, entry: &Entry) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            INSERT_SQL,
            params![
                entry.id,
                entry.name,
                entry.seen,
                entry.owned,
                entry.ignored,
                entry.wishlisted
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: EntryId) -> Result<Option<Entry>, StoreError> {
        let conn = self.conn.lock();
        let entry = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM entries WHERE id = ?1"),
                params![id],
                entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    fn replace_all(&self, entries: &[Entry]) -> Result<(), StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM entries", [])?;
        {
            let mut stmt = tx.prepare(INSERT_SQL)?;
            for entry in entries {
                stmt.execute(params![
                    entry.id,
                    entry.name,
                    entry.seen,
                    entry.owned,
                    entry.ignored,
                    entry.wishlisted
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn len(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock();
        Ok(conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?)
    }

    fn count(&self, query: &IndexQuery) -> Result<u64, StoreError> {
        let conn = self.conn.lock();
        let sql = format!("SELECT COUNT(*) FROM entries WHERE {} = ?1", query.column());
        Ok(conn.query_row(&sql, params![key_value(query)], |row| row.get(0))?)
    }

    fn cursor(
        &self,
        query: &IndexQuery,
        direction: Direction,
        visit: &mut dyn FnMut(Entry) -> ControlFlow<()>,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {COLUMNS} FROM entries WHERE {} = ?1 ORDER BY id {}",
            query.column(),
            order(direction)
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let mut rows = stmt.query(params![key_value(query)])?;

        while let Some(row) = rows.next()? {
            if visit(entry_from_row(row)?).is_break() {
                break;
            }
        }
        Ok(())
    }

    /// Seeks with OFFSET instead of walking the cursor.
    fn nth(
        &self,
        query: &IndexQuery,
        direction: Direction,
        n: u64,
    ) -> Result<Option<Entry>, StoreError> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {COLUMNS} FROM entries WHERE {} = ?1 ORDER BY id {} LIMIT 1 OFFSET ?2",
            query.column(),
            order(direction)
        );
        let entry = conn
            .query_row(&sql, params![key_value(query), n], entry_from_row)
            .optional()?;
        Ok(entry)
    }
}
