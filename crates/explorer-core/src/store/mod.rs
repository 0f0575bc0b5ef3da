//! Persistent entry store keyed by id, with secondary indexes on `name` and
//! each status flag.
//!
//! The [`EntryStore`] trait is the only thing the reconciler, selector and
//! seen tracker depend on. [`SqliteStore`] is the persistent engine;
//! [`MemoryStore`] backs tests and ephemeral sessions.

pub mod memory;
pub mod sqlite;

use std::ops::ControlFlow;

use crate::models::{Entry, EntryId};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store schema version {found} is newer than supported version {supported}")]
    IncompatibleSchema { found: i64, supported: i64 },

    #[error("Store operation failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Boolean status columns with a secondary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFlag {
    Seen,
    Owned,
    Ignored,
    Wishlisted,
}

impl StatusFlag {
    pub fn column(&self) -> &'static str {
        match self {
            StatusFlag::Seen => "seen",
            StatusFlag::Owned => "owned",
            StatusFlag::Ignored => "ignored",
            StatusFlag::Wishlisted => "wishlisted",
        }
    }

    pub fn get(&self, entry: &Entry) -> bool {
        match self {
            StatusFlag::Seen => entry.seen,
            StatusFlag::Owned => entry.owned,
            StatusFlag::Ignored => entry.ignored,
            StatusFlag::Wishlisted => entry.wishlisted,
        }
    }
}

/// A secondary index together with the key value to filter on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexQuery {
    Name(String),
    Flag(StatusFlag, bool),
}

impl IndexQuery {
    /// The `seen = false` partition.
    pub fn unseen() -> Self {
        IndexQuery::Flag(StatusFlag::Seen, false)
    }

    pub fn column(&self) -> &'static str {
        match self {
            IndexQuery::Name(_) => "name",
            IndexQuery::Flag(flag, _) => flag.column(),
        }
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        match self {
            IndexQuery::Name(name) => entry.name == *name,
            IndexQuery::Flag(flag, value) => flag.get(entry) == *value,
        }
    }
}

/// Cursor direction over `id` within one index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

pub trait EntryStore: Send + Sync {
    /// Insert or replace by id.
    fn put(&self, entry: &Entry) -> Result<(), StoreError>;

    fn get(&self, id: EntryId) -> Result<Option<Entry>, StoreError>;

    /// Replace the entire contents atomically: readers see either the old
    /// complete set or the new one.
    fn replace_all(&self, entries: &[Entry]) -> Result<(), StoreError>;

    fn len(&self) -> Result<u64, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn count(&self, query: &IndexQuery) -> Result<u64, StoreError>;

    /// Visit entries matching `query` ordered by id in `direction` until the
    /// visitor breaks. The visitor must not call back into the store.
    fn cursor(
        &self,
        query: &IndexQuery,
        direction: Direction,
        visit: &mut dyn FnMut(Entry) -> ControlFlow<()>,
    ) -> Result<(), StoreError>;

    /// The zero-based `n`th entry of the cursor, if the index has that many.
    fn nth(
        &self,
        query: &IndexQuery,
        direction: Direction,
        n: u64,
    ) -> Result<Option<Entry>, StoreError> {
        let mut position = 0u64;
        let mut found = None;

        self.cursor(query, direction, &mut |entry| {
            if position == n {
                found = Some(entry);
                ControlFlow::Break(())
            } else {
                position += 1;
                ControlFlow::Continue(())
            }
        })?;

        Ok(found)
    }
}

/// Shared behavioural checks run against every engine.
#[cfg(test)]
pub(crate) mod conformance {
    use super::*;

    pub(crate) fn entry(id: EntryId, name: &str, seen: bool) -> Entry {
        Entry {
            id,
            name: name.to_string(),
            owned: false,
            ignored: false,
            wishlisted: false,
            seen,
        }
    }

    fn collect(store: &dyn EntryStore, query: &IndexQuery, direction: Direction) -> Vec<EntryId> {
        let mut ids = Vec::new();
        store
            .cursor(query, direction, &mut |entry| {
                ids.push(entry.id);
                ControlFlow::Continue(())
            })
            .unwrap();
        ids
    }

    pub(crate) fn put_get_replace(store: &dyn EntryStore) {
        assert!(store.is_empty().unwrap());
        assert_eq!(store.get(1).unwrap(), None);

        store.put(&entry(1, "Foo", false)).unwrap();
        store.put(&entry(1, "Foo Renamed", true)).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.get(1).unwrap(), Some(entry(1, "Foo Renamed", true)));

        store
            .replace_all(&[entry(2, "Bar", false), entry(3, "Baz", false)])
            .unwrap();
        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.get(1).unwrap(), None);
        assert!(store.get(3).unwrap().is_some());

        store.replace_all(&[]).unwrap();
        assert!(store.is_empty().unwrap());
    }

    pub(crate) fn index_cursors(store: &dyn EntryStore) {
        let mut owned = entry(4, "Owned", true);
        owned.owned = true;
        let mut wishlisted = entry(7, "Shared", true);
        wishlisted.wishlisted = true;
        let mut ignored = entry(8, "Ignored", true);
        ignored.ignored = true;

        store
            .replace_all(&[
                entry(5, "Shared", false),
                entry(1, "One", false),
                owned,
                entry(9, "Nine", false),
                wishlisted,
                ignored,
            ])
            .unwrap();

        let unseen = IndexQuery::unseen();
        assert_eq!(collect(store, &unseen, Direction::Descending), vec![9, 5, 1]);
        assert_eq!(collect(store, &unseen, Direction::Ascending), vec![1, 5, 9]);
        assert_eq!(store.count(&unseen).unwrap(), 3);

        let seen = IndexQuery::Flag(StatusFlag::Seen, true);
        assert_eq!(collect(store, &seen, Direction::Ascending), vec![4, 7, 8]);

        let name = IndexQuery::Name("Shared".to_string());
        assert_eq!(collect(store, &name, Direction::Descending), vec![7, 5]);
        assert_eq!(store.count(&name).unwrap(), 2);

        let owned = IndexQuery::Flag(StatusFlag::Owned, true);
        assert_eq!(collect(store, &owned, Direction::Ascending), vec![4]);
        let ignored = IndexQuery::Flag(StatusFlag::Ignored, true);
        assert_eq!(collect(store, &ignored, Direction::Ascending), vec![8]);
        let wishlisted = IndexQuery::Flag(StatusFlag::Wishlisted, true);
        assert_eq!(collect(store, &wishlisted, Direction::Ascending), vec![7]);
        let not_wishlisted = IndexQuery::Flag(StatusFlag::Wishlisted, false);
        assert_eq!(store.count(&not_wishlisted).unwrap(), 5);

        // visitor can stop early
        let mut visited = 0;
        store
            .cursor(&unseen, Direction::Descending, &mut |_| {
                visited += 1;
                ControlFlow::Break(())
            })
            .unwrap();
        assert_eq!(visited, 1);

        let third = store.nth(&unseen, Direction::Descending, 2).unwrap();
        assert_eq!(third.map(|e| e.id), Some(1));
        assert_eq!(store.nth(&unseen, Direction::Descending, 3).unwrap(), None);
        assert_eq!(
            store.nth(&unseen, Direction::Ascending, 0).unwrap().map(|e| e.id),
            Some(1)
        );
    }
}
