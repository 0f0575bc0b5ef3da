use std::collections::BTreeMap;
use std::ops::ControlFlow;

use parking_lot::RwLock;

use super::{Direction, EntryStore, IndexQuery, StoreError};
use crate::models::{Entry, EntryId};

/// Non-persistent store. Cursors iterate a snapshot taken under the read lock,
/// so a visitor never observes a concurrent `replace_all` halfway through.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<EntryId, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().map(|e| (e.id, e)).collect()),
        }
    }
}

impl EntryStore for MemoryStore {
    fn put(&self, entry: &Entry) -> Result<(), StoreError> {
        self.entries.write().insert(entry.id, entry.clone());
        Ok(())
    }

    fn get(&self, id: EntryId) -> Result<Option<Entry>, StoreError> {
        Ok(self.entries.read().get(&id).cloned())
    }

    fn replace_all(&self, entries: &[Entry]) -> Result<(), StoreError> {
        let rebuilt: BTreeMap<EntryId, Entry> =
            entries.iter().map(|e| (e.id, e.clone())).collect();
        *self.entries.write() = rebuilt;
        Ok(())
    }

    fn len(&self) -> Result<u64, StoreError> {
        Ok(self.entries.read().len() as u64)
    }

    fn count(&self, query: &IndexQuery) -> Result<u64, StoreError> {
        Ok(self
            .entries
            .read()
            .values()
            .filter(|e| query.matches(e))
            .count() as u64)
    }

    fn cursor(
        &self,
        query: &IndexQuery,
        direction: Direction,
        visit: &mut dyn FnMut(Entry) -> ControlFlow<()>,
    ) -> Result<(), StoreError> {
        let snapshot: Vec<Entry> = self
            .entries
            .read()
            .values()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();

        let ordered: Box<dyn Iterator<Item = Entry>> = match direction {
            Direction::Ascending => Box::new(snapshot.into_iter()),
            Direction::Descending => Box::new(snapshot.into_iter().rev()),
        };

        for entry in ordered {
            if visit(entry).is_break() {
                break;
            }
        }
        Ok(())
    }
}
