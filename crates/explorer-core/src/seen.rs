use serde::Serialize;

use crate::models::EntryId;
use crate::store::{EntryStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkOutcome {
    Marked,
    AlreadySeen,
    NotFound,
}

/// The only post-creation writer of `seen`.
pub struct SeenTracker<'a, S: EntryStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: EntryStore + ?Sized> SeenTracker<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Set `seen` on `id`. Unknown or already seen ids are a no-op.
    pub fn mark_seen(&self, id: EntryId) -> Result<MarkOutcome, StoreError> {
        let Some(mut entry) = self.store.get(id)? else {
            tracing::debug!("Entry {} not in store, nothing to mark", id);
            return Ok(MarkOutcome::NotFound);
        };

        if entry.seen {
            return Ok(MarkOutcome::AlreadySeen);
        }

        entry.seen = true;
        self.store.put(&entry)?;
        tracing::info!("Marked {} ({}) as seen", entry.id, entry.name);
        Ok(MarkOutcome::Marked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::conformance::entry;
    use crate::store::{IndexQuery, MemoryStore, SqliteStore};

    #[test]
    fn test_mark_seen() {
        let store = MemoryStore::with_entries([entry(1, "Foo", false), entry(3, "Baz", false)]);
        let tracker = SeenTracker::new(&store);

        assert_eq!(tracker.mark_seen(3).unwrap(), MarkOutcome::Marked);
        assert!(store.get(3).unwrap().unwrap().seen);
        assert!(!store.get(1).unwrap().unwrap().seen);
        assert_eq!(store.count(&IndexQuery::unseen()).unwrap(), 1);
    }

    #[test]
    fn test_mark_seen_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.put(&entry(7, "Foo", false)).unwrap();
        let tracker = SeenTracker::new(&store);

        assert_eq!(tracker.mark_seen(7).unwrap(), MarkOutcome::Marked);
        let once = store.get(7).unwrap();
        assert_eq!(tracker.mark_seen(7).unwrap(), MarkOutcome::AlreadySeen);
        assert_eq!(store.get(7).unwrap(), once);
    }

    #[test]
    fn test_mark_unknown_id() {
        let store = MemoryStore::new();
        let tracker = SeenTracker::new(&store);

        assert_eq!(tracker.mark_seen(42).unwrap(), MarkOutcome::NotFound);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_mark_keeps_status_flags() {
        let mut owned = entry(5, "Owned", true);
        owned.owned = true;
        let store = MemoryStore::with_entries([owned.clone()]);

        assert_eq!(
            SeenTracker::new(&store).mark_seen(5).unwrap(),
            MarkOutcome::AlreadySeen
        );
        assert_eq!(store.get(5).unwrap(), Some(owned));
    }
}
