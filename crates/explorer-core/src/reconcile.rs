//! Merge a freshly fetched catalog with the user status snapshot.

use std::collections::HashSet;

use serde::Serialize;

use crate::models::entry::is_canonical_name;
use crate::models::{CatalogItem, Entry, EntryId, UserStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    /// Entries emitted for storage
    pub stored: usize,
    /// Demo/playtest variants dropped
    pub discarded: usize,
    /// Repeated ids dropped (first occurrence wins)
    pub duplicates: usize,
}

/// Build the full entry set for the store.
///
/// Flags come from `status`; `seen` starts as `owned || ignored || wishlisted`.
/// Non-canonical names are dropped. Output order follows the catalog.
pub fn reconcile(catalog: &[CatalogItem], status: &UserStatus) -> (Vec<Entry>, ReconcileSummary) {
    let mut summary = ReconcileSummary::default();
    let mut ids: HashSet<EntryId> = HashSet::with_capacity(catalog.len());
    let mut entries = Vec::with_capacity(catalog.len());

    for item in catalog {
        if !is_canonical_name(&item.name) {
            summary.discarded += 1;
            continue;
        }
        if !ids.insert(item.id) {
            summary.duplicates += 1;
            continue;
        }

        let owned = status.is_owned(item.id);
        let ignored = status.is_ignored(item.id);
        let wishlisted = status.is_wishlisted(item.id);

        entries.push(Entry {
            id: item.id,
            name: item.name.clone(),
            owned,
            ignored,
            wishlisted,
            seen: owned || ignored || wishlisted,
        });
    }

    summary.stored = entries.len();
    (entries, summary)
}

/// Re-mark entries that were seen before the rebuild. Returns how many were carried.
pub fn carry_seen(entries: &mut [Entry], previously_seen: &HashSet<EntryId>) -> usize {
    let mut carried = 0;
    for entry in entries.iter_mut() {
        if !entry.seen && previously_seen.contains(&entry.id) {
            entry.seen = true;
            carried += 1;
        }
    }
    carried
}
