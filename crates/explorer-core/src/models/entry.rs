use serde::{Deserialize, Serialize};

use crate::constants::NON_CANONICAL_SUFFIXES;

/// Catalog identifier, assigned remotely and never reused.
pub type EntryId = u64;

/// One stored catalog entry with the user's status flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub name: String,
    pub owned: bool,
    pub ignored: bool,
    pub wishlisted: bool,
    /// Monotonic: set at creation from the status flags, or later by navigation.
    pub seen: bool,
}

/// Demo and playtest variants share a base title and are never stored.
pub fn is_canonical_name(name: &str) -> bool {
    !NON_CANONICAL_SUFFIXES
        .iter()
        .any(|suffix| name.ends_with(suffix))
}
