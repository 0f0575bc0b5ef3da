use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::EntryId;

/// Point-in-time classification of catalog entries for the current user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserStatus {
    pub owned: HashSet<EntryId>,
    pub ignored: HashSet<EntryId>,
    pub wishlisted: HashSet<EntryId>,
}

/// Wire shape of the user status endpoint, also used for the cached blob.
///
/// `rgIgnoredApps` is an object keyed by id; the endpoint sends `[]` when it is empty.
#[derive(Debug, Default, Serialize, Deserialize)]
struct UserStatusDocument {
    #[serde(rename = "rgOwnedApps", default)]
    owned: Vec<Value>,
    #[serde(rename = "rgIgnoredApps", default)]
    ignored: Value,
    #[serde(rename = "rgWishlist", default)]
    wishlisted: Vec<Value>,
}

fn collect_ids(values: &[Value]) -> HashSet<EntryId> {
    values.iter().filter_map(Value::as_u64).collect()
}

fn collect_ignored(value: &Value) -> HashSet<EntryId> {
    match value {
        Value::Object(map) => map.keys().filter_map(|key| key.parse().ok()).collect(),
        Value::Array(values) => collect_ids(values),
        _ => HashSet::new(),
    }
}

impl UserStatus {
    /// Build a snapshot from the endpoint's JSON document.
    /// Missing collections are empty; non-integer ids are dropped.
    pub fn from_document(doc: Value) -> Result<Self, serde_json::Error> {
        let doc: UserStatusDocument = serde_json::from_value(doc)?;
        Ok(Self {
            owned: collect_ids(&doc.owned),
            ignored: collect_ignored(&doc.ignored),
            wishlisted: collect_ids(&doc.wishlisted),
        })
    }

    pub fn from_blob(blob: &str) -> Result<Self, serde_json::Error> {
        Self::from_document(serde_json::from_str(blob)?)
    }

    /// Serialize back to the endpoint's document shape. Ids are sorted so the
    /// blob is stable for a given snapshot.
    pub fn to_blob(&self) -> Result<String, serde_json::Error> {
        let sorted = |ids: &HashSet<EntryId>| {
            let mut ids: Vec<EntryId> = ids.iter().copied().collect();
            ids.sort_unstable();
            ids
        };

        let ignored: BTreeMap<String, Value> = sorted(&self.ignored)
            .into_iter()
            .map(|id| (id.to_string(), Value::from(0)))
            .collect();

        let doc = UserStatusDocument {
            owned: sorted(&self.owned).into_iter().map(Value::from).collect(),
            ignored: serde_json::to_value(ignored)?,
            wishlisted: sorted(&self.wishlisted).into_iter().map(Value::from).collect(),
        };
        serde_json::to_string(&doc)
    }

    pub fn is_owned(&self, id: EntryId) -> bool {
        self.owned.contains(&id)
    }

    pub fn is_ignored(&self, id: EntryId) -> bool {
        self.ignored.contains(&id)
    }

    pub fn is_wishlisted(&self, id: EntryId) -> bool {
        self.wishlisted.contains(&id)
    }
}
