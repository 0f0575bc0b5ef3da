use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::EntryId;

/// An `{appid, name}` element of the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: EntryId,
    pub name: String,
}

impl CatalogItem {
    pub fn new(id: EntryId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Parse a single untyped catalog element.
    ///
    /// Returns `None` if `appid` is not a non-negative integer that fits the
    /// store's signed 64-bit key, or if `name` is missing or not a string.
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = value.get("appid")?.as_u64()?;
        if i64::try_from(id).is_err() {
            return None;
        }
        let name = value.get("name")?.as_str()?;
        Some(Self::new(id, name))
    }
}

/// Result of parsing a catalog document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogParse {
    pub items: Vec<CatalogItem>,
    /// Elements dropped for missing or invalid fields
    pub rejected: usize,
}

/// Parse `{"applist": {"apps": [...]}}`.
///
/// Fails only when the top-level shape is wrong. Malformed elements are
/// counted in `rejected` and skipped.
pub fn parse_catalog(doc: &Value) -> Result<CatalogParse, &'static str> {
    let apps = doc
        .get("applist")
        .and_then(|list| list.get("apps"))
        .and_then(Value::as_array)
        .ok_or("missing applist.apps array")?;

    let mut parsed = CatalogParse {
        items: Vec::with_capacity(apps.len()),
        rejected: 0,
    };

    for (index, app) in apps.iter().enumerate() {
        match CatalogItem::from_value(app) {
            Some(item) => parsed.items.push(item),
            None => {
                tracing::debug!("Rejected malformed catalog element #{}: {}", index, app);
                parsed.rejected += 1;
            }
        }
    }

    Ok(parsed)
}
