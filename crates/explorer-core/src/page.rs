use crate::constants::DETAIL_PATH_MARKER;
use crate::models::EntryId;

/// What the host page exposes to an activation: its path and origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    pub path: Option<String>,
    pub origin: String,
}

impl PageContext {
    pub fn new(path: Option<String>, origin: impl Into<String>) -> Self {
        Self {
            path,
            origin: origin.into(),
        }
    }

    /// The entry whose detail page is being viewed, if any.
    pub fn current_entry_id(&self) -> Option<EntryId> {
        self.path.as_deref().and_then(entry_id_from_path)
    }
}

/// Parse `/app/<id>/...`: the first two path segments must be the detail
/// marker and an integer id.
pub fn entry_id_from_path(path: &str) -> Option<EntryId> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let mut segments = path.strip_prefix('/').unwrap_or(path).split('/');

    match (segments.next(), segments.next()) {
        (Some(DETAIL_PATH_MARKER), Some(id)) => id.parse().ok(),
        _ => None,
    }
}
