//! Application-wide constants
//!
//! Endpoint defaults, cache slot names and the markers that identify
//! non-canonical catalog entries.

/// Remote catalog of every app on the store
pub const CATALOG_URL: &str = "https://api.steampowered.com/ISteamApps/GetAppList/v2/";

/// Per-user owned/ignored/wishlisted document (requires a store session cookie)
pub const USER_STATUS_URL: &str = "https://store.steampowered.com/dynamicstore/userdata/";

/// Origin used to build navigation links
pub const STORE_ORIGIN: &str = "https://store.steampowered.com";

/// Path segment that precedes an entry id on detail pages (`/app/<id>/...`)
pub const DETAIL_PATH_MARKER: &str = "app";

/// Default cache lifetime for both remote datasets
pub const DEFAULT_TTL_SECS: u64 = 60 * 60; // 1 hour

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Name suffixes of demo/playtest variants; such entries are never stored.
pub const NON_CANONICAL_SUFFIXES: [&str; 2] = [" Demo", " Playtest"];

// Scalar cache keys
pub mod keys {
    /// Timestamp (unix millis) of the last successful catalog refresh
    pub const CATALOG_CACHED: &str = "catalog.cached";
    /// Timestamp (unix millis) of the last successful user status refresh
    pub const USER_STATUS_CACHED: &str = "user_status.cached";
    /// Serialized user status snapshot
    pub const USER_STATUS_STORED: &str = "user_status.stored";
}

// Navigation labels
pub const NEXT_LABEL: &str = "Next";
pub const RANDOM_LABEL: &str = "Random";
