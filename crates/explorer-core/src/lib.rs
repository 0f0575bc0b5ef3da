pub mod affordance;
pub mod cache;
pub mod config;
pub mod constants;
pub mod models;
pub mod page;
pub mod reconcile;
pub mod remote;
pub mod seen;
pub mod selector;
pub mod session;
pub mod store;
pub mod tracing_setup;

// Re-export the session surface at crate root for convenience
pub use config::{CoreConfig, SelectionMode};
pub use models::{CatalogItem, Entry, EntryId, UserStatus};
pub use session::{ActivationReport, Session, SessionError};
