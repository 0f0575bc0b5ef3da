pub mod catalog;
pub mod entry;
pub mod user_status;

pub use catalog::{parse_catalog, CatalogItem, CatalogParse};
pub use entry::{Entry, EntryId};
pub use user_status::UserStatus;
