//! Scalar cache state: timestamps and the status snapshot blob, plus the
//! staleness gate that decides when a remote dataset must be refetched.

pub mod clock;
pub mod gate;
pub mod kv;

pub use clock::{Clock, SystemClock};
pub use gate::{CacheGate, CacheSlot};
pub use kv::{JsonFileKv, KvError, KvStore, MemoryKv};
