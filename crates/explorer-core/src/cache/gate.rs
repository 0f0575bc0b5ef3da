use std::time::Duration;

use super::{Clock, KvError, KvStore};
use crate::constants::keys;

/// The two remote datasets whose freshness is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSlot {
    Catalog,
    UserStatus,
}

impl CacheSlot {
    pub const ALL: [CacheSlot; 2] = [CacheSlot::Catalog, CacheSlot::UserStatus];

    pub fn key(&self) -> &'static str {
        match self {
            CacheSlot::Catalog => keys::CATALOG_CACHED,
            CacheSlot::UserStatus => keys::USER_STATUS_CACHED,
        }
    }
}

/// Decides per slot whether cached data is stale, from a stored timestamp and a TTL.
pub struct CacheGate<'a> {
    kv: &'a dyn KvStore,
    clock: &'a dyn Clock,
}

impl<'a> CacheGate<'a> {
    pub fn new(kv: &'a dyn KvStore, clock: &'a dyn Clock) -> Self {
        Self { kv, clock }
    }

    /// Stored timestamp for `key`. Unparseable values count as absent.
    pub fn timestamp(&self, key: &str) -> Option<i64> {
        self.kv.get(key)?.trim().parse().ok()
    }

    /// True if no timestamp is recorded for `key`, or if more than `ttl` has
    /// elapsed since it was recorded.
    pub fn is_stale(&self, key: &str, ttl: Duration) -> bool {
        match self.timestamp(key) {
            Some(cached_at) => {
                let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
                self.clock.now_millis().saturating_sub(cached_at) > ttl_millis
            }
            None => true,
        }
    }

    pub fn is_slot_stale(&self, slot: CacheSlot, ttl: Duration) -> bool {
        self.is_stale(slot.key(), ttl)
    }

    /// Record a successful refresh of `slot` at the current time.
    pub fn touch(&self, slot: CacheSlot) -> Result<(), KvError> {
        self.kv
            .set(slot.key(), &self.clock.now_millis().to_string())
    }

    /// Reset both slots to the epoch so the next check is stale regardless of TTL.
    pub fn invalidate(&self) -> Result<(), KvError> {
        for slot in CacheSlot::ALL {
            self.kv.set(slot.key(), "0")?;
        }
        tracing::info!("Cache invalidated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::cache::MemoryKv;

    const HOUR: Duration = Duration::from_secs(3600);
    // 2023-11-14T22:13:20Z
    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_missing_timestamp_is_stale() {
        let kv = MemoryKv::new();
        let clock = ManualClock::at(NOW);
        let gate = CacheGate::new(&kv, &clock);

        assert!(gate.is_stale("catalog.cached", HOUR));
        assert!(gate.is_stale("catalog.cached", Duration::MAX));
    }

    #[test]
    fn test_fresh_until_ttl_elapses() {
        let kv = MemoryKv::new();
        let clock = ManualClock::at(NOW);
        let gate = CacheGate::new(&kv, &clock);

        gate.touch(CacheSlot::Catalog).unwrap();
        assert!(!gate.is_slot_stale(CacheSlot::Catalog, HOUR));

        clock.advance(HOUR);
        // exactly at timestamp + ttl is still fresh
        assert!(!gate.is_slot_stale(CacheSlot::Catalog, HOUR));

        clock.advance(Duration::from_millis(1));
        assert!(gate.is_slot_stale(CacheSlot::Catalog, HOUR));
    }

    #[test]
    fn test_slots_are_independent() {
        let kv = MemoryKv::new();
        let clock = ManualClock::at(NOW);
        let gate = CacheGate::new(&kv, &clock);

        gate.touch(CacheSlot::UserStatus).unwrap();
        assert!(!gate.is_slot_stale(CacheSlot::UserStatus, HOUR));
        assert!(gate.is_slot_stale(CacheSlot::Catalog, HOUR));
    }

    #[test]
    fn test_invalidate_forces_staleness() {
        let kv = MemoryKv::new();
        let clock = ManualClock::at(NOW);
        let gate = CacheGate::new(&kv, &clock);

        gate.touch(CacheSlot::Catalog).unwrap();
        gate.touch(CacheSlot::UserStatus).unwrap();
        gate.invalidate().unwrap();

        assert_eq!(gate.timestamp(keys::CATALOG_CACHED), Some(0));
        assert!(gate.is_slot_stale(CacheSlot::Catalog, HOUR));
        assert!(gate.is_slot_stale(CacheSlot::UserStatus, HOUR));
    }

    #[test]
    fn test_garbage_timestamp_is_stale() {
        let kv = MemoryKv::new();
        kv.set(keys::CATALOG_CACHED, "yesterday").unwrap();
        let clock = ManualClock::at(NOW);
        let gate = CacheGate::new(&kv, &clock);

        assert_eq!(gate.timestamp(keys::CATALOG_CACHED), None);
        assert!(gate.is_slot_stale(CacheSlot::Catalog, HOUR));
    }
}
