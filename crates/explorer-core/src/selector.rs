//! Deterministic and random selection over the unseen partition.
//!
//! Both operations walk the `seen = false` index newest first (descending id).

use std::ops::ControlFlow;

use rand::Rng;
use serde::Serialize;

use crate::models::EntryId;
use crate::store::{Direction, EntryStore, IndexQuery, StoreError};

/// Ids picked by one activation. `None` means every entry has been seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub next: Option<EntryId>,
    pub random: Option<EntryId>,
}

pub struct Selector<'a, S: EntryStore + ?Sized> {
    store: &'a S,
    ceiling: Option<EntryId>,
}

impl<'a, S: EntryStore + ?Sized> Selector<'a, S> {
    /// `ceiling` excludes newer ids from `next_unseen`; `None` disables it.
    pub fn new(store: &'a S, ceiling: Option<EntryId>) -> Self {
        Self { store, ceiling }
    }

    /// Highest unseen id at or below the ceiling.
    pub fn next_unseen(&self) -> Result<Option<EntryId>, StoreError> {
        let mut next = None;

        self.store
            .cursor(&IndexQuery::unseen(), Direction::Descending, &mut |entry| {
                match self.ceiling {
                    Some(ceiling) if entry.id > ceiling => ControlFlow::Continue(()),
                    _ => {
                        next = Some(entry.id);
                        ControlFlow::Break(())
                    }
                }
            })?;

        Ok(next)
    }

    /// Uniformly random unseen id, using the thread RNG.
    pub fn random_unseen(&self) -> Result<Option<EntryId>, StoreError> {
        self.random_unseen_with(&mut rand::rng())
    }

    /// Count the partition, draw `r` in `[0, n)`, then take the `r`th entry
    /// of the descending cursor. Assumes no writer between count and seek.
    pub fn random_unseen_with<R: Rng>(
        &self,
        rng: &mut R,
    ) -> Result<Option<EntryId>, StoreError> {
        let query = IndexQuery::unseen();
        let n = self.store.count(&query)?;
        if n == 0 {
            return Ok(None);
        }

        let r = rng.random_range(0..n);
        let picked = self.store.nth(&query, Direction::Descending, r)?;
        Ok(picked.map(|entry| entry.id))
    }
}
