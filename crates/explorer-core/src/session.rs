//! One activation's worth of state and the pipeline that drives it.
//!
//! Stages run strictly in order: user status, catalog, seen marking,
//! selection, injection. Only a store failure aborts an activation; fetch
//! failures fall back to cached data and are reported in the
//! [`ActivationReport`].

use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::Arc;

use serde::Serialize;

use crate::affordance::{inject, Affordance, AffordanceSurface};
use crate::cache::{CacheGate, CacheSlot, Clock, JsonFileKv, KvError, KvStore, SystemClock};
use crate::config::CoreConfig;
use crate::constants::{keys, NEXT_LABEL, RANDOM_LABEL};
use crate::models::{EntryId, UserStatus};
use crate::page::PageContext;
use crate::reconcile::{carry_seen, reconcile, ReconcileSummary};
use crate::remote::{FetchError, RemoteSource, SteamClient};
use crate::seen::{MarkOutcome, SeenTracker};
use crate::selector::{Selection, Selector};
use crate::store::{Direction, EntryStore, IndexQuery, SqliteStore, StatusFlag, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] FetchError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleCheck {
    Fresh,
    Stale,
}

/// Where the status snapshot used by this activation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSource {
    Fetched,
    Cached,
    /// Refetch failed; an older snapshot is in use
    CachedAfterFailure,
    /// Refetch failed and nothing was cached
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CatalogOutcome {
    Rebuilt {
        summary: ReconcileSummary,
        /// Malformed remote elements dropped before reconciliation
        rejected: usize,
        /// Entries kept seen because the user already navigated to them
        carried_seen: usize,
    },
    Reused,
    FetchFailed {
        error: String,
    },
    /// No status snapshot to reconcile against; store left untouched
    SkippedNoStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    pub status: StatusSource,
    pub catalog: CatalogOutcome,
    pub current_entry: Option<EntryId>,
    pub marked: Option<MarkOutcome>,
    pub selection: Selection,
    pub affordances: Vec<Affordance>,
}

/// Session context passed through every stage. Nothing here is global.
pub struct Session<R, S, K> {
    config: CoreConfig,
    remote: R,
    store: S,
    kv: K,
    clock: Arc<dyn Clock>,
    user_status: Option<UserStatus>,
}

impl Session<SteamClient, SqliteStore, JsonFileKv> {
    /// Open the on-disk store, then the scalar cache, then the HTTP client.
    pub fn open(config: CoreConfig) -> Result<Self, SessionError> {
        let store = SqliteStore::open(config.store_path())?;
        let kv = JsonFileKv::open(config.kv_path());
        let remote = SteamClient::new(&config)?;

        tracing::info!("Session opened at {}", config.data_dir.display());
        Ok(Self::new(config, remote, store, kv))
    }
}

impl<R: RemoteSource, S: EntryStore, K: KvStore> Session<R, S, K> {
    pub fn new(config: CoreConfig, remote: R, store: S, kv: K) -> Self {
        Self {
            config,
            remote,
            store,
            kv,
            clock: Arc::new(SystemClock),
            user_status: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    fn gate(&self) -> CacheGate<'_> {
        CacheGate::new(&self.kv, self.clock.as_ref())
    }

    pub fn check(&self, slot: CacheSlot) -> StaleCheck {
        let ttl = match slot {
            CacheSlot::Catalog => self.config.catalog_ttl(),
            CacheSlot::UserStatus => self.config.user_status_ttl(),
        };
        if self.gate().is_slot_stale(slot, ttl) {
            StaleCheck::Stale
        } else {
            StaleCheck::Fresh
        }
    }

    /// Force both datasets to be refetched on the next activation.
    pub fn invalidate(&self) -> Result<(), KvError> {
        self.gate().invalidate()
    }

    fn restore_user_status(&self) -> Option<UserStatus> {
        let blob = self.kv.get(keys::USER_STATUS_STORED)?;
        match UserStatus::from_blob(&blob) {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::warn!("Discarding unreadable user status snapshot: {}", e);
                None
            }
        }
    }

    /// Blob first, timestamp second: a fresh timestamp always has a snapshot behind it.
    fn persist_user_status(&self, status: &UserStatus) {
        let saved = status
            .to_blob()
            .map_err(KvError::from)
            .and_then(|blob| self.kv.set(keys::USER_STATUS_STORED, &blob))
            .and_then(|()| self.gate().touch(CacheSlot::UserStatus));

        if let Err(e) = saved {
            tracing::warn!("Failed to cache user status: {}", e);
        }
    }

    /// Status stage: reuse the cached snapshot while fresh, otherwise refetch.
    pub async fn refresh_user_status(&mut self) -> StatusSource {
        if self.check(CacheSlot::UserStatus) == StaleCheck::Fresh {
            if let Some(status) = self.restore_user_status() {
                self.user_status = Some(status);
                return StatusSource::Cached;
            }
            tracing::debug!("User status timestamp is fresh but no snapshot is stored");
        }

        match self.remote.fetch_user_status().await {
            Ok(status) => {
                self.persist_user_status(&status);
                self.user_status = Some(status);
                StatusSource::Fetched
            }
            Err(e) => {
                tracing::warn!("User status fetch failed: {}", e);
                if self.user_status.is_none() {
                    self.user_status = self.restore_user_status();
                }
                if self.user_status.is_some() {
                    StatusSource::CachedAfterFailure
                } else {
                    StatusSource::Unavailable
                }
            }
        }
    }

    /// Every id currently flagged seen, whatever set the flag.
    fn seen_ids(&self) -> Result<HashSet<EntryId>, StoreError> {
        let mut ids = HashSet::new();
        self.store.cursor(
            &IndexQuery::Flag(StatusFlag::Seen, true),
            Direction::Ascending,
            &mut |entry| {
                ids.insert(entry.id);
                ControlFlow::Continue(())
            },
        )?;
        Ok(ids)
    }

    /// Catalog stage: rebuild the store from a fresh catalog when stale.
    ///
    /// The store is only replaced after a complete fetch, and the catalog
    /// timestamp only moves after the store was replaced.
    pub async fn refresh_catalog(&mut self) -> Result<CatalogOutcome, StoreError> {
        let Some(status) = self.user_status.as_ref() else {
            tracing::warn!("No user status available, keeping current catalog");
            return Ok(CatalogOutcome::SkippedNoStatus);
        };

        let stale = self.check(CacheSlot::Catalog) == StaleCheck::Stale;
        if !stale && !self.store.is_empty()? {
            return Ok(CatalogOutcome::Reused);
        }

        let parsed = match self.remote.fetch_catalog().await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Catalog fetch failed: {}", e);
                return Ok(CatalogOutcome::FetchFailed {
                    error: e.to_string(),
                });
            }
        };

        tracing::info!("Updating entries in store");
        let (mut entries, summary) = reconcile(&parsed.items, status);

        let carried_seen = if self.config.preserve_seen_on_refresh {
            carry_seen(&mut entries, &self.seen_ids()?)
        } else {
            0
        };

        self.store.replace_all(&entries)?;
        if let Err(e) = self.gate().touch(CacheSlot::Catalog) {
            tracing::warn!("Failed to record catalog refresh: {}", e);
        }

        tracing::info!(
            "Entries up to date in store: {} stored, {} demo/playtest skipped, {} carried seen",
            summary.stored,
            summary.discarded,
            carried_seen
        );

        Ok(CatalogOutcome::Rebuilt {
            summary,
            rejected: parsed.rejected,
            carried_seen,
        })
    }

    pub fn mark_seen(&self, id: EntryId) -> Result<MarkOutcome, StoreError> {
        SeenTracker::new(&self.store).mark_seen(id)
    }

    /// Selection stage, per the configured mode.
    pub fn select(&self) -> Result<Selection, StoreError> {
        let selector = Selector::new(&self.store, self.config.id_ceiling);
        let mode = self.config.selection;

        let next = if mode.wants_next() {
            selector.next_unseen()?
        } else {
            None
        };
        let random = if mode.wants_random() {
            selector.random_unseen()?
        } else {
            None
        };

        Ok(Selection { next, random })
    }

    /// Run the full gate-check, fetch, reconcile, mark, select, inject sequence.
    pub async fn activate(
        &mut self,
        page: &PageContext,
        surface: &mut dyn AffordanceSurface,
    ) -> Result<ActivationReport, SessionError> {
        let status = self.refresh_user_status().await;
        let catalog = self.refresh_catalog().await?;

        let current_entry = page.current_entry_id();
        let marked = current_entry
            .map(|id| self.mark_seen(id))
            .transpose()?;

        let selection = self.select()?;
        match selection.next.or(selection.random) {
            Some(id) => tracing::info!("Next entry to see is {}", id),
            None => tracing::info!("No unseen entries left"),
        }

        let mut affordances = Vec::new();
        affordances.extend(inject(surface, &page.origin, selection.next, NEXT_LABEL));
        affordances.extend(inject(surface, &page.origin, selection.random, RANDOM_LABEL));

        Ok(ActivationReport {
            status,
            catalog,
            current_entry,
            marked,
            selection,
            affordances,
        })
    }
}
