//! Per-coordinate prediction cache with request deduplication
//!
//! The cache holds at most one entry per [`CoordinateKey`]. A lookup for a
//! key that already has an entry joins it instead of issuing another remote
//! call, so at most one request per key is ever outstanding.
//!
//! Every issued lookup is stamped with the cache [`Epoch`]. Clearing the
//! cache advances the epoch; a result that arrives for an older epoch is
//! reported as [`Resolution::Stale`] and dropped.
//!
//! Callers that want to wait for a key subscribe with [`PredictionCache::watch`]
//! and await [`PredictionWatch::settled`]. All watches on one key observe the
//! same terminal entry.

use std::collections::HashMap;

use tokio::sync::watch;

use crate::coordinate::{Coordinate, CoordinateKey};
use crate::prediction::{PredictionEntry, PredictionError, PredictionRecord};

/// Cache generation, advanced by [`PredictionCache::clear_generation`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Epoch(u64);

impl Epoch {
    /// Raw generation number, for logs and task keys
    pub fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Epoch(self.0.wrapping_add(1))
    }
}

/// Outcome of [`PredictionCache::lookup`]
#[derive(Clone, Debug, PartialEq)]
pub enum Lookup {
    /// No entry existed; a Pending entry was inserted and the caller must
    /// issue the remote call stamped with `epoch`.
    Issued { epoch: Epoch },
    /// A call for this key is already outstanding.
    Joined,
    /// The key already settled; no call is needed.
    Cached(PredictionEntry),
}

/// Outcome of [`PredictionCache::resolve`]
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// The pending entry transitioned to this terminal entry.
    Applied(PredictionEntry),
    /// The result belongs to an invalidated lookup and was dropped.
    Stale,
}

struct Slot {
    entry: PredictionEntry,
    epoch: Epoch,
    notify: watch::Sender<PredictionEntry>,
}

/// Subscription to one key's cache entry
#[derive(Clone, Debug)]
pub struct PredictionWatch {
    key: CoordinateKey,
    rx: watch::Receiver<PredictionEntry>,
}

impl PredictionWatch {
    /// Key this watch follows
    pub fn key(&self) -> CoordinateKey {
        self.key
    }

    /// Entry as last published by the cache
    pub fn current(&self) -> PredictionEntry {
        self.rx.borrow().clone()
    }

    /// Wait until the entry is Ready or Failed.
    ///
    /// Returns `None` if the entry was invalidated while still pending.
    pub async fn settled(mut self) -> Option<PredictionEntry> {
        let entry = self
            .rx
            .wait_for(|entry| !entry.is_pending())
            .await
            .ok()?
            .clone();
        Some(entry)
    }
}

/// Mapping from coordinate key to lookup state
#[derive(Default)]
pub struct PredictionCache {
    slots: HashMap<CoordinateKey, Slot>,
    epoch: Epoch,
}

impl std::fmt::Debug for PredictionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionCache")
            .field("entries", &self.slots.len())
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl PredictionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Look up `coordinate`, inserting a Pending entry if none exists.
    pub fn lookup(&mut self, coordinate: Coordinate) -> Lookup {
        let key = coordinate.key();
        if let Some(slot) = self.slots.get(&key) {
            return match &slot.entry {
                PredictionEntry::Pending => {
                    tracing::debug!(%key, "joined outstanding prediction lookup");
                    Lookup::Joined
                }
                entry => Lookup::Cached(entry.clone()),
            };
        }

        let (notify, _) = watch::channel(PredictionEntry::Pending);
        self.slots.insert(
            key,
            Slot {
                entry: PredictionEntry::Pending,
                epoch: self.epoch,
                notify,
            },
        );
        tracing::debug!(%key, epoch = self.epoch.value(), "issued prediction lookup");
        Lookup::Issued { epoch: self.epoch }
    }

    /// Read the current entry without triggering a lookup
    pub fn get(&self, key: &CoordinateKey) -> Option<&PredictionEntry> {
        self.slots.get(key).map(|slot| &slot.entry)
    }

    /// Whether `key` has an entry in any state
    pub fn contains(&self, key: &CoordinateKey) -> bool {
        self.slots.contains_key(key)
    }

    /// Subscribe to a key's entry, if one exists
    pub fn watch(&self, key: &CoordinateKey) -> Option<PredictionWatch> {
        self.slots.get(key).map(|slot| PredictionWatch {
            key: *key,
            rx: slot.notify.subscribe(),
        })
    }

    /// Apply the result of a lookup issued at `epoch`.
    ///
    /// The entry transitions at most once: results for a missing key, a key
    /// that already settled, or a different epoch are stale.
    pub fn resolve(
        &mut self,
        key: &CoordinateKey,
        epoch: Epoch,
        result: Result<PredictionRecord, PredictionError>,
    ) -> Resolution {
        if epoch != self.epoch {
            return Resolution::Stale;
        }
        let Some(slot) = self.slots.get_mut(key) else {
            return Resolution::Stale;
        };
        if slot.epoch != epoch || !slot.entry.is_pending() {
            return Resolution::Stale;
        }

        let entry = PredictionEntry::from(result);
        slot.entry = entry.clone();
        slot.notify.send_replace(entry.clone());
        Resolution::Applied(entry)
    }

    /// Remove a key so the next lookup re-issues the remote call.
    ///
    /// Returns whether an entry was present.
    pub fn invalidate(&mut self, key: &CoordinateKey) -> bool {
        self.slots.remove(key).is_some()
    }

    /// Invalidate `keys` plus every pending entry, then advance the epoch.
    ///
    /// Pending entries go too: their results would be stale under the new
    /// epoch and the entries would otherwise never settle.
    pub fn clear_generation<I>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = CoordinateKey>,
    {
        let before = self.slots.len();
        for key in keys {
            self.slots.remove(&key);
        }
        self.slots.retain(|_, slot| !slot.entry.is_pending());
        self.epoch = self.epoch.next();
        before - self.slots.len()
    }

    /// All entries, unordered
    pub fn entries(&self) -> impl Iterator<Item = (&CoordinateKey, &PredictionEntry)> {
        self.slots.iter().map(|(key, slot)| (key, &slot.entry))
    }

    /// Number of lookups still waiting for a result
    pub fn pending_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| slot.entry.is_pending())
            .count()
    }

    /// Number of entries, pending ones included
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
