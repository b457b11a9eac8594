//! Favorites store.
//!
//! This module provides:
//! - `FavoritesStore`: Ordered favorites across all partitions, written through to storage
//! - `FavoritesChanged`: Notification broadcast after every mutation
//!
//! The in-memory list is authoritative. Every mutation updates it first and then
//! persists the affected partitions synchronously; a persistence failure is logged
//! and does not undo the mutation.
//!
//! Each entry remembers the partition it was loaded from (or first saved to) and
//! is only ever written back there, so changing the workspace roots between runs
//! never duplicates an entry into a second partition.

use std::collections::BTreeSet;
use std::path::PathBuf;
use tokio::sync::broadcast;

use crate::entry::{EntryKind, FavoriteEntry};
use crate::partition::{partition_for, partitions_for_roots, PartitionKey};
use crate::storage::KeyValueStore;

/// Capacity of the change channel; slow subscribers see `Lagged`
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// What changed in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoritesChanged {
    Added(String),
    Removed(String),
    Reordered,
}

/// An entry together with the partition that owns it
#[derive(Debug, Clone)]
struct Owned {
    entry: FavoriteEntry,
    partition: PartitionKey,
}

pub struct FavoritesStore<S> {
    storage: S,
    roots: Vec<PathBuf>,
    entries: Vec<Owned>,
    /// Duplicate copies skipped at load, by identifier
    shadowed: Vec<(String, PartitionKey)>,
    changed: broadcast::Sender<FavoritesChanged>,
}

impl<S: KeyValueStore> FavoritesStore<S> {
    /// Create the store and load every partition for `roots`
    ///
    /// With workspace roots open, each root's list is loaded in root order;
    /// otherwise the global list is loaded. Partitions that cannot be read load
    /// as empty.
    pub fn open(storage: S, roots: Vec<PathBuf>) -> Self {
        let mut entries: Vec<Owned> = Vec::new();
        let mut shadowed = Vec::new();

        for partition in partitions_for_roots(&roots) {
            let key = partition.storage_key();
            match storage.get(&key) {
                Ok(Some(items)) => {
                    for item in items {
                        if entries.iter().any(|o| o.entry.identifier == item.identifier) {
                            tracing::warn!(
                                identifier = %item.identifier,
                                %partition,
                                "Skipping duplicate favorite"
                            );
                            shadowed.push((item.identifier, partition.clone()));
                            continue;
                        }
                        entries.push(Owned {
                            entry: item,
                            partition: partition.clone(),
                        });
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(%e, %partition, "Failed to load favorites partition");
                }
            }
        }

        tracing::debug!(count = entries.len(), roots = roots.len(), "Loaded favorites");

        Self {
            storage,
            roots,
            entries,
            shadowed,
            changed: broadcast::channel(CHANGE_CHANNEL_CAPACITY).0,
        }
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<FavoritesChanged> {
        self.changed.subscribe()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if an identifier is already a favorite
    pub fn contains(&self, identifier: &str) -> bool {
        self.position(identifier).is_some()
    }

    pub fn get(&self, identifier: &str) -> Option<&FavoriteEntry> {
        self.entries
            .iter()
            .map(|o| &o.entry)
            .find(|e| e.identifier == identifier)
    }

    /// Partition that owns `identifier`
    ///
    /// Known entries report the partition they are stored in; anything else
    /// resolves against the current roots.
    pub fn partition_of(&self, identifier: &str) -> PartitionKey {
        match self.position(identifier) {
            Some(index) => self.entries[index].partition.clone(),
            None => partition_for(identifier, &self.roots),
        }
    }

    /// All entries sorted by display rank
    pub fn list(&self) -> Vec<FavoriteEntry> {
        let mut items: Vec<FavoriteEntry> = self.entries.iter().map(|o| o.entry.clone()).collect();
        items.sort_by_key(|e| e.order);
        items
    }

    /// Add a favorite at the end of the list
    ///
    /// Returns `false` (and does nothing) if the identifier is already present.
    pub fn add(&mut self, identifier: impl Into<String>, kind: EntryKind) -> bool {
        let identifier = identifier.into();
        if self.contains(&identifier) {
            tracing::debug!(%identifier, "Already a favorite");
            return false;
        }

        let partition = partition_for(&identifier, &self.roots);
        let max_order = self.entries.iter().map(|o| o.entry.order).max();
        let (order, renumbered) = match max_order.map(|max| max.checked_add(1)) {
            None => (0, false),
            Some(Some(order)) => (order, false),
            Some(None) => {
                // Ranks ran out at the top; compact them before appending
                tracing::warn!("Favorite order overflowed, renumbering");
                self.renumber();
                (self.entries.len() as u32, true)
            }
        };

        self.entries.push(Owned {
            entry: FavoriteEntry::new(identifier.clone(), kind, order),
            partition: partition.clone(),
        });
        if renumbered {
            self.persist_all();
        } else {
            self.persist_partition(&partition);
        }
        self.notify(FavoritesChanged::Added(identifier));
        true
    }

    /// Remove a favorite
    ///
    /// Returns `false` (and does nothing) if the identifier is not present.
    pub fn remove(&mut self, identifier: &str) -> bool {
        let Some(index) = self.position(identifier) else {
            tracing::debug!(identifier, "Not a favorite");
            return false;
        };

        let removed = self.entries.remove(index);
        self.persist_partition(&removed.partition);
        // Drop duplicate copies too, or they resurface on the next load
        let stale: Vec<PartitionKey> = self
            .shadowed
            .iter()
            .filter(|(id, p)| id == identifier && *p != removed.partition)
            .map(|(_, p)| p.clone())
            .collect();
        self.shadowed.retain(|(id, _)| id != identifier);
        for partition in stale {
            self.persist_partition(&partition);
        }
        self.notify(FavoritesChanged::Removed(identifier.to_string()));
        true
    }

    /// Move `source` immediately before `target`, or to the end when `target`
    /// is `None` or not a favorite
    ///
    /// Every entry's order is renumbered to its new position afterwards.
    /// Returns `false` (and does nothing) if `source` equals `target` or is not
    /// a favorite.
    pub fn reorder(&mut self, source: &str, target: Option<&str>) -> bool {
        if target == Some(source) {
            return false;
        }

        self.sort();
        let Some(source_index) = self.position(source) else {
            tracing::debug!(source, "Reorder source is not a favorite");
            return false;
        };
        let target_index = target
            .and_then(|t| self.position(t))
            .unwrap_or(self.entries.len());

        let item = self.entries.remove(source_index);
        // After removing, indices shift: if source < target, insert at target - 1
        let insert_at = if source_index < target_index {
            target_index - 1
        } else {
            target_index
        };
        self.entries.insert(insert_at, item);
        self.renumber();

        tracing::debug!(source, ?target, insert_at, "Reordered favorites");
        self.persist_all();
        self.notify(FavoritesChanged::Reordered);
        true
    }

    fn position(&self, identifier: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|o| o.entry.identifier == identifier)
    }

    /// Stable sort by display rank
    fn sort(&mut self) {
        self.entries.sort_by_key(|o| o.entry.order);
    }

    /// Assign dense ranks 0..n-1 in display order
    fn renumber(&mut self) {
        self.sort();
        for (index, owned) in self.entries.iter_mut().enumerate() {
            owned.entry.order = index as u32;
        }
    }

    /// Write every partition that owns at least one entry
    fn persist_all(&mut self) {
        let partitions: BTreeSet<String> = self
            .entries
            .iter()
            .map(|o| o.partition.storage_key())
            .collect();
        for key in partitions {
            self.persist_key(&key);
        }
    }

    /// Write the current contents of `partition` to storage
    fn persist_partition(&mut self, partition: &PartitionKey) {
        self.persist_key(&partition.storage_key());
    }

    fn persist_key(&mut self, key: &str) {
        let mut items: Vec<FavoriteEntry> = self
            .entries
            .iter()
            .filter(|o| o.partition.storage_key() == key)
            .map(|o| o.entry.clone())
            .collect();
        items.sort_by_key(|e| e.order);

        if let Err(e) = self.storage.set(key, &items) {
            tracing::error!(%e, key, "Failed to save favorites partition");
        }
    }

    fn notify(&self, change: FavoritesChanged) {
        // No subscribers is fine
        self.changed.send(change).ok();
    }
}
