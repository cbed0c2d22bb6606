//! In-memory home registry.
//!
//! Lock granularity:
//! - `players` (RwLock) guards the player → record map. It is held only long enough to
//!   clone a record handle, insert a fresh record, or remove one.
//! - Each record has its own Mutex. Mutations of one player's homes serialize on it;
//!   different players never contend.
//! - Lock order is always map, then record. Nothing waits on the map while holding a
//!   record lock, so the two cannot deadlock.
//!
//! Reads hand back cloned snapshots and release every lock before returning.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::debug;

use crate::homes::types::{HomeEntry, PlayerHomeRecord, PlayerId};

struct RecordSlot {
    record: PlayerHomeRecord,
    /// Set once the slot has been unlinked from the map; holders must fetch a new slot.
    retired: bool,
}

type SharedSlot = Arc<Mutex<RecordSlot>>;

fn lock_slot(slot: &Mutex<RecordSlot>) -> MutexGuard<'_, RecordSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
pub struct HomeRegistry {
    players: RwLock<HashMap<PlayerId, SharedSlot>>,
}

impl HomeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_map(&self) -> RwLockReadGuard<'_, HashMap<PlayerId, SharedSlot>> {
        self.players.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_map(&self) -> RwLockWriteGuard<'_, HashMap<PlayerId, SharedSlot>> {
        self.players.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn existing_slot(&self, player: PlayerId) -> Option<SharedSlot> {
        self.read_map().get(&player).cloned()
    }

    fn slot_for(&self, player: PlayerId) -> SharedSlot {
        if let Some(slot) = self.existing_slot(player) {
            return slot;
        }
        self.write_map()
            .entry(player)
            .or_insert_with(|| {
                Arc::new(Mutex::new(RecordSlot {
                    record: PlayerHomeRecord::new(player),
                    retired: false,
                }))
            })
            .clone()
    }

    /// Drop the player's record if it has been emptied.
    fn prune(&self, player: PlayerId) {
        let mut map = self.write_map();
        let Some(slot) = map.get(&player).cloned() else {
            return;
        };
        let mut guard = lock_slot(&slot);
        if guard.record.is_empty() && !guard.retired {
            guard.retired = true;
            drop(guard);
            map.remove(&player);
            debug!("Pruned empty home record for {}", player);
        }
    }

    /// Run `f` with exclusive access to the player's record, creating it if needed.
    ///
    /// Everything inside `f` is atomic with respect to other mutations of the same
    /// player. A record left empty afterwards is removed from the registry.
    pub fn with_record_mut<R>(&self, player: PlayerId, f: impl FnOnce(&mut PlayerHomeRecord) -> R) -> R {
        let mut pending = Some(f);
        loop {
            let slot = self.slot_for(player);
            let mut guard = lock_slot(&slot);
            if guard.retired {
                // Unlinked between lookup and lock; the next lookup yields a fresh slot.
                continue;
            }
            if let Some(f) = pending.take() {
                let result = f(&mut guard.record);
                let emptied = guard.record.is_empty();
                drop(guard);
                if emptied {
                    self.prune(player);
                }
                return result;
            }
        }
    }

    /// Snapshot of the player's record, if they have any homes.
    pub fn get_if_present(&self, player: PlayerId) -> Option<PlayerHomeRecord> {
        let slot = self.existing_slot(player)?;
        let guard = lock_slot(&slot);
        if guard.retired || guard.record.is_empty() {
            return None;
        }
        Some(guard.record.clone())
    }

    /// Snapshot of the player's record, or an empty one. Never inserts.
    pub fn record_or_empty(&self, player: PlayerId) -> PlayerHomeRecord {
        self.get_if_present(player)
            .unwrap_or_else(|| PlayerHomeRecord::new(player))
    }

    pub fn get_home(&self, player: PlayerId, name: &str) -> Option<HomeEntry> {
        let slot = self.existing_slot(player)?;
        let guard = lock_slot(&slot);
        if guard.retired {
            return None;
        }
        guard.record.get(name).cloned()
    }

    /// Whether the player currently owns at least one home.
    pub fn has(&self, player: PlayerId) -> bool {
        self.get_if_present(player).is_some()
    }

    /// Snapshots of every non-empty record, ordered by player id.
    pub fn list_all(&self) -> Vec<PlayerHomeRecord> {
        let slots: Vec<SharedSlot> = self.read_map().values().cloned().collect();
        let mut records: Vec<PlayerHomeRecord> = slots
            .iter()
            .filter_map(|slot| {
                let guard = lock_slot(slot);
                (!guard.retired && !guard.record.is_empty()).then(|| guard.record.clone())
            })
            .collect();
        records.sort_by_key(|record| record.owner());
        records
    }

    /// Players that own at least one home, sorted.
    pub fn players_with_homes(&self) -> Vec<PlayerId> {
        self.list_all().iter().map(|record| record.owner()).collect()
    }

    pub fn home_count(&self) -> usize {
        self.list_all().iter().map(|record| record.len()).sum()
    }

    /// Remove a player's record entirely, returning what it held.
    pub fn remove(&self, player: PlayerId) -> Option<PlayerHomeRecord> {
        let slot = self.write_map().remove(&player)?;
        let mut guard = lock_slot(&slot);
        guard.retired = true;
        let record = std::mem::replace(&mut guard.record, PlayerHomeRecord::new(player));
        (!record.is_empty()).then_some(record)
    }

    /// Replace the registry contents wholesale, e.g. after loading from disk.
    pub fn replace_all(&self, homes: impl IntoIterator<Item = HomeEntry>) {
        let mut fresh: HashMap<PlayerId, PlayerHomeRecord> = HashMap::new();
        for home in homes {
            fresh
                .entry(home.owner)
                .or_insert_with(|| PlayerHomeRecord::new(home.owner))
                .insert(home.name, home.location);
        }

        let mut map = self.write_map();
        for slot in map.values() {
            lock_slot(slot).retired = true;
        }
        map.clear();
        for (player, record) in fresh {
            map.insert(
                player,
                Arc::new(Mutex::new(RecordSlot {
                    record,
                    retired: false,
                })),
            );
        }
    }
}
