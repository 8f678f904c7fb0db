//! Slab registry of independent channels
//!
//! O(1) insert/lookup/remove with stable, never-reused IDs. The registry
//! lock only guards the slot table; lookups hand out a `SharedChannel`
//! clone, so work on different channels never contends.

use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

use crate::config::ChannelConfig;
use crate::error::{Result, StateError};
use crate::shared::SharedChannel;

pub const DEFAULT_CAPACITY: usize = 1024;

struct Slots {
    channels: Vec<Option<SharedChannel>>,

    /// Free list (indices of available slots)
    free: Vec<usize>,

    /// Next ID to assign (monotonically increasing)
    next_id: u64,

    id_to_slot: HashMap<u64, usize>,
}

pub struct ChannelRegistry {
    slots: RwLock<Slots>,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChannelRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: RwLock::new(Slots {
                channels: vec![None; capacity],
                free: (0..capacity).rev().collect(),
                next_id: 0,
                id_to_slot: HashMap::new(),
            }),
        }
    }

    /// Store a channel, returning its ID
    pub fn insert(&self, channel: SharedChannel) -> Result<u64> {
        let mut slots = self.slots.write().map_err(|_| StateError::LockPoisoned)?;

        let slot_idx = slots.free.pop().ok_or(StateError::RegistryFull)?;
        let id = slots.next_id;
        slots.next_id += 1;

        slots.channels[slot_idx] = Some(channel);
        slots.id_to_slot.insert(id, slot_idx);

        debug!(id, slot = slot_idx, active = slots.id_to_slot.len(), "channel registered");
        Ok(id)
    }

    /// Build a channel from `config` and store it
    pub fn create(&self, config: ChannelConfig, seed: Option<u64>) -> Result<u64> {
        self.insert(SharedChannel::create(config, seed)?)
    }

    pub fn get(&self, id: u64) -> Result<SharedChannel> {
        let slots = self.slots.read().map_err(|_| StateError::LockPoisoned)?;
        slots
            .id_to_slot
            .get(&id)
            .and_then(|&idx| slots.channels[idx].clone())
            .ok_or_else(|| StateError::UnknownChannel(id).into())
    }

    /// Remove a channel. Handles already given out stay usable.
    pub fn remove(&self, id: u64) -> Result<SharedChannel> {
        let mut slots = self.slots.write().map_err(|_| StateError::LockPoisoned)?;

        let slot_idx = slots
            .id_to_slot
            .remove(&id)
            .ok_or(StateError::UnknownChannel(id))?;
        let channel = slots.channels[slot_idx]
            .take()
            .ok_or(StateError::UnknownChannel(id))?;
        slots.free.push(slot_idx);

        debug!(id, active = slots.id_to_slot.len(), "channel removed");
        Ok(channel)
    }

    /// Number of active channels
    pub fn count(&self) -> usize {
        self.slots.read().map(|s| s.id_to_slot.len()).unwrap_or(0)
    }

    pub fn capacity(&self) -> usize {
        self.slots.read().map(|s| s.channels.len()).unwrap_or(0)
    }
}
