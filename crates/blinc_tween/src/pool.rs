//! Tween slot pool
//!
//! Records live in a generational [`SlotMap`], so a slot key that outlived its
//! tween can never reach the tween that reused the slot. Callers address
//! tweens by [`TweenId`]; the id-to-key map resolves them in constant time.

use crate::error::{Result, TweenError};
use crate::id::{IdAllocator, TweenId};
use crate::tween::TweenRecord;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Storage position of a live tween (slot index + generation)
    pub(crate) struct TweenKey;
}

pub(crate) struct SlotPool {
    slots: SlotMap<TweenKey, TweenRecord>,
    index: FxHashMap<TweenId, TweenKey>,
    ids: IdAllocator,
    /// Reserved slot count. Doubles whenever every slot is occupied.
    capacity: usize,
}

impl SlotPool {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: SlotMap::with_capacity_and_key(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            ids: IdAllocator::new(),
            capacity,
        }
    }

    /// Store a new tween and return its fresh id
    ///
    /// `build` receives the id so the record can carry it.
    pub fn allocate(&mut self, build: impl FnOnce(TweenId) -> TweenRecord) -> (TweenId, TweenKey) {
        if self.slots.len() >= self.capacity {
            self.grow();
        }

        let index = &self.index;
        let id = self.ids.next_where(|id| !id.is_none() && !index.contains_key(&id));
        let key = self.slots.insert(build(id));
        self.index.insert(id, key);
        (id, key)
    }

    fn grow(&mut self) {
        let new_capacity = self.capacity * 2;
        let additional = new_capacity - self.slots.len();
        self.slots.reserve(additional);
        self.index.reserve(additional);
        tracing::debug!(
            "SlotPool: growing from {} to {} slots",
            self.capacity,
            new_capacity
        );
        self.capacity = new_capacity;
    }

    /// Free a slot, returning the record it held
    ///
    /// Returns `None` if the key is stale. The record is handed back rather
    /// than dropped here so callers can drop captured closures outside any
    /// borrow of the pool.
    pub fn release(&mut self, key: TweenKey) -> Option<TweenRecord> {
        let record = self.slots.remove(key)?;
        self.index.remove(&record.id);
        Some(record)
    }

    /// Resolve an id to its slot key
    pub fn find(&self, id: TweenId) -> Result<TweenKey> {
        self.index.get(&id).copied().ok_or(TweenError::NotFound(id))
    }

    pub fn find_record(&self, id: TweenId) -> Result<&TweenRecord> {
        let key = self.find(id)?;
        self.slots.get(key).ok_or(TweenError::NotFound(id))
    }

    pub fn find_record_mut(&mut self, id: TweenId) -> Result<&mut TweenRecord> {
        let key = self.find(id)?;
        self.slots.get_mut(key).ok_or(TweenError::NotFound(id))
    }

    pub fn contains(&self, id: TweenId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get_mut(&mut self, key: TweenKey) -> Option<&mut TweenRecord> {
        self.slots.get_mut(key)
    }

    /// Copy the keys of all live tweens into `buf`, replacing its contents
    pub fn collect_keys(&self, buf: &mut Vec<TweenKey>) {
        buf.clear();
        buf.extend(self.slots.keys());
    }

    /// Remove every tween, returning the records
    pub fn drain(&mut self) -> Vec<TweenRecord> {
        self.index.clear();
        self.slots.drain().map(|(_, record)| record).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
