//! Latest-value-wins handoff between a loader thread and the tick
//!
//! The producer publishes whenever it has something new; the simulation
//! picks up the most recent value at the start of its next tick. Values
//! published in between are replaced, never queued.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

struct Slot<T> {
    pending: Option<T>,
    /// Raised on publish, cleared when taken
    dirty: bool,
}

/// Single-slot handoff, cheap to clone across threads
pub struct Handoff<T> {
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T> Clone for Handoff<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Default for Handoff<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Handoff<T> {
    /// Empty slot
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                pending: None,
                dirty: false,
            })),
        }
    }

    /// Replace whatever is waiting with `value`
    pub fn publish(&self, value: T) {
        let mut slot = self.slot.lock();
        slot.pending = Some(value);
        slot.dirty = true;
    }

    /// Take the latest value, if one arrived since the last take
    pub fn take(&self) -> Option<T> {
        let mut slot = self.slot.lock();
        if !slot.dirty {
            return None;
        }
        slot.dirty = false;
        slot.pending.take()
    }

    /// Whether a value is waiting
    pub fn has_pending(&self) -> bool {
        self.slot.lock().dirty
    }
}

/// Animation lengths fed by the asset loader
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimCatalog {
    durations: HashMap<String, u64>,
}

impl AnimCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an animation
    pub fn with_anim(mut self, name: impl Into<String>, duration_ms: u64) -> Self {
        self.durations.insert(name.into(), duration_ms);
        self
    }

    /// Length of an animation
    pub fn duration(&self, name: &str) -> Option<u64> {
        self.durations.get(name).copied()
    }

    /// All lengths by name
    pub fn durations(&self) -> &HashMap<String, u64> {
        &self.durations
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }
}
