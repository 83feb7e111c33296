//! Per-unit typed state slots with access counters.
//!
//! The [`StorageManager`] hands out one lazily-created [`UnitStorage`] slot
//! per unit *instance* (keyed by activation id, never by identity — two
//! instance objects never share a slot). Every read, write, and clear is
//! counted so tests can assert on storage traffic without a mock framework.

use crate::error::UnitError;
use crate::unit::ActivationId;
use serde::{Deserialize, Serialize};
use std::any::{type_name, Any};
use std::cell::{Cell, Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Snapshot of storage access counters.
///
/// Counters increment monotonically until [`StorageManager::reset_counts`]
/// zeroes them. State values are unaffected by counter resets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    /// Number of `clear` calls.
    pub clears: u64,

    /// Number of `read` calls.
    pub reads: u64,

    /// Number of `write` calls.
    pub writes: u64,
}

/// Per-slot access counters.
struct SlotCounters {
    clears: Cell<u64>,
    reads: Cell<u64>,
    writes: Cell<u64>,
}

impl SlotCounters {
    fn new() -> Self {
        Self {
            clears: Cell::new(0),
            reads: Cell::new(0),
            writes: Cell::new(0),
        }
    }

    fn snapshot(&self) -> StorageStats {
        StorageStats {
            clears: self.clears.get(),
            reads: self.reads.get(),
            writes: self.writes.get(),
        }
    }

    fn reset(&self) {
        self.clears.set(0);
        self.reads.set(0);
        self.writes.set(0);
    }
}

/// Typed state container bound one-to-one with a unit instance.
struct StorageSlot<T> {
    state: RefCell<T>,
    counters: Rc<SlotCounters>,
}

/// Typed storage accessor handed to a unit.
///
/// Cheap to clone; all clones refer to the same slot. `read` before any
/// `write` returns the default-constructed state without implying a write
/// occurred.
///
/// # Example
///
/// ```rust,ignore
/// let storage = ctx.storage::<CounterState>()?;
/// storage.write(CounterState { value: 3 });
/// assert_eq!(storage.read().value, 3);
/// ```
pub struct UnitStorage<T> {
    slot: Rc<StorageSlot<T>>,
}

impl<T> std::fmt::Debug for UnitStorage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitStorage").finish_non_exhaustive()
    }
}

impl<T> Clone for UnitStorage<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<T: Default + 'static> UnitStorage<T> {
    /// Read the current state, incrementing the read counter.
    ///
    /// The returned borrow must be dropped before the next `write` or
    /// `clear`; holding it across one panics, as with any `RefCell`.
    pub fn read(&self) -> Ref<'_, T> {
        self.slot.counters.reads.set(self.slot.counters.reads.get() + 1);
        self.slot.state.borrow()
    }

    /// Replace the state, incrementing the write counter.
    pub fn write(&self, value: T) {
        self.slot.counters.writes.set(self.slot.counters.writes.get() + 1);
        *self.slot.state.borrow_mut() = value;
    }

    /// Reset the state to its default value, incrementing the clear counter.
    pub fn clear(&self) {
        self.slot.counters.clears.set(self.slot.counters.clears.get() + 1);
        *self.slot.state.borrow_mut() = T::default();
    }

    /// Snapshot this slot's own counters.
    pub fn stats(&self) -> StorageStats {
        self.slot.counters.snapshot()
    }
}

/// Type-erased slot entry tracked by the manager.
///
/// The counters are kept alongside the erased slot so aggregation never needs
/// to know the state type.
struct SlotEntry {
    slot: Rc<dyn Any>,
    counters: Rc<SlotCounters>,
    state_type: &'static str,
}

/// Lazily-created, per-unit-instance typed state slots with aggregate
/// statistics.
///
/// Slots are created on first storage access for an instance and live for the
/// silo's lifetime; they are never explicitly destroyed. The slot's state
/// type is fixed at first access — a mismatched second request is a usage
/// error.
pub struct StorageManager {
    slots: RefCell<HashMap<ActivationId, SlotEntry>>,
}

impl StorageManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(HashMap::new()),
        }
    }

    /// Get (or lazily create) the storage slot for a unit instance.
    ///
    /// The first request fixes the slot's state type to `T` and initializes
    /// it with `T::default()` and zeroed counters. A later request with a
    /// different state type signals [`UnitError::StorageTypeMismatch`].
    pub fn get_storage<T: Default + 'static>(
        &self,
        activation: ActivationId,
    ) -> Result<UnitStorage<T>, UnitError> {
        let mut slots = self.slots.borrow_mut();

        if let Some(entry) = slots.get(&activation) {
            let slot = entry
                .slot
                .clone()
                .downcast::<StorageSlot<T>>()
                .map_err(|_| UnitError::StorageTypeMismatch {
                    existing: entry.state_type,
                    requested: type_name::<T>(),
                })?;
            return Ok(UnitStorage { slot });
        }

        tracing::debug!(
            activation = activation.as_u64(),
            state_type = type_name::<T>(),
            "creating storage slot"
        );

        let counters = Rc::new(SlotCounters::new());
        let slot = Rc::new(StorageSlot {
            state: RefCell::new(T::default()),
            counters: counters.clone(),
        });
        slots.insert(
            activation,
            SlotEntry {
                slot: slot.clone(),
                counters,
                state_type: type_name::<T>(),
            },
        );

        Ok(UnitStorage { slot })
    }

    /// Sum the access counters across all tracked slots.
    pub fn stats(&self) -> StorageStats {
        let mut total = StorageStats::default();
        for entry in self.slots.borrow().values() {
            let stats = entry.counters.snapshot();
            total.clears += stats.clears;
            total.reads += stats.reads;
            total.writes += stats.writes;
        }
        total
    }

    /// Zero all counters across all slots, leaving state values untouched.
    pub fn reset_counts(&self) {
        for entry in self.slots.borrow().values() {
            entry.counters.reset();
        }
    }

    /// Get the number of slots currently tracked.
    pub fn slot_count(&self) -> usize {
        self.slots.borrow().len()
    }
}

impl Default for StorageManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StorageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageManager")
            .field("slots", &self.slots.borrow().len())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct CounterState {
        value: u64,
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct NameState {
        name: String,
    }

    #[test]
    fn test_read_before_write_returns_default() {
        let manager = StorageManager::new();
        let storage = manager
            .get_storage::<CounterState>(ActivationId::new(1))
            .unwrap();

        assert_eq!(*storage.read(), CounterState::default());
        assert_eq!(
            storage.stats(),
            StorageStats {
                clears: 0,
                reads: 1,
                writes: 0,
            }
        );
    }

    #[test]
    fn test_write_read_round_trip() {
        let manager = StorageManager::new();
        let storage = manager
            .get_storage::<CounterState>(ActivationId::new(1))
            .unwrap();

        storage.write(CounterState { value: 42 });
        assert_eq!(storage.read().value, 42);
    }

    #[test]
    fn test_clear_resets_to_default_and_counts() {
        let manager = StorageManager::new();
        let storage = manager
            .get_storage::<CounterState>(ActivationId::new(1))
            .unwrap();

        storage.write(CounterState { value: 42 });
        storage.clear();

        assert_eq!(storage.read().value, 0);
        let stats = storage.stats();
        assert_eq!(stats.clears, 1);
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.reads, 1);
    }

    #[test]
    fn test_same_activation_returns_same_slot() {
        let manager = StorageManager::new();
        let first = manager
            .get_storage::<CounterState>(ActivationId::new(1))
            .unwrap();
        first.write(CounterState { value: 7 });

        let second = manager
            .get_storage::<CounterState>(ActivationId::new(1))
            .unwrap();
        assert_eq!(second.read().value, 7);
        assert_eq!(manager.slot_count(), 1);
    }

    #[test]
    fn test_distinct_activations_get_distinct_slots() {
        let manager = StorageManager::new();
        let a = manager
            .get_storage::<CounterState>(ActivationId::new(1))
            .unwrap();
        let b = manager
            .get_storage::<CounterState>(ActivationId::new(2))
            .unwrap();

        a.write(CounterState { value: 1 });
        assert_eq!(b.read().value, 0);
        assert_eq!(manager.slot_count(), 2);
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let manager = StorageManager::new();
        manager
            .get_storage::<CounterState>(ActivationId::new(1))
            .unwrap();

        let err = manager
            .get_storage::<NameState>(ActivationId::new(1))
            .unwrap_err();
        assert!(matches!(err, UnitError::StorageTypeMismatch { .. }));
    }

    #[test]
    fn test_aggregate_stats_sum_across_slots() {
        let manager = StorageManager::new();
        let a = manager
            .get_storage::<CounterState>(ActivationId::new(1))
            .unwrap();
        let b = manager
            .get_storage::<NameState>(ActivationId::new(2))
            .unwrap();

        a.write(CounterState { value: 1 });
        a.write(CounterState { value: 2 });
        let _ = b.read();
        b.clear();

        assert_eq!(
            manager.stats(),
            StorageStats {
                clears: 1,
                reads: 1,
                writes: 2,
            }
        );
    }

    #[test]
    fn test_reset_counts_zeroes_counters_but_keeps_state() {
        let manager = StorageManager::new();
        let storage = manager
            .get_storage::<CounterState>(ActivationId::new(1))
            .unwrap();

        storage.write(CounterState { value: 42 });
        let _ = storage.read();
        manager.reset_counts();

        assert_eq!(manager.stats(), StorageStats::default());
        assert_eq!(storage.read().value, 42);
    }
}
