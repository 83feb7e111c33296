//! Runtime-services facade handed to every unit.
//!
//! The real runtime exposes timers, reminders, streams, and storage to each
//! activation. The harness reproduces that surface through narrow capability
//! traits; the silo wires recording test doubles behind them so their
//! registrations can be asserted on.

pub mod reminders;
pub mod streams;
pub mod timers;

// Re-exports
pub use reminders::{RegisteredReminder, ReminderRegistry, TestReminderRegistry};
pub use streams::{StreamProvider, StreamProviderLookup, TestStreamProviders};
pub use timers::{RegisteredTimer, TestTimerRegistry, TimerRegistry};

use crate::storage::StorageManager;
use std::rc::Rc;

/// Bundle of runtime service references shared by all activation contexts in
/// a silo.
///
/// Cloning is cheap; all clones point at the same underlying services.
#[derive(Clone)]
pub struct RuntimeServices {
    /// Per-instance storage slots.
    pub storage: Rc<StorageManager>,

    /// Timer-registration capability.
    pub timers: Rc<dyn TimerRegistry>,

    /// Reminder-registration capability.
    pub reminders: Rc<dyn ReminderRegistry>,

    /// Stream-provider lookup, keyed by name.
    pub streams: Rc<dyn StreamProviderLookup>,
}

impl std::fmt::Debug for RuntimeServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeServices")
            .field("storage", &self.storage)
            .finish()
    }
}
