//! Reminder-registration capability and its recording test double.

use crate::unit::UnitIdentity;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

/// Capability for registering and unregistering named unit reminders.
///
/// As with timers, only the registration bookkeeping lives here; firing
/// reminders is out of scope.
pub trait ReminderRegistry {
    /// Register (or replace) the named reminder for the given unit.
    fn register_reminder(
        &self,
        identity: &UnitIdentity,
        name: &str,
        due: Duration,
        period: Duration,
    );

    /// Remove the named reminder for the given unit, if present.
    fn unregister_reminder(&self, identity: &UnitIdentity, name: &str);
}

/// A reminder registration captured by [`TestReminderRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredReminder {
    /// Delay before the first firing.
    pub due: Duration,

    /// Interval between firings.
    pub period: Duration,
}

/// Recording reminder registry used by the test silo.
///
/// Reminders are keyed by (identity, name); re-registering a name replaces
/// the previous entry, matching the real runtime's contract.
#[derive(Debug, Default)]
pub struct TestReminderRegistry {
    reminders: RefCell<HashMap<(UnitIdentity, String), RegisteredReminder>>,
}

impl TestReminderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of live reminders.
    pub fn count(&self) -> usize {
        self.reminders.borrow().len()
    }

    /// Look up the named reminder for a unit.
    pub fn reminder(&self, identity: &UnitIdentity, name: &str) -> Option<RegisteredReminder> {
        self.reminders
            .borrow()
            .get(&(identity.clone(), name.to_string()))
            .cloned()
    }
}

impl ReminderRegistry for TestReminderRegistry {
    fn register_reminder(
        &self,
        identity: &UnitIdentity,
        name: &str,
        due: Duration,
        period: Duration,
    ) {
        tracing::debug!(%identity, name, ?due, ?period, "reminder registered");
        self.reminders.borrow_mut().insert(
            (identity.clone(), name.to_string()),
            RegisteredReminder { due, period },
        );
    }

    fn unregister_reminder(&self, identity: &UnitIdentity, name: &str) {
        tracing::debug!(%identity, name, "reminder unregistered");
        self.reminders
            .borrow_mut()
            .remove(&(identity.clone(), name.to_string()));
    }
}
