//! Activation context handed to a unit at creation time.

use crate::error::UnitError;
use crate::services::{ReminderRegistry, RuntimeServices, StreamProvider, TimerRegistry};
use crate::storage::UnitStorage;
use crate::unit::{LifecycleController, UnitIdentity};
use std::fmt;
use std::rc::Rc;

/// Identifier for a single unit activation within a silo.
///
/// Assigned from a monotonic per-silo counter, one per instantiated unit.
/// Storage slots are keyed by activation id rather than identity, so two
/// instance objects never share a slot even when re-created under the same
/// identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivationId(u64);

impl ActivationId {
    /// Create an ActivationId.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActivationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The bundle of references supplied to a unit at creation time.
///
/// A context carries the unit's identity, its activation id, the lifecycle
/// controller it may register extra hooks with, and the runtime-services
/// facade (storage, timers, reminders, streams). Units keep the context (or a
/// clone) for the duration of their life to reach storage and services.
///
/// # Example
///
/// ```rust,ignore
/// impl FromContext for CounterUnit {
///     fn from_context(ctx: ActivationContext) -> Option<Self> {
///         let storage = ctx.storage::<CounterState>().ok()?;
///         Some(Self { ctx, storage })
///     }
/// }
/// ```
#[derive(Clone)]
pub struct ActivationContext {
    identity: UnitIdentity,
    activation: ActivationId,
    lifecycle: Rc<LifecycleController>,
    services: RuntimeServices,
}

impl ActivationContext {
    /// Assemble a context (called by the silo per activation).
    pub fn new(
        identity: UnitIdentity,
        activation: ActivationId,
        lifecycle: Rc<LifecycleController>,
        services: RuntimeServices,
    ) -> Self {
        Self {
            identity,
            activation,
            lifecycle,
            services,
        }
    }

    /// Identity this unit was created under.
    pub fn identity(&self) -> &UnitIdentity {
        &self.identity
    }

    /// Activation id of this unit instance.
    pub fn activation(&self) -> ActivationId {
        self.activation
    }

    /// Lifecycle controller for this activation.
    ///
    /// Hooks registered here during construction run as part of the start
    /// sequence, before the unit's own `on_start`.
    pub fn lifecycle(&self) -> &LifecycleController {
        &self.lifecycle
    }

    /// Get (or lazily create) this instance's typed storage slot.
    ///
    /// The state type is fixed on first access; a mismatched later request
    /// signals [`UnitError::StorageTypeMismatch`].
    pub fn storage<T: Default + 'static>(&self) -> Result<UnitStorage<T>, UnitError> {
        self.services.storage.get_storage::<T>(self.activation)
    }

    /// Timer-registration service.
    pub fn timers(&self) -> &dyn TimerRegistry {
        self.services.timers.as_ref()
    }

    /// Reminder-registration service.
    pub fn reminders(&self) -> &dyn ReminderRegistry {
        self.services.reminders.as_ref()
    }

    /// Look up a stream provider by name.
    pub fn stream_provider(&self, name: &str) -> Option<Rc<dyn StreamProvider>> {
        self.services.streams.provider(name)
    }
}

impl fmt::Debug for ActivationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationContext")
            .field("identity", &self.identity)
            .field("activation", &self.activation)
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}
