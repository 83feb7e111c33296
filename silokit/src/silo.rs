//! Test silo: the composition root wiring registry, storage, lifecycle, and
//! runtime services together.

use crate::error::UnitError;
use crate::services::{
    RuntimeServices, TestReminderRegistry, TestStreamProviders, TestTimerRegistry,
};
use crate::storage::{StorageManager, StorageStats};
use crate::unit::{
    ActivationContext, ActivationId, ContextCreator, FromContext, LifecycleController,
    LifecycleState, Unit, UnitCreator, UnitIdentity, UnitRecord, UnitRegistry,
};
use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Lifecycle record tracked per instantiated unit, keyed by instance
/// pointer.
///
/// The weak handle detects entries whose instance has been dropped, so a
/// later allocation reusing the address never aliases a retired entry.
#[derive(Clone)]
struct ActivationEntry {
    instance: Weak<dyn Any>,
    lifecycle: Rc<LifecycleController>,
    identity: UnitIdentity,
    interface: TypeId,
}

/// In-memory, single-threaded silo for unit testing virtual-actor units.
///
/// One silo is used by one test at a time; there is no internal locking and
/// concurrent use from multiple threads is unsupported. Operations that
/// mirror the real runtime's asynchronous activation/deactivation APIs are
/// awaited, but nothing runs in parallel: for a single identity, start hooks
/// always complete before the creation call returns and stop hooks always
/// complete before deactivation returns.
///
/// # Example
///
/// ```rust,ignore
/// let silo = TestSilo::new();
///
/// let unit = silo.create_unit::<CounterUnit>(42).await?;
/// unit.borrow_mut().increment();
///
/// silo.deactivate(&unit).await?;
/// assert_eq!(silo.storage_stats().writes, 1);
/// ```
pub struct TestSilo {
    registry: UnitRegistry,
    storage: Rc<StorageManager>,
    timers: Rc<TestTimerRegistry>,
    reminders: Rc<TestReminderRegistry>,
    streams: Rc<TestStreamProviders>,
    lifecycles: RefCell<HashMap<*const (), ActivationEntry>>,
    next_activation: Cell<u64>,
}

impl TestSilo {
    /// Create an empty silo.
    pub fn new() -> Self {
        Self {
            registry: UnitRegistry::new(),
            storage: Rc::new(StorageManager::new()),
            timers: Rc::new(TestTimerRegistry::new()),
            reminders: Rc::new(TestReminderRegistry::new()),
            streams: Rc::new(TestStreamProviders::new()),
            lifecycles: RefCell::new(HashMap::new()),
            next_activation: Cell::new(0),
        }
    }

    /// Create (or return) the unit for `identity`, registered under its own
    /// concrete type.
    ///
    /// First reference instantiates the unit via [`FromContext`] and runs its
    /// start sequence to completion; later references return the existing
    /// instance.
    pub async fn create_unit<U: FromContext>(
        &self,
        identity: impl Into<UnitIdentity>,
    ) -> Result<Rc<RefCell<U>>, UnitError> {
        self.create_unit_as::<U, U>(identity).await
    }

    /// Create (or return) the unit for `identity`, registered under the
    /// declared interface type `I`.
    ///
    /// `I` may be the concrete type or a `dyn Trait` object type; the same
    /// identity can be live under different interfaces simultaneously.
    pub async fn create_unit_as<U: FromContext, I: ?Sized + 'static>(
        &self,
        identity: impl Into<UnitIdentity>,
    ) -> Result<Rc<RefCell<U>>, UnitError> {
        self.create_unit_with::<_, I>(identity, &ContextCreator::<U>::new())
            .await
    }

    /// Create (or return) the unit for `identity` using an explicit creator
    /// collaborator.
    ///
    /// Used when instantiation needs external collaborators the unit cannot
    /// reach through its activation context alone.
    pub async fn create_unit_with<C: UnitCreator, I: ?Sized + 'static>(
        &self,
        identity: impl Into<UnitIdentity>,
        creator: &C,
    ) -> Result<Rc<RefCell<C::Unit>>, UnitError> {
        let identity = identity.into();

        let activation = self
            .registry
            .get_or_create::<C, I>(identity.clone(), creator, {
                let identity = identity.clone();
                |lifecycle| self.new_context(identity, lifecycle)
            })
            .await?;

        if activation.fresh {
            self.lifecycles.borrow_mut().insert(
                Rc::as_ptr(&activation.instance) as *const (),
                ActivationEntry {
                    instance: downgrade_any(&activation.instance),
                    lifecycle: activation.lifecycle.clone(),
                    identity,
                    interface: TypeId::of::<I>(),
                },
            );
        }

        Ok(activation.instance)
    }

    /// Explicitly insert an already-built instance under `(identity, I)`.
    ///
    /// The out-of-band insertion path: the caller is responsible for having
    /// activated the instance. Overwrites any existing mapping for the same
    /// key (last write wins). The instance becomes deactivatable through this
    /// silo.
    pub fn register_unit<U: Unit, I: ?Sized + 'static>(
        &self,
        identity: impl Into<UnitIdentity>,
        instance: Rc<RefCell<U>>,
        lifecycle: Rc<LifecycleController>,
    ) {
        let identity = identity.into();
        self.registry.register::<I>(
            identity.clone(),
            UnitRecord {
                instance: instance.clone(),
                lifecycle: lifecycle.clone(),
            },
        );
        self.lifecycles.borrow_mut().insert(
            Rc::as_ptr(&instance) as *const (),
            ActivationEntry {
                instance: downgrade_any(&instance),
                lifecycle,
                identity,
                interface: TypeId::of::<I>(),
            },
        );
    }

    /// Run the stop sequence for a previously created unit.
    ///
    /// Awaits every stop hook (in reverse registration order) before
    /// returning, then drops the registry record so the identity can be
    /// re-created as a brand-new activation. Signals
    /// [`UnitError::UnknownUnit`] when no lifecycle record exists for the
    /// instance, and [`UnitError::LifecycleOrder`] when the unit is not
    /// active (e.g. deactivated twice).
    pub async fn deactivate<U: Unit>(&self, unit: &Rc<RefCell<U>>) -> Result<(), UnitError> {
        let ptr = Rc::as_ptr(unit) as *const ();
        let entry = self.entry_for(ptr).ok_or(UnitError::UnknownUnit)?;

        entry.lifecycle.trigger_stop().await?;
        tracing::info!(identity = %entry.identity, "unit deactivated");

        // Free the (identity, interface) slot for re-creation, unless a
        // later register call already replaced this instance.
        self.registry
            .remove_instance(&entry.identity, entry.interface, ptr);
        Ok(())
    }

    /// Look up the lifecycle state for a previously created unit.
    ///
    /// Returns `None` when no lifecycle record exists for the instance.
    pub fn lifecycle_state<U: Unit>(&self, unit: &Rc<RefCell<U>>) -> Option<LifecycleState> {
        let ptr = Rc::as_ptr(unit) as *const ();
        self.entry_for(ptr).map(|entry| entry.lifecycle.state())
    }

    /// Aggregate storage counters across all slots.
    pub fn storage_stats(&self) -> StorageStats {
        self.storage.stats()
    }

    /// Zero all storage counters; state values are unaffected.
    pub fn reset_storage_counts(&self) {
        self.storage.reset_counts()
    }

    /// The silo's storage manager.
    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    /// The recording timer registry handed to units.
    pub fn timers(&self) -> &TestTimerRegistry {
        &self.timers
    }

    /// The recording reminder registry handed to units.
    pub fn reminders(&self) -> &TestReminderRegistry {
        &self.reminders
    }

    /// The stream provider table handed to units.
    pub fn stream_providers(&self) -> &TestStreamProviders {
        &self.streams
    }

    /// The number of live unit records.
    pub fn unit_count(&self) -> usize {
        self.registry.count()
    }

    /// Fetch the activation entry for an instance pointer.
    ///
    /// Entries whose instance has been dropped are treated as absent: the
    /// address may have been handed to an unrelated allocation since.
    fn entry_for(&self, ptr: *const ()) -> Option<ActivationEntry> {
        let entries = self.lifecycles.borrow();
        let entry = entries.get(&ptr)?;
        entry.instance.upgrade().map(|_| entry.clone())
    }

    /// Assemble an activation context around a fresh lifecycle controller.
    fn new_context(
        &self,
        identity: UnitIdentity,
        lifecycle: Rc<LifecycleController>,
    ) -> ActivationContext {
        let activation = ActivationId::new(self.next_activation.get());
        self.next_activation.set(activation.as_u64() + 1);

        ActivationContext::new(
            identity,
            activation,
            lifecycle,
            RuntimeServices {
                storage: self.storage.clone(),
                timers: self.timers.clone(),
                reminders: self.reminders.clone(),
                streams: self.streams.clone(),
            },
        )
    }
}

/// Downgrade a typed instance handle to the erased form the lifecycle map
/// stores.
fn downgrade_any<U: Unit>(instance: &Rc<RefCell<U>>) -> Weak<dyn Any> {
    let weak: Weak<RefCell<U>> = Rc::downgrade(instance);
    weak
}

impl Default for TestSilo {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TestSilo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestSilo")
            .field("units", &self.registry.count())
            .field("storage", &self.storage)
            .finish()
    }
}
