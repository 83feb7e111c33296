//! Unit registry enforcing at-most-one live instance per identity.
//!
//! The registry maps `(identity, interface type)` pairs to live unit records.
//! `get_or_create` is the single-activation guarantee of the harness:
//! re-requesting a pair that already has a live record returns the existing
//! instance instead of building a new one.

use crate::error::UnitError;
use crate::unit::{ActivationContext, LifecycleController, Unit, UnitCreator, UnitIdentity};
use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Registry key: identity plus the declared interface type.
///
/// The interface type may be the concrete unit type or a `dyn Trait` object
/// type; both are `'static` and keyed by `TypeId`, so the caller names the
/// interface explicitly instead of relying on runtime type inspection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RegistryKey {
    identity: UnitIdentity,
    interface: TypeId,
}

/// A live unit activation: the instance plus its lifecycle controller.
///
/// At most one record exists per `(identity, interface)` pair at any time
/// within a silo. The record owns the controller; the instance is shared with
/// test code through `Rc`.
#[derive(Clone)]
pub struct UnitRecord {
    /// The unit instance, erased to `Rc<dyn Any>` (concretely an
    /// `Rc<RefCell<U>>`).
    pub instance: Rc<dyn Any>,

    /// The controller driving this instance's start/stop sequences.
    pub lifecycle: Rc<LifecycleController>,
}

/// Result of a `get_or_create` call.
pub struct Activation<U> {
    /// The resolved instance (existing or freshly created).
    pub instance: Rc<RefCell<U>>,

    /// The instance's lifecycle controller.
    pub lifecycle: Rc<LifecycleController>,

    /// Whether this call created the instance (false when an existing record
    /// was returned).
    pub fresh: bool,
}

impl<U> std::fmt::Debug for Activation<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Activation")
            .field("fresh", &self.fresh)
            .finish_non_exhaustive()
    }
}

/// Resolves a unit interface + identity to a singleton instance, creating and
/// activating on first reference.
pub struct UnitRegistry {
    records: RefCell<HashMap<RegistryKey, UnitRecord>>,
}

impl UnitRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            records: RefCell::new(HashMap::new()),
        }
    }

    /// Get the number of live records.
    pub fn count(&self) -> usize {
        self.records.borrow().len()
    }

    /// Find the live record for `(identity, I)`, if any.
    pub fn find<I: ?Sized + 'static>(&self, identity: &UnitIdentity) -> Option<UnitRecord> {
        let key = RegistryKey {
            identity: identity.clone(),
            interface: TypeId::of::<I>(),
        };
        self.records.borrow().get(&key).cloned()
    }

    /// Resolve `(identity, I)` to its singleton instance.
    ///
    /// If a live record exists, its instance is returned as-is. Otherwise a
    /// fresh [`LifecycleController`] is built, `context` assembles the
    /// activation context around it, the creator instantiates the unit, the
    /// start sequence runs to completion, and only then is the record
    /// registered.
    ///
    /// # Errors
    ///
    /// - [`UnitError::Instantiation`] when the creator returns no usable
    ///   instance.
    /// - [`UnitError::Failed`] when the existing record under this key holds
    ///   a different concrete type (possible via [`register`](Self::register)
    ///   overwrites).
    /// - Any error a start hook surfaces, which aborts the creation call. No
    ///   record is registered, so the identity stays free for a later
    ///   attempt.
    pub async fn get_or_create<C, I>(
        &self,
        identity: UnitIdentity,
        creator: &C,
        context: impl FnOnce(Rc<LifecycleController>) -> ActivationContext,
    ) -> Result<Activation<C::Unit>, UnitError>
    where
        C: UnitCreator,
        I: ?Sized + 'static,
    {
        if let Some(record) = self.find::<I>(&identity) {
            let instance = record
                .instance
                .clone()
                .downcast::<RefCell<C::Unit>>()
                .map_err(|_| {
                    UnitError::Failed(format!(
                        "existing unit for identity {} is not a {}",
                        identity,
                        type_name::<C::Unit>()
                    ))
                })?;
            tracing::debug!(%identity, "returning existing unit");
            return Ok(Activation {
                instance,
                lifecycle: record.lifecycle,
                fresh: false,
            });
        }

        let lifecycle = Rc::new(LifecycleController::new());
        let ctx = context(lifecycle.clone());

        let unit = creator.create(ctx).await.ok_or_else(|| UnitError::Instantiation {
            unit_type: type_name::<C::Unit>(),
            identity: identity.clone(),
        })?;
        let instance = Rc::new(RefCell::new(unit));

        attach_unit_hooks(&lifecycle, &instance);

        // Only a fully started unit is registered; a failing start hook
        // leaves the identity free for a later attempt.
        lifecycle.trigger_start().await?;

        self.register::<I>(
            identity.clone(),
            UnitRecord {
                instance: instance.clone(),
                lifecycle: lifecycle.clone(),
            },
        );
        tracing::info!(%identity, unit_type = type_name::<C::Unit>(), "unit created");

        Ok(Activation {
            instance,
            lifecycle,
            fresh: true,
        })
    }

    /// Explicitly insert a record for `(identity, I)`.
    ///
    /// Used when a caller has already built and activated an instance
    /// out-of-band, e.g. cross-unit creation during a call. Last write wins:
    /// an existing mapping for the same key is overwritten (logged, not
    /// rejected).
    pub fn register<I: ?Sized + 'static>(&self, identity: UnitIdentity, record: UnitRecord) {
        let key = RegistryKey {
            identity,
            interface: TypeId::of::<I>(),
        };
        if self.records.borrow_mut().insert(key.clone(), record).is_some() {
            tracing::warn!(identity = %key.identity, "overwriting existing unit record");
        }
    }

    /// Remove the record for `(identity, interface)` if it still maps to the
    /// given instance.
    ///
    /// The pointer check guards against removing a record that a later
    /// `register` call already replaced. Returns whether a record was
    /// removed.
    pub fn remove_instance(
        &self,
        identity: &UnitIdentity,
        interface: TypeId,
        instance: *const (),
    ) -> bool {
        let key = RegistryKey {
            identity: identity.clone(),
            interface,
        };
        let mut records = self.records.borrow_mut();
        match records.get(&key) {
            Some(record) if Rc::as_ptr(&record.instance) as *const () == instance => {
                records.remove(&key);
                true
            }
            _ => false,
        }
    }
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UnitRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitRegistry")
            .field("records", &self.records.borrow().len())
            .finish()
    }
}

/// Wire the unit's own `on_start`/`on_stop` into its lifecycle controller.
///
/// Hooks hold a `Weak` handle so the controller never keeps the instance
/// alive on its own; the registry record does that. An upgrade failure means
/// the instance is gone and the hook becomes a no-op.
#[allow(clippy::await_holding_refcell_ref)]
fn attach_unit_hooks<U: Unit>(lifecycle: &LifecycleController, instance: &Rc<RefCell<U>>) {
    let weak: Weak<RefCell<U>> = Rc::downgrade(instance);
    lifecycle.register_start_hook({
        let weak = weak.clone();
        move || {
            let weak = weak.clone();
            Box::pin(async move {
                if let Some(unit) = weak.upgrade() {
                    let mut unit = unit.borrow_mut();
                    unit.on_start().await?;
                }
                Ok(())
            })
        }
    });
    lifecycle.register_stop_hook(move || {
        let weak = weak.clone();
        Box::pin(async move {
            if let Some(unit) = weak.upgrade() {
                let mut unit = unit.borrow_mut();
                unit.on_stop().await?;
            }
            Ok(())
        })
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        RuntimeServices, TestReminderRegistry, TestStreamProviders, TestTimerRegistry,
    };
    use crate::storage::StorageManager;
    use crate::unit::{ActivationId, ContextCreator, FromContext};
    use async_trait::async_trait;

    struct NullUnit;

    #[async_trait(?Send)]
    impl Unit for NullUnit {}

    impl FromContext for NullUnit {
        fn from_context(_ctx: ActivationContext) -> Option<Self> {
            Some(NullUnit)
        }
    }

    struct NeverUnit;

    #[async_trait(?Send)]
    impl Unit for NeverUnit {}

    impl FromContext for NeverUnit {
        fn from_context(_ctx: ActivationContext) -> Option<Self> {
            None
        }
    }

    struct FailingStartUnit;

    #[async_trait(?Send)]
    impl Unit for FailingStartUnit {
        async fn on_start(&mut self) -> Result<(), UnitError> {
            Err(UnitError::Failed("start refused".to_string()))
        }
    }

    impl FromContext for FailingStartUnit {
        fn from_context(_ctx: ActivationContext) -> Option<Self> {
            Some(FailingStartUnit)
        }
    }

    fn test_services() -> RuntimeServices {
        RuntimeServices {
            storage: Rc::new(StorageManager::new()),
            timers: Rc::new(TestTimerRegistry::new()),
            reminders: Rc::new(TestReminderRegistry::new()),
            streams: Rc::new(TestStreamProviders::new()),
        }
    }

    fn test_context(
        identity: UnitIdentity,
        lifecycle: Rc<LifecycleController>,
    ) -> ActivationContext {
        ActivationContext::new(identity, ActivationId::new(0), lifecycle, test_services())
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let registry = UnitRegistry::new();
        let identity = UnitIdentity::integer(42);
        let creator = ContextCreator::<NullUnit>::new();

        let first = registry
            .get_or_create::<_, NullUnit>(identity.clone(), &creator, {
                let identity = identity.clone();
                |lc| test_context(identity, lc)
            })
            .await
            .unwrap();
        assert!(first.fresh);
        assert!(first.lifecycle.state().is_active());

        let second = registry
            .get_or_create::<_, NullUnit>(identity.clone(), &creator, {
                let identity = identity.clone();
                |lc| test_context(identity, lc)
            })
            .await
            .unwrap();
        assert!(!second.fresh);
        assert!(Rc::ptr_eq(&first.instance, &second.instance));
        assert_eq!(registry.count(), 1);
    }

    #[tokio::test]
    async fn test_distinct_identities_get_distinct_instances() {
        let registry = UnitRegistry::new();
        let creator = ContextCreator::<NullUnit>::new();

        let a = registry
            .get_or_create::<_, NullUnit>(UnitIdentity::integer(42), &creator, |lc| {
                test_context(UnitIdentity::integer(42), lc)
            })
            .await
            .unwrap();
        let b = registry
            .get_or_create::<_, NullUnit>(UnitIdentity::integer(43), &creator, |lc| {
                test_context(UnitIdentity::integer(43), lc)
            })
            .await
            .unwrap();

        assert!(!Rc::ptr_eq(&a.instance, &b.instance));
        assert_eq!(registry.count(), 2);
    }

    #[tokio::test]
    async fn test_creator_returning_none_is_an_instantiation_error() {
        let registry = UnitRegistry::new();
        let creator = ContextCreator::<NeverUnit>::new();

        let err = registry
            .get_or_create::<_, NeverUnit>(UnitIdentity::integer(1), &creator, |lc| {
                test_context(UnitIdentity::integer(1), lc)
            })
            .await
            .unwrap_err();

        assert!(matches!(err, UnitError::Instantiation { .. }));
        assert_eq!(registry.count(), 0);
    }

    #[tokio::test]
    async fn test_failed_start_leaves_no_record() {
        let registry = UnitRegistry::new();
        let identity = UnitIdentity::integer(5);
        let creator = ContextCreator::<FailingStartUnit>::new();

        let err = registry
            .get_or_create::<_, FailingStartUnit>(identity.clone(), &creator, {
                let identity = identity.clone();
                |lc| test_context(identity, lc)
            })
            .await
            .unwrap_err();

        assert!(matches!(err, UnitError::Failed(_)));
        assert_eq!(registry.count(), 0);
        assert!(registry.find::<FailingStartUnit>(&identity).is_none());
    }

    #[tokio::test]
    async fn test_register_is_last_write_wins() {
        let registry = UnitRegistry::new();
        let identity = UnitIdentity::string("dup");

        let make_record = || {
            let instance: Rc<RefCell<NullUnit>> = Rc::new(RefCell::new(NullUnit));
            UnitRecord {
                instance: instance.clone(),
                lifecycle: Rc::new(LifecycleController::new()),
            }
        };

        let first = make_record();
        let second = make_record();
        registry.register::<NullUnit>(identity.clone(), first);
        registry.register::<NullUnit>(identity.clone(), second.clone());

        assert_eq!(registry.count(), 1);
        let found = registry.find::<NullUnit>(&identity).unwrap();
        assert!(Rc::ptr_eq(&found.instance, &second.instance));
    }

    #[tokio::test]
    async fn test_remove_instance_requires_pointer_match() {
        let registry = UnitRegistry::new();
        let identity = UnitIdentity::integer(7);
        let creator = ContextCreator::<NullUnit>::new();

        let activation = registry
            .get_or_create::<_, NullUnit>(identity.clone(), &creator, {
                let identity = identity.clone();
                |lc| test_context(identity, lc)
            })
            .await
            .unwrap();

        let interface = TypeId::of::<NullUnit>();
        let bogus = Rc::new(RefCell::new(NullUnit));
        assert!(!registry.remove_instance(
            &identity,
            interface,
            Rc::as_ptr(&bogus) as *const ()
        ));
        assert_eq!(registry.count(), 1);

        let ptr = Rc::as_ptr(&activation.instance) as *const ();
        assert!(registry.remove_instance(&identity, interface, ptr));
        assert_eq!(registry.count(), 0);
    }
}
