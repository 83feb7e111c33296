//! Unit trait definitions and the creator capability.

use crate::error::UnitError;
use crate::unit::ActivationContext;
use async_trait::async_trait;
use std::marker::PhantomData;

/// A virtual-actor-style object addressed by an identity.
///
/// Units have a managed activation/deactivation lifecycle: the silo wires
/// [`on_start`](Unit::on_start) and [`on_stop`](Unit::on_stop) into the
/// unit's lifecycle controller, so they run as part of the ordered start/stop
/// sequence. Both default to no-ops for units with no lifecycle behavior.
///
/// # Example
///
/// ```rust,ignore
/// struct CounterUnit {
///     ctx: ActivationContext,
///     started: bool,
/// }
///
/// #[async_trait(?Send)]
/// impl Unit for CounterUnit {
///     async fn on_start(&mut self) -> Result<(), UnitError> {
///         self.started = true;
///         Ok(())
///     }
/// }
/// ```
#[async_trait(?Send)]
pub trait Unit: 'static {
    /// Called once while the unit's start sequence runs.
    ///
    /// Runs after any hooks the unit registered during construction, before
    /// the lifecycle controller reaches `Active`. Returning an error aborts
    /// the creation call.
    async fn on_start(&mut self) -> Result<(), UnitError> {
        Ok(())
    }

    /// Called once while the unit's stop sequence runs.
    ///
    /// Runs before any hooks the unit registered during construction (stop
    /// hooks execute in reverse registration order).
    async fn on_stop(&mut self) -> Result<(), UnitError> {
        Ok(())
    }
}

/// Capability for building a raw unit instance from an activation context.
///
/// The registry invokes the creator exactly once per fresh activation.
/// Returning `None` means no usable instance could be produced and surfaces
/// as [`UnitError::Instantiation`] — fatal to that creation call, never
/// retried.
///
/// Both the concrete type (`Self::Unit`) and the interface type are supplied
/// explicitly at the call site; there is no runtime type inspection.
#[async_trait(?Send)]
pub trait UnitCreator {
    /// The concrete unit type this creator builds.
    type Unit: Unit;

    /// Build a raw instance for the given activation context.
    async fn create(&self, ctx: ActivationContext) -> Option<Self::Unit>;
}

/// Constructor trait for units that can be built directly from their
/// activation context.
///
/// Implementing this gives access to the convenience creation path
/// `silo.create_unit::<MyUnit>(key)`. Units needing external collaborators
/// implement [`UnitCreator`] on a dedicated creator type instead.
pub trait FromContext: Unit + Sized {
    /// Build the unit, or `None` if no usable instance can be produced.
    fn from_context(ctx: ActivationContext) -> Option<Self>;
}

/// Creator adapter for [`FromContext`] units.
///
/// A zero-sized [`UnitCreator`] that delegates to `U::from_context`. Used by
/// the silo's `create_unit` convenience methods.
pub struct ContextCreator<U>(PhantomData<U>);

impl<U> ContextCreator<U> {
    /// Create the adapter.
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<U> Default for ContextCreator<U> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl<U: FromContext> UnitCreator for ContextCreator<U> {
    type Unit = U;

    async fn create(&self, ctx: ActivationContext) -> Option<U> {
        U::from_context(ctx)
    }
}
