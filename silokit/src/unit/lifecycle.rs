//! Unit lifecycle state machine and ordered hook execution.

use crate::error::UnitError;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;

/// Unit lifecycle state machine.
///
/// # State Transitions
///
/// ```text
/// Created → Activating → Active → Deactivating → Deactivated
/// ```
///
/// A controller moves through the start half exactly once and the stop half
/// exactly once; there is no backward edge. A deactivated identity is never
/// resurrected — re-creating it yields a brand-new controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Instance created, start sequence not yet triggered.
    Created,

    /// Start hooks in progress.
    Activating,

    /// Start sequence completed, unit is live.
    Active,

    /// Stop hooks in progress.
    Deactivating,

    /// Stop sequence completed, unit is retired.
    Deactivated,
}

impl LifecycleState {
    /// Check whether the unit has completed its start sequence and has not
    /// begun stopping.
    pub fn is_active(&self) -> bool {
        matches!(self, LifecycleState::Active)
    }

    /// Check whether this is the terminal state.
    pub fn is_deactivated(&self) -> bool {
        matches!(self, LifecycleState::Deactivated)
    }
}

/// Future returned by a lifecycle hook.
pub type HookFuture = Pin<Box<dyn Future<Output = Result<(), UnitError>>>>;

/// A registered start or stop hook.
///
/// Hooks are closures so they can capture whatever references they need
/// (typically a `Weak` handle to the unit instance); each invocation produces
/// a fresh future that the controller awaits to completion.
pub type LifecycleHook = Box<dyn Fn() -> HookFuture>;

/// Per-unit state machine driving ordered start/stop hook execution.
///
/// Start hooks run in registration order; stop hooks run in reverse
/// registration order, mirroring layered startup/shutdown: the last thing
/// activated is the first thing deactivated. The controller does not know
/// what a hook does, only when to run it.
///
/// Hook execution is awaited sequentially — each hook completes before the
/// next begins — but nothing runs in parallel with it, so a hook that never
/// completes stalls the calling test.
///
/// # Example
///
/// ```rust,ignore
/// let lifecycle = LifecycleController::new();
/// lifecycle.register_start_hook(|| Box::pin(async { Ok(()) }));
/// lifecycle.trigger_start().await?;
/// assert!(lifecycle.state().is_active());
/// ```
pub struct LifecycleController {
    state: Cell<LifecycleState>,
    start_hooks: RefCell<Vec<LifecycleHook>>,
    stop_hooks: RefCell<Vec<LifecycleHook>>,
}

impl LifecycleController {
    /// Create a controller in the `Created` state with no hooks.
    pub fn new() -> Self {
        Self {
            state: Cell::new(LifecycleState::Created),
            start_hooks: RefCell::new(Vec::new()),
            stop_hooks: RefCell::new(Vec::new()),
        }
    }

    /// Get the current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    /// Register a hook to run during the start sequence.
    ///
    /// Hooks execute in registration order.
    pub fn register_start_hook(&self, hook: impl Fn() -> HookFuture + 'static) {
        self.start_hooks.borrow_mut().push(Box::new(hook));
    }

    /// Register a hook to run during the stop sequence.
    ///
    /// Hooks execute in reverse registration order.
    pub fn register_stop_hook(&self, hook: impl Fn() -> HookFuture + 'static) {
        self.stop_hooks.borrow_mut().push(Box::new(hook));
    }

    /// Run the start sequence: `Created → Activating → Active`.
    ///
    /// Each start hook is awaited to completion before the next begins. Valid
    /// only once per controller; calling it in any state other than `Created`
    /// signals [`UnitError::LifecycleOrder`]. A failing hook aborts the
    /// trigger and leaves the controller in `Activating`.
    pub async fn trigger_start(&self) -> Result<(), UnitError> {
        let state = self.state.get();
        if state != LifecycleState::Created {
            return Err(UnitError::LifecycleOrder {
                operation: "start",
                state,
            });
        }

        self.state.set(LifecycleState::Activating);
        tracing::debug!("lifecycle start triggered");

        let count = self.start_hooks.borrow().len();
        for index in 0..count {
            // The borrow is dropped before the future is awaited.
            let future = (self.start_hooks.borrow()[index])();
            future.await?;
        }

        self.state.set(LifecycleState::Active);
        Ok(())
    }

    /// Run the stop sequence: `Active → Deactivating → Deactivated`.
    ///
    /// Stop hooks are awaited in reverse registration order. Valid only from
    /// `Active`; any other state signals [`UnitError::LifecycleOrder`]. A
    /// failing hook aborts the trigger and leaves the controller in
    /// `Deactivating`.
    pub async fn trigger_stop(&self) -> Result<(), UnitError> {
        let state = self.state.get();
        if state != LifecycleState::Active {
            return Err(UnitError::LifecycleOrder {
                operation: "stop",
                state,
            });
        }

        self.state.set(LifecycleState::Deactivating);
        tracing::debug!("lifecycle stop triggered");

        let count = self.stop_hooks.borrow().len();
        for index in (0..count).rev() {
            let future = (self.stop_hooks.borrow()[index])();
            future.await?;
        }

        self.state.set(LifecycleState::Deactivated);
        Ok(())
    }
}

impl Default for LifecycleController {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LifecycleController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleController")
            .field("state", &self.state.get())
            .field("start_hooks", &self.start_hooks.borrow().len())
            .field("stop_hooks", &self.stop_hooks.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording_hook(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> LifecycleHook {
        let log = log.clone();
        Box::new(move || {
            let log = log.clone();
            Box::pin(async move {
                log.borrow_mut().push(tag);
                Ok(())
            })
        })
    }

    #[tokio::test]
    async fn test_start_hooks_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let lifecycle = LifecycleController::new();

        lifecycle.register_start_hook(recording_hook(&log, "first"));
        lifecycle.register_start_hook(recording_hook(&log, "second"));
        lifecycle.register_start_hook(recording_hook(&log, "third"));

        lifecycle.trigger_start().await.unwrap();

        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
        assert_eq!(lifecycle.state(), LifecycleState::Active);
    }

    #[tokio::test]
    async fn test_stop_hooks_run_in_reverse_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let lifecycle = LifecycleController::new();

        lifecycle.register_stop_hook(recording_hook(&log, "first"));
        lifecycle.register_stop_hook(recording_hook(&log, "second"));

        lifecycle.trigger_start().await.unwrap();
        lifecycle.trigger_stop().await.unwrap();

        assert_eq!(*log.borrow(), vec!["second", "first"]);
        assert_eq!(lifecycle.state(), LifecycleState::Deactivated);
    }

    #[tokio::test]
    async fn test_stop_before_start_is_an_order_error() {
        let lifecycle = LifecycleController::new();

        let err = lifecycle.trigger_stop().await.unwrap_err();
        assert!(matches!(
            err,
            UnitError::LifecycleOrder {
                operation: "stop",
                state: LifecycleState::Created,
            }
        ));
    }

    #[tokio::test]
    async fn test_double_start_is_an_order_error() {
        let lifecycle = LifecycleController::new();
        lifecycle.trigger_start().await.unwrap();

        let err = lifecycle.trigger_start().await.unwrap_err();
        assert!(matches!(
            err,
            UnitError::LifecycleOrder {
                operation: "start",
                state: LifecycleState::Active,
            }
        ));
    }

    #[tokio::test]
    async fn test_double_stop_is_an_order_error() {
        let lifecycle = LifecycleController::new();
        lifecycle.trigger_start().await.unwrap();
        lifecycle.trigger_stop().await.unwrap();

        let err = lifecycle.trigger_stop().await.unwrap_err();
        assert!(matches!(
            err,
            UnitError::LifecycleOrder {
                operation: "stop",
                state: LifecycleState::Deactivated,
            }
        ));
    }

    #[tokio::test]
    async fn test_failing_start_hook_aborts_the_sequence() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let lifecycle = LifecycleController::new();

        lifecycle.register_start_hook(recording_hook(&log, "first"));
        lifecycle.register_start_hook(|| {
            Box::pin(async { Err(UnitError::Failed("boom".to_string())) })
        });
        lifecycle.register_start_hook(recording_hook(&log, "third"));

        let err = lifecycle.trigger_start().await.unwrap_err();
        assert!(matches!(err, UnitError::Failed(_)));

        // The first hook ran, the one after the failure did not, and the
        // controller is stuck mid-activation.
        assert_eq!(*log.borrow(), vec!["first"]);
        assert_eq!(lifecycle.state(), LifecycleState::Activating);
    }

    #[test]
    fn test_state_helpers() {
        assert!(LifecycleState::Active.is_active());
        assert!(!LifecycleState::Created.is_active());
        assert!(LifecycleState::Deactivated.is_deactivated());
        assert!(!LifecycleState::Deactivating.is_deactivated());
    }
}
