//! Timer-registration capability and its recording test double.

use crate::unit::UnitIdentity;
use std::cell::RefCell;
use std::time::Duration;

/// Capability for registering unit timers.
///
/// The harness only records registrations; wall-clock scheduling is an
/// external concern and is never simulated here.
pub trait TimerRegistry {
    /// Register a periodic timer for the given unit.
    fn register_timer(&self, identity: &UnitIdentity, due: Duration, period: Duration);
}

/// A timer registration captured by [`TestTimerRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredTimer {
    /// Identity of the unit that registered the timer.
    pub identity: UnitIdentity,

    /// Delay before the first tick.
    pub due: Duration,

    /// Interval between ticks.
    pub period: Duration,
}

/// Recording timer registry used by the test silo.
///
/// Tests assert against [`registrations`](TestTimerRegistry::registrations)
/// instead of waiting for timers to fire.
#[derive(Debug, Default)]
pub struct TestTimerRegistry {
    timers: RefCell<Vec<RegisteredTimer>>,
}

impl TestTimerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of recorded registrations.
    pub fn count(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Snapshot all recorded registrations.
    pub fn registrations(&self) -> Vec<RegisteredTimer> {
        self.timers.borrow().clone()
    }
}

impl TimerRegistry for TestTimerRegistry {
    fn register_timer(&self, identity: &UnitIdentity, due: Duration, period: Duration) {
        tracing::debug!(%identity, ?due, ?period, "timer registered");
        self.timers.borrow_mut().push(RegisteredTimer {
            identity: identity.clone(),
            due,
            period,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_registrations_are_recorded() {
        let registry = TestTimerRegistry::new();
        let identity = UnitIdentity::integer(1);

        registry.register_timer(&identity, Duration::from_secs(1), Duration::from_secs(5));
        registry.register_timer(&identity, Duration::ZERO, Duration::from_secs(30));

        assert_eq!(registry.count(), 2);
        let recorded = registry.registrations();
        assert_eq!(recorded[0].period, Duration::from_secs(5));
        assert_eq!(recorded[1].due, Duration::ZERO);
    }
}
