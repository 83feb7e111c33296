//! Error types for the silokit test harness.

use crate::unit::{LifecycleState, UnitIdentity};
use thiserror::Error;

/// Errors surfaced by silo operations.
///
/// The harness is deterministic, so every failure is fatal to the operation
/// that triggered it and is never retried. Prior state (an already-activated
/// unit, already-counted storage accesses) is left intact.
#[derive(Debug, Error)]
pub enum UnitError {
    /// The unit creator produced no usable instance for the requested
    /// identity.
    #[error("unable to instantiate unit {unit_type} for identity {identity}")]
    Instantiation {
        /// Concrete unit type that was requested.
        unit_type: &'static str,
        /// Identity the creation was attempted for.
        identity: UnitIdentity,
    },

    /// A lifecycle trigger was invoked out of valid state order.
    #[error("lifecycle {operation} is not valid in state {state:?}")]
    LifecycleOrder {
        /// The trigger that was attempted ("start" or "stop").
        operation: &'static str,
        /// State the controller was in at the time.
        state: LifecycleState,
    },

    /// Deactivation was requested for an instance with no tracked lifecycle
    /// record.
    #[error("no lifecycle record exists for the given unit instance")]
    UnknownUnit,

    /// Storage was requested with a state type inconsistent with the slot's
    /// established type.
    #[error("storage slot already holds state of type {existing}, requested {requested}")]
    StorageTypeMismatch {
        /// State type the slot was created with.
        existing: &'static str,
        /// State type of the mismatched request.
        requested: &'static str,
    },

    /// A unit-level hook or operation failed.
    #[error("unit operation failed: {0}")]
    Failed(String),
}
