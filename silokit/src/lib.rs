//! # Silokit
//!
//! In-process test silo for virtual-actor units.
//!
//! Silokit reproduces a virtual-actor runtime's single-activation semantics —
//! identity-addressed instantiation, ordered lifecycle transitions, and
//! per-unit durable-state access — entirely in memory, so unit ("grain-style"
//! actor) implementations can be tested without a real cluster while keeping
//! the asynchronous contract real units expect.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ TestSilo (composition root)                                 │
//! │                                                             │
//! │  ┌───────────────────────────┐  ┌────────────────────────┐  │
//! │  │ UnitRegistry              │  │ StorageManager         │  │
//! │  │ (identity, interface)     │  │ per-instance typed     │  │
//! │  │   → instance + lifecycle  │  │ slots + access counts  │  │
//! │  └───────────────────────────┘  └────────────────────────┘  │
//! │                                                             │
//! │  ┌───────────────────────────┐  ┌────────────────────────┐  │
//! │  │ LifecycleController       │  │ RuntimeServices        │  │
//! │  │ (one per activation)      │  │ timers / reminders /   │  │
//! │  │ ordered start/stop hooks  │  │ streams facades        │  │
//! │  └───────────────────────────┘  └────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use silokit::prelude::*;
//!
//! let silo = TestSilo::new();
//!
//! // Creation runs the unit's start sequence before returning.
//! let unit = silo.create_unit::<CounterUnit>(42).await?;
//!
//! // Same identity, same instance.
//! let again = silo.create_unit::<CounterUnit>(42).await?;
//! assert!(Rc::ptr_eq(&unit, &again));
//!
//! silo.deactivate(&unit).await?;
//! ```
//!
//! ## Execution Model
//!
//! Everything is single-threaded and cooperative: one silo per test, `Rc` /
//! `RefCell` ownership, no locking. Async surfaces exist to preserve the
//! calling convention real units are written against, not to run anything in
//! parallel.

#![deny(missing_docs)]

pub mod error;
pub mod prelude;
pub mod services;
pub mod silo;
pub mod storage;
pub mod unit;

// Re-exports
pub use error::UnitError;
pub use silo::TestSilo;
pub use storage::{StorageManager, StorageStats, UnitStorage};
pub use unit::{
    ActivationContext, ActivationId, FromContext, LifecycleController, LifecycleState, Unit,
    UnitCreator, UnitIdentity, UnitKey, UnitRegistry,
};
