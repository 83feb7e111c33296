//! Common imports for silokit tests.
//!
//! This module provides a convenient prelude for importing commonly used types and traits.

// Re-export core types
pub use crate::error::UnitError;
pub use crate::services::{
    ReminderRegistry, RuntimeServices, StreamProvider, StreamProviderLookup, TimerRegistry,
};
pub use crate::silo::TestSilo;
pub use crate::storage::{StorageManager, StorageStats, UnitStorage};
pub use crate::unit::{
    ActivationContext, ActivationId, ContextCreator, FromContext, LifecycleController,
    LifecycleState, Unit, UnitCreator, UnitIdentity, UnitKey,
};

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use std::cell::RefCell;
pub use std::rc::Rc;
pub use std::time::Duration;
pub use uuid::Uuid;

/// Result type for silo operations.
pub type Result<T> = std::result::Result<T, UnitError>;
