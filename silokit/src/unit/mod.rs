//! Unit identity, lifecycle, and registry types.

pub mod context;
pub mod identity;
pub mod lifecycle;
pub mod registry;
pub mod traits;

// Re-exports
pub use context::{ActivationContext, ActivationId};
pub use identity::{UnitIdentity, UnitKey};
pub use lifecycle::{HookFuture, LifecycleController, LifecycleHook, LifecycleState};
pub use registry::{Activation, UnitRecord, UnitRegistry};
pub use traits::{ContextCreator, FromContext, Unit, UnitCreator};
