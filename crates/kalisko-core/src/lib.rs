//! Module lifecycle, hook/xcall registries, and the timer-driven event
//! loop that ties them together.

pub mod error;
pub mod hook;
pub mod module;
pub mod runtime;
pub mod store;
pub mod timer;
pub mod version;
pub mod xcall;

pub use error::{Error, PlatformError, ResolutionError, UsageError};
pub use hook::HookRegistry;
pub use module::{ModuleGraph, ModuleMetadata, ModuleState, CORE_MODULE};
pub use runtime::Runtime;
pub use store::Store;
pub use timer::{TimerHandle, TimerScheduler};
pub use xcall::{XCallHandler, XCallRegistry};
