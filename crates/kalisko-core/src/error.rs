//! Error kinds per the error handling design: resolution and usage errors
//! are ordinary returned values; invariant violations are a bug in the
//! core itself and abort the process rather than propagate.

use kalisko_abi::{ModuleStatus, Version};
use std::path::PathBuf;

/// Failures while resolving a module's dependency subgraph (`need`).
/// Recovery: the partially-built subgraph is unwound and the failure is
/// surfaced to the top-level `request`.
#[derive(thiserror::Error, Debug)]
pub enum ResolutionError {
	#[error("library not found at {0:?}")]
	LibraryNotFound(PathBuf),
	#[error("failed to load dynamic library for module {module}: {source}")]
	Library { module: String, source: String },
	#[error("module {module} is missing required symbol {symbol}")]
	MissingSymbol { module: String, symbol: &'static str },
	#[error("library claims to be module {reported:?} but was requested as {name}")]
	NameMismatch { name: String, reported: String },
	#[error(
		"module {module} version {actual} does not satisfy requirement {requirement} (compatible down to {bcversion})"
	)]
	VersionIncompatible { module: String, requirement: Version, actual: Version, bcversion: Version },
	#[error("circular dependency detected on module {0}")]
	CircularDependency(String),
	#[error("initializer of module {module} returned {status:?}")]
	InitializerFailed { module: String, status: ModuleStatus },
}

/// Caller-misuse failures that leave registry/graph state unchanged.
#[derive(thiserror::Error, Debug)]
pub enum UsageError {
	#[error("hook {0} already exists")]
	HookAlreadyExists(String),
	#[error("no such hook: {0}")]
	NoSuchHook(String),
	#[error("listener not attached to hook {0}")]
	ListenerNotAttached(String),
	#[error("xcall {0} already registered")]
	XCallAlreadyExists(String),
	#[error("no such xcall: {0}")]
	NoSuchXCall(String),
	#[error("module {0} is not in the graph")]
	NoSuchModule(String),
	#[error("module {0} is already requested")]
	AlreadyRequested(String),
	#[error("module {0} is not requested")]
	NotRequested(String),
	#[error("the core module can be neither requested nor revoked")]
	CoreIsReserved,
	#[error("runtime dependency from {source} to {target} already exists")]
	DependencyAlreadyExists { source: String, target: String },
	#[error("adding runtime dependency from {source} to {target} would create a cycle")]
	WouldCreateCycle { source: String, target: String },
}

/// Platform/loader-level failures not specific to a single module's graph
/// resolution (e.g. an unusable search path).
#[derive(thiserror::Error, Debug)]
pub enum PlatformError {
	#[error("search path {0:?} does not exist")]
	SearchPathNotFound(PathBuf),
}

/// Umbrella error for operations that can fail for more than one of the
/// reasons above, e.g. `request` is both a resolution and a usage surface.
#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error(transparent)]
	Resolution(#[from] ResolutionError),
	#[error(transparent)]
	Usage(#[from] UsageError),
	#[error(transparent)]
	Platform(#[from] PlatformError),
}

/// Logs and aborts the process. The module graph and related tables are
/// only ever mutated from the single event-loop thread, so reaching this
/// means an invariant the core itself is responsible for has already been
/// broken (e.g. a module missing from its own table on removal) — there is
/// no safe way to keep running with a corrupted graph.
#[cold]
pub fn invariant_violation(message: impl std::fmt::Display) -> ! {
	tracing::error!(%message, "invariant violation, aborting");
	std::process::exit(1)
}
