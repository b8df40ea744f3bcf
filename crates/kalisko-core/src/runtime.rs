//! The runtime: owns the hook, timer and xcall registries plus the module
//! graph, and drives the sleep-until-next-deadline event loop.
//!
//! Guest initializers receive a `*mut c_void` they cast back to `&mut
//! Runtime` to reach the registries. The reflective built-in xcalls (module
//! introspection, request/revoke/force-unload) need the same access but
//! have no such parameter in their call signature, so they read it from a
//! thread-local "current runtime" pointer set for the duration of the
//! dispatch — the same current-context-guard shape used elsewhere in this
//! codebase for scoping access to a single active instance during a
//! callback.

use crate::error::Error;
use crate::hook::HookRegistry;
use crate::module::ModuleGraph;
use crate::store::Store;
use crate::timer::TimerScheduler;
use crate::xcall::XCallRegistry;
use std::cell::RefCell;
use std::ffi::c_void;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Floor on the event loop's sleep, mirroring the minimum tick interval the
/// original scheduler enforces so a timer landing in the immediate past
/// doesn't spin the loop with zero-length sleeps.
const MIN_SLEEP: Duration = Duration::from_micros(1000);

thread_local! {
	static ACTIVE_RUNTIME: RefCell<*mut Runtime> = const { RefCell::new(std::ptr::null_mut()) };
}

struct RuntimeGuard {
	previous: *mut Runtime,
}

impl RuntimeGuard {
	fn enter(current: *mut Runtime) -> Self {
		let previous = ACTIVE_RUNTIME.with(|cell| cell.replace(current));
		RuntimeGuard { previous }
	}
}

impl Drop for RuntimeGuard {
	fn drop(&mut self) {
		ACTIVE_RUNTIME.with(|cell| *cell.borrow_mut() = self.previous);
	}
}

/// # Safety
/// Only valid while called from within a dispatch that went through
/// [`RuntimeGuard::enter`] — i.e. from inside a built-in xcall handler.
unsafe fn with_active_runtime<R>(f: impl FnOnce(&mut Runtime) -> R) -> Option<R> {
	let ptr = ACTIVE_RUNTIME.with(|cell| *cell.borrow());
	if ptr.is_null() {
		return None;
	}
	Some(f(unsafe { &mut *ptr }))
}

/// Reads the target module name a reflective builtin xcall operates on
/// from the request tree's `"module"` path.
fn module_argument(request: &Store) -> Option<&str> {
	request.get_path("module").and_then(Store::as_str)
}

pub struct Runtime {
	pub hooks: HookRegistry,
	pub timers: TimerScheduler,
	pub xcalls: XCallRegistry,
	pub modules: ModuleGraph,
}

impl Runtime {
	pub fn new(search_paths: Vec<PathBuf>) -> Self {
		let mut runtime = Runtime {
			hooks: HookRegistry::new(),
			timers: TimerScheduler::new(),
			xcalls: XCallRegistry::new(),
			modules: ModuleGraph::new(search_paths),
		};
		runtime.install_builtin_xcalls();
		runtime
	}

	fn self_ptr(&mut self) -> *mut c_void {
		self as *mut Runtime as *mut c_void
	}

	pub fn request_module(&mut self, name: &str) -> Result<(), Error> {
		let rt = self.self_ptr();
		let _guard = RuntimeGuard::enter(rt as *mut Runtime);
		self.modules.request(name, rt)
	}

	pub fn revoke_module(&mut self, name: &str) -> Result<(), Error> {
		let rt = self.self_ptr();
		let _guard = RuntimeGuard::enter(rt as *mut Runtime);
		self.modules.revoke(name)
	}

	pub fn force_unload_module(&mut self, name: &str) -> Result<(), Error> {
		let rt = self.self_ptr();
		let _guard = RuntimeGuard::enter(rt as *mut Runtime);
		self.modules.force_unload(name)
	}

	/// Dispatches `request` through the xcall registry. The handler name is
	/// read from `"xcall/function"` within `request` itself, not passed
	/// separately — an unknown or missing name comes back as an
	/// `"xcall/error"` entry in the response tree rather than a `Result`
	/// error, matching every other xcall's calling convention.
	pub fn invoke_xcall(&mut self, request: &Store) -> Store {
		let rt = self.self_ptr();
		let _guard = RuntimeGuard::enter(rt as *mut Runtime);
		self.xcalls.invoke(request)
	}

	/// Runs the event loop: requests `seed_module` (the root the caller
	/// actually wants), then sleeps until the earliest pending timer
	/// deadline and ticks, repeating until no timers remain pending or a
	/// graceful exit has been requested. A graceful exit stops the loop
	/// after the current drain even if further timers remain scheduled.
	pub fn run(&mut self, seed_module: &str) -> Result<(), Error> {
		self.request_module(seed_module)?;
		while self.timers.has_pending() && !self.timers.is_exiting() {
			let deadline = self.timers.next_deadline().expect("has_pending just checked");
			let now = Instant::now();
			let sleep_for = deadline.saturating_duration_since(now).max(MIN_SLEEP);
			std::thread::sleep(sleep_for);
			self.timers.tick(Instant::now());
		}
		self.shutdown();
		Ok(())
	}

	/// Requests graceful exit on the timer scheduler and tears down every
	/// still-loaded module (other than `core`), in reverse-dependency order
	/// via `force_unload`.
	pub fn shutdown(&mut self) {
		self.timers.request_graceful_exit();
		for name in self.modules.active_modules() {
			if self.modules.status(&name).is_some() {
				let _ = self.force_unload_module(&name);
			}
		}
	}

	fn install_builtin_xcalls(&mut self) {
		self.xcalls
			.register(
				"module.author",
				Box::new(|request| {
					let Some(name) = module_argument(request) else {
						return Store::create_string("");
					};
					unsafe { with_active_runtime(|rt| rt.modules.metadata(name).map(|m| m.author)) }
						.flatten()
						.map(Store::create_string)
						.unwrap_or_else(|| Store::create_string(""))
				}),
				None,
			)
			.expect("builtin xcall names are registered once at startup");

		self.xcalls
			.register(
				"module.version",
				Box::new(|request| {
					let Some(name) = module_argument(request) else {
						return Store::create_string("");
					};
					unsafe { with_active_runtime(|rt| rt.modules.metadata(name).map(|m| m.version.to_string())) }
						.flatten()
						.map(Store::create_string)
						.unwrap_or_else(|| Store::create_string(""))
				}),
				None,
			)
			.expect("builtin xcall names are registered once at startup");

		self.xcalls
			.register(
				"module.request",
				Box::new(|request| {
					let Some(name) = module_argument(request) else {
						return Store::create_int(0);
					};
					let ok = unsafe { with_active_runtime(|rt| rt.request_module(name).is_ok()) }.unwrap_or(false);
					Store::create_int(ok as i64)
				}),
				None,
			)
			.expect("builtin xcall names are registered once at startup");

		self.xcalls
			.register(
				"module.revoke",
				Box::new(|request| {
					let Some(name) = module_argument(request) else {
						return Store::create_int(0);
					};
					let ok = unsafe { with_active_runtime(|rt| rt.revoke_module(name).is_ok()) }.unwrap_or(false);
					Store::create_int(ok as i64)
				}),
				None,
			)
			.expect("builtin xcall names are registered once at startup");

		self.xcalls
			.register(
				"module.force_unload",
				Box::new(|request| {
					let Some(name) = module_argument(request) else {
						return Store::create_int(0);
					};
					let ok = unsafe { with_active_runtime(|rt| rt.force_unload_module(name).is_ok()) }.unwrap_or(false);
					Store::create_int(ok as i64)
				}),
				None,
			)
			.expect("builtin xcall names are registered once at startup");

		self.xcalls
			.register(
				"runtime.exit",
				Box::new(|_request| {
					unsafe { with_active_runtime(|rt| rt.timers.request_graceful_exit()) };
					Store::create_int(1)
				}),
				None,
			)
			.expect("builtin xcall names are registered once at startup");
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_runtime_installs_reflective_xcalls() {
		let runtime = Runtime::new(Vec::new());
		assert!(runtime.xcalls.exists("module.author"));
		assert!(runtime.xcalls.exists("module.request"));
		assert!(runtime.xcalls.exists("module.revoke"));
		assert!(runtime.xcalls.exists("module.force_unload"));
		assert!(runtime.xcalls.exists("runtime.exit"));
	}

	#[test]
	fn runtime_exit_xcall_sets_the_graceful_exit_latch() {
		let mut runtime = Runtime::new(Vec::new());
		assert!(!runtime.timers.is_exiting());
		runtime.invoke_xcall(&crate::xcall::request("runtime.exit"));
		assert!(runtime.timers.is_exiting());
	}

	#[test]
	fn invoke_xcall_of_unknown_function_reports_xcall_error() {
		let mut runtime = Runtime::new(Vec::new());
		let response = runtime.invoke_xcall(&crate::xcall::request("nonexistent"));
		assert!(response.get_path(crate::xcall::ERROR_PATH).is_some());
	}

	#[test]
	fn request_unknown_module_surfaces_as_error() {
		let mut runtime = Runtime::new(vec![PathBuf::from("/nonexistent")]);
		assert!(runtime.request_module("does_not_exist").is_err());
	}

	#[test]
	fn run_with_no_pending_timers_and_no_seed_dependencies_returns_once_requested() {
		let mut runtime = Runtime::new(vec![PathBuf::from("/nonexistent")]);
		// The seed module can't be found in an empty search path; run()
		// should surface that as an error rather than looping forever.
		assert!(runtime.run("module_perform").is_err());
	}

	#[test]
	fn shutdown_is_idempotent_on_an_empty_graph() {
		let mut runtime = Runtime::new(Vec::new());
		runtime.shutdown();
		runtime.shutdown();
	}
}
