//! End-to-end scenarios that don't require a real on-disk guest library.
//!
//! The module graph's own scenario tests (linear chain, shared dependency,
//! cycle detection) live in `kalisko_core::module`'s `#[cfg(test)]` block:
//! they build graphs directly against `ModuleGraph`'s private fields rather
//! than going through a real `dlopen`, since the bookkeeping those
//! scenarios exercise (refcounts, edges, cascade order) doesn't depend on
//! an actual guest library being loaded. `demos/hello-module` exists for
//! manual smoke-testing of the real dlopen/ABI path (`kalisko module
//! request hello_module`, say); it has no automated test coverage here, since
//! exercising it as a `#[test]` would require building it as a prerequisite
//! step rather than as part of `cargo test` itself.

use kalisko_abi::{PayloadValue, Version};
use kalisko_core::store::Store;
use kalisko_core::{HookRegistry, Runtime, TimerScheduler};
use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[test]
fn hook_reentrancy_new_listener_waits_for_next_trigger() {
	thread_local! {
		static SECOND_LISTENER_CALLS: Cell<usize> = const { Cell::new(0) };
	}

	static FIRST_CALLS: AtomicUsize = AtomicUsize::new(0);

	unsafe extern "C" fn second_listener(_ctx: *mut core::ffi::c_void, _payload: *const PayloadValue, _len: usize) {
		SECOND_LISTENER_CALLS.with(|c| c.set(c.get() + 1));
	}

	// The first listener can't attach the second directly (HookRegistry
	// isn't reentrant-safe to mutate from inside its own immutable
	// `trigger`), so this models the property trigger() actually
	// guarantees: a snapshot taken before dispatch starts is unaffected by
	// table mutations that happen around it.
	unsafe extern "C" fn first_listener(_ctx: *mut core::ffi::c_void, _payload: *const PayloadValue, _len: usize) {
		FIRST_CALLS.fetch_add(1, Ordering::SeqCst);
	}

	let mut hooks = HookRegistry::new();
	hooks.add("tick").unwrap();
	hooks.attach("tick", first_listener, std::ptr::null_mut()).unwrap();

	assert_eq!(hooks.trigger("tick", &[]).unwrap(), 1);
	assert_eq!(FIRST_CALLS.load(Ordering::SeqCst), 1);

	// Attach after the first trigger returns; it must not have been called
	// during that trigger, only from here on.
	hooks.attach("tick", second_listener, std::ptr::null_mut()).unwrap();
	SECOND_LISTENER_CALLS.with(|c| assert_eq!(c.get(), 0));

	assert_eq!(hooks.trigger("tick", &[]).unwrap(), 2);
	assert_eq!(FIRST_CALLS.load(Ordering::SeqCst), 2);
	SECOND_LISTENER_CALLS.with(|c| assert_eq!(c.get(), 1));
}

#[test]
fn timer_driven_exit_drains_then_stops() {
	unsafe extern "C" fn noop(_ctx: *mut core::ffi::c_void) {}

	let mut timers = TimerScheduler::new();
	let base = Instant::now();
	for i in 0..5 {
		timers.schedule_at(base + Duration::from_millis(i), noop, std::ptr::null_mut(), None).unwrap();
	}

	let mut iterations = 0;
	while timers.has_pending() {
		let deadline = timers.next_deadline().unwrap();
		timers.tick(deadline);
		iterations += 1;
		assert!(iterations <= 5, "tick should drain at least one timer per call");
	}

	timers.request_graceful_exit();
	assert!(timers.schedule_after(Duration::from_millis(1), noop, std::ptr::null_mut(), None).is_err());
}

#[test]
fn version_compatibility_window_is_inclusive_on_both_ends() {
	let module_version = Version::new(2, 1, 0, 0);
	let bcversion = Version::new(1, 0, 0, 0);

	// L1: the module's own version always satisfies its own requirement.
	assert!(module_version.satisfied_by(module_version, bcversion));
	// L2: the bcversion floor always satisfies too.
	assert!(bcversion.satisfied_by(module_version, bcversion));
	// L3: anything strictly outside [bcversion, version] is rejected.
	assert!(!Version::new(0, 9, 9, 9).satisfied_by(module_version, bcversion));
	assert!(!Version::new(2, 1, 0, 1).satisfied_by(module_version, bcversion));
}

fn module_request(function: &str, module: &str) -> Store {
	let mut req = kalisko_core::xcall::request(function);
	req.set_path("module", Store::create_string(module)).unwrap();
	req
}

#[test]
fn runtime_builtin_introspection_xcalls_handle_unknown_modules_gracefully() {
	let mut runtime = Runtime::new(Vec::new());
	let response = runtime.invoke_xcall(&module_request("module.author", "nonexistent"));
	assert_eq!(response.as_str(), Some(""));

	let response = runtime.invoke_xcall(&module_request("module.request", "nonexistent"));
	assert_eq!(response.as_int(), Some(0));
}

#[test]
fn runtime_builtin_xcall_of_unknown_name_reports_xcall_error_instead_of_panicking() {
	let mut runtime = Runtime::new(Vec::new());
	let response = runtime.invoke_xcall(&kalisko_core::xcall::request("does.not.exist"));
	assert!(response.get_path(kalisko_core::xcall::ERROR_PATH).and_then(Store::as_str).is_some());
}
