//! Named pub-sub hooks. Listeners attach in insertion order and are
//! dispatched from a snapshot taken at the start of `trigger`, so a
//! listener that attaches or detaches another listener mid-dispatch never
//! corrupts the in-progress trigger (it only affects the next one).

use crate::error::UsageError;
use kalisko_abi::{HookListenerFn, PayloadValue};
use std::collections::HashMap;

struct Listener {
	callback: HookListenerFn,
	context: *mut core::ffi::c_void,
}

// The registry only ever runs on the single event-loop thread; the raw
// pointer is opaque context owned by whoever attached it, not shared
// across threads by this type.
unsafe impl Send for Listener {}

struct Hook {
	listeners: Vec<Listener>,
}

#[derive(Default)]
pub struct HookRegistry {
	hooks: HashMap<String, Hook>,
}

impl HookRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, name: &str) -> Result<(), UsageError> {
		if self.hooks.contains_key(name) {
			return Err(UsageError::HookAlreadyExists(name.to_string()));
		}
		self.hooks.insert(name.to_string(), Hook { listeners: Vec::new() });
		tracing::debug!(hook = name, "hook added");
		Ok(())
	}

	pub fn remove(&mut self, name: &str) -> Result<(), UsageError> {
		self.hooks.remove(name).ok_or_else(|| UsageError::NoSuchHook(name.to_string()))?;
		tracing::debug!(hook = name, "hook removed");
		Ok(())
	}

	pub fn exists(&self, name: &str) -> bool {
		self.hooks.contains_key(name)
	}

	pub fn attach(
		&mut self,
		name: &str,
		callback: HookListenerFn,
		context: *mut core::ffi::c_void,
	) -> Result<(), UsageError> {
		let hook = self.hooks.get_mut(name).ok_or_else(|| UsageError::NoSuchHook(name.to_string()))?;
		hook.listeners.push(Listener { callback, context });
		Ok(())
	}

	/// Detaches the first listener matching `(callback, context)`. If the
	/// same pair was attached more than once, only that one instance is
	/// removed.
	pub fn detach(
		&mut self,
		name: &str,
		callback: HookListenerFn,
		context: *mut core::ffi::c_void,
	) -> Result<(), UsageError> {
		let hook = self.hooks.get_mut(name).ok_or_else(|| UsageError::NoSuchHook(name.to_string()))?;
		let position = hook
			.listeners
			.iter()
			.position(|l| l.callback as usize == callback as usize && l.context == context)
			.ok_or_else(|| UsageError::ListenerNotAttached(name.to_string()))?;
		hook.listeners.remove(position);
		Ok(())
	}

	/// Dispatches `payload` to every listener attached at the moment
	/// `trigger` was called, returning how many were notified. Listener side
	/// effects on the hook table (attach, detach, even `remove`-ing this
	/// hook) never affect the snapshot already in flight.
	pub fn trigger(&self, name: &str, payload: &[PayloadValue]) -> Result<usize, UsageError> {
		let hook = self.hooks.get(name).ok_or_else(|| UsageError::NoSuchHook(name.to_string()))?;
		let snapshot: Vec<(HookListenerFn, *mut core::ffi::c_void)> =
			hook.listeners.iter().map(|l| (l.callback, l.context)).collect();

		let count = snapshot.len();
		for (callback, context) in snapshot {
			unsafe { callback(context, payload.as_ptr(), payload.len()) };
		}
		Ok(count)
	}
}
