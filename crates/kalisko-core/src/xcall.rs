//! Named request/response handlers operating on [`crate::store::Store`].
//!
//! Unlike hooks, an xcall has exactly one handler: invoking an unknown name
//! is reported in the response tree rather than rejected outright, since an
//! xcall's whole interface is "hand me a tree, get a tree back" — there is
//! no distinct out-of-band error channel to a caller that only sees `Store`
//! values crossing the boundary.

use crate::error::UsageError;
use crate::store::Store;
use std::collections::HashMap;

pub type XCallHandler = Box<dyn Fn(&Store) -> Store>;

/// Path in the request tree naming which handler to dispatch to.
pub const FUNCTION_PATH: &str = "xcall/function";
/// Path the registry writes an error message under in the response tree
/// when `FUNCTION_PATH` is missing or names no registered handler.
pub const ERROR_PATH: &str = "xcall/error";

struct Entry {
	handler: XCallHandler,
	owner_module: Option<String>,
}

#[derive(Default)]
pub struct XCallRegistry {
	entries: HashMap<String, Entry>,
}

impl XCallRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, name: &str, handler: XCallHandler, owner_module: Option<String>) -> Result<(), UsageError> {
		if self.entries.contains_key(name) {
			return Err(UsageError::XCallAlreadyExists(name.to_string()));
		}
		self.entries.insert(name.to_string(), Entry { handler, owner_module });
		tracing::debug!(xcall = name, "xcall registered");
		Ok(())
	}

	pub fn unregister(&mut self, name: &str) -> Result<(), UsageError> {
		self.entries.remove(name).ok_or_else(|| UsageError::NoSuchXCall(name.to_string()))?;
		Ok(())
	}

	pub fn exists(&self, name: &str) -> bool {
		self.entries.contains_key(name)
	}

	/// Reads the handler name out of `request`'s `"xcall/function"` path and
	/// dispatches to it. If that path is missing or names no registered
	/// handler, the response is an otherwise-empty tree with
	/// `"xcall/error"` set to a message describing why.
	pub fn invoke(&self, request: &Store) -> Store {
		let Some(name) = request.get_path(FUNCTION_PATH).and_then(Store::as_str) else {
			return error_response("request is missing \"xcall/function\"");
		};
		match self.entries.get(name) {
			Some(entry) => (entry.handler)(request),
			None => error_response(&format!("no such xcall: {name}")),
		}
	}

	/// Unregisters every xcall owned by `module`, used when that module
	/// unloads.
	pub fn remove_xcalls_of_module(&mut self, module: &str) {
		self.entries.retain(|_, entry| entry.owner_module.as_deref() != Some(module));
	}
}

fn error_response(message: &str) -> Store {
	let mut response = Store::create_array();
	response.set_path(ERROR_PATH, Store::create_string(message)).expect("fresh array always accepts a flat path");
	response
}

/// Builds a request tree naming `function`, for callers that don't need
/// any further parameters.
pub fn request(function: &str) -> Store {
	let mut req = Store::create_array();
	req.set_path(FUNCTION_PATH, Store::create_string(function)).expect("fresh array always accepts a flat path");
	req
}

#[cfg(test)]
mod tests {
	use super::*;

	fn echo_request(function: &str, payload: &str) -> Store {
		let mut req = request(function);
		req.set_path("payload", Store::create_string(payload)).unwrap();
		req
	}

	#[test]
	fn register_then_invoke_round_trips() {
		let mut registry = XCallRegistry::new();
		registry.register("echo", Box::new(|req: &Store| req.get_path("payload").unwrap().clone()), None).unwrap();
		let response = registry.invoke(&echo_request("echo", "hi"));
		assert_eq!(response.as_str(), Some("hi"));
	}

	#[test]
	fn duplicate_register_is_rejected() {
		let mut registry = XCallRegistry::new();
		registry.register("echo", Box::new(|req: &Store| req.clone()), None).unwrap();
		assert!(matches!(
			registry.register("echo", Box::new(|req: &Store| req.clone()), None),
			Err(UsageError::XCallAlreadyExists(_))
		));
	}

	#[test]
	fn invoke_unknown_function_writes_xcall_error() {
		let registry = XCallRegistry::new();
		let response = registry.invoke(&request("missing"));
		assert!(response.get_path(ERROR_PATH).and_then(Store::as_str).is_some());
	}

	#[test]
	fn invoke_without_function_path_writes_xcall_error() {
		let registry = XCallRegistry::new();
		let response = registry.invoke(&Store::create_array());
		assert!(response.get_path(ERROR_PATH).and_then(Store::as_str).is_some());
	}

	#[test]
	fn unload_removes_only_owned_xcalls() {
		let mut registry = XCallRegistry::new();
		registry.register("a_call", Box::new(|req: &Store| req.clone()), Some("a".to_string())).unwrap();
		registry.register("b_call", Box::new(|req: &Store| req.clone()), Some("b".to_string())).unwrap();
		registry.remove_xcalls_of_module("a");
		assert!(!registry.exists("a_call"));
		assert!(registry.exists("b_call"));
	}
}
