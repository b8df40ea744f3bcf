//! The module dependency graph: loading, reference-counted lifetime, and
//! the recursive `need`/`unneed` resolution that drives it.
//!
//! Every requested module is pinned to a synthetic root called `core`,
//! matching the original's convention of representing "the user wants
//! this" as just another incoming reference rather than a special case
//! threaded through the whole graph.

use crate::error::{Error, ResolutionError, UsageError};
use kalisko_abi::{
	self as abi, DependencyList, KString, ModuleDependency as AbiDependency, ModuleStatus, Version,
	MODULE_AUTHOR_FN, MODULE_BCVERSION_FN, MODULE_DEPENDS_FN, MODULE_DESCRIPTION_FN, MODULE_FINALIZER_FN,
	MODULE_INITIALIZER_FN, MODULE_NAME_FN, MODULE_PREFIX, MODULE_SUFFIX, MODULE_VERSION_FN,
};
use libloading::{Library, Symbol};
use std::collections::{HashMap, HashSet};
use std::ffi::c_void;
use std::path::{Path, PathBuf};

/// The synthetic root every `request`ed module is pinned under.
pub const CORE_MODULE: &str = "core";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
	Loading,
	Loaded,
	Finalizing,
}

struct ModuleRecord {
	library: Library,
	path: PathBuf,
	author: String,
	description: String,
	version: Version,
	bcversion: Version,
	/// Dependencies declared by the module's own `depends` export.
	declared_dependencies: Vec<(String, Version)>,
	/// Extra edges added after load via `add_runtime_dependency`.
	runtime_dependencies: HashSet<String>,
	finalizer: Option<abi::ModuleFinalizerFn>,
	refcount: usize,
	status: ModuleState,
}

pub struct ModuleMetadata {
	pub name: String,
	pub author: String,
	pub description: String,
	pub version: Version,
	pub bcversion: Version,
	pub dependencies: Vec<(String, Version)>,
}

pub struct ModuleGraph {
	modules: HashMap<String, ModuleRecord>,
	search_paths: Vec<PathBuf>,
	default_search_paths: Vec<PathBuf>,
}

impl ModuleGraph {
	pub fn new(default_search_paths: Vec<PathBuf>) -> Self {
		let mut graph = ModuleGraph { modules: HashMap::new(), search_paths: default_search_paths.clone(), default_search_paths };
		graph.modules.insert(
			CORE_MODULE.to_string(),
			ModuleRecord {
				library: core_stub_library(),
				path: PathBuf::new(),
				author: "kalisko".to_string(),
				description: "synthetic root for requested modules".to_string(),
				version: Version::new(0, 0, 0, 0),
				bcversion: Version::new(0, 0, 0, 0),
				declared_dependencies: Vec::new(),
				runtime_dependencies: HashSet::new(),
				finalizer: None,
				refcount: 1,
				status: ModuleState::Loaded,
			},
		);
		graph
	}

	pub fn set_search_path(&mut self, path: PathBuf) -> Result<(), crate::error::PlatformError> {
		if !path.exists() {
			return Err(crate::error::PlatformError::SearchPathNotFound(path));
		}
		self.search_paths.insert(0, path);
		Ok(())
	}

	pub fn reset_search_path(&mut self) {
		self.search_paths = self.default_search_paths.clone();
	}

	pub fn is_loaded(&self, name: &str) -> bool {
		matches!(self.modules.get(name), Some(record) if record.status == ModuleState::Loaded)
	}

	pub fn status(&self, name: &str) -> Option<ModuleState> {
		self.modules.get(name).map(|record| record.status)
	}

	pub fn metadata(&self, name: &str) -> Option<ModuleMetadata> {
		let record = self.modules.get(name)?;
		Some(ModuleMetadata {
			name: name.to_string(),
			author: record.author.clone(),
			description: record.description.clone(),
			version: record.version,
			bcversion: record.bcversion,
			dependencies: record.declared_dependencies.clone(),
		})
	}

	/// Every currently loaded module other than the synthetic `core` root.
	pub fn active_modules(&self) -> Vec<String> {
		self.modules.keys().filter(|n| n.as_str() != CORE_MODULE).cloned().collect()
	}

	pub fn is_requested(&self, name: &str) -> bool {
		self.modules.get(CORE_MODULE).is_some_and(|core| core.runtime_dependencies.contains(name))
	}

	/// Current reference count, i.e. how many incoming edges (declared
	/// dependencies of other modules, runtime dependencies, and `core` if
	/// requested) are keeping `name` alive.
	pub fn rc(&self, name: &str) -> Option<usize> {
		self.modules.get(name).map(|record| record.refcount)
	}

	/// Modules that (directly or transitively) depend on `name` — the
	/// reverse of [`ModuleGraph::check_dependency`].
	pub fn rdeps(&self, name: &str) -> Vec<String> {
		self.reverse_dependencies(name)
	}

	/// The user-facing entry point: pins `name` under the `core` root and
	/// loads its whole dependency subgraph if it isn't already resolved.
	pub fn request(&mut self, name: &str, rt: *mut c_void) -> Result<(), Error> {
		if name == CORE_MODULE {
			return Err(UsageError::CoreIsReserved.into());
		}
		if self.is_requested(name) {
			return Err(UsageError::AlreadyRequested(name.to_string()).into());
		}
		let mut loading_stack = HashSet::new();
		self.need(name, rt, &mut loading_stack)?;
		self.add_edge(CORE_MODULE, name);
		Ok(())
	}

	/// Inverse of [`ModuleGraph::request`]: drops `core`'s reference and
	/// unwinds anything that reference was the last one keeping alive.
	pub fn revoke(&mut self, name: &str) -> Result<(), Error> {
		if name == CORE_MODULE {
			return Err(UsageError::CoreIsReserved.into());
		}
		if !self.is_requested(name) {
			return Err(UsageError::NotRequested(name.to_string()).into());
		}
		// Root set membership must be dropped before unneed(), exactly as in
		// the original: unneed() walking core's own dependency list must not
		// still see this module listed.
		self.remove_edge(CORE_MODULE, name);
		self.unneed(name, rt_null()).map_err(Error::from)
	}

	/// Unconditionally tears down `name` and every module that (transitively)
	/// depends on it, except `core` itself, regardless of remaining
	/// refcounts. Used for forced reloads, not ordinary teardown.
	///
	/// After removing `name` itself, its own dependencies are released via
	/// `unneed` exactly as they would be by a normal refcount-driven
	/// teardown — otherwise a forced unload would leave `name`'s
	/// dependencies resident forever with a stale refcount.
	pub fn force_unload(&mut self, name: &str) -> Result<(), Error> {
		if name == CORE_MODULE {
			return Err(UsageError::CoreIsReserved.into());
		}
		let rdeps = self.reverse_dependencies(name);
		for rdep in rdeps {
			if rdep != CORE_MODULE && self.modules.contains_key(&rdep) {
				self.force_unload(&rdep)?;
			}
		}
		if let Some(record) = self.modules.get(name) {
			let declared: Vec<String> = record.declared_dependencies.iter().map(|(d, _)| d.clone()).collect();
			let runtime_deps: Vec<String> = record.runtime_dependencies.iter().cloned().collect();
			self.unload_module(name, rt_null());
			for dep in declared.into_iter().chain(runtime_deps) {
				self.unneed(&dep, rt_null()).ok();
			}
		}
		self.remove_edge(CORE_MODULE, name);
		Ok(())
	}

	pub fn add_runtime_dependency(&mut self, source: &str, target: &str) -> Result<(), UsageError> {
		if !self.modules.contains_key(source) {
			return Err(UsageError::NoSuchModule(source.to_string()));
		}
		if !self.modules.contains_key(target) {
			return Err(UsageError::NoSuchModule(target.to_string()));
		}
		if self.check_dependency(source, target) {
			return Err(UsageError::DependencyAlreadyExists { source: source.to_string(), target: target.to_string() });
		}
		if self.check_dependency(target, source) || target == source {
			return Err(UsageError::WouldCreateCycle { source: source.to_string(), target: target.to_string() });
		}
		self.modules.get_mut(source).unwrap().runtime_dependencies.insert(target.to_string());
		self.modules.get_mut(target).unwrap().refcount += 1;
		Ok(())
	}

	/// Whether `source` depends (declared or runtime-added) on `target`,
	/// directly or transitively.
	pub fn check_dependency(&self, source: &str, target: &str) -> bool {
		let Some(record) = self.modules.get(source) else { return false };
		let direct = record.declared_dependencies.iter().any(|(d, _)| d == target) || record.runtime_dependencies.contains(target);
		if direct {
			return true;
		}
		self.all_dependencies(source).iter().any(|dep| dep == target)
	}

	fn all_dependencies(&self, name: &str) -> Vec<String> {
		let Some(record) = self.modules.get(name) else { return Vec::new() };
		let mut out = Vec::new();
		let mut stack: Vec<String> =
			record.declared_dependencies.iter().map(|(d, _)| d.clone()).chain(record.runtime_dependencies.iter().cloned()).collect();
		let mut seen = HashSet::new();
		while let Some(dep) = stack.pop() {
			if !seen.insert(dep.clone()) {
				continue;
			}
			if let Some(dep_record) = self.modules.get(&dep) {
				stack.extend(dep_record.declared_dependencies.iter().map(|(d, _)| d.clone()));
				stack.extend(dep_record.runtime_dependencies.iter().cloned());
			}
			out.push(dep);
		}
		out
	}

	fn reverse_dependencies(&self, name: &str) -> Vec<String> {
		self.modules.keys().filter(|candidate| candidate.as_str() != name && self.check_dependency(candidate, name)).cloned().collect()
	}

	fn add_edge(&mut self, source: &str, target: &str) {
		if let Some(record) = self.modules.get_mut(source) {
			record.runtime_dependencies.insert(target.to_string());
		}
	}

	fn remove_edge(&mut self, source: &str, target: &str) {
		if let Some(record) = self.modules.get_mut(source) {
			record.runtime_dependencies.remove(target);
		}
	}

	/// The recursive resolution algorithm. A module already `Loaded` just
	/// gets its refcount bumped; one currently `Loading` higher up the same
	/// call stack is a cycle; otherwise the library is loaded, its declared
	/// dependencies are resolved first, and only then is the initializer
	/// invoked.
	fn need(&mut self, name: &str, rt: *mut c_void, loading_stack: &mut HashSet<String>) -> Result<(), ResolutionError> {
		if let Some(record) = self.modules.get_mut(name) {
			if record.status == ModuleState::Loading {
				return Err(ResolutionError::CircularDependency(name.to_string()));
			}
			record.refcount += 1;
			return Ok(());
		}

		if !loading_stack.insert(name.to_string()) {
			return Err(ResolutionError::CircularDependency(name.to_string()));
		}

		let path = self.resolve_library_path(name)?;
		let record = load_module_record(name, &path)?;
		let declared_dependencies = record.declared_dependencies.clone();
		self.modules.insert(name.to_string(), record);
		if let Some(record) = self.modules.get_mut(name) {
			record.status = ModuleState::Loading;
		}

		let mut resolved_deps: Vec<String> = Vec::new();
		for (dep_name, dep_requirement) in &declared_dependencies {
			if let Err(err) = self.need(dep_name, rt, loading_stack) {
				for resolved in &resolved_deps {
					self.unneed(resolved, rt).ok();
				}
				self.modules.remove(name);
				loading_stack.remove(name);
				return Err(err);
			}
			resolved_deps.push(dep_name.clone());
			let Some(dep_record) = self.modules.get(dep_name) else {
				continue;
			};
			if !dep_requirement.satisfied_by(dep_record.version, dep_record.bcversion) {
				let actual = dep_record.version;
				let bcversion = dep_record.bcversion;
				for resolved in &resolved_deps {
					self.unneed(resolved, rt).ok();
				}
				self.modules.remove(name);
				loading_stack.remove(name);
				return Err(ResolutionError::VersionIncompatible {
					module: dep_name.clone(),
					requirement: *dep_requirement,
					actual,
					bcversion,
				});
			}
		}

		let init_status = self.call_initializer(name, rt)?;
		if init_status != ModuleStatus::Ok {
			for resolved in &resolved_deps {
				self.unneed(resolved, rt).ok();
			}
			self.modules.remove(name);
			loading_stack.remove(name);
			return Err(ResolutionError::InitializerFailed { module: name.to_string(), status: init_status });
		}

		if let Some(record) = self.modules.get_mut(name) {
			record.status = ModuleState::Loaded;
			record.refcount = 1;
		}
		loading_stack.remove(name);
		tracing::info!(module = name, "module loaded");
		Ok(())
	}

	/// Drops one reference; once it hits zero, the module's own
	/// dependencies are released (recursively) before the module itself is
	/// finalized and its library closed.
	fn unneed(&mut self, name: &str, rt: *mut c_void) -> Result<(), ResolutionError> {
		let Some(record) = self.modules.get_mut(name) else {
			return Err(ResolutionError::LibraryNotFound(PathBuf::from(name)));
		};
		record.refcount = record.refcount.saturating_sub(1);
		if record.refcount > 0 {
			return Ok(());
		}

		let declared: Vec<String> = record.declared_dependencies.iter().map(|(d, _)| d.clone()).collect();
		let runtime_deps: Vec<String> = record.runtime_dependencies.iter().cloned().collect();

		self.unload_module(name, rt);

		for dep in declared.into_iter().chain(runtime_deps) {
			self.unneed(&dep, rt).ok();
		}
		Ok(())
	}

	fn unload_module(&mut self, name: &str, rt: *mut c_void) {
		let Some(mut record) = self.modules.remove(name) else {
			crate::error::invariant_violation(format!("module {name} missing from graph during unload"));
		};
		record.status = ModuleState::Finalizing;
		if let Some(finalizer) = record.finalizer {
			unsafe { finalizer(rt) };
		}
		tracing::info!(module = name, "module unloaded");
		drop(record.library);
	}

	fn call_initializer(&self, name: &str, rt: *mut c_void) -> Result<ModuleStatus, ResolutionError> {
		let record = self.modules.get(name).expect("just inserted");
		let init: Symbol<abi::ModuleInitializerFn> = unsafe {
			record
				.library
				.get(MODULE_INITIALIZER_FN.to_bytes_with_nul())
				.map_err(|_| ResolutionError::MissingSymbol { module: name.to_string(), symbol: "kalisko_module_init" })?
		};
		Ok(unsafe { init(rt) })
	}

	fn resolve_library_path(&self, name: &str) -> Result<PathBuf, ResolutionError> {
		let filename = format!("{MODULE_PREFIX}{name}{MODULE_SUFFIX}");
		for dir in &self.search_paths {
			let candidate = dir.join(&filename);
			if candidate.exists() {
				return Ok(candidate);
			}
		}
		Err(ResolutionError::LibraryNotFound(PathBuf::from(filename)))
	}

	pub fn lookup_function<T>(&self, module: &str, symbol: &str) -> Result<Symbol<'_, T>, ResolutionError> {
		let record = self.modules.get(module).ok_or_else(|| ResolutionError::LibraryNotFound(PathBuf::from(module)))?;
		let mut bytes = symbol.as_bytes().to_vec();
		bytes.push(0);
		unsafe {
			record
				.library
				.get(&bytes)
				.map_err(|_| ResolutionError::MissingSymbol { module: module.to_string(), symbol: Box::leak(symbol.to_string().into_boxed_str()) })
		}
	}
}

fn rt_null() -> *mut c_void {
	std::ptr::null_mut()
}

/// Two-phase bind: first `RTLD_LAZY` just to read metadata symbols cheaply,
/// then reopen `RTLD_NOW | RTLD_GLOBAL` before calling into the module, so a
/// bad symbol table is caught before any guest code runs and later-loaded
/// modules can still resolve symbols this one exports.
fn load_module_record(name: &str, path: &Path) -> Result<ModuleRecord, ResolutionError> {
	#[cfg(unix)]
	let lazy_probe = unsafe {
		use libloading::os::unix::Library as UnixLibrary;
		UnixLibrary::open(Some(path), libloading::os::unix::RTLD_LAZY)
			.map(Library::from)
			.map_err(|e| ResolutionError::Library { module: name.to_string(), source: e.to_string() })?
	};
	#[cfg(not(unix))]
	let lazy_probe =
		unsafe { Library::new(path).map_err(|e| ResolutionError::Library { module: name.to_string(), source: e.to_string() })? };

	let reported_name = read_kstring(&lazy_probe, MODULE_NAME_FN, name)?;
	if reported_name != name {
		return Err(ResolutionError::NameMismatch { name: name.to_string(), reported: reported_name });
	}
	drop(lazy_probe);

	#[cfg(unix)]
	let library = unsafe {
		use libloading::os::unix::Library as UnixLibrary;
		UnixLibrary::open(Some(path), libloading::os::unix::RTLD_NOW | libloading::os::unix::RTLD_GLOBAL)
			.map(Library::from)
			.map_err(|e| ResolutionError::Library { module: name.to_string(), source: e.to_string() })?
	};
	#[cfg(not(unix))]
	let library =
		unsafe { Library::new(path).map_err(|e| ResolutionError::Library { module: name.to_string(), source: e.to_string() })? };

	let author = read_kstring(&library, MODULE_AUTHOR_FN, name)?;
	let description = read_kstring(&library, MODULE_DESCRIPTION_FN, name)?;
	let version = read_version(&library, MODULE_VERSION_FN, name)?;
	let bcversion = read_version(&library, MODULE_BCVERSION_FN, name)?;
	let declared_dependencies = read_dependencies(&library, name)?;
	let finalizer: Option<abi::ModuleFinalizerFn> =
		unsafe { library.get::<abi::ModuleFinalizerFn>(MODULE_FINALIZER_FN.to_bytes_with_nul()).ok().map(|sym| *sym) };

	Ok(ModuleRecord {
		library,
		path: path.to_path_buf(),
		author,
		description,
		version,
		bcversion,
		declared_dependencies,
		runtime_dependencies: HashSet::new(),
		finalizer,
		refcount: 0,
		status: ModuleState::Loading,
	})
}

fn read_kstring(library: &Library, symbol: &std::ffi::CStr, module: &str) -> Result<String, ResolutionError> {
	let func: Symbol<unsafe extern "C" fn() -> KString> = unsafe {
		library
			.get(symbol.to_bytes_with_nul())
			.map_err(|_| ResolutionError::MissingSymbol { module: module.to_string(), symbol: leak(symbol) })?
	};
	let ks = unsafe { func() };
	Ok(unsafe { ks.as_str() }.into_owned())
}

fn read_version(library: &Library, symbol: &std::ffi::CStr, module: &str) -> Result<Version, ResolutionError> {
	let func: Symbol<unsafe extern "C" fn() -> Version> = unsafe {
		library
			.get(symbol.to_bytes_with_nul())
			.map_err(|_| ResolutionError::MissingSymbol { module: module.to_string(), symbol: leak(symbol) })?
	};
	Ok(unsafe { func() })
}

fn read_dependencies(library: &Library, module: &str) -> Result<Vec<(String, Version)>, ResolutionError> {
	let func: Symbol<unsafe extern "C" fn() -> DependencyList> = unsafe {
		library
			.get(MODULE_DEPENDS_FN.to_bytes_with_nul())
			.map_err(|_| ResolutionError::MissingSymbol { module: module.to_string(), symbol: "kalisko_module_depends" })?
	};
	let list = unsafe { func() };
	let deps: &[AbiDependency] = unsafe { list.as_slice() };
	Ok(deps.iter().map(|d| (unsafe { d.name.as_str() }.into_owned(), d.required)).collect())
}

fn leak(symbol: &std::ffi::CStr) -> &'static str {
	Box::leak(symbol.to_string_lossy().into_owned().into_boxed_str())
}

/// `core`'s library handle is never dereferenced; it exists only so the
/// graph's storage doesn't need an `Option<Library>` for the one module
/// with no backing file.
fn core_stub_library() -> Library {
	#[cfg(unix)]
	unsafe {
		use libloading::os::unix::Library as UnixLibrary;
		UnixLibrary::this().into()
	}
	#[cfg(not(unix))]
	unsafe {
		Library::new(std::env::current_exe().expect("current executable path")).expect("self-open for core stub")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Inserts an already-`Loaded` module directly into the graph's table,
	/// bypassing `need`/dlopen entirely. `core_stub_library` gives us a real
	/// `Library` handle (the current executable, reopened) without needing
	/// an on-disk `cdylib` fixture, which is enough to exercise the graph's
	/// own bookkeeping (refcounts, edges, cascade order) in isolation from
	/// the loader.
	fn insert_loaded(graph: &mut ModuleGraph, name: &str, declared_dependencies: &[&str], refcount: usize) {
		graph.modules.insert(
			name.to_string(),
			ModuleRecord {
				library: core_stub_library(),
				path: PathBuf::new(),
				author: "test".to_string(),
				description: String::new(),
				version: Version::new(1, 0, 0, 0),
				bcversion: Version::new(1, 0, 0, 0),
				declared_dependencies: declared_dependencies.iter().map(|d| (d.to_string(), Version::new(1, 0, 0, 0))).collect(),
				runtime_dependencies: HashSet::new(),
				finalizer: None,
				refcount,
				status: ModuleState::Loaded,
			},
		);
	}

	/// Reproduces the linear chain `top -> mid -> bottom`: force-unloading
	/// `mid` must tear down `top` (which can no longer function without it)
	/// and must also release `mid`'s own dependency on `bottom`, rather than
	/// leaving `bottom` resident with a stale refcount.
	#[test]
	fn force_unload_of_a_middle_module_releases_its_own_dependencies_too() {
		let mut graph = ModuleGraph::new(Vec::new());
		insert_loaded(&mut graph, "bottom", &[], 1);
		insert_loaded(&mut graph, "mid", &["bottom"], 1);
		insert_loaded(&mut graph, "top", &["mid"], 1);
		graph.add_edge(CORE_MODULE, "top");

		graph.force_unload("mid").unwrap();

		assert!(!graph.is_loaded("top"));
		assert!(!graph.is_loaded("mid"));
		assert!(!graph.is_loaded("bottom"));
		assert_eq!(graph.rc("bottom"), None);
		assert_eq!(graph.active_modules(), Vec::<String>::new());
	}

	/// A shared dependency kept alive by two independent parents must
	/// survive force-unloading just one of them, with its refcount dropping
	/// by exactly one.
	#[test]
	fn force_unload_of_one_of_two_dependents_leaves_the_shared_dependency_alive() {
		let mut graph = ModuleGraph::new(Vec::new());
		insert_loaded(&mut graph, "shared", &[], 2);
		insert_loaded(&mut graph, "left", &["shared"], 1);
		insert_loaded(&mut graph, "right", &["shared"], 1);
		graph.add_edge(CORE_MODULE, "left");
		graph.add_edge(CORE_MODULE, "right");

		graph.force_unload("left").unwrap();

		assert!(!graph.is_loaded("left"));
		assert!(graph.is_loaded("right"));
		assert!(graph.is_loaded("shared"));
		assert_eq!(graph.rc("shared"), Some(1));
		let rdeps = graph.rdeps("shared");
		assert!(rdeps.contains(&"right".to_string()));
		assert!(!rdeps.contains(&"left".to_string()));
	}

	#[test]
	fn rc_and_rdeps_reflect_a_simple_dependency_edge() {
		let mut graph = ModuleGraph::new(Vec::new());
		insert_loaded(&mut graph, "util", &[], 2);
		insert_loaded(&mut graph, "a", &["util"], 1);
		insert_loaded(&mut graph, "b", &["util"], 1);

		assert_eq!(graph.rc("util"), Some(2));
		let mut rdeps = graph.rdeps("util");
		rdeps.sort();
		assert_eq!(rdeps, vec!["a".to_string(), "b".to_string()]);
	}

	/// A module still mid-initialization (status `Loading`) being `need`ed
	/// again further down the same resolution stack is exactly what a
	/// dependency cycle looks like from `need`'s point of view, regardless
	/// of whether the modules involved are real on-disk libraries.
	#[test]
	fn need_of_a_module_still_loading_is_reported_as_a_cycle() {
		let mut graph = ModuleGraph::new(Vec::new());
		insert_loaded(&mut graph, "a", &["b"], 1);
		graph.modules.get_mut("a").unwrap().status = ModuleState::Loading;

		let mut loading_stack = HashSet::new();
		let err = graph.need("a", rt_null(), &mut loading_stack).unwrap_err();
		assert!(matches!(err, ResolutionError::CircularDependency(name) if name == "a"));
	}

	#[test]
	fn core_module_exists_and_is_loaded_from_the_start() {
		let graph = ModuleGraph::new(Vec::new());
		assert!(graph.is_loaded(CORE_MODULE));
	}

	#[test]
	fn request_of_missing_library_fails_with_library_not_found() {
		let mut graph = ModuleGraph::new(vec![PathBuf::from("/nonexistent")]);
		let err = graph.request("does_not_exist", rt_null()).unwrap_err();
		assert!(matches!(err, Error::Resolution(ResolutionError::LibraryNotFound(_))));
	}

	#[test]
	fn revoke_of_core_is_rejected() {
		let mut graph = ModuleGraph::new(Vec::new());
		assert!(matches!(graph.revoke(CORE_MODULE), Err(Error::Usage(UsageError::CoreIsReserved))));
	}

	#[test]
	fn set_search_path_rejects_nonexistent_directory() {
		let mut graph = ModuleGraph::new(Vec::new());
		assert!(graph.set_search_path(PathBuf::from("/definitely/not/a/real/path")).is_err());
	}

	#[test]
	fn reset_search_path_restores_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let mut graph = ModuleGraph::new(vec![dir.path().to_path_buf()]);
		let other = tempfile::tempdir().unwrap();
		graph.set_search_path(other.path().to_path_buf()).unwrap();
		graph.reset_search_path();
		assert_eq!(graph.search_paths, vec![dir.path().to_path_buf()]);
	}
}
