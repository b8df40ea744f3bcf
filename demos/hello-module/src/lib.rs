//! Minimal guest module: exports just enough of the ABI to load, resolve
//! no dependencies, and do nothing else. A starting point to copy when
//! writing a real module.

use kalisko_abi::{kstr, DependencyList, KString, ModuleStatus, Version};
use std::ffi::c_void;

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kalisko_module_name() -> KString {
	kstr!("hello_module")
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kalisko_module_author() -> KString {
	kstr!("kalisko")
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kalisko_module_description() -> KString {
	kstr!("says hello on load")
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kalisko_module_version() -> Version {
	Version::new(1, 0, 0, 0)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kalisko_module_bcversion() -> Version {
	Version::new(1, 0, 0, 0)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kalisko_module_depends() -> DependencyList {
	DependencyList::EMPTY
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kalisko_module_init(rt: *mut c_void) -> ModuleStatus {
	let _runtime = unsafe { &mut *(rt as *mut kalisko_core::Runtime) };
	tracing::info!("hello_module loaded");
	ModuleStatus::Ok
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kalisko_module_finalize(_rt: *mut c_void) {
	tracing::info!("hello_module unloaded");
}
