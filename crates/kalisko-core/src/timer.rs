//! Deadline-ordered timer scheduling. The event loop sleeps until
//! [`TimerScheduler::next_deadline`] and then calls [`TimerScheduler::tick`],
//! which fires every callback whose deadline has passed.

use kalisko_abi::TimerCallbackFn;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Monotonic counter used only to break ties between timers sharing a
/// deadline, so the `BTreeMap` key stays totally ordered without needing a
/// dense key space.
type Tiebreak = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(Tiebreak);

struct Entry {
	callback: TimerCallbackFn,
	context: *mut core::ffi::c_void,
	owner_module: Option<String>,
}

// See kalisko_core::hook::Listener: single-threaded event loop only, the
// opaque pointer is owned by the scheduling caller.
unsafe impl Send for Entry {}

#[derive(Default)]
pub struct TimerScheduler {
	pending: BTreeMap<(Instant, Tiebreak), Entry>,
	next_tiebreak: Tiebreak,
	exiting: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum TimerError {
	#[error("no such timer")]
	NoSuchTimer,
	#[error("scheduler is exiting, no further timers accepted")]
	Exiting,
}

impl TimerScheduler {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn schedule_at(
		&mut self,
		deadline: Instant,
		callback: TimerCallbackFn,
		context: *mut core::ffi::c_void,
		owner_module: Option<String>,
	) -> Result<TimerHandle, TimerError> {
		if self.exiting {
			return Err(TimerError::Exiting);
		}
		let tiebreak = self.next_tiebreak;
		self.next_tiebreak += 1;
		self.pending.insert((deadline, tiebreak), Entry { callback, context, owner_module });
		Ok(TimerHandle(tiebreak))
	}

	pub fn schedule_after(
		&mut self,
		delay: Duration,
		callback: TimerCallbackFn,
		context: *mut core::ffi::c_void,
		owner_module: Option<String>,
	) -> Result<TimerHandle, TimerError> {
		self.schedule_at(Instant::now() + delay, callback, context, owner_module)
	}

	pub fn cancel(&mut self, handle: TimerHandle) -> Result<(), TimerError> {
		let key = self.pending.keys().find(|(_, tiebreak)| *tiebreak == handle.0).copied();
		match key {
			Some(key) => {
				self.pending.remove(&key);
				Ok(())
			}
			None => Err(TimerError::NoSuchTimer),
		}
	}

	/// Cancels every timer scheduled by `module`, used when that module
	/// unloads so it can never be called back into after its library is
	/// closed.
	pub fn remove_timers_of_module(&mut self, module: &str) {
		self.pending.retain(|_, entry| entry.owner_module.as_deref() != Some(module));
	}

	pub fn next_deadline(&self) -> Option<Instant> {
		self.pending.keys().next().map(|(deadline, _)| *deadline)
	}

	pub fn has_pending(&self) -> bool {
		!self.pending.is_empty()
	}

	/// Stops accepting new timers and, from the next iteration on, tells
	/// `Runtime::run`'s event loop to stop even if timers further out are
	/// still scheduled — the loop still finishes whatever tick it's
	/// currently in, it just won't sleep for the next deadline afterward.
	pub fn request_graceful_exit(&mut self) {
		self.exiting = true;
	}

	pub fn is_exiting(&self) -> bool {
		self.exiting
	}

	/// Fires every timer whose deadline is `<= now`, in deadline order.
	/// Stops at the first remaining deadline in the future, mirroring the
	/// original's early-exit traversal.
	pub fn tick(&mut self, now: Instant) {
		loop {
			let Some((&(deadline, tiebreak), _)) = self.pending.iter().next() else {
				return;
			};
			if deadline > now {
				return;
			}
			let entry = self.pending.remove(&(deadline, tiebreak)).expect("key just observed present");
			unsafe { (entry.callback)(entry.context) };
		}
	}
}
