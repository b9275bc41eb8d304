//! EffectGuard - At-most-once Effects
//!
//! A rendering environment may schedule the same mount effect more than once
//! (strict double invocation, re-renders with new dependencies). `EffectGuard`
//! gives a side effect an at-most-once contract per logical key.
//!
//! ## State Machine
//!
//! ```text
//!             evaluate(key') with key' != key
//!   Ran(key) ─────────────────────────────────▶ Idle
//!      ▲                                          │
//!      │            commit: run body              │
//!      └──────────────────────────────────────────┘
//! ```
//!
//! - `Idle`: the next commit runs the effect body, entering `Ran(key)` *before*
//!   the body executes.
//! - `Ran(key)`: commits for the same key are no-ops.
//!
//! Cleanup returned by the body runs when its evaluation is superseded (a later
//! evaluation with a different key or dependency value commits) or when the guard
//! is disposed. It runs on those paths even when the superseding commit skips the
//! body.
//!
//! ## Example
//!
//! ```ignore
//! use appshell_reactive::{EffectGuard, Runtime};
//!
//! let rt = Runtime::strict();
//! let guard = EffectGuard::new();
//!
//! guard.evaluate(&rt, Some("project-1".to_string()), (), || {
//!     load_project("project-1");
//!     Ok(None)
//! });
//! rt.flush()?; // load_project runs once even though the runtime double-invokes
//! ```

use core::cell::RefCell;
use core::fmt;

use std::rc::{Rc, Weak};

use crate::error::EffectError;
use crate::runtime::{EffectTiming, NodeId, Runtime};

/// Cleanup callable returned by an effect body
pub type Cleanup = Box<dyn FnOnce()>;

/// Return type of an effect body
pub type EffectResult = Result<Option<Cleanup>, EffectError>;

/// Execution state of a guarded effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState<K> {
	/// The body has not run for the current key
	Idle,
	/// The body has run (or is running) for this key
	Ran(Option<K>),
}

struct GuardInner<K, D> {
	state: GuardState<K>,
	last_key: Option<K>,
	observed: bool,
	last_deps: Option<D>,
	/// Incremented once per scheduled evaluation
	generation: u64,
	/// Last generation whose commit has started
	committed: u64,
	cleanup: Option<Cleanup>,
	disposed: bool,
}

/// Guards an effect so that its body executes at most once per key.
///
/// # Type Parameters
///
/// * `K` - The logical key type (e.g. the ID of the resource being loaded)
/// * `D` - The dependency value; a changed value supersedes the previous evaluation
pub struct EffectGuard<K: 'static = String, D: 'static = ()> {
	id: NodeId,
	timing: EffectTiming,
	inner: Rc<RefCell<GuardInner<K, D>>>,
}

impl<K, D> EffectGuard<K, D>
where
	K: Clone + PartialEq + fmt::Debug + 'static,
	D: PartialEq + 'static,
{
	/// Create a guard for a passive effect
	pub fn new() -> Self {
		Self::with_timing(EffectTiming::Passive)
	}

	/// Create a guard whose effect runs with the given timing
	pub fn with_timing(timing: EffectTiming) -> Self {
		Self {
			id: NodeId::new(),
			timing,
			inner: Rc::new(RefCell::new(GuardInner {
				state: GuardState::Idle,
				last_key: None,
				observed: false,
				last_deps: None,
				generation: 0,
				committed: 0,
				cleanup: None,
				disposed: false,
			})),
		}
	}

	/// Evaluate the guard during a render pass.
	///
	/// A key different from the last observed key resets the guard to `Idle`.
	/// The effect is scheduled on `rt` when this is the first evaluation, or the
	/// key or dependency value changed; otherwise nothing is scheduled.
	///
	/// Returns whether a commit was scheduled.
	pub fn evaluate<F>(&self, rt: &Runtime, key: Option<K>, deps: D, effect: F) -> bool
	where
		F: Fn() -> EffectResult + 'static,
	{
		let generation = {
			let mut inner = self.inner.borrow_mut();
			if inner.disposed {
				return false;
			}

			let first = !inner.observed;
			let key_changed = !first && inner.last_key != key;
			if key_changed {
				tracing::debug!(guard = ?self.id, from = ?inner.last_key, to = ?key, "effect key changed");
			}
			if first || key_changed {
				inner.state = GuardState::Idle;
				inner.last_key = key;
				inner.observed = true;
			}

			let deps_changed = inner.last_deps.as_ref() != Some(&deps);
			if !(first || key_changed || deps_changed) {
				return false;
			}

			inner.last_deps = Some(deps);
			inner.generation += 1;
			inner.generation
		};

		let weak = Rc::downgrade(&self.inner);
		let id = self.id;
		rt.schedule(self.id, self.timing, move || {
			commit(&weak, id, generation, &effect)
		});
		true
	}

	/// Current state of the guard
	pub fn state(&self) -> GuardState<K> {
		self.inner.borrow().state.clone()
	}

	/// Whether the body has run for the current key
	pub fn has_run(&self) -> bool {
		matches!(self.inner.borrow().state, GuardState::Ran(_))
	}

	/// The last key observed by [`evaluate`](Self::evaluate)
	pub fn last_key(&self) -> Option<K> {
		self.inner.borrow().last_key.clone()
	}

	/// Whether a cleanup from the last run is being held
	pub fn holds_cleanup(&self) -> bool {
		self.inner.borrow().cleanup.is_some()
	}

	/// Get the NodeId of this guard
	pub fn id(&self) -> NodeId {
		self.id
	}

	/// Tear the guard down, running any held cleanup.
	///
	/// Commits still queued for this guard become no-ops.
	pub fn dispose(&self) {
		let cleanup = {
			let Ok(mut inner) = self.inner.try_borrow_mut() else {
				return;
			};
			if inner.disposed {
				return;
			}
			inner.disposed = true;
			inner.cleanup.take()
		};
		if let Some(cleanup) = cleanup {
			tracing::debug!(guard = ?self.id, "running cleanup on teardown");
			cleanup();
		}
	}
}

fn commit<K, D, F>(
	weak: &Weak<RefCell<GuardInner<K, D>>>,
	id: NodeId,
	generation: u64,
	effect: &F,
) -> Result<(), EffectError>
where
	K: Clone + PartialEq + fmt::Debug + 'static,
	D: 'static,
	F: Fn() -> EffectResult,
{
	let Some(inner) = weak.upgrade() else {
		return Ok(());
	};

	let superseded = {
		let mut guard = inner.borrow_mut();
		// A newer evaluation exists or the owner is gone
		if guard.disposed || generation != guard.generation {
			return Ok(());
		}
		if guard.committed < generation {
			guard.committed = generation;
			guard.cleanup.take()
		} else {
			None
		}
	};
	if let Some(cleanup) = superseded {
		tracing::debug!(guard = ?id, "running cleanup of superseded evaluation");
		cleanup();
	}

	{
		let mut guard = inner.borrow_mut();
		if guard.disposed || matches!(guard.state, GuardState::Ran(_)) {
			return Ok(());
		}
		guard.state = GuardState::Ran(guard.last_key.clone());
	}

	tracing::debug!(guard = ?id, "running guarded effect");
	let cleanup = effect()?;

	let mut guard = inner.borrow_mut();
	if guard.disposed {
		drop(guard);
		if let Some(cleanup) = cleanup {
			cleanup();
		}
	} else {
		guard.cleanup = cleanup;
	}
	Ok(())
}

impl<K, D> Default for EffectGuard<K, D>
where
	K: Clone + PartialEq + fmt::Debug + 'static,
	D: PartialEq + 'static,
{
	fn default() -> Self {
		Self::new()
	}
}

impl<K: 'static, D: 'static> Drop for EffectGuard<K, D> {
	fn drop(&mut self) {
		let cleanup = match self.inner.try_borrow_mut() {
			Ok(mut inner) if !inner.disposed => {
				inner.disposed = true;
				inner.cleanup.take()
			}
			_ => None,
		};
		if let Some(cleanup) = cleanup {
			cleanup();
		}
	}
}

impl<K: fmt::Debug + 'static, D: 'static> fmt::Debug for EffectGuard<K, D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut s = f.debug_struct("EffectGuard");
		s.field("id", &self.id).field("timing", &self.timing);
		if let Ok(inner) = self.inner.try_borrow() {
			s.field("state", &inner.state)
				.field("last_key", &inner.last_key)
				.field("disposed", &inner.disposed);
		}
		s.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use core::cell::Cell;
	use rstest::rstest;

	fn counting_effect(
		runs: &Rc<Cell<u32>>,
		cleanups: &Rc<Cell<u32>>,
	) -> impl Fn() -> EffectResult + 'static {
		let runs = Rc::clone(runs);
		let cleanups = Rc::clone(cleanups);
		move || {
			runs.set(runs.get() + 1);
			let cleanups = Rc::clone(&cleanups);
			Ok(Some(Box::new(move || cleanups.set(cleanups.get() + 1)) as Cleanup))
		}
	}

	#[rstest]
	fn test_effect_is_deferred_until_commit() {
		let rt = Runtime::new();
		let guard: EffectGuard = EffectGuard::new();
		let runs = Rc::new(Cell::new(0));
		let cleanups = Rc::new(Cell::new(0));

		assert!(guard.evaluate(&rt, Some("A".into()), (), counting_effect(&runs, &cleanups)));
		assert_eq!(runs.get(), 0);
		assert_eq!(guard.state(), GuardState::Idle);

		rt.flush().unwrap();
		assert_eq!(runs.get(), 1);
		assert_eq!(guard.state(), GuardState::Ran(Some("A".to_string())));
	}

	#[rstest]
	fn test_same_key_twice_in_one_pass_runs_once() {
		let rt = Runtime::new();
		let guard: EffectGuard = EffectGuard::new();
		let runs = Rc::new(Cell::new(0));
		let cleanups = Rc::new(Cell::new(0));

		guard.evaluate(&rt, Some("A".into()), (), counting_effect(&runs, &cleanups));
		guard.evaluate(&rt, Some("A".into()), (), counting_effect(&runs, &cleanups));
		rt.flush().unwrap();

		assert_eq!(runs.get(), 1);
	}

	#[rstest]
	fn test_strict_double_invocation_runs_once() {
		let rt = Runtime::strict();
		let guard: EffectGuard = EffectGuard::new();
		let runs = Rc::new(Cell::new(0));
		let cleanups = Rc::new(Cell::new(0));

		guard.evaluate(&rt, Some("A".into()), (), counting_effect(&runs, &cleanups));
		assert_eq!(rt.flush().unwrap(), 2);

		assert_eq!(runs.get(), 1);
		assert_eq!(cleanups.get(), 0);
		assert!(guard.holds_cleanup());
	}

	#[rstest]
	fn test_rerender_with_same_key_does_not_rerun() {
		let rt = Runtime::new();
		let guard: EffectGuard = EffectGuard::new();
		let runs = Rc::new(Cell::new(0));
		let cleanups = Rc::new(Cell::new(0));

		for _ in 0..3 {
			guard.evaluate(&rt, Some("A".into()), (), counting_effect(&runs, &cleanups));
			rt.flush().unwrap();
		}

		assert_eq!(runs.get(), 1);
		assert!(guard.has_run());
	}

	#[rstest]
	fn test_key_change_runs_prior_cleanup_then_reruns() {
		let rt = Runtime::new();
		let guard: EffectGuard = EffectGuard::new();
		let log = Rc::new(RefCell::new(Vec::new()));

		let make = |name: &'static str| {
			let log = Rc::clone(&log);
			move || {
				log.borrow_mut().push(format!("run {name}"));
				let log = Rc::clone(&log);
				Ok(Some(Box::new(move || log.borrow_mut().push(format!("cleanup {name}"))) as Cleanup))
			}
		};

		guard.evaluate(&rt, Some("A".into()), (), make("A"));
		rt.flush().unwrap();

		guard.evaluate(&rt, Some("B".into()), (), make("B"));
		assert_eq!(guard.state(), GuardState::Idle);
		assert_eq!(guard.last_key(), Some("B".to_string()));
		rt.flush().unwrap();

		assert_eq!(*log.borrow(), vec!["run A", "cleanup A", "run B"]);
		assert_eq!(guard.state(), GuardState::Ran(Some("B".to_string())));
	}

	#[rstest]
	fn test_dependency_change_runs_cleanup_but_skips_body() {
		let rt = Runtime::new();
		let guard: EffectGuard<String, u32> = EffectGuard::new();
		let runs = Rc::new(Cell::new(0));
		let cleanups = Rc::new(Cell::new(0));

		guard.evaluate(&rt, Some("A".into()), 1, counting_effect(&runs, &cleanups));
		rt.flush().unwrap();

		assert!(guard.evaluate(&rt, Some("A".into()), 2, counting_effect(&runs, &cleanups)));
		rt.flush().unwrap();

		assert_eq!(runs.get(), 1);
		assert_eq!(cleanups.get(), 1);
		assert!(!guard.holds_cleanup());
	}

	#[rstest]
	fn test_dispose_runs_cleanup_once() {
		let rt = Runtime::new();
		let guard: EffectGuard = EffectGuard::new();
		let runs = Rc::new(Cell::new(0));
		let cleanups = Rc::new(Cell::new(0));

		guard.evaluate(&rt, None, (), counting_effect(&runs, &cleanups));
		rt.flush().unwrap();

		guard.dispose();
		guard.dispose();
		assert_eq!(cleanups.get(), 1);

		// Disposed guards ignore further evaluations
		assert!(!guard.evaluate(&rt, Some("B".into()), (), counting_effect(&runs, &cleanups)));
		assert_eq!(rt.pending_count(), 0);
	}

	#[rstest]
	fn test_drop_runs_cleanup() {
		let rt = Runtime::new();
		let runs = Rc::new(Cell::new(0));
		let cleanups = Rc::new(Cell::new(0));

		{
			let guard: EffectGuard = EffectGuard::new();
			guard.evaluate(&rt, None, (), counting_effect(&runs, &cleanups));
			rt.flush().unwrap();
		}

		assert_eq!(runs.get(), 1);
		assert_eq!(cleanups.get(), 1);
	}

	#[rstest]
	fn test_commit_after_drop_is_noop() {
		let rt = Runtime::new();
		let runs = Rc::new(Cell::new(0));
		let cleanups = Rc::new(Cell::new(0));

		{
			let guard: EffectGuard = EffectGuard::new();
			guard.evaluate(&rt, None, (), counting_effect(&runs, &cleanups));
		}
		rt.flush().unwrap();

		assert_eq!(runs.get(), 0);
	}

	#[rstest]
	fn test_failed_effect_propagates_and_is_not_retried() {
		let rt = Runtime::new();
		let guard: EffectGuard = EffectGuard::new();
		let attempts = Rc::new(Cell::new(0));

		let make = || {
			let attempts = Rc::clone(&attempts);
			move || {
				attempts.set(attempts.get() + 1);
				Err(EffectError::failed("remote unavailable"))
			}
		};

		guard.evaluate(&rt, Some("A".into()), (), make());
		let err = rt.flush().unwrap_err();
		assert_eq!(err.to_string(), "Effect failed: remote unavailable");
		assert!(guard.has_run());

		// Same key: no retry
		guard.evaluate(&rt, Some("A".into()), (), make());
		rt.flush().unwrap();
		assert_eq!(attempts.get(), 1);

		// Explicit key change retries
		guard.evaluate(&rt, Some("A2".into()), (), make());
		assert!(rt.flush().is_err());
		assert_eq!(attempts.get(), 2);
	}

	#[rstest]
	fn test_stale_evaluation_is_skipped_when_key_changes_before_commit() {
		let rt = Runtime::new();
		let guard: EffectGuard = EffectGuard::new();
		let seen = Rc::new(RefCell::new(Vec::new()));

		let make = |name: &'static str| {
			let seen = Rc::clone(&seen);
			move || {
				seen.borrow_mut().push(name);
				Ok(None)
			}
		};

		guard.evaluate(&rt, Some("A".into()), (), make("A"));
		guard.evaluate(&rt, Some("B".into()), (), make("B"));
		rt.flush().unwrap();

		assert_eq!(*seen.borrow(), vec!["B"]);
	}
}
