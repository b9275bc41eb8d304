//! Effect Runtime
//!
//! This module provides the deferred effect queue that sits between a render pass
//! and the side effects it schedules.
//!
//! ## Architecture
//!
//! 1. **Render**: view code evaluates hooks, which *schedule* effects on the runtime
//! 2. **Commit**: the owner of the render loop calls [`Runtime::flush`]
//! 3. **Execution**: layout effects run first, then passive effects, in schedule order
//!
//! A runtime created with [`Runtime::strict`] invokes every passive effect twice,
//! reproducing a rendering environment that double-invokes mount effects. Hooks
//! built on top of the runtime (see [`EffectGuard`](crate::EffectGuard)) must stay
//! correct under that mode.
//!
//! ## Example
//!
//! ```ignore
//! use appshell_reactive::{EffectTiming, NodeId, Runtime};
//!
//! let rt = Runtime::new();
//! rt.schedule(NodeId::new(), EffectTiming::Passive, || {
//!     println!("committed");
//!     Ok(())
//! });
//! rt.flush()?;
//! ```

use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicUsize, Ordering};

use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::EffectError;

/// Unique identifier for reactive nodes (stores, subscriptions, effect owners)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
	/// Create a new unique NodeId
	pub fn new() -> Self {
		static COUNTER: AtomicUsize = AtomicUsize::new(0);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

impl Default for NodeId {
	fn default() -> Self {
		Self::new()
	}
}

/// Effect execution timing.
///
/// - Layout effects run first during a flush (before anything is painted)
/// - Passive effects run after all layout effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectTiming {
	/// Layout effect - runs before passive effects
	Layout,
	/// Passive effect - runs after the commit
	#[default]
	Passive,
}

type EffectTask = Rc<dyn Fn() -> Result<(), EffectError>>;

/// Clears a busy flag when dropped, including while unwinding
pub(crate) struct FlagReset<'a>(pub(crate) &'a Cell<bool>);

impl Drop for FlagReset<'_> {
	fn drop(&mut self) {
		self.0.set(false);
	}
}

/// An effect waiting for the next flush
struct ScheduledEffect {
	owner: NodeId,
	timing: EffectTiming,
	task: EffectTask,
}

/// Deferred effect queue.
///
/// One runtime is owned by the application (or by a test). Nothing here is
/// global: hooks receive the runtime they should schedule on.
pub struct Runtime {
	layout_queue: RefCell<VecDeque<ScheduledEffect>>,
	passive_queue: RefCell<VecDeque<ScheduledEffect>>,
	double_invoke: bool,
	flushing: Cell<bool>,
}

impl Runtime {
	/// Create a new Runtime that runs every effect once per flush
	pub fn new() -> Self {
		Self {
			layout_queue: RefCell::new(VecDeque::new()),
			passive_queue: RefCell::new(VecDeque::new()),
			double_invoke: false,
			flushing: Cell::new(false),
		}
	}

	/// Create a Runtime that invokes each passive effect twice per flush.
	pub fn strict() -> Self {
		Self {
			double_invoke: true,
			..Self::new()
		}
	}

	/// Whether this runtime double-invokes passive effects
	pub fn is_strict(&self) -> bool {
		self.double_invoke
	}

	/// Schedule an effect for the next flush
	///
	/// # Arguments
	///
	/// * `owner` - ID of the hook that scheduled the effect
	/// * `timing` - Layout or Passive
	/// * `task` - The effect body
	pub fn schedule<F>(&self, owner: NodeId, timing: EffectTiming, task: F)
	where
		F: Fn() -> Result<(), EffectError> + 'static,
	{
		let scheduled = ScheduledEffect {
			owner,
			timing,
			task: Rc::new(task),
		};
		match timing {
			EffectTiming::Layout => self.layout_queue.borrow_mut().push_back(scheduled),
			EffectTiming::Passive => self.passive_queue.borrow_mut().push_back(scheduled),
		}
		tracing::trace!(?owner, ?timing, "effect scheduled");
	}

	/// Number of effects waiting for the next flush
	pub fn pending_count(&self) -> usize {
		self.layout_queue.borrow().len() + self.passive_queue.borrow().len()
	}

	/// Whether the given owner has an effect waiting for the next flush
	pub fn has_pending(&self, owner: NodeId) -> bool {
		self.layout_queue
			.borrow()
			.iter()
			.chain(self.passive_queue.borrow().iter())
			.any(|scheduled| scheduled.owner == owner)
	}

	fn next_effect(&self) -> Option<ScheduledEffect> {
		if let Some(next) = self.layout_queue.borrow_mut().pop_front() {
			return Some(next);
		}
		self.passive_queue.borrow_mut().pop_front()
	}

	/// Run every scheduled effect, including effects scheduled while flushing.
	///
	/// All effects are executed even when one fails. The first failure is
	/// returned so that it reaches the caller's error boundary; later failures
	/// are logged.
	///
	/// Returns the number of effect invocations performed. A nested call made
	/// from inside an effect returns `Ok(0)` and leaves the queue to the outer
	/// flush.
	pub fn flush(&self) -> Result<usize, EffectError> {
		if self.flushing.replace(true) {
			return Ok(0);
		}
		let _reset = FlagReset(&self.flushing);

		let mut invocations = 0;
		let mut first_error = None;

		while let Some(scheduled) = self.next_effect() {
			let passes = match (scheduled.timing, self.double_invoke) {
				(EffectTiming::Passive, true) => 2,
				_ => 1,
			};
			for _ in 0..passes {
				invocations += 1;
				if let Err(err) = (scheduled.task)() {
					if first_error.is_none() {
						first_error = Some(err);
					} else {
						tracing::error!(owner = ?scheduled.owner, error = %err, "additional effect failure during flush");
					}
				}
			}
		}

		match first_error {
			Some(err) => Err(err),
			None => Ok(invocations),
		}
	}
}

impl Default for Runtime {
	fn default() -> Self {
		Self::new()
	}
}

impl core::fmt::Debug for Runtime {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Runtime")
			.field("pending", &self.pending_count())
			.field("strict", &self.double_invoke)
			.finish()
	}
}
