//! Overlay visibility store.

use core::cell::Cell;
use core::fmt;
use core::str::FromStr;

use std::rc::Rc;

use appshell_reactive::{Store, Subscription};
use serde::Deserialize;

use crate::settings::{DEFAULT_OVERLAY_TITLE, OverlaySettings};

/// Snapshot of the overlay.
///
/// `left_offset_px` is only meaningful while `is_visible` is true; hiding the
/// overlay always clears it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayState {
	pub is_visible: bool,
	pub title: String,
	pub left_offset_px: Option<u32>,
}

impl OverlayState {
	fn hidden(title: &str) -> Self {
		Self {
			is_visible: false,
			title: title.to_string(),
			left_offset_px: None,
		}
	}
}

impl Default for OverlayState {
	fn default() -> Self {
		Self::hidden(DEFAULT_OVERLAY_TITLE)
	}
}

/// How overlapping `show` calls from independent callers are arbitrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayPolicy {
	/// The last call wins: any `hide` hides the overlay.
	#[default]
	LastWriterWins,
	/// The overlay stays visible while more `show` calls than `hide` calls
	/// are outstanding.
	RefCounted,
}

impl OverlayPolicy {
	/// Returns the configuration name of the policy
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::LastWriterWins => "last_writer_wins",
			Self::RefCounted => "ref_counted",
		}
	}
}

impl FromStr for OverlayPolicy {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			"last_writer_wins" => Ok(Self::LastWriterWins),
			"ref_counted" => Ok(Self::RefCounted),
			other => Err(format!("unknown overlay policy `{other}`")),
		}
	}
}

impl fmt::Display for OverlayPolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Shared overlay store.
///
/// Cloning yields another handle to the same overlay. Every mutation notifies
/// subscribers synchronously with one consistent [`OverlayState`] snapshot.
#[derive(Clone)]
pub struct OverlayStore {
	state: Store<OverlayState>,
	policy: OverlayPolicy,
	default_title: Rc<str>,
	outstanding: Rc<Cell<usize>>,
}

impl OverlayStore {
	/// Creates a hidden overlay with last-writer-wins arbitration
	pub fn new() -> Self {
		Self::with_policy(OverlayPolicy::LastWriterWins)
	}

	/// Creates a hidden overlay with the given arbitration policy
	pub fn with_policy(policy: OverlayPolicy) -> Self {
		Self::build(policy, DEFAULT_OVERLAY_TITLE)
	}

	/// Creates a hidden overlay from settings
	pub fn from_settings(settings: &OverlaySettings) -> Self {
		let title = if settings.default_title.is_empty() {
			DEFAULT_OVERLAY_TITLE
		} else {
			settings.default_title.as_str()
		};
		Self::build(settings.policy, title)
	}

	fn build(policy: OverlayPolicy, default_title: &str) -> Self {
		Self {
			state: Store::new(OverlayState::hidden(default_title)),
			policy,
			default_title: Rc::from(default_title),
			outstanding: Rc::new(Cell::new(0)),
		}
	}

	/// Shows the overlay.
	///
	/// An empty title falls back to the default title. The offset is stored
	/// verbatim, including `None`.
	pub fn show(&self, title: &str, left_offset_px: Option<u32>) {
		if self.policy == OverlayPolicy::RefCounted {
			self.outstanding.set(self.outstanding.get() + 1);
		}
		let title = if title.is_empty() {
			self.default_title.to_string()
		} else {
			title.to_string()
		};
		tracing::debug!(%title, ?left_offset_px, "overlay shown");
		self.state.update(|state| {
			state.is_visible = true;
			state.title = title;
			state.left_offset_px = left_offset_px;
		});
	}

	/// Hides the overlay and clears the offset.
	///
	/// Idempotent. Under [`OverlayPolicy::RefCounted`] the overlay only hides
	/// once every outstanding `show` has been matched.
	pub fn hide(&self) {
		if self.policy == OverlayPolicy::RefCounted {
			let remaining = self.outstanding.get().saturating_sub(1);
			self.outstanding.set(remaining);
			if remaining > 0 {
				tracing::debug!(remaining, "overlay hide deferred");
				return;
			}
		}
		tracing::debug!("overlay hidden");
		self.state.update(|state| {
			state.is_visible = false;
			state.left_offset_px = None;
		});
	}

	/// Shows the overlay and returns a guard that hides it when dropped
	#[must_use = "the overlay is hidden as soon as the guard is dropped"]
	pub fn scoped(&self, title: &str, left_offset_px: Option<u32>) -> OverlayGuard {
		self.show(title, left_offset_px);
		OverlayGuard {
			store: self.clone(),
		}
	}

	/// Snapshot of the whole overlay state
	pub fn state(&self) -> OverlayState {
		self.state.get()
	}

	pub fn is_visible(&self) -> bool {
		self.state.with(|state| state.is_visible)
	}

	pub fn title(&self) -> String {
		self.state.with(|state| state.title.clone())
	}

	pub fn left_offset_px(&self) -> Option<u32> {
		self.state.with(|state| state.left_offset_px)
	}

	pub fn policy(&self) -> OverlayPolicy {
		self.policy
	}

	/// Outstanding `show` calls (always 0 under last-writer-wins)
	pub fn outstanding(&self) -> usize {
		self.outstanding.get()
	}

	/// Subscribe to overlay changes
	#[must_use = "dropping the Subscription unsubscribes immediately"]
	pub fn subscribe<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&OverlayState) + 'static,
	{
		self.state.subscribe(listener)
	}

	pub fn subscriber_count(&self) -> usize {
		self.state.subscriber_count()
	}
}

impl Default for OverlayStore {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for OverlayStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OverlayStore")
			.field("state", &self.state())
			.field("policy", &self.policy)
			.field("outstanding", &self.outstanding.get())
			.finish()
	}
}

/// Hides the overlay when dropped, on every exit path of a long operation.
pub struct OverlayGuard {
	store: OverlayStore,
}

impl Drop for OverlayGuard {
	fn drop(&mut self) {
		self.store.hide();
	}
}

impl fmt::Debug for OverlayGuard {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OverlayGuard").finish_non_exhaustive()
	}
}
