//! Overlay portal and loader visual.

use core::cell::RefCell;
use core::fmt;

use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use appshell_reactive::Subscription;

use super::store::{OverlayState, OverlayStore};
use crate::component::{Component, render_attributes};
use crate::settings::{DEFAULT_LOADER_ASSET, OverlaySettings};

/// Stacking layer of the overlay, above everything else on the page
pub const OVERLAY_Z_INDEX: u32 = 9999;

/// Which loader rendition the overlay shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderMode {
	/// Covers the whole viewport
	Fullscreen,
	/// Confined to the region right of the stored offset
	Container,
}

impl LoaderMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Fullscreen => "fullscreen",
			Self::Container => "container",
		}
	}
}

/// Media asset locations for each loader mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderAssets {
	pub fullscreen: String,
	pub container: String,
}

impl LoaderAssets {
	pub fn new(fullscreen: impl Into<String>, container: impl Into<String>) -> Self {
		Self {
			fullscreen: fullscreen.into(),
			container: container.into(),
		}
	}

	pub fn from_settings(settings: &OverlaySettings) -> Self {
		Self::new(&settings.fullscreen_asset, &settings.container_asset)
	}

	/// Asset to play for the given mode
	pub fn source_for(&self, mode: LoaderMode) -> &str {
		match mode {
			LoaderMode::Fullscreen => &self.fullscreen,
			LoaderMode::Container => &self.container,
		}
	}
}

impl Default for LoaderAssets {
	fn default() -> Self {
		Self::new(DEFAULT_LOADER_ASSET, DEFAULT_LOADER_ASSET)
	}
}

/// Positioning of the overlay derived from the stored offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverlayLayout {
	pub left_offset_px: Option<u32>,
}

impl OverlayLayout {
	pub fn from_state(state: &OverlayState) -> Self {
		Self {
			left_offset_px: state.left_offset_px,
		}
	}

	pub fn mode(&self) -> LoaderMode {
		match self.left_offset_px {
			Some(_) => LoaderMode::Container,
			None => LoaderMode::Fullscreen,
		}
	}

	/// Inline style for the overlay root.
	///
	/// With an offset, the region left of it stays uncovered and interactive.
	pub fn style(&self) -> String {
		let mut style = format!("position: fixed; inset: 0; z-index: {};", OVERLAY_Z_INDEX);
		if let Some(offset) = self.left_offset_px {
			style.push_str(&format!(
				" left: {offset}px; width: calc(100% - {offset}px);"
			));
		}
		style
	}
}

/// The mounted loader visual.
///
/// Owns the looping media element; dropping it releases the resource.
pub struct OverlayVisual {
	mode: LoaderMode,
	source: String,
}

impl OverlayVisual {
	fn mount(mode: LoaderMode, assets: &LoaderAssets) -> Self {
		let source = assets.source_for(mode).to_string();
		tracing::debug!(mode = mode.as_str(), %source, "loader visual mounted");
		Self { mode, source }
	}

	pub fn mode(&self) -> LoaderMode {
		self.mode
	}

	pub fn source(&self) -> &str {
		&self.source
	}
}

impl Component for OverlayVisual {
	fn name(&self) -> &'static str {
		"OverlayVisual"
	}

	fn render(&self) -> String {
		format!(
			"<video src=\"{}\" data-mode=\"{}\" autoplay loop muted playsinline></video>",
			html_escape::encode_double_quoted_attribute(&self.source),
			self.mode.as_str()
		)
	}
}

impl Drop for OverlayVisual {
	fn drop(&mut self) {
		tracing::debug!(mode = self.mode.as_str(), "loader visual released");
	}
}

impl fmt::Debug for OverlayVisual {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OverlayVisual")
			.field("mode", &self.mode)
			.field("source", &self.source)
			.finish()
	}
}

struct PortalInner {
	assets: LoaderAssets,
	visual: Option<OverlayVisual>,
	layout: OverlayLayout,
	title: String,
	mount_count: usize,
	render_count: usize,
}

impl PortalInner {
	fn apply(&mut self, state: &OverlayState) {
		self.render_count += 1;
		if !state.is_visible {
			self.visual = None;
			self.layout = OverlayLayout::default();
			return;
		}

		self.layout = OverlayLayout::from_state(state);
		self.title = state.title.clone();
		let mode = self.layout.mode();
		let remount = self.visual.as_ref().is_none_or(|visual| visual.mode != mode);
		if remount {
			// Release the previous media before mounting the new rendition
			self.visual = None;
			self.visual = Some(OverlayVisual::mount(mode, &self.assets));
			self.mount_count += 1;
		}
	}
}

/// Renders the overlay exactly when the store says so.
///
/// Mount one portal near the root; it subscribes to the store for its whole
/// lifetime and drops the subscription with itself.
pub struct OverlayPortal {
	inner: Rc<RefCell<PortalInner>>,
	_subscription: Subscription,
}

impl OverlayPortal {
	pub fn new(store: OverlayStore, assets: LoaderAssets) -> Self {
		let inner = Rc::new(RefCell::new(PortalInner {
			assets,
			visual: None,
			layout: OverlayLayout::default(),
			title: String::new(),
			mount_count: 0,
			render_count: 0,
		}));
		inner.borrow_mut().apply(&store.state());

		let weak: Weak<RefCell<PortalInner>> = Rc::downgrade(&inner);
		let subscription = store.subscribe(move |state| {
			if let Some(inner) = weak.upgrade() {
				inner.borrow_mut().apply(state);
			}
		});

		Self {
			inner,
			_subscription: subscription,
		}
	}

	/// Whether a visual is currently mounted
	pub fn is_mounted(&self) -> bool {
		self.inner.borrow().visual.is_some()
	}

	/// Mode of the mounted visual, if any
	pub fn mode(&self) -> Option<LoaderMode> {
		self.inner.borrow().visual.as_ref().map(OverlayVisual::mode)
	}

	pub fn layout(&self) -> OverlayLayout {
		self.inner.borrow().layout
	}

	/// How many times a visual has been mounted
	pub fn mount_count(&self) -> usize {
		self.inner.borrow().mount_count
	}

	/// How many store changes the portal has reacted to, including the initial one
	pub fn render_count(&self) -> usize {
		self.inner.borrow().render_count
	}
}

impl Component for OverlayPortal {
	fn name(&self) -> &'static str {
		"OverlayPortal"
	}

	fn render(&self) -> String {
		let inner = self.inner.borrow();
		let Some(visual) = inner.visual.as_ref() else {
			return String::new();
		};

		format!(
			"<div{}>{}<span class=\"sr-only\">{}</span></div>",
			render_attributes(&self.attributes()),
			visual.render(),
			html_escape::encode_text(&inner.title)
		)
	}

	fn attributes(&self) -> BTreeMap<String, String> {
		let inner = self.inner.borrow();
		let mut attributes = BTreeMap::new();
		if inner.visual.is_none() {
			return attributes;
		}
		attributes.insert("class".to_string(), "overlay-portal".to_string());
		attributes.insert("role".to_string(), "status".to_string());
		attributes.insert("aria-busy".to_string(), "true".to_string());
		attributes.insert("style".to_string(), inner.layout.style());
		attributes
	}
}

impl fmt::Debug for OverlayPortal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let inner = self.inner.borrow();
		f.debug_struct("OverlayPortal")
			.field("visual", &inner.visual)
			.field("layout", &inner.layout)
			.field("mount_count", &inner.mount_count)
			.finish()
	}
}
