//! Render context detection

/// Where the current render is happening.
///
/// Client-only work such as remote fetches must never start during a
/// server-side render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderContext {
	/// Running in a browser with a live `window`
	Client,
	/// Server-side rendering, no browser globals
	Server,
}

impl RenderContext {
	/// Detect the context of the current process.
	///
	/// On `wasm32` this checks for a `window`; everywhere else it is
	/// [`RenderContext::Server`]. Native tests that exercise client behavior
	/// pass [`RenderContext::Client`] explicitly.
	#[cfg(target_arch = "wasm32")]
	pub fn current() -> Self {
		if web_sys::window().is_some() {
			Self::Client
		} else {
			Self::Server
		}
	}

	/// Detect the context of the current process.
	#[cfg(not(target_arch = "wasm32"))]
	pub fn current() -> Self {
		Self::Server
	}

	pub fn is_client(&self) -> bool {
		matches!(self, Self::Client)
	}

	pub fn is_server(&self) -> bool {
		matches!(self, Self::Server)
	}
}
