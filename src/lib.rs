//! # appshell
//!
//! Shared client-side coordination for a single-page application shell:
//!
//! - a loader overlay any view can toggle, rendered by one portal near the root
//! - session bootstrap that keeps the auth flag in line with the persisted credential
//! - a profile cache whose fetch runs at most once per empty cache
//! - [`EffectGuard`](reactive::EffectGuard), an at-most-once contract for view effects
//!
//! ## Crates
//!
//! - [`reactive`]: stores, subscriptions, the deferred effect runtime and the effect guard
//! - [`pages`]: overlay, session, profile, settings and platform plumbing
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use appshell::prelude::*;
//!
//! let settings = ShellSettings::from_env()?;
//! let shell = AppShell::new(&settings, credentials, Rc::new(profile_api));
//!
//! shell.session().on_session_start();
//! let view = shell.profile().use_profile(RenderContext::current(), &default_spawner());
//! ```

pub mod pages;
pub mod reactive;
mod shell;

pub use shell::AppShell;

/// Commonly used types from every appshell crate
pub mod prelude {
	pub use crate::shell::AppShell;
	pub use appshell_pages::prelude::*;
	pub use appshell_reactive::{
		EffectError, EffectGuard, EffectTiming, GuardState, Runtime, Store, Subscription,
	};
}
