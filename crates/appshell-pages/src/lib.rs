//! # appshell-pages
//!
//! Client-side coordination for the application shell.
//!
//! ## Architecture
//!
//! - [`overlay`]: shared loader overlay store and the portal that renders it
//! - [`session`]: auth store and reconciliation with the persisted credential
//! - [`profile`]: profile store and the guarded, deduplicated profile fetch
//! - [`settings`]: TOML and environment configuration
//! - [`context`]: client versus server render detection
//! - [`spawn`]: local task spawning for `!Send` fetch tasks
//!
//! Every store is an ordinary value built from [`appshell_reactive::Store`].
//! Views receive the stores they need instead of reaching for globals.
//!
//! ## Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use appshell_pages::prelude::*;
//!
//! let settings = ShellSettings::from_env()?;
//! let overlay = OverlayStore::from_settings(&settings.overlay);
//! let portal = OverlayPortal::new(overlay.clone(), LoaderAssets::from_settings(&settings.overlay));
//!
//! {
//!     let _loading = overlay.scoped("Loading project", Some(settings.overlay.confined_offset_px));
//!     load_project().await?;
//! }
//! ```

pub mod component;
pub mod context;
pub mod error;
pub mod overlay;
pub mod profile;
pub mod session;
pub mod settings;
pub mod spawn;

pub use component::Component;
pub use context::RenderContext;
pub use error::{RemoteError, RemoteResult, SettingsError, SettingsResult};
pub use settings::ShellSettings;

/// Commonly used types
pub mod prelude {
	pub use crate::component::Component;
	pub use crate::context::RenderContext;
	pub use crate::error::{RemoteError, RemoteResult, SettingsError, SettingsResult};
	pub use crate::overlay::{
		LoaderAssets, LoaderMode, OverlayGuard, OverlayPolicy, OverlayPortal, OverlayState,
		OverlayStore,
	};
	pub use crate::profile::{
		ImageUpload, Profile, ProfileApi, ProfileCache, ProfileMount, ProfileState, ProfileStore,
		ProfileUpdate, ProfileView,
	};
	pub use crate::session::{
		AuthState, AuthStore, CookieCredentialSource, CredentialSource, MemoryCredentialSource,
		Reconciliation, SessionBootstrap, SessionMount, User,
	};
	pub use crate::settings::ShellSettings;
	pub use crate::spawn::{Spawner, default_spawner};
}
