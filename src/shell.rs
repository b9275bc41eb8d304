//! Application shell assembly.

use std::rc::Rc;

use appshell_pages::overlay::{LoaderAssets, OverlayPortal, OverlayStore};
use appshell_pages::profile::{ProfileApi, ProfileCache, ProfileStore};
use appshell_pages::session::{AuthStore, CredentialSource, SessionBootstrap};
use appshell_pages::settings::ShellSettings;

/// Every shared store of the shell, built from one set of settings.
///
/// Views take the handles they need from here; nothing is global, so tests
/// build a fresh shell per case.
pub struct AppShell {
	overlay: OverlayStore,
	portal: OverlayPortal,
	auth: AuthStore,
	session: Rc<SessionBootstrap>,
	profile: ProfileCache,
	confined_offset_px: u32,
}

impl AppShell {
	pub fn new(
		settings: &ShellSettings,
		credentials: Rc<dyn CredentialSource>,
		api: Rc<dyn ProfileApi>,
	) -> Self {
		let overlay = OverlayStore::from_settings(&settings.overlay);
		let portal = OverlayPortal::new(
			overlay.clone(),
			LoaderAssets::from_settings(&settings.overlay),
		);
		let auth = AuthStore::new();
		let session = Rc::new(SessionBootstrap::new(auth.clone(), credentials));
		let profile = ProfileCache::new(ProfileStore::new(), api);

		tracing::debug!(policy = %settings.overlay.policy, "app shell assembled");
		Self {
			overlay,
			portal,
			auth,
			session,
			profile,
			confined_offset_px: settings.overlay.confined_offset_px,
		}
	}

	pub fn overlay(&self) -> &OverlayStore {
		&self.overlay
	}

	pub fn portal(&self) -> &OverlayPortal {
		&self.portal
	}

	pub fn auth(&self) -> &AuthStore {
		&self.auth
	}

	pub fn session(&self) -> &Rc<SessionBootstrap> {
		&self.session
	}

	pub fn profile(&self) -> &ProfileCache {
		&self.profile
	}

	/// Offset for overlays confined next to the side panel
	pub fn confined_offset_px(&self) -> u32 {
		self.confined_offset_px
	}

	/// Signs out: drops the credential, the session and the cached profile
	pub fn signout(&self, credentials: &dyn CredentialSource) {
		self.auth.signout(credentials);
		self.profile.clear_profile();
	}
}
