//! Guarded profile fetch and the view-facing profile hook.

use core::fmt;

use std::rc::Rc;

use appshell_reactive::{EffectGuard, Runtime};
use futures::FutureExt;
use futures::future::LocalBoxFuture;

use super::api::{ImageUpload, Profile, ProfileApi, ProfileUpdate};
use super::store::{ProfileState, ProfileStore};
use crate::context::RenderContext;
use crate::error::RemoteResult;
use crate::spawn::Spawner;

/// What a view sees of the profile.
///
/// The convenience accessors are pure projections of the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileView {
	pub profile: Option<Profile>,
	pub loading: bool,
	pub error: Option<String>,
}

impl ProfileView {
	pub fn user_name(&self) -> &str {
		self.profile.as_ref().map_or("", |profile| profile.name.as_str())
	}

	pub fn user_email(&self) -> &str {
		self.profile.as_ref().map_or("", |profile| profile.email.as_str())
	}

	pub fn user_image(&self) -> &str {
		self.profile
			.as_ref()
			.and_then(|profile| profile.image_url.as_deref())
			.unwrap_or("")
	}

	/// Whether a profile is loaded
	pub fn is_authenticated(&self) -> bool {
		self.profile.is_some()
	}
}

impl From<ProfileState> for ProfileView {
	fn from(state: ProfileState) -> Self {
		Self {
			profile: state.profile,
			loading: state.loading,
			error: state.error,
		}
	}
}

/// The profile store plus the remote service that fills it
#[derive(Clone)]
pub struct ProfileCache {
	store: ProfileStore,
	api: Rc<dyn ProfileApi>,
}

impl ProfileCache {
	pub fn new(store: ProfileStore, api: Rc<dyn ProfileApi>) -> Self {
		Self { store, api }
	}

	pub fn store(&self) -> &ProfileStore {
		&self.store
	}

	/// Starts the profile fetch if nothing is loaded or loading.
	///
	/// Returns the fetch task when this call won the gate; the caller spawns
	/// or awaits it. Returns `None` during a server-side render.
	pub fn ensure_loaded(&self, ctx: RenderContext) -> Option<LocalBoxFuture<'static, ()>> {
		if ctx.is_server() {
			return None;
		}
		let epoch = self.store.begin_fetch()?;

		tracing::debug!("profile fetch started");
		let store = self.store.clone();
		let api = Rc::clone(&self.api);
		Some(async move { store.complete_fetch(api.as_ref(), epoch).await }.boxed_local())
	}

	/// Triggers the guarded fetch on `spawner` and returns the current view
	pub fn use_profile(&self, ctx: RenderContext, spawner: &dyn Spawner) -> ProfileView {
		if let Some(task) = self.ensure_loaded(ctx) {
			spawner.spawn_local(task);
		}
		self.view()
	}

	pub fn view(&self) -> ProfileView {
		self.store.state().into()
	}

	/// Refetches the profile unless a load is in flight
	pub async fn fetch_profile(&self) {
		self.store.fetch_profile(self.api.as_ref()).await;
	}

	pub async fn update_profile(&self, update: ProfileUpdate) -> RemoteResult<Profile> {
		self.store.update_profile(self.api.as_ref(), update).await
	}

	pub async fn upload_image(&self, upload: ImageUpload) -> RemoteResult<Profile> {
		self.store.upload_image(self.api.as_ref(), upload).await
	}

	pub fn clear_profile(&self) {
		self.store.clear_profile();
	}

	pub fn set_profile(&self, profile: Profile) {
		self.store.set_profile(profile);
	}

	/// Mounts the profile hook into a view whose effects run on `rt`
	pub fn mount(&self, ctx: RenderContext, spawner: Rc<dyn Spawner>) -> ProfileMount {
		ProfileMount {
			cache: self.clone(),
			ctx,
			spawner,
			guard: EffectGuard::new(),
		}
	}
}

impl fmt::Debug for ProfileCache {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ProfileCache")
			.field("store", &self.store)
			.finish_non_exhaustive()
	}
}

/// A mounted profile hook.
///
/// Each render evaluates an effect keyed on "the profile needs loading", so
/// the fetch trigger runs after commit and at most once per transition into
/// that state, even under strict double invocation.
pub struct ProfileMount {
	cache: ProfileCache,
	ctx: RenderContext,
	spawner: Rc<dyn Spawner>,
	guard: EffectGuard<bool, ()>,
}

impl ProfileMount {
	pub fn use_profile(&self, rt: &Runtime) -> ProfileView {
		let view = self.cache.view();
		let needs_load = view.profile.is_none() && !view.loading;

		let cache = self.cache.clone();
		let spawner = Rc::clone(&self.spawner);
		let ctx = self.ctx;
		self.guard.evaluate(rt, Some(needs_load), (), move || {
			if let Some(task) = cache.ensure_loaded(ctx) {
				spawner.spawn_local(task);
			}
			Ok(None)
		});
		view
	}
}

impl fmt::Debug for ProfileMount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ProfileMount")
			.field("cache", &self.cache)
			.field("ctx", &self.ctx)
			.field("guard", &self.guard)
			.finish_non_exhaustive()
	}
}
