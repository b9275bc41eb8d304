//! Shared profile store.

use core::cell::Cell;
use core::fmt;

use std::rc::Rc;

use appshell_reactive::{Store, Subscription};

use super::api::{ImageUpload, Profile, ProfileApi, ProfileUpdate};
use crate::error::{RemoteError, RemoteResult};

/// Snapshot of the profile slice
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileState {
	pub profile: Option<Profile>,
	pub loading: bool,
	pub error: Option<String>,
}

/// Shared profile store.
///
/// Remote failures are captured into [`ProfileState::error`]; `profile` keeps
/// its previous value when an operation fails.
///
/// [`clear_profile`](Self::clear_profile) starts a new epoch. Operations begun
/// in an earlier epoch still complete, but their results are not written.
#[derive(Clone, Default)]
pub struct ProfileStore {
	state: Store<ProfileState>,
	epoch: Rc<Cell<u64>>,
}

impl ProfileStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn state(&self) -> ProfileState {
		self.state.get()
	}

	pub fn profile(&self) -> Option<Profile> {
		self.state.with(|state| state.profile.clone())
	}

	pub fn is_loading(&self) -> bool {
		self.state.with(|state| state.loading)
	}

	pub fn error(&self) -> Option<String> {
		self.state.with(|state| state.error.clone())
	}

	/// Flips `loading` on if nothing is loaded and no load is in flight.
	///
	/// Returns whether the caller now owns the fetch. Because the flag flips
	/// synchronously, a second trigger before the first settles gets `false`.
	pub fn try_begin_fetch(&self) -> bool {
		self.begin_fetch().is_some()
	}

	/// The gate behind [`try_begin_fetch`](Self::try_begin_fetch); returns the
	/// epoch the fetch belongs to.
	pub(crate) fn begin_fetch(&self) -> Option<u64> {
		let started = self.state.update_if(|state| {
			if state.profile.is_some() || state.loading {
				return false;
			}
			state.loading = true;
			state.error = None;
			true
		});
		started.then(|| self.epoch.get())
	}

	/// Fetches the profile, replacing any loaded one.
	///
	/// Skipped while another operation is loading. Failures are captured into
	/// `error` and not returned.
	pub async fn fetch_profile(&self, api: &dyn ProfileApi) {
		let Some(epoch) = self.try_begin() else {
			tracing::debug!("profile fetch skipped, already loading");
			return;
		};
		self.complete_fetch(api, epoch).await;
	}

	/// Runs the remote fetch for a load already started by the gate
	pub(crate) async fn complete_fetch(&self, api: &dyn ProfileApi, epoch: u64) {
		let result = api.fetch_profile().await;
		// Fetch failures stay in `error`; callers observe them through the store
		self.settle("fetch profile", epoch, result).ok();
	}

	/// Sends a partial update; on success the store holds the server's profile.
	///
	/// Fails with [`RemoteError::Busy`] without touching the store while
	/// another operation is loading.
	pub async fn update_profile(
		&self,
		api: &dyn ProfileApi,
		update: ProfileUpdate,
	) -> RemoteResult<Profile> {
		let Some(epoch) = self.try_begin() else {
			return Err(RemoteError::Busy);
		};
		let result = api.update_profile(&update).await;
		self.settle("update profile", epoch, result)
	}

	/// Uploads a profile image; on success the store holds the server's profile.
	///
	/// Fails with [`RemoteError::Busy`] while another operation is loading.
	pub async fn upload_image(
		&self,
		api: &dyn ProfileApi,
		upload: ImageUpload,
	) -> RemoteResult<Profile> {
		let Some(epoch) = self.try_begin() else {
			return Err(RemoteError::Busy);
		};
		let result = api.upload_image(&upload).await;
		self.settle("upload image", epoch, result)
	}

	/// Resets the slice, which permits a new guarded fetch.
	///
	/// An operation still in flight settles silently.
	pub fn clear_profile(&self) {
		self.epoch.set(self.epoch.get() + 1);
		self.state.set(ProfileState::default());
	}

	pub fn set_profile(&self, profile: Profile) {
		self.state.update(|state| state.profile = Some(profile));
	}

	#[must_use = "dropping the Subscription unsubscribes immediately"]
	pub fn subscribe<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&ProfileState) + 'static,
	{
		self.state.subscribe(listener)
	}

	/// Starts an operation unless one is outstanding
	fn try_begin(&self) -> Option<u64> {
		let started = self.state.update_if(|state| {
			if state.loading {
				return false;
			}
			state.loading = true;
			state.error = None;
			true
		});
		started.then(|| self.epoch.get())
	}

	fn settle(
		&self,
		operation: &str,
		epoch: u64,
		result: RemoteResult<Profile>,
	) -> RemoteResult<Profile> {
		if epoch != self.epoch.get() {
			tracing::debug!(operation, "profile cleared while in flight, result dropped");
			return result;
		}
		match result {
			Ok(profile) => {
				self.state.update(|state| {
					state.profile = Some(profile.clone());
					state.loading = false;
				});
				Ok(profile)
			}
			Err(err) => {
				tracing::warn!(operation, error = %err, "profile operation failed");
				self.state.update(|state| {
					state.error = Some(err.to_string());
					state.loading = false;
				});
				Err(err)
			}
		}
	}
}

impl fmt::Debug for ProfileStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ProfileStore")
			.field("state", &self.state())
			.finish()
	}
}
