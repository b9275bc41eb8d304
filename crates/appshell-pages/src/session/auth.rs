//! Shared authentication state.

use core::fmt;

use appshell_reactive::{Store, Subscription};
use serde::{Deserialize, Serialize};

use super::credentials::CredentialSource;

/// The signed-in account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	pub id: i64,
	pub email: String,
	#[serde(default)]
	pub is_active: bool,
}

/// Snapshot of the session.
///
/// `is_authenticated` tracks whether a credential is persisted; `user` is only
/// filled once the account has been loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
	pub user: Option<User>,
	pub is_authenticated: bool,
}

/// Shared authentication store
#[derive(Clone, Default)]
pub struct AuthStore {
	state: Store<AuthState>,
}

impl AuthStore {
	/// Signed-out store with no user
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_state(state: AuthState) -> Self {
		Self {
			state: Store::new(state),
		}
	}

	pub fn state(&self) -> AuthState {
		self.state.get()
	}

	pub fn is_authenticated(&self) -> bool {
		self.state.with(|state| state.is_authenticated)
	}

	pub fn user(&self) -> Option<User> {
		self.state.with(|state| state.user.clone())
	}

	pub fn set_user(&self, user: Option<User>) {
		self.state.update(|state| state.user = user);
	}

	pub fn set_authenticated(&self, authenticated: bool) {
		tracing::debug!(authenticated, "auth flag set");
		self.state
			.update(|state| state.is_authenticated = authenticated);
	}

	/// Deletes the persisted credential and resets the session
	pub fn signout(&self, source: &dyn CredentialSource) {
		source.clear_token();
		tracing::debug!("signed out");
		self.state.set(AuthState::default());
	}

	#[must_use = "dropping the Subscription unsubscribes immediately"]
	pub fn subscribe<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&AuthState) + 'static,
	{
		self.state.subscribe(listener)
	}

	pub fn subscriber_count(&self) -> usize {
		self.state.subscriber_count()
	}

	/// Sets the flag only if it differs, returning whether it changed
	pub(crate) fn sync_authenticated(&self, authenticated: bool) -> bool {
		self.state.update_if(|state| {
			if state.is_authenticated == authenticated {
				return false;
			}
			state.is_authenticated = authenticated;
			true
		})
	}
}

impl fmt::Debug for AuthStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AuthStore")
			.field("state", &self.state())
			.finish()
	}
}
