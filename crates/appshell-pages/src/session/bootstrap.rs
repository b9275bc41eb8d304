//! Session bootstrap: reconcile the persisted credential with the auth flag.

use core::fmt;

use std::rc::{Rc, Weak};

use appshell_reactive::{EffectGuard, Runtime, Subscription};

use super::auth::{AuthState, AuthStore};
use super::credentials::CredentialSource;

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
	/// The flag already matched the credential; nothing was mutated
	Unchanged,
	/// A credential was found and the flag was set
	SignedIn,
	/// No credential was found and the flag was cleared
	SignedOut,
}

/// Keeps `AuthState::is_authenticated` equal to "a credential is persisted".
pub struct SessionBootstrap {
	auth: AuthStore,
	source: Rc<dyn CredentialSource>,
}

impl SessionBootstrap {
	pub fn new(auth: AuthStore, source: Rc<dyn CredentialSource>) -> Self {
		Self { auth, source }
	}

	pub fn auth(&self) -> &AuthStore {
		&self.auth
	}

	/// Reads the credential and sets the flag only if it differs.
	///
	/// A consistent store is left untouched, so subscribers are not notified.
	pub fn reconcile(&self) -> Reconciliation {
		let has_token = self.source.read_token().is_some();
		if !self.auth.sync_authenticated(has_token) {
			return Reconciliation::Unchanged;
		}

		let outcome = if has_token {
			Reconciliation::SignedIn
		} else {
			Reconciliation::SignedOut
		};
		tracing::debug!(?outcome, "session reconciled");
		outcome
	}

	/// Entry point for application start
	pub fn on_session_start(&self) -> Reconciliation {
		self.reconcile()
	}

	/// Entry point for when the host knows the credential was written or removed
	pub fn on_credential_changed(&self) -> Reconciliation {
		self.reconcile()
	}

	/// Re-reconciles whenever the auth store changes.
	///
	/// Reconciliation only mutates on a mismatch, so the loop settles after at
	/// most one extra notification.
	#[must_use = "dropping the Subscription unbinds the session"]
	pub fn bind(self: &Rc<Self>) -> Subscription {
		let weak: Weak<Self> = Rc::downgrade(self);
		self.auth.subscribe(move |_| {
			if let Some(bootstrap) = weak.upgrade() {
				bootstrap.reconcile();
			}
		})
	}

	/// Mounts the session into a view: reconciles once after the first commit
	/// and stays bound to auth changes while the returned handle lives.
	pub fn mount(self: &Rc<Self>, rt: &Runtime) -> SessionMount {
		let mount = SessionMount {
			bootstrap: Rc::clone(self),
			guard: EffectGuard::new(),
			_binding: self.bind(),
		};
		mount.use_auth(rt);
		mount
	}
}

impl fmt::Debug for SessionBootstrap {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SessionBootstrap")
			.field("auth", &self.auth)
			.finish_non_exhaustive()
	}
}

/// A mounted session, returned by [`SessionBootstrap::mount`].
pub struct SessionMount {
	bootstrap: Rc<SessionBootstrap>,
	guard: EffectGuard<(), ()>,
	_binding: Subscription,
}

impl SessionMount {
	/// Evaluates the mount-time reconciliation for this render pass and returns
	/// the current auth snapshot.
	///
	/// The reconciliation body runs once per mount, even when the runtime
	/// double-invokes effects.
	pub fn use_auth(&self, rt: &Runtime) -> AuthState {
		let weak = Rc::downgrade(&self.bootstrap);
		self.guard.evaluate(rt, None, (), move || {
			if let Some(bootstrap) = weak.upgrade() {
				bootstrap.on_session_start();
			}
			Ok(None)
		});
		self.bootstrap.auth.state()
	}

	pub fn has_reconciled(&self) -> bool {
		self.guard.has_run()
	}
}

impl fmt::Debug for SessionMount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SessionMount")
			.field("bootstrap", &self.bootstrap)
			.field("guard", &self.guard)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::session::MemoryCredentialSource;
	use core::cell::Cell;
	use rstest::rstest;

	fn bootstrap(token: Option<&str>, authenticated: bool) -> (Rc<SessionBootstrap>, Rc<MemoryCredentialSource>) {
		let source = Rc::new(MemoryCredentialSource::new());
		if let Some(token) = token {
			source.set_token(token);
		}
		let auth = AuthStore::with_state(AuthState {
			user: None,
			is_authenticated: authenticated,
		});
		let bootstrap = Rc::new(SessionBootstrap::new(auth, source.clone()));
		(bootstrap, source)
	}

	fn count_notifications(auth: &AuthStore) -> (Rc<Cell<usize>>, Subscription) {
		let count = Rc::new(Cell::new(0));
		let counter = Rc::clone(&count);
		let sub = auth.subscribe(move |_| counter.set(counter.get() + 1));
		(count, sub)
	}

	#[rstest]
	#[case(Some("abc"), false, Reconciliation::SignedIn, true)]
	#[case(None, true, Reconciliation::SignedOut, false)]
	#[case(Some("abc"), true, Reconciliation::Unchanged, true)]
	#[case(None, false, Reconciliation::Unchanged, false)]
	fn test_reconcile(
		#[case] token: Option<&str>,
		#[case] authenticated: bool,
		#[case] expected: Reconciliation,
		#[case] final_flag: bool,
	) {
		let (bootstrap, _source) = bootstrap(token, authenticated);
		let (count, _sub) = count_notifications(bootstrap.auth());

		assert_eq!(bootstrap.reconcile(), expected);
		assert_eq!(bootstrap.auth().is_authenticated(), final_flag);
		assert_eq!(count.get(), usize::from(expected != Reconciliation::Unchanged));
	}

	#[rstest]
	fn test_credential_change_is_picked_up() {
		let (bootstrap, source) = bootstrap(None, false);
		assert_eq!(bootstrap.on_session_start(), Reconciliation::Unchanged);

		source.set_token("fresh");
		assert_eq!(bootstrap.on_credential_changed(), Reconciliation::SignedIn);
		assert!(bootstrap.auth().is_authenticated());
	}

	#[rstest]
	fn test_bind_corrects_inconsistent_writes() {
		let (bootstrap, _source) = bootstrap(None, false);
		let _binding = bootstrap.bind();

		bootstrap.auth().set_authenticated(true);

		assert!(!bootstrap.auth().is_authenticated());
	}

	#[rstest]
	fn test_bind_settles_after_signout() {
		let (bootstrap, source) = bootstrap(Some("abc"), true);
		let _binding = bootstrap.bind();
		let (count, _sub) = count_notifications(bootstrap.auth());

		bootstrap.auth().signout(source.as_ref());

		assert!(!bootstrap.auth().is_authenticated());
		assert_eq!(count.get(), 1);
	}

	#[rstest]
	fn test_mount_reconciles_once_under_strict_runtime() {
		let rt = Runtime::strict();
		let (bootstrap, _source) = bootstrap(Some("abc"), false);

		let mount = bootstrap.mount(&rt);
		assert!(!bootstrap.auth().is_authenticated());

		rt.flush().unwrap();
		assert!(mount.has_reconciled());
		assert!(bootstrap.auth().is_authenticated());

		let state = mount.use_auth(&rt);
		assert!(state.is_authenticated);
		assert_eq!(rt.pending_count(), 0);
	}

	#[rstest]
	fn test_dropping_mount_unbinds() {
		let rt = Runtime::new();
		let (bootstrap, _source) = bootstrap(None, false);
		let mount = bootstrap.mount(&rt);
		assert_eq!(bootstrap.auth().subscriber_count(), 1);

		drop(mount);
		assert_eq!(bootstrap.auth().subscriber_count(), 0);
	}
}
