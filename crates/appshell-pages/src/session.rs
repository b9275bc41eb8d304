//! Session state
//!
//! [`AuthStore`] holds the shared authentication flag. [`SessionBootstrap`]
//! keeps it consistent with the credential persisted in a [`CredentialSource`]
//! (the `access_token` cookie in the browser).
//!
//! ```ignore
//! use std::rc::Rc;
//! use appshell_pages::session::{AuthStore, CookieCredentialSource, SessionBootstrap};
//!
//! let auth = AuthStore::new();
//! let bootstrap = Rc::new(SessionBootstrap::new(
//!     auth.clone(),
//!     Rc::new(CookieCredentialSource::document("access_token")),
//! ));
//!
//! bootstrap.on_session_start();
//! let _binding = bootstrap.bind();
//! ```

mod auth;
mod bootstrap;
mod credentials;

pub use auth::{AuthState, AuthStore, User};
pub use bootstrap::{Reconciliation, SessionBootstrap, SessionMount};
#[cfg(target_arch = "wasm32")]
pub use credentials::DocumentCookieJar;
pub use credentials::{
	CookieCredentialSource, CookieJar, CredentialSource, MemoryCredentialSource, StaticCookieJar,
	parse_cookie_value,
};
