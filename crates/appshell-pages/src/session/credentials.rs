//! Persisted credential sources.

use core::cell::RefCell;
use core::fmt;

use std::rc::Rc;

use crate::settings::SessionSettings;

/// Synchronous access to the persisted session credential
pub trait CredentialSource {
	/// Returns the token if one is persisted. Empty values count as absent.
	fn read_token(&self) -> Option<String>;

	/// Deletes the persisted token
	fn clear_token(&self);
}

impl<T: CredentialSource + ?Sized> CredentialSource for Rc<T> {
	fn read_token(&self) -> Option<String> {
		(**self).read_token()
	}

	fn clear_token(&self) {
		(**self).clear_token()
	}
}

/// In-memory credential for tests and native hosts
#[derive(Debug, Default)]
pub struct MemoryCredentialSource {
	token: RefCell<Option<String>>,
}

impl MemoryCredentialSource {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_token(token: impl Into<String>) -> Self {
		let source = Self::new();
		source.set_token(token);
		source
	}

	pub fn set_token(&self, token: impl Into<String>) {
		*self.token.borrow_mut() = Some(token.into());
	}
}

impl CredentialSource for MemoryCredentialSource {
	fn read_token(&self) -> Option<String> {
		self.token.borrow().clone().filter(|token| !token.is_empty())
	}

	fn clear_token(&self) {
		self.token.borrow_mut().take();
	}
}

/// Parses a cookie value from a `Cookie`-style header string.
///
/// The value is percent-decoded. Empty values are treated as absent, which is
/// also what an expired cookie looks like.
pub fn parse_cookie_value(cookie_str: &str, name: &str) -> Option<String> {
	for part in cookie_str.split(';') {
		let part = part.trim();
		if let Some((key, value)) = part.split_once('=')
			&& key.trim() == name
		{
			let value = value.trim();
			if value.is_empty() {
				return None;
			}
			let decoded = urlencoding::decode(value)
				.map(|decoded| decoded.into_owned())
				.unwrap_or_else(|_| value.to_string());
			return Some(decoded);
		}
	}
	None
}

/// Read/expire access to a cookie store
pub trait CookieJar {
	/// The full cookie string, as `document.cookie` returns it
	fn cookie_header(&self) -> Option<String>;

	/// Expires the named cookie
	fn expire(&self, name: &str);
}

/// Cookie jar backed by a fixed header string.
///
/// Used for server-side rendering, where the request's `Cookie` header is the
/// only source, and in tests.
#[derive(Debug, Default)]
pub struct StaticCookieJar {
	header: RefCell<String>,
}

impl StaticCookieJar {
	pub fn new(header: impl Into<String>) -> Self {
		Self {
			header: RefCell::new(header.into()),
		}
	}

	pub fn header(&self) -> String {
		self.header.borrow().clone()
	}
}

impl CookieJar for StaticCookieJar {
	fn cookie_header(&self) -> Option<String> {
		Some(self.header())
	}

	fn expire(&self, name: &str) {
		let remaining = self
			.header
			.borrow()
			.split(';')
			.map(str::trim)
			.filter(|part| {
				!part.is_empty()
					&& part
						.split_once('=')
						.is_none_or(|(key, _)| key.trim() != name)
			})
			.collect::<Vec<_>>()
			.join("; ");
		*self.header.borrow_mut() = remaining;
	}
}

/// Cookie jar backed by `document.cookie`
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentCookieJar;

#[cfg(target_arch = "wasm32")]
impl DocumentCookieJar {
	fn document() -> Option<web_sys::HtmlDocument> {
		use wasm_bindgen::JsCast;

		let window = web_sys::window()?;
		let document = window.document()?;
		document.dyn_into::<web_sys::HtmlDocument>().ok()
	}
}

#[cfg(target_arch = "wasm32")]
impl CookieJar for DocumentCookieJar {
	fn cookie_header(&self) -> Option<String> {
		Self::document()?.cookie().ok()
	}

	fn expire(&self, name: &str) {
		let Some(document) = Self::document() else {
			return;
		};
		let cookie = format!("{name}=; expires=Thu, 01 Jan 1970 00:00:00 UTC; path=/");
		if document.set_cookie(&cookie).is_err() {
			appshell_reactive::warn_log!("failed to expire cookie `{}`", name);
		}
	}
}

/// Credential persisted in a named cookie
pub struct CookieCredentialSource<J: CookieJar> {
	jar: J,
	name: String,
}

impl<J: CookieJar> CookieCredentialSource<J> {
	pub fn new(jar: J, name: impl Into<String>) -> Self {
		Self {
			jar,
			name: name.into(),
		}
	}

	/// Uses the cookie name configured in `settings`
	pub fn from_settings(jar: J, settings: &SessionSettings) -> Self {
		Self::new(jar, settings.token_cookie.clone())
	}

	pub fn cookie_name(&self) -> &str {
		&self.name
	}

	pub fn jar(&self) -> &J {
		&self.jar
	}
}

#[cfg(target_arch = "wasm32")]
impl CookieCredentialSource<DocumentCookieJar> {
	/// Reads `document.cookie`
	pub fn document(name: impl Into<String>) -> Self {
		Self::new(DocumentCookieJar, name)
	}
}

impl<J: CookieJar> CredentialSource for CookieCredentialSource<J> {
	fn read_token(&self) -> Option<String> {
		let header = self.jar.cookie_header()?;
		parse_cookie_value(&header, &self.name)
	}

	fn clear_token(&self) {
		self.jar.expire(&self.name);
	}
}

impl<J: CookieJar> fmt::Debug for CookieCredentialSource<J> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CookieCredentialSource")
			.field("name", &self.name)
			.finish_non_exhaustive()
	}
}
