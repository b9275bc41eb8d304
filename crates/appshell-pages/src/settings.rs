//! Shell settings
//!
//! Every field has a default, so an empty TOML document or an empty environment
//! yields [`ShellSettings::default`].
//!
//! ```toml
//! [overlay]
//! default_title = "Loading..."
//! policy = "last_writer_wins"
//! confined_offset_px = 400
//! fullscreen_asset = "/Loader.mp4"
//! container_asset = "/Loader.mp4"
//!
//! [session]
//! token_cookie = "access_token"
//! ```
//!
//! Environment variables use the `APPSHELL_` prefix by default, e.g.
//! `APPSHELL_OVERLAY_POLICY=ref_counted`.

use serde::Deserialize;
use std::env;

use crate::error::{SettingsError, SettingsResult};
use crate::overlay::OverlayPolicy;

/// Default prefix for environment lookups
pub const ENV_PREFIX: &str = "APPSHELL_";

/// Title shown when `show` is called with an empty title
pub const DEFAULT_OVERLAY_TITLE: &str = "Loading...";

/// Cookie holding the access token
pub const DEFAULT_TOKEN_COOKIE: &str = "access_token";

/// Horizontal inset used by views that confine the overlay next to a side panel
pub const DEFAULT_CONFINED_OFFSET_PX: u32 = 400;

/// Looping loader media
pub const DEFAULT_LOADER_ASSET: &str = "/Loader.mp4";

/// Overlay configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
	pub default_title: String,
	pub policy: OverlayPolicy,
	pub confined_offset_px: u32,
	pub fullscreen_asset: String,
	pub container_asset: String,
}

impl Default for OverlaySettings {
	fn default() -> Self {
		Self {
			default_title: DEFAULT_OVERLAY_TITLE.to_string(),
			policy: OverlayPolicy::default(),
			confined_offset_px: DEFAULT_CONFINED_OFFSET_PX,
			fullscreen_asset: DEFAULT_LOADER_ASSET.to_string(),
			container_asset: DEFAULT_LOADER_ASSET.to_string(),
		}
	}
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
	/// Name of the persisted credential cookie
	pub token_cookie: String,
}

impl Default for SessionSettings {
	fn default() -> Self {
		Self {
			token_cookie: DEFAULT_TOKEN_COOKIE.to_string(),
		}
	}
}

/// Top-level settings for the shell
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShellSettings {
	pub overlay: OverlaySettings,
	pub session: SessionSettings,
}

impl ShellSettings {
	/// Parse settings from a TOML document
	pub fn from_toml_str(source: &str) -> SettingsResult<Self> {
		let settings = toml::from_str(source)?;
		Ok(settings)
	}

	/// Load settings from `APPSHELL_*` environment variables
	pub fn from_env() -> SettingsResult<Self> {
		Self::from_env_with_prefix(ENV_PREFIX)
	}

	/// Load settings from environment variables with a custom prefix
	pub fn from_env_with_prefix(prefix: &str) -> SettingsResult<Self> {
		Self::from_lookup(prefix, |key| env::var(key).ok())
	}

	/// Load settings through an arbitrary key lookup.
	///
	/// Keys are `<prefix><SECTION>_<FIELD>` in upper case, for example
	/// `APPSHELL_OVERLAY_CONFINED_OFFSET_PX`. Missing keys keep their defaults.
	pub fn from_lookup<F>(prefix: &str, lookup: F) -> SettingsResult<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut settings = Self::default();
		let get = |name: &str| {
			let key = format!("{}{}", prefix, name);
			lookup(&key).map(|value| (key, value))
		};

		if let Some((_, value)) = get("OVERLAY_DEFAULT_TITLE") {
			settings.overlay.default_title = value;
		}
		if let Some((key, value)) = get("OVERLAY_POLICY") {
			settings.overlay.policy = value.parse().map_err(|reason| SettingsError::InvalidValue {
				key,
				value: value.clone(),
				reason,
			})?;
		}
		if let Some((key, value)) = get("OVERLAY_CONFINED_OFFSET_PX") {
			settings.overlay.confined_offset_px =
				value.trim().parse().map_err(|err: std::num::ParseIntError| {
					SettingsError::InvalidValue {
						key,
						value: value.clone(),
						reason: err.to_string(),
					}
				})?;
		}
		if let Some((_, value)) = get("OVERLAY_FULLSCREEN_ASSET") {
			settings.overlay.fullscreen_asset = value;
		}
		if let Some((_, value)) = get("OVERLAY_CONTAINER_ASSET") {
			settings.overlay.container_asset = value;
		}
		if let Some((_, value)) = get("SESSION_TOKEN_COOKIE") {
			settings.session.token_cookie = value;
		}

		Ok(settings)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::collections::HashMap;

	#[rstest]
	fn test_defaults() {
		let settings = ShellSettings::default();
		assert_eq!(settings.overlay.default_title, "Loading...");
		assert_eq!(settings.overlay.policy, OverlayPolicy::LastWriterWins);
		assert_eq!(settings.overlay.confined_offset_px, 400);
		assert_eq!(settings.session.token_cookie, "access_token");
	}

	#[rstest]
	fn test_empty_toml_yields_defaults() {
		let settings = ShellSettings::from_toml_str("").unwrap();
		assert_eq!(settings, ShellSettings::default());
	}

	#[rstest]
	fn test_partial_toml() {
		let settings = ShellSettings::from_toml_str(
			r#"
			[overlay]
			policy = "ref_counted"
			confined_offset_px = 320

			[session]
			token_cookie = "sid"
			"#,
		)
		.unwrap();

		assert_eq!(settings.overlay.policy, OverlayPolicy::RefCounted);
		assert_eq!(settings.overlay.confined_offset_px, 320);
		assert_eq!(settings.overlay.default_title, "Loading...");
		assert_eq!(settings.session.token_cookie, "sid");
	}

	#[rstest]
	fn test_invalid_toml_is_reported() {
		let err = ShellSettings::from_toml_str("[overlay]\npolicy = \"sometimes\"").unwrap_err();
		assert!(matches!(err, SettingsError::Toml(_)));
	}

	#[rstest]
	fn test_from_lookup() {
		let vars: HashMap<&str, &str> = HashMap::from([
			("APPSHELL_OVERLAY_DEFAULT_TITLE", "Please wait"),
			("APPSHELL_OVERLAY_POLICY", "ref_counted"),
			("APPSHELL_OVERLAY_CONFINED_OFFSET_PX", " 256 "),
			("APPSHELL_SESSION_TOKEN_COOKIE", "jwt"),
		]);

		let settings =
			ShellSettings::from_lookup(ENV_PREFIX, |key| vars.get(key).map(|v| v.to_string()))
				.unwrap();

		assert_eq!(settings.overlay.default_title, "Please wait");
		assert_eq!(settings.overlay.policy, OverlayPolicy::RefCounted);
		assert_eq!(settings.overlay.confined_offset_px, 256);
		assert_eq!(settings.session.token_cookie, "jwt");
		assert_eq!(settings.overlay.fullscreen_asset, DEFAULT_LOADER_ASSET);
	}

	#[rstest]
	#[case("OVERLAY_CONFINED_OFFSET_PX", "wide")]
	#[case("OVERLAY_POLICY", "sometimes")]
	fn test_from_lookup_rejects_invalid_values(#[case] name: &str, #[case] raw: &str) {
		let key = format!("{}{}", ENV_PREFIX, name);
		let err = ShellSettings::from_lookup(ENV_PREFIX, |k| (k == key).then(|| raw.to_string()))
			.unwrap_err();

		match err {
			SettingsError::InvalidValue { key: reported, value, .. } => {
				assert_eq!(reported, key);
				assert_eq!(value, raw);
			}
			other => panic!("unexpected error: {other}"),
		}
	}
}
