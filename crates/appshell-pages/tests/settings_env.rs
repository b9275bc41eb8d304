//! Settings loaded from the process environment

use appshell_pages::overlay::OverlayPolicy;
use appshell_pages::{SettingsError, ShellSettings};
use rstest::*;
use serial_test::serial;
use std::env;

const PREFIX: &str = "APPSHELL_ENVTEST_";

fn clear() {
	// SAFETY: Setting environment variables is unsafe in multi-threaded programs.
	// These tests use #[serial] to ensure exclusive access to environment variables.
	unsafe {
		for key in [
			"APPSHELL_ENVTEST_OVERLAY_POLICY",
			"APPSHELL_ENVTEST_OVERLAY_CONFINED_OFFSET_PX",
			"APPSHELL_ENVTEST_SESSION_TOKEN_COOKIE",
		] {
			env::remove_var(key);
		}
	}
}

#[rstest]
#[serial(env_change)]
fn test_env_overrides_defaults() {
	clear();
	// SAFETY: see `clear`
	unsafe {
		env::set_var("APPSHELL_ENVTEST_OVERLAY_POLICY", "ref_counted");
		env::set_var("APPSHELL_ENVTEST_SESSION_TOKEN_COOKIE", "sid");
	}

	let settings = ShellSettings::from_env_with_prefix(PREFIX).unwrap();
	clear();

	assert_eq!(settings.overlay.policy, OverlayPolicy::RefCounted);
	assert_eq!(settings.session.token_cookie, "sid");
	assert_eq!(settings.overlay.confined_offset_px, 400);
}

#[rstest]
#[serial(env_change)]
fn test_env_rejects_bad_offset() {
	clear();
	// SAFETY: see `clear`
	unsafe {
		env::set_var("APPSHELL_ENVTEST_OVERLAY_CONFINED_OFFSET_PX", "-5");
	}

	let result = ShellSettings::from_env_with_prefix(PREFIX);
	clear();

	assert!(matches!(result, Err(SettingsError::InvalidValue { .. })));
}

#[rstest]
#[serial(env_change)]
fn test_empty_env_yields_defaults() {
	clear();
	assert_eq!(
		ShellSettings::from_env_with_prefix(PREFIX).unwrap(),
		ShellSettings::default()
	);
}
