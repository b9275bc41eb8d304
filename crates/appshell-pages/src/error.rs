//! Error types for appshell-pages

use thiserror::Error;

/// Failure reported by a remote profile operation.
///
/// Remote failures are captured into `ProfileState::error` as display strings
/// and never escape a hook as a panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
	/// The request was rejected because the session is not authenticated
	#[error("Not authenticated")]
	Unauthorized,

	/// The server answered with an error status
	#[error("Request failed with status {status}: {message}")]
	Status {
		/// HTTP-like status code
		status: u16,
		/// Message returned by the server
		message: String,
	},

	/// The request never reached the server
	#[error("Network error: {0}")]
	Network(String),

	/// The response could not be decoded
	#[error("Invalid response: {0}")]
	Decode(String),

	/// Another operation on the same store is still outstanding
	#[error("Another profile operation is in progress")]
	Busy,
}

impl From<serde_json::Error> for RemoteError {
	fn from(err: serde_json::Error) -> Self {
		Self::Decode(err.to_string())
	}
}

/// Error raised while loading [`ShellSettings`](crate::settings::ShellSettings).
#[derive(Debug, Error)]
pub enum SettingsError {
	/// The TOML document could not be parsed
	#[error("Failed to parse settings: {0}")]
	Toml(#[from] toml::de::Error),

	/// A setting had a value that could not be interpreted
	#[error("Invalid value for {key}: {value:?} ({reason})")]
	InvalidValue {
		key: String,
		value: String,
		reason: String,
	},
}

/// Result type for settings operations
pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

/// Result type for remote operations
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;
