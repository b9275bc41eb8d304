//! Error types for appshell-reactive

use thiserror::Error;

/// Error raised by a guarded or scheduled effect.
///
/// Effect failures are never swallowed by the runtime: they are returned from
/// [`Runtime::flush`](crate::Runtime::flush) to the caller's error boundary.
#[derive(Debug, Error)]
pub enum EffectError {
	/// The effect body reported a failure
	#[error("Effect failed: {0}")]
	Failed(String),

	/// The effect body returned an underlying error
	#[error(transparent)]
	Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl EffectError {
	/// Creates a failure with a message
	pub fn failed(message: impl Into<String>) -> Self {
		Self::Failed(message.into())
	}
}

/// Result type for effect operations
pub type Result<T> = std::result::Result<T, EffectError>;
