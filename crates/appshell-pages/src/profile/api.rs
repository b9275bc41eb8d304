//! Profile types and the remote profile service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RemoteResult;

/// The signed-in user's profile as the server reports it.
///
/// Older backends send the display name as `fullname` or `full_name` and the
/// avatar as `photo`; decoding accepts all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireProfile")]
pub struct Profile {
	pub id: i64,
	pub email: String,
	pub name: String,
	pub image_url: Option<String>,
}

#[derive(Deserialize)]
struct WireProfile {
	id: i64,
	#[serde(default)]
	email: String,
	name: Option<String>,
	fullname: Option<String>,
	full_name: Option<String>,
	image_url: Option<String>,
	photo: Option<String>,
}

impl From<WireProfile> for Profile {
	fn from(wire: WireProfile) -> Self {
		Self {
			id: wire.id,
			email: wire.email,
			name: wire
				.name
				.or(wire.fullname)
				.or(wire.full_name)
				.unwrap_or_default(),
			image_url: wire.image_url.or(wire.photo),
		}
	}
}

/// Partial profile update; unset fields are left untouched by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
}

impl ProfileUpdate {
	pub fn is_empty(&self) -> bool {
		self.name.is_none() && self.email.is_none()
	}
}

/// A profile image to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
	pub file_name: String,
	pub content_type: String,
	pub bytes: Vec<u8>,
}

impl ImageUpload {
	pub fn new(
		file_name: impl Into<String>,
		content_type: impl Into<String>,
		bytes: impl Into<Vec<u8>>,
	) -> Self {
		Self {
			file_name: file_name.into(),
			content_type: content_type.into(),
			bytes: bytes.into(),
		}
	}
}

/// Remote profile service.
///
/// Transport is up to the implementor; every call resolves to the profile as
/// stored on the server after the operation.
#[async_trait(?Send)]
pub trait ProfileApi {
	async fn fetch_profile(&self) -> RemoteResult<Profile>;

	async fn update_profile(&self, update: &ProfileUpdate) -> RemoteResult<Profile>;

	async fn upload_image(&self, upload: &ImageUpload) -> RemoteResult<Profile>;
}
