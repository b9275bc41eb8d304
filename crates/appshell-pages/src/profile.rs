//! Profile cache
//!
//! [`ProfileStore`] holds the signed-in user's profile together with its
//! loading and error flags. [`ProfileCache`] layers the guarded fetch on top:
//! any number of views may ask for the profile, and only the first trigger
//! while nothing is loaded reaches the [`ProfileApi`].
//!
//! ```ignore
//! use std::rc::Rc;
//! use appshell_pages::context::RenderContext;
//! use appshell_pages::profile::{ProfileCache, ProfileStore};
//! use appshell_pages::spawn::default_spawner;
//!
//! let cache = ProfileCache::new(ProfileStore::new(), Rc::new(api));
//! let view = cache.use_profile(RenderContext::current(), &default_spawner());
//! println!("{}", view.user_name());
//! ```

mod api;
mod cache;
mod store;

pub use api::{ImageUpload, Profile, ProfileApi, ProfileUpdate};
pub use cache::{ProfileCache, ProfileMount, ProfileView};
pub use store::{ProfileState, ProfileStore};
