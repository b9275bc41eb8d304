//! Shared overlay
//!
//! Any view can toggle the blocking loader overlay through an [`OverlayStore`]
//! without holding a reference to the overlay itself. A single [`OverlayPortal`]
//! mounted near the root renders the overlay whenever the store says so.
//!
//! ```ignore
//! use appshell_pages::overlay::{OverlayPortal, OverlayStore, LoaderAssets};
//!
//! let overlay = OverlayStore::new();
//! let portal = OverlayPortal::new(overlay.clone(), LoaderAssets::default());
//!
//! overlay.show("Generating code", Some(400));
//! assert!(portal.is_mounted());
//! overlay.hide();
//! assert!(!portal.is_mounted());
//! ```

mod portal;
mod store;

pub use portal::{LoaderAssets, LoaderMode, OverlayLayout, OverlayPortal, OverlayVisual};
pub use store::{OverlayGuard, OverlayPolicy, OverlayState, OverlayStore};
