//! Overlay, session and profile coordination
//!
//! This module re-exports `appshell-pages`.

pub use appshell_pages::*;
