//! Reactive primitives
//!
//! This module re-exports `appshell-reactive`, including its logging macros.

pub use appshell_reactive::*;
