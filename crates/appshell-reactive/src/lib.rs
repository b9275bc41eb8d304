//! # appshell-reactive
//!
//! Reactive primitives shared by every appshell component:
//!
//! - [`Store`]: injectable shared state with synchronous, atomic-snapshot notification
//! - [`Subscription`]: weak listener handle that unsubscribes on drop
//! - [`Runtime`]: deferred effect queue flushed after each render commit
//! - [`EffectGuard`]: at-most-once effect execution per logical key
//!
//! Everything here is single-threaded (`Rc`/`RefCell`), matching the browser event
//! loop the primitives are written for.

pub mod effect_guard;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod store;

pub use effect_guard::{Cleanup, EffectGuard, EffectResult, GuardState};
pub use error::{EffectError, Result};
pub use runtime::{EffectTiming, NodeId, Runtime};
pub use store::{Store, Subscription};

#[doc(hidden)]
pub mod __private {
	pub use tracing;
	#[cfg(target_arch = "wasm32")]
	pub use web_sys;
}
