//! Local task spawning
//!
//! Fetch tasks hold `Rc` handles into stores, so they are `!Send` and must be
//! spawned onto the current thread's executor. [`Spawner`] hides which
//! executor that is.

use futures::future::LocalBoxFuture;

/// Spawns `!Send` futures onto the current thread's executor
pub trait Spawner {
	fn spawn_local(&self, task: LocalBoxFuture<'static, ()>);
}

/// Spawns onto the browser's microtask queue
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct WasmSpawner;

#[cfg(target_arch = "wasm32")]
impl Spawner for WasmSpawner {
	fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
		wasm_bindgen_futures::spawn_local(task);
	}
}

/// Spawns onto the enclosing `tokio::task::LocalSet`.
///
/// Must be called from within a `LocalSet` (or a current-thread runtime
/// driving one); tokio panics otherwise.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioLocalSpawner;

#[cfg(not(target_arch = "wasm32"))]
impl Spawner for TokioLocalSpawner {
	fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
		// Completion is observed through the stores, not the join handle
		drop(tokio::task::spawn_local(task));
	}
}

/// The spawner for the current target
#[cfg(target_arch = "wasm32")]
pub fn default_spawner() -> WasmSpawner {
	WasmSpawner
}

/// The spawner for the current target
#[cfg(not(target_arch = "wasm32"))]
pub fn default_spawner() -> TokioLocalSpawner {
	TokioLocalSpawner
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
	use super::*;
	use core::cell::Cell;
	use futures::FutureExt;
	use std::rc::Rc;

	#[tokio::test]
	async fn test_tokio_spawner_runs_local_task() {
		let local = tokio::task::LocalSet::new();
		let ran = Rc::new(Cell::new(false));

		let flag = Rc::clone(&ran);
		local
			.run_until(async move {
				default_spawner().spawn_local(async move { flag.set(true) }.boxed_local());
				tokio::task::yield_now().await;
			})
			.await;
		local.await;

		assert!(ran.get());
	}
}
