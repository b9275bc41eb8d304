//! Store - Injectable Shared State Container
//!
//! `Store<T>` holds one piece of shared state and notifies subscribers every time
//! it is mutated.
//!
//! ## Key Features
//!
//! - **Synchronous Notification**: every mutation notifies all current subscribers
//!   before the outermost mutating call returns. A mutation made by a listener
//!   restarts the round, so every subscriber ends on the latest state and no
//!   subscriber receives a snapshot older than one it has already seen.
//! - **Atomic Snapshots**: subscribers and readers always receive the whole state,
//!   cloned at a single mutation point.
//! - **Weak Subscriptions**: a [`Subscription`] only holds a weak reference to the
//!   store and unsubscribes when dropped.
//! - **Owner-controlled Lifecycle**: a store is an ordinary value. Tests construct
//!   isolated instances instead of resetting globals.
//!
//! ## Example
//!
//! ```ignore
//! use appshell_reactive::Store;
//!
//! let count = Store::new(0);
//! let _sub = count.subscribe(|n| println!("count is now {n}"));
//!
//! count.set(42); // prints "count is now 42"
//! count.update(|n| *n += 1); // prints "count is now 43"
//! ```

use core::cell::{Cell, RefCell};
use core::fmt;

use std::rc::{Rc, Weak};

use crate::runtime::{FlagReset, NodeId};

type Listener<T> = Rc<dyn Fn(&T)>;

struct StoreInner<T> {
	value: RefCell<T>,
	listeners: RefCell<Vec<(NodeId, Listener<T>)>>,
	notifying: Cell<bool>,
	dirty: Cell<bool>,
}

/// Type-erased unsubscribe hook, so a [`Subscription`] does not carry `T`.
trait Unsubscribe {
	fn unsubscribe(&self, id: NodeId);
}

impl<T> Unsubscribe for StoreInner<T> {
	fn unsubscribe(&self, id: NodeId) {
		self.listeners
			.borrow_mut()
			.retain(|(listener_id, _)| *listener_id != id);
	}
}

/// A shared state container with synchronous change notification.
///
/// Cloning a `Store` yields another handle to the same state.
pub struct Store<T: Clone + 'static> {
	id: NodeId,
	inner: Rc<StoreInner<T>>,
}

impl<T: Clone + 'static> Store<T> {
	/// Create a new Store with the given initial state
	pub fn new(value: T) -> Self {
		Self {
			id: NodeId::new(),
			inner: Rc::new(StoreInner {
				value: RefCell::new(value),
				listeners: RefCell::new(Vec::new()),
				notifying: Cell::new(false),
				dirty: Cell::new(false),
			}),
		}
	}

	/// Get a snapshot of the whole state
	pub fn get(&self) -> T {
		self.inner.value.borrow().clone()
	}

	/// Read the state through a projection, without cloning all of it
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		f(&*self.inner.value.borrow())
	}

	/// Replace the state and notify subscribers
	pub fn set(&self, value: T) {
		*self.inner.value.borrow_mut() = value;
		self.notify();
	}

	/// Mutate the state in place and notify subscribers once
	pub fn update<F>(&self, f: F)
	where
		F: FnOnce(&mut T),
	{
		f(&mut *self.inner.value.borrow_mut());
		self.notify();
	}

	/// Mutate the state only if `f` reports a change.
	///
	/// Subscribers are notified only when `f` returns `true`, which lets callers
	/// skip redundant notifications when the state already matches.
	pub fn update_if<F>(&self, f: F) -> bool
	where
		F: FnOnce(&mut T) -> bool,
	{
		let changed = f(&mut *self.inner.value.borrow_mut());
		if changed {
			self.notify();
		}
		changed
	}

	/// Register a listener that receives a snapshot after every mutation.
	///
	/// The listener stays registered until the returned [`Subscription`] is
	/// dropped.
	#[must_use = "dropping the Subscription unsubscribes immediately"]
	pub fn subscribe<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&T) + 'static,
	{
		let id = NodeId::new();
		self.inner
			.listeners
			.borrow_mut()
			.push((id, Rc::new(listener)));
		let store: Weak<dyn Unsubscribe> = Rc::downgrade(&self.inner) as Weak<dyn Unsubscribe>;
		Subscription { id, store }
	}

	/// Number of live subscriptions
	pub fn subscriber_count(&self) -> usize {
		self.inner.listeners.borrow().len()
	}

	/// Get the NodeId of this store
	pub fn id(&self) -> NodeId {
		self.id
	}

	fn notify(&self) {
		let inner = &self.inner;
		// A mutation from inside a listener is picked up by the running round
		if inner.notifying.replace(true) {
			inner.dirty.set(true);
			return;
		}
		let _reset = FlagReset(&inner.notifying);

		loop {
			inner.dirty.set(false);
			// Borrows are released before listeners run so they may read,
			// mutate or unsubscribe.
			let snapshot = self.get();
			let listeners: Vec<Listener<T>> = inner
				.listeners
				.borrow()
				.iter()
				.map(|(_, listener)| Rc::clone(listener))
				.collect();
			for listener in listeners {
				if inner.dirty.get() {
					break;
				}
				listener(&snapshot);
			}
			if !inner.dirty.get() {
				break;
			}
		}
	}
}

impl<T: Clone + 'static> Clone for Store<T> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			inner: Rc::clone(&self.inner),
		}
	}
}

impl<T: Clone + Default + 'static> Default for Store<T> {
	fn default() -> Self {
		Self::new(T::default())
	}
}

impl<T: fmt::Debug + Clone + 'static> fmt::Debug for Store<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Store")
			.field("id", &self.id)
			.field("value", &*self.inner.value.borrow())
			.field("subscribers", &self.subscriber_count())
			.finish()
	}
}

/// Handle for a store listener. Dropping it unsubscribes.
pub struct Subscription {
	id: NodeId,
	store: Weak<dyn Unsubscribe>,
}

impl Subscription {
	/// Whether the store this subscription belongs to is still alive
	pub fn is_active(&self) -> bool {
		self.store.strong_count() > 0
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(store) = self.store.upgrade() {
			store.unsubscribe(self.id);
		}
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("active", &self.is_active())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use core::cell::Cell;
	use rstest::rstest;

	#[rstest]
	fn test_store_creation() {
		let store = Store::new(42);
		assert_eq!(store.get(), 42);
	}

	#[rstest]
	fn test_store_set_and_update() {
		let store = Store::new(0);

		store.set(100);
		assert_eq!(store.get(), 100);

		store.update(|n| *n += 1);
		assert_eq!(store.get(), 101);
	}

	#[rstest]
	fn test_store_clone_shares_state() {
		let store1 = Store::new(String::from("a"));
		let store2 = store1.clone();

		store1.set("b".to_string());
		assert_eq!(store2.get(), "b");
		assert_eq!(store1.id(), store2.id());
	}

	#[rstest]
	fn test_subscribers_notified_synchronously() {
		let store = Store::new(0);
		let seen = Rc::new(RefCell::new(Vec::new()));

		let seen_clone = Rc::clone(&seen);
		let _sub = store.subscribe(move |n| seen_clone.borrow_mut().push(*n));

		store.set(1);
		assert_eq!(*seen.borrow(), vec![1]);
		store.update(|n| *n *= 10);
		assert_eq!(*seen.borrow(), vec![1, 10]);
	}

	#[rstest]
	fn test_update_if_skips_notification_when_unchanged() {
		let store = Store::new(5);
		let notified = Rc::new(Cell::new(0));

		let notified_clone = Rc::clone(&notified);
		let _sub = store.subscribe(move |_| notified_clone.set(notified_clone.get() + 1));

		assert!(!store.update_if(|_| false));
		assert_eq!(notified.get(), 0);

		assert!(store.update_if(|n| {
			*n = 6;
			true
		}));
		assert_eq!(notified.get(), 1);
		assert_eq!(store.get(), 6);
	}

	#[rstest]
	fn test_drop_subscription_unsubscribes() {
		let store = Store::new(0);
		let notified = Rc::new(Cell::new(0));

		let notified_clone = Rc::clone(&notified);
		let sub = store.subscribe(move |_| notified_clone.set(notified_clone.get() + 1));
		assert_eq!(store.subscriber_count(), 1);

		drop(sub);
		assert_eq!(store.subscriber_count(), 0);

		store.set(1);
		assert_eq!(notified.get(), 0);
	}

	#[rstest]
	fn test_subscription_does_not_keep_store_alive() {
		let sub = {
			let store = Store::new(0);
			store.subscribe(|_| {})
		};
		assert!(!sub.is_active());
		// Dropping after the store is gone is a no-op
		drop(sub);
	}

	#[rstest]
	fn test_listener_may_mutate_store_reentrantly() {
		let store = Store::new(0);
		let seen = Rc::new(RefCell::new(Vec::new()));

		let inner_store = store.clone();
		let seen_clone = Rc::clone(&seen);
		let _sub = store.subscribe(move |n| {
			seen_clone.borrow_mut().push(*n);
			if *n == 1 {
				inner_store.set(2);
			}
		});

		store.set(1);
		assert_eq!(*seen.borrow(), vec![1, 2]);
		assert_eq!(store.get(), 2);
	}

	#[rstest]
	fn test_later_listeners_never_see_superseded_snapshot() {
		let store = Store::new(0);
		let seen = Rc::new(RefCell::new(Vec::new()));

		// Writer registered first clamps anything above 10
		let writer_store = store.clone();
		let _writer = store.subscribe(move |n| {
			if *n > 10 {
				writer_store.set(10);
			}
		});
		let seen_clone = Rc::clone(&seen);
		let _observer = store.subscribe(move |n| seen_clone.borrow_mut().push(*n));

		store.set(50);

		assert_eq!(store.get(), 10);
		assert_eq!(*seen.borrow(), vec![10]);
	}

	#[rstest]
	fn test_nested_mutation_restarts_round_for_earlier_listeners() {
		let store = Store::new(0);
		let first = Rc::new(RefCell::new(Vec::new()));
		let last = Rc::new(RefCell::new(Vec::new()));

		let first_clone = Rc::clone(&first);
		let _first = store.subscribe(move |n| first_clone.borrow_mut().push(*n));
		let writer_store = store.clone();
		let _writer = store.subscribe(move |n| {
			if *n == 1 {
				writer_store.update(|n| *n += 1);
			}
		});
		let last_clone = Rc::clone(&last);
		let _last = store.subscribe(move |n| last_clone.borrow_mut().push(*n));

		store.set(1);

		assert_eq!(*first.borrow(), vec![1, 2]);
		assert_eq!(*last.borrow(), vec![2]);
	}

	#[rstest]
	fn test_notification_recovers_after_panicking_listener() {
		let store = Store::new(0);
		let seen = Rc::new(Cell::new(0));

		let panicking = store.subscribe(|n| {
			if *n == 1 {
				panic!("listener failed");
			}
		});
		let seen_clone = Rc::clone(&seen);
		let _sub = store.subscribe(move |n| seen_clone.set(*n));

		let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| store.set(1)));
		assert!(result.is_err());
		drop(panicking);

		store.set(2);
		assert_eq!(seen.get(), 2);
	}

	#[rstest]
	fn test_listener_may_unsubscribe_during_notification() {
		let store = Store::new(0);
		let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

		let slot_clone = Rc::clone(&slot);
		let sub = store.subscribe(move |_| {
			slot_clone.borrow_mut().take();
		});
		*slot.borrow_mut() = Some(sub);

		store.set(1);
		assert_eq!(store.subscriber_count(), 0);
	}

	proptest::proptest! {
		#[test]
		fn test_last_notification_matches_final_state(values in proptest::collection::vec(proptest::num::i32::ANY, 1..32)) {
			let store = Store::new(0);
			let last = Rc::new(Cell::new(None));

			let last_clone = Rc::clone(&last);
			let _sub = store.subscribe(move |n| last_clone.set(Some(*n)));

			for value in &values {
				store.set(*value);
			}

			proptest::prop_assert_eq!(last.get(), Some(store.get()));
			proptest::prop_assert_eq!(store.get(), *values.last().unwrap());
		}
	}
}
