//! Signal - Fine-grained Reactive Primitive
//!
//! `Signal<T>` is a mutable cell with subscriber tracking. Reading it
//! inside an active listener records the dependency automatically; writing
//! it notifies every subscriber, unless the new value equals the old one.
//!
//! ## Example
//!
//! ```ignore
//! use formic_reactive::Signal;
//!
//! let count = Signal::new(0);
//! assert_eq!(count.get(), 0);
//!
//! count.set(42);
//! assert_eq!(count.get(), 42);
//!
//! // Equal writes are suppressed: no subscriber runs for this.
//! count.set(42);
//! ```

use core::cell::RefCell;
use core::fmt;
use std::rc::Rc;

use crate::runtime::{NodeId, try_with_runtime, with_runtime};

/// A reactive cell holding a value of type `T`
///
/// Clones share the same underlying value via `Rc<RefCell<T>>`; all clones
/// notify the same subscriber set.
#[derive(Clone)]
pub struct Signal<T: 'static> {
	id: NodeId,
	value: Rc<RefCell<T>>,
}

impl<T: 'static> Signal<T> {
	/// Create a new signal with the given initial value
	pub fn new(value: T) -> Self {
		Self {
			id: NodeId::new(),
			value: Rc::new(RefCell::new(value)),
		}
	}

	/// Get the current value, tracking the read
	///
	/// When called inside an active listener (and outside `untrack`), the
	/// listener is registered as a subscriber of this signal.
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		with_runtime(|rt| rt.track_dependency(self.id));
		self.get_untracked()
	}

	/// Get the current value without registering a dependency
	pub fn get_untracked(&self) -> T
	where
		T: Clone,
	{
		self.value.borrow().clone()
	}

	/// Borrow the current value without cloning or tracking
	///
	/// The closure must not write to this signal.
	pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		f(&self.value.borrow())
	}

	/// Set a new value, notifying subscribers
	///
	/// A write of a value equal to the current one is a no-op: nothing is
	/// stored and no subscriber is notified.
	pub fn set(&self, value: T)
	where
		T: PartialEq,
	{
		if *self.value.borrow() == value {
			return;
		}
		*self.value.borrow_mut() = value;
		with_runtime(|rt| rt.notify_signal_change(self.id));
	}

	/// Update the value in place with `f`, notifying on change
	pub fn update<F>(&self, f: F)
	where
		T: Clone + PartialEq,
		F: FnOnce(&mut T),
	{
		let changed = {
			let mut value = self.value.borrow_mut();
			let before = value.clone();
			f(&mut value);
			*value != before
		};
		if changed {
			with_runtime(|rt| rt.notify_signal_change(self.id));
		}
	}

	/// The runtime id of this signal (mainly for tests)
	pub fn id(&self) -> NodeId {
		self.id
	}
}

impl<T: 'static> Drop for Signal<T> {
	fn drop(&mut self) {
		// Unhook from the graph only when the last clone goes away.
		if Rc::strong_count(&self.value) == 1 {
			let _ = try_with_runtime(|rt| rt.remove_node(self.id));
		}
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for Signal<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Signal")
			.field("id", &self.id)
			.field("value", &*self.value.borrow())
			.finish()
	}
}
