//! Effect - Reactive Listeners
//!
//! An `Effect` is a closure that re-runs whenever one of the signals it
//! read during its last run changes. Dependencies are re-tracked from
//! scratch on every run, so conditional reads subscribe correctly.
//!
//! UI framework bindings build their render subscriptions on top of this:
//! the binding wraps its "re-render this field" callback in an `Effect`
//! and the store's signals do the rest.

use core::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::runtime::{NodeId, try_with_runtime, with_runtime};

type ListenerFn = Box<dyn FnMut() + 'static>;

thread_local! {
	static LISTENERS: RefCell<BTreeMap<NodeId, ListenerFn>> = const { RefCell::new(BTreeMap::new()) };
}

/// Run a listener by id, re-tracking its dependencies
///
/// Called by the runtime's flush loop. Missing ids are ignored (the
/// listener was dropped after being queued).
pub(crate) fn execute_listener(id: NodeId) {
	let Some(mut f) = LISTENERS.with(|store| store.borrow_mut().remove(&id)) else {
		return;
	};
	with_runtime(|rt| rt.clear_dependencies(id));
	with_runtime(|rt| rt.push_observer(id));
	f();
	with_runtime(|rt| rt.pop_observer());
	LISTENERS.with(|store| store.borrow_mut().insert(id, f));
}

/// A reactive listener that re-runs when its dependencies change
///
/// Runs immediately on creation. Dropping the effect unsubscribes it from
/// every signal it tracked.
///
/// # Example
///
/// ```ignore
/// let count = Signal::new(0);
/// let c = count.clone();
/// let _effect = Effect::new(move || {
///     println!("count is {}", c.get());
/// });
/// count.set(1); // prints again
/// ```
pub struct Effect {
	id: NodeId,
}

impl Effect {
	/// Create and immediately run a new effect
	pub fn new<F>(f: F) -> Self
	where
		F: FnMut() + 'static,
	{
		let id = NodeId::new();
		LISTENERS.with(|store| store.borrow_mut().insert(id, Box::new(f)));
		execute_listener(id);
		Self { id }
	}

	/// The runtime id of this effect (mainly for tests)
	pub fn id(&self) -> NodeId {
		self.id
	}
}

impl Drop for Effect {
	fn drop(&mut self) {
		let _ = try_with_runtime(|rt| rt.remove_node(self.id));
		let _ = LISTENERS.try_with(|store| store.borrow_mut().remove(&self.id));
	}
}
