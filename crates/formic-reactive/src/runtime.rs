//! Reactive Runtime
//!
//! The runtime manages the dependency graph between signals and their
//! listeners, and schedules listener re-execution when signals change.
//!
//! ## Architecture
//!
//! 1. **Observer Stack**: tracks the currently executing listener so that
//!    `Signal::get()` can record a dependency automatically.
//! 2. **Dependency Graph**: bidirectional edges (signal → subscribers,
//!    listener → dependencies) so cleanup can unsubscribe both sides.
//! 3. **Batching**: a depth counter coalesces notifications raised inside
//!    `batch()` into a single deduplicated flush when the outermost batch
//!    exits.
//! 4. **Untracking**: a second depth counter suspends dependency
//!    registration inside `untrack()`.
//!
//! The runtime is thread-local: each thread gets an independent reactive
//! world, which also means it needs no locking.

use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicUsize, Ordering};
use std::collections::BTreeMap;

/// Unique identifier for reactive nodes (signals and listeners)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
	/// Create a new unique NodeId
	pub fn new() -> Self {
		static COUNTER: AtomicUsize = AtomicUsize::new(0);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

impl Default for NodeId {
	fn default() -> Self {
		Self::new()
	}
}

/// Dependency graph node
#[derive(Debug, Default)]
pub(crate) struct DependencyNode {
	/// IDs of listeners that depend on this node
	pub(crate) subscribers: Vec<NodeId>,
	/// IDs of signals this node depends on
	pub(crate) dependencies: Vec<NodeId>,
}

/// Thread-local reactive runtime
///
/// Holds the observer stack, the dependency graph, the pending-notification
/// queue, and the batch/untrack depth counters.
pub struct Runtime {
	/// Stack of currently executing listeners
	observer_stack: RefCell<Vec<NodeId>>,
	/// Dependency graph: NodeId -> DependencyNode
	pub(crate) dependency_graph: RefCell<BTreeMap<NodeId, DependencyNode>>,
	/// Listeners waiting to be notified, deduplicated
	pub(crate) pending: RefCell<Vec<NodeId>>,
	/// Nesting depth of `batch()` calls
	batch_depth: Cell<usize>,
	/// Nesting depth of `untrack()` calls
	untrack_depth: Cell<usize>,
	/// Guard against re-entrant flushes
	flushing: Cell<bool>,
}

impl Runtime {
	/// Create a new Runtime instance
	pub fn new() -> Self {
		Self {
			observer_stack: RefCell::new(Vec::new()),
			dependency_graph: RefCell::new(BTreeMap::new()),
			pending: RefCell::new(Vec::new()),
			batch_depth: Cell::new(0),
			untrack_depth: Cell::new(0),
			flushing: Cell::new(false),
		}
	}

	/// Get the currently executing listener, if any
	pub fn current_observer(&self) -> Option<NodeId> {
		self.observer_stack.borrow().last().copied()
	}

	/// Push a listener onto the observer stack
	pub fn push_observer(&self, id: NodeId) {
		self.observer_stack.borrow_mut().push(id);
	}

	/// Pop a listener from the observer stack
	pub fn pop_observer(&self) -> Option<NodeId> {
		self.observer_stack.borrow_mut().pop()
	}

	/// Record a dependency between the current observer and a signal
	///
	/// Called by `Signal::get()`. No-op when no listener is executing or
	/// when inside `untrack()`.
	pub fn track_dependency(&self, signal_id: NodeId) {
		if self.untrack_depth.get() > 0 {
			return;
		}
		if let Some(observer_id) = self.current_observer() {
			let mut graph = self.dependency_graph.borrow_mut();

			let signal_node = graph.entry(signal_id).or_default();
			if !signal_node.subscribers.contains(&observer_id) {
				signal_node.subscribers.push(observer_id);
			}

			let observer_node = graph.entry(observer_id).or_default();
			if !observer_node.dependencies.contains(&signal_id) {
				observer_node.dependencies.push(signal_id);
			}
		}
	}

	/// Notify that a signal has changed
	///
	/// Subscribers are queued (once each) and flushed immediately unless a
	/// batch is active, in which case the outermost `batch()` flushes them.
	pub fn notify_signal_change(&self, signal_id: NodeId) {
		{
			let graph = self.dependency_graph.borrow();
			if let Some(node) = graph.get(&signal_id) {
				let mut pending = self.pending.borrow_mut();
				for &subscriber_id in &node.subscribers {
					if !pending.contains(&subscriber_id) {
						pending.push(subscriber_id);
					}
				}
			}
		}
		if self.batch_depth.get() == 0 {
			self.flush();
		}
	}

	/// Enter a batch scope
	pub fn begin_batch(&self) {
		self.batch_depth.set(self.batch_depth.get() + 1);
	}

	/// Leave a batch scope, flushing when the outermost scope exits
	pub fn end_batch(&self) {
		let depth = self.batch_depth.get();
		debug_assert!(depth > 0, "end_batch without begin_batch");
		self.batch_depth.set(depth - 1);
		if depth == 1 {
			self.flush();
		}
	}

	/// Enter an untracked scope
	pub fn begin_untrack(&self) {
		self.untrack_depth.set(self.untrack_depth.get() + 1);
	}

	/// Leave an untracked scope
	pub fn end_untrack(&self) {
		let depth = self.untrack_depth.get();
		debug_assert!(depth > 0, "end_untrack without begin_untrack");
		self.untrack_depth.set(depth - 1);
	}

	/// Run every pending listener exactly once
	///
	/// Listeners scheduled while flushing are picked up by the same flush
	/// loop; a listener already executed in this flush can be re-queued by
	/// a later write, which matches the "once per flush of its pending
	/// entry" contract.
	pub fn flush(&self) {
		if self.flushing.get() {
			return;
		}
		self.flushing.set(true);
		loop {
			let batch = core::mem::take(&mut *self.pending.borrow_mut());
			if batch.is_empty() {
				break;
			}
			for listener_id in batch {
				crate::effect::execute_listener(listener_id);
			}
		}
		self.flushing.set(false);
	}

	/// Remove a listener from every signal it subscribed to
	///
	/// Called before a listener re-runs (so it re-tracks from scratch) and
	/// when it is dropped.
	pub fn clear_dependencies(&self, node_id: NodeId) {
		let mut graph = self.dependency_graph.borrow_mut();

		if let Some(node) = graph.get(&node_id) {
			let dependencies = node.dependencies.clone();
			for &dep_id in &dependencies {
				if let Some(dep_node) = graph.get_mut(&dep_id) {
					dep_node.subscribers.retain(|&id| id != node_id);
				}
			}
		}

		if let Some(node) = graph.get_mut(&node_id) {
			node.dependencies.clear();
		}
	}

	/// Remove a node from the dependency graph entirely
	pub fn remove_node(&self, node_id: NodeId) {
		self.clear_dependencies(node_id);
		self.dependency_graph.borrow_mut().remove(&node_id);
		self.pending.borrow_mut().retain(|&id| id != node_id);
	}

	/// Number of subscribers currently attached to a node (for tests)
	pub fn subscriber_count(&self, node_id: NodeId) -> usize {
		self.dependency_graph
			.borrow()
			.get(&node_id)
			.map(|node| node.subscribers.len())
			.unwrap_or(0)
	}
}

impl Default for Runtime {
	fn default() -> Self {
		Self::new()
	}
}

thread_local! {
	static RUNTIME: Runtime = Runtime::new();
}

/// Run a closure with access to the thread-local runtime
pub fn with_runtime<F, R>(f: F) -> R
where
	F: FnOnce(&Runtime) -> R,
{
	RUNTIME.with(f)
}

/// Safe runtime access for Drop implementations
///
/// Returns None if the thread-local storage has already been destroyed.
pub(crate) fn try_with_runtime<F, R>(f: F) -> Option<R>
where
	F: FnOnce(&Runtime) -> R,
{
	RUNTIME.try_with(f).ok()
}

/// Coalesce signal notifications raised inside `f` into a single flush
///
/// Nested calls are supported; only the outermost batch flushes. Each
/// listener is notified at most once per flush even if several of its
/// dependencies changed.
///
/// # Example
///
/// ```ignore
/// batch(|| {
///     first.set(1);
///     second.set(2);
/// }); // dependents run once, here
/// ```
pub fn batch<F, R>(f: F) -> R
where
	F: FnOnce() -> R,
{
	with_runtime(|rt| rt.begin_batch());
	let result = f();
	with_runtime(|rt| rt.end_batch());
	result
}

/// Read signals inside `f` without registering dependencies
///
/// Writers use this so that their own bookkeeping reads (array lengths,
/// current presence flags) never subscribe the writer to the cells it is
/// about to mutate.
pub fn untrack<F, R>(f: F) -> R
where
	F: FnOnce() -> R,
{
	with_runtime(|rt| rt.begin_untrack());
	let result = f();
	with_runtime(|rt| rt.end_untrack());
	result
}
