//! Stable identifiers for array items
//!
//! Every array slot in a field-store tree carries an `ItemId` that survives
//! reorders, so UI list reconciliation can key on it.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Stable identity of an array slot, independent of the value stored there
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(u64);

impl ItemId {
	/// Generate a fresh, process-unique id
	pub fn next() -> Self {
		static COUNTER: AtomicU64 = AtomicU64::new(0);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

impl fmt::Display for ItemId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "item-{}", self.0)
	}
}

/// Generate a fresh item id
pub fn next_item_id() -> ItemId {
	ItemId::next()
}
