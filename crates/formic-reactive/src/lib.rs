//! # formic-reactive
//!
//! The minimal reactive primitive the formic form engine is built on:
//! `Signal<T>` cells with automatic subscriber tracking, `Effect`
//! listeners, `batch` notification coalescing, `untrack` reads, and
//! stable `ItemId` generation for array slots.
//!
//! The runtime is thread-local and single-threaded by design: form state
//! lives on the UI thread, and every mutation entry point in the core
//! wraps its work in `batch` + `untrack` so a composed operation produces
//! exactly one flush and never self-subscribes.

pub mod effect;
pub mod id;
pub mod runtime;
pub mod signal;

pub use effect::Effect;
pub use id::{ItemId, next_item_id};
pub use runtime::{NodeId, batch, untrack, with_runtime};
pub use signal::Signal;
