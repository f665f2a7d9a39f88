//! Array item state plumbing
//!
//! The mutation surface never moves store objects around: a store keeps
//! its tree position for the life of the form, and `insert`, `remove`,
//! `move`, `replace` and `swap` are all expressed by copying, resetting
//! or exchanging the *state* held inside slots. These three primitives
//! are that mechanism. Callers hold the batch/untrack scopes.

use crate::error::StoreResult;
use crate::init::ensure_child_at;
use crate::store::{FieldState, FieldStore, Presence};
use formic_reactive::next_item_id;
use serde_json::Value;
use std::rc::Rc;

/// Transplant one slot's state into another
///
/// Copies `input`, `start_input`, `errors`, `is_touched`, `is_dirty`
/// and the bound elements; initial signals are left alone. Missing
/// target slots are initialized first so the copy is total.
pub fn copy_item_state(source: &Rc<FieldStore>, target: &Rc<FieldStore>) -> StoreResult<()> {
	target.errors.set(source.errors.get_untracked());
	target.is_touched.set(source.is_touched.get_untracked());
	target.is_dirty.set(source.is_dirty.get_untracked());
	*target.elements.borrow_mut() = source.elements.borrow().clone();
	match (&source.state, &target.state) {
		(FieldState::Value(source), FieldState::Value(target)) => {
			target.input.set(source.input.get_untracked());
			target.start_input.set(source.start_input.get_untracked());
		}
		(FieldState::Object(source_state), FieldState::Object(target_state)) => {
			target_state.input.set(source_state.input.get_untracked());
			target_state
				.start_input
				.set(source_state.start_input.get_untracked());
			for (key, source_child) in &source_state.children {
				let target_child = target_state
					.children
					.iter()
					.find(|(name, _)| name == key)
					.map(|(_, child)| child.clone());
				if let Some(target_child) = target_child {
					copy_item_state(source_child, &target_child)?;
				}
			}
		}
		(FieldState::Array(source_state), FieldState::Array(target_state)) => {
			target_state.input.set(source_state.input.get_untracked());
			target_state
				.start_input
				.set(source_state.start_input.get_untracked());
			target_state.items.set(source_state.items.get_untracked());
			target_state
				.start_items
				.set(source_state.start_items.get_untracked());
			let len = source_state.items.get_untracked().len();
			for index in 0..len {
				let Some(source_child) = source_state.child(index) else {
					continue;
				};
				let target_child = ensure_child_at(target, index, None)?;
				copy_item_state(&source_child, &target_child)?;
			}
		}
		// same item schema on both sides, a kind mismatch cannot happen
		_ => {}
	}
	Ok(())
}

/// Re-derive a slot's state as if freshly built from `input`, keeping
/// the store's identity (and its id in the parent's item list)
///
/// `input` becomes both the current value and the dirty baseline;
/// errors, flags and bound elements are cleared. Array sub-items get
/// fresh ids — resetting a slot discards the old identities of
/// everything below it. Initial signals are not touched.
pub fn reset_item_state(store: &Rc<FieldStore>, input: Option<&Value>) -> StoreResult<()> {
	store.errors.set(None);
	store.is_touched.set(false);
	store.is_dirty.set(false);
	store.elements.borrow_mut().clear();
	match &store.state {
		FieldState::Value(state) => {
			state.input.set(input.cloned());
			state.start_input.set(input.cloned());
		}
		FieldState::Object(state) => {
			let presence = Presence::of(input);
			state.input.set(presence);
			state.start_input.set(presence);
			for (key, child) in &state.children {
				let child_input = input.and_then(|value| value.get(key));
				reset_item_state(child, child_input)?;
			}
		}
		FieldState::Array(_) => {
			let state = store.as_array()?;
			let presence = Presence::of(input);
			state.input.set(presence);
			state.start_input.set(presence);
			let values = match input {
				Some(Value::Array(values)) => values.as_slice(),
				_ => &[],
			};
			let items: Vec<_> = values.iter().map(|_| next_item_id()).collect();
			state.items.set(items.clone());
			state.start_items.set(items);
			for (index, value) in values.iter().enumerate() {
				let child = ensure_child_at(store, index, Some(value))?;
				reset_item_state(&child, Some(value))?;
			}
		}
	}
	Ok(())
}

/// Symmetric exchange of two slots' state
///
/// Recurses structurally; when one side has fewer initialized children
/// the shorter side grows first so the exchange is total.
pub fn swap_item_state(a: &Rc<FieldStore>, b: &Rc<FieldStore>) -> StoreResult<()> {
	if Rc::ptr_eq(a, b) {
		return Ok(());
	}
	swap_signal(&a.errors, &b.errors);
	swap_signal(&a.is_touched, &b.is_touched);
	swap_signal(&a.is_dirty, &b.is_dirty);
	std::mem::swap(&mut *a.elements.borrow_mut(), &mut *b.elements.borrow_mut());
	match (&a.state, &b.state) {
		(FieldState::Value(a_state), FieldState::Value(b_state)) => {
			swap_signal(&a_state.input, &b_state.input);
			swap_signal(&a_state.start_input, &b_state.start_input);
		}
		(FieldState::Object(a_state), FieldState::Object(b_state)) => {
			swap_signal(&a_state.input, &b_state.input);
			swap_signal(&a_state.start_input, &b_state.start_input);
			for (key, a_child) in &a_state.children {
				let b_child = b_state
					.children
					.iter()
					.find(|(name, _)| name == key)
					.map(|(_, child)| child.clone());
				if let Some(b_child) = b_child {
					swap_item_state(a_child, &b_child)?;
				}
			}
		}
		(FieldState::Array(a_state), FieldState::Array(b_state)) => {
			let a_len = a_state.items.get_untracked().len();
			let b_len = b_state.items.get_untracked().len();
			swap_signal(&a_state.input, &b_state.input);
			swap_signal(&a_state.start_input, &b_state.start_input);
			swap_signal(&a_state.items, &b_state.items);
			swap_signal(&a_state.start_items, &b_state.start_items);
			for index in 0..a_len.max(b_len) {
				let a_child = ensure_child_at(a, index, None)?;
				let b_child = ensure_child_at(b, index, None)?;
				swap_item_state(&a_child, &b_child)?;
			}
		}
		_ => {}
	}
	Ok(())
}

fn swap_signal<T: Clone + PartialEq + 'static>(
	a: &formic_reactive::Signal<T>,
	b: &formic_reactive::Signal<T>,
) {
	let a_value = a.get_untracked();
	let b_value = b.get_untracked();
	a.set(b_value);
	b.set(a_value);
}
