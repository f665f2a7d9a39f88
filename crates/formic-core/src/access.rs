//! Access primitives
//!
//! Reads (`get_field_input`, `get_field_bool`) are tracking: calling
//! them inside an effect subscribes the effect to every signal they
//! touch, so derived values recompute automatically. Writes wrap
//! themselves in `batch` + `untrack` so one logical mutation produces
//! one notification wave and the writer never subscribes itself.

use crate::error::{StoreError, StoreResult};
use crate::init::ensure_child_at;
use crate::store::{
	BoolField, FieldState, FieldStore, FormStore, Path, PathSegment, Presence, SchemaBehavior,
	TrackedFlag,
};
use formic_reactive::{batch, next_item_id, untrack};
use serde_json::Value;
use std::rc::Rc;

/// Resolve the store at `path`, failing loudly on a bad path
///
/// Array segments are checked against the logical item list, so an
/// excluded (physically present but logically removed) slot is out of
/// bounds here.
pub fn get_field_store(form: &FormStore, path: &Path) -> StoreResult<Rc<FieldStore>> {
	let mut current = form.root.clone();
	for segment in path.segments() {
		current = child_at(&current, segment)?;
	}
	Ok(current)
}

/// Step from a store to one of its children
pub(crate) fn child_at(store: &Rc<FieldStore>, segment: &PathSegment) -> StoreResult<Rc<FieldStore>> {
	match (&store.state, segment) {
		(FieldState::Object(state), PathSegment::Key(key)) => state
			.children
			.iter()
			.find(|(name, _)| name == key)
			.map(|(_, child)| child.clone())
			.ok_or_else(|| StoreError::ChildNotFound {
				key: key.clone(),
				name: store.name.clone(),
			}),
		(FieldState::Array(state), PathSegment::Index(index)) => {
			let len = state.items.get_untracked().len();
			if *index >= len {
				return Err(StoreError::IndexOutOfBounds {
					index: *index,
					len,
					name: store.name.clone(),
				});
			}
			state
				.children
				.borrow()
				.get(*index)
				.cloned()
				.ok_or_else(|| StoreError::IndexOutOfBounds {
					index: *index,
					len,
					name: store.name.clone(),
				})
		}
		(_, PathSegment::Key(key)) => Err(StoreError::ChildNotFound {
			key: key.clone(),
			name: store.name.clone(),
		}),
		(_, PathSegment::Index(_)) => Err(StoreError::NotAnArray {
			name: store.name.clone(),
		}),
	}
}

/// Reassemble the logical input of a subtree (tracking read)
///
/// Containers short-circuit on their own presence: a `Null` container
/// yields `null` and an `Absent` one yields `None` without consulting
/// children. Present objects omit keys whose child input is absent;
/// present arrays keep their length and fill absent slots with `null`.
pub fn get_field_input(store: &FieldStore) -> Option<Value> {
	match &store.state {
		FieldState::Value(state) => state.input.get(),
		FieldState::Object(state) => match state.input.get() {
			Presence::Present => {
				let mut map = serde_json::Map::new();
				for (key, child) in &state.children {
					if let Some(value) = get_field_input(child) {
						map.insert(key.clone(), value);
					}
				}
				Some(Value::Object(map))
			}
			Presence::Null => Some(Value::Null),
			Presence::Absent => None,
		},
		FieldState::Array(state) => match state.input.get() {
			Presence::Present => {
				let len = state.items.get().len();
				let children = state.children.borrow();
				let values = children
					.iter()
					.take(len)
					.map(|child| get_field_input(child).unwrap_or(Value::Null))
					.collect();
				Some(Value::Array(values))
			}
			Presence::Null => Some(Value::Null),
			Presence::Absent => None,
		},
	}
}

/// OR-reduce a boolean facet over a subtree (tracking read)
pub fn get_field_bool(store: &FieldStore, field: BoolField) -> bool {
	let own = match field {
		BoolField::Errors => store.errors.get().is_some(),
		BoolField::Touched => store.is_touched.get(),
		BoolField::Dirty => store.is_dirty.get(),
	};
	if own {
		return true;
	}
	match &store.state {
		FieldState::Value(_) => false,
		FieldState::Object(state) => state
			.children
			.iter()
			.any(|(_, child)| get_field_bool(child, field)),
		FieldState::Array(state) => {
			let len = state.items.get().len();
			state
				.children
				.borrow()
				.iter()
				.take(len)
				.any(|child| get_field_bool(child, field))
		}
	}
}

/// Set a boolean facet over a subtree
///
/// Objects never carry the flag themselves, only their children do;
/// arrays carry it on the node and on every current item.
pub fn set_field_bool(store: &FieldStore, flag: TrackedFlag, value: bool) {
	batch(|| set_field_bool_inner(store, flag, value));
}

fn set_field_bool_inner(store: &FieldStore, flag: TrackedFlag, value: bool) {
	let set_own = |store: &FieldStore| match flag {
		TrackedFlag::Touched => store.is_touched.set(value),
		TrackedFlag::Dirty => store.is_dirty.set(value),
	};
	match &store.state {
		FieldState::Value(_) => set_own(store),
		FieldState::Object(state) => {
			for (_, child) in &state.children {
				set_field_bool_inner(child, flag, value);
			}
		}
		FieldState::Array(state) => {
			set_own(store);
			let len = state.items.get_untracked().len();
			let children = state.children.borrow().clone();
			for child in children.iter().take(len) {
				set_field_bool_inner(child, flag, value);
			}
		}
	}
}

/// Write an input at a path, forcing every intermediate container
/// present and marking the target touched
///
/// Returns the target store so callers can feed it to the validation
/// trigger. The whole write runs inside one batch.
pub fn set_field_input(
	form: &FormStore,
	path: &Path,
	input: Option<Value>,
) -> StoreResult<Rc<FieldStore>> {
	batch(|| {
		untrack(|| {
			let mut current = form.root.clone();
			let segments = path.segments();
			for (position, segment) in segments.iter().enumerate() {
				let child = child_at(&current, segment)?;
				if position + 1 < segments.len() {
					force_present(&child);
				}
				current = child;
			}
			set_nested_input(form, &current, input)?;
			current.is_touched.set(true);
			Ok(current)
		})
	})
}

fn force_present(store: &FieldStore) {
	match &store.state {
		FieldState::Value(_) => {}
		FieldState::Object(state) => state.input.set(Presence::Present),
		FieldState::Array(state) => state.input.set(Presence::Present),
	}
}

fn is_nullish(input: &Option<Value>) -> bool {
	matches!(input, None | Some(Value::Null))
}

/// Inputs a pristine control reports before anyone typed
fn is_blank(input: &Option<Value>) -> bool {
	matches!(input, Some(Value::String(text)) if text.is_empty())
}

pub(crate) fn values_equal(
	behavior: Option<&SchemaBehavior>,
	a: &Option<Value>,
	b: &Option<Value>,
) -> bool {
	if let (Some(equals), Some(a), Some(b)) =
		(behavior.and_then(|b| b.equals.as_ref()), a, b)
	{
		return equals(a, b);
	}
	a == b
}

/// Leaf dirty rule: differing from the baseline makes the field dirty,
/// except that a blank input over a nullish baseline stays clean (an
/// untouched text control reports `""` while its baseline is absent)
pub(crate) fn leaf_dirty(
	behavior: Option<&SchemaBehavior>,
	start: &Option<Value>,
	new: &Option<Value>,
) -> bool {
	if values_equal(behavior, start, new) {
		return false;
	}
	!is_nullish(start) || !is_blank(new)
}

/// Recursive input write; callers hold the batch/untrack scopes
pub(crate) fn set_nested_input(
	form: &FormStore,
	store: &Rc<FieldStore>,
	input: Option<Value>,
) -> StoreResult<()> {
	let behavior = form.behavior.as_ref();
	match &store.state {
		FieldState::Value(state) => {
			let input = match (behavior.and_then(|b| b.transform.as_ref()), input) {
				(Some(transform), Some(value)) => Some(transform(value)),
				(_, input) => input,
			};
			let start = state.start_input.get_untracked();
			store.is_dirty.set(leaf_dirty(behavior, &start, &input));
			state.input.set(input);
		}
		FieldState::Object(state) => {
			let presence = Presence::of(input.as_ref());
			for (key, child) in &state.children {
				let child_input = input.as_ref().and_then(|value| value.get(key)).cloned();
				set_nested_input(form, child, child_input)?;
			}
			store.is_dirty.set(state.start_input.get_untracked() != presence);
			state.input.set(presence);
		}
		FieldState::Array(_) => {
			let presence = Presence::of(input.as_ref());
			let values = match input {
				Some(Value::Array(values)) => values,
				_ => Vec::new(),
			};
			let state = store.as_array()?;
			let mut items = state.items.get_untracked();
			// shrinking excludes items; the physical slots stay reusable
			items.truncate(items.len().min(values.len()));
			let grown = values.len().saturating_sub(items.len());
			for (index, value) in values.into_iter().enumerate() {
				let child = ensure_child_at(store, index, Some(&value))?;
				set_nested_input(form, &child, Some(value))?;
			}
			for _ in 0..grown {
				items.push(next_item_id());
			}
			let dirty = state.start_input.get_untracked() != presence
				|| state.start_items.get_untracked().len() != items.len();
			state.items.set(items);
			store.is_dirty.set(dirty);
			state.input.set(presence);
		}
	}
	Ok(())
}

/// Visit a subtree pre-order: the store itself, then its children
///
/// Arrays are walked over their physical slots, so excluded items are
/// visited too; uniform state sweeps (error clearing, reset) rely on
/// that.
pub fn walk_field_store(store: &Rc<FieldStore>, visitor: &mut dyn FnMut(&Rc<FieldStore>)) {
	visitor(store);
	match &store.state {
		FieldState::Value(_) => {}
		FieldState::Object(state) => {
			for (_, child) in &state.children {
				walk_field_store(child, visitor);
			}
		}
		FieldState::Array(state) => {
			let children = state.children.borrow().clone();
			for child in &children {
				walk_field_store(child, visitor);
			}
		}
	}
}
