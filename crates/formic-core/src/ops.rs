//! Mutation operation surface
//!
//! These are the entry points UI bindings and form authors call. Every
//! mutation does its store writes inside one `batch` + `untrack` scope,
//! then feeds the interaction event to the validation trigger table, so
//! an operation produces exactly one notification wave followed by at
//! most one validation pass.

use crate::access::{
	get_field_input, get_field_store, set_field_input, walk_field_store,
};
use crate::error::{StoreError, StoreResult};
use crate::init::ensure_child_at;
use crate::items::{copy_item_state, reset_item_state, swap_item_state};
use crate::store::{FieldState, FieldStore, FormStore, Path, Presence, ValidationEvent};
use crate::validate::{validate_form_input, validate_if_required, ValidateOptions};
use formic_reactive::{batch, next_item_id, untrack};
use serde_json::Value;
use std::rc::Rc;
use tracing::debug;

/// Options for [`insert`]
pub struct InsertOptions {
	/// Path of the array field
	pub path: Path,
	/// Insertion index; appends when absent
	pub at: Option<usize>,
	/// Input the new item starts with
	pub initial_input: Option<Value>,
}

/// Options for [`remove`]
pub struct RemoveOptions {
	pub path: Path,
	pub at: usize,
}

/// Options for [`move_item`]
pub struct MoveOptions {
	pub path: Path,
	pub from: usize,
	pub to: usize,
}

/// Options for [`replace`]
pub struct ReplaceOptions {
	pub path: Path,
	pub at: usize,
	pub initial_input: Option<Value>,
}

/// Options for [`swap`]
pub struct SwapOptions {
	pub path: Path,
	pub at: usize,
	pub and: usize,
}

/// Options for [`set_input`]
pub struct SetInputOptions {
	/// Target field; the root when left at default
	pub path: Path,
	pub input: Option<Value>,
}

/// Options for [`set_errors`]
pub struct SetErrorsOptions {
	/// Target field; the root when left at default
	pub path: Path,
	/// New errors; `None` or an empty list clears them
	pub errors: Option<Vec<String>>,
}

/// Options for [`reset`]
#[derive(Default)]
pub struct ResetOptions {
	/// Subtree to reset; the whole form when absent
	pub path: Option<Path>,
	/// Rebase the initial baseline to this input before restoring
	pub initial_input: Option<Value>,
	/// Keep the current input instead of restoring the initial one
	pub keep_input: bool,
	/// Keep the touched flags
	pub keep_touched: bool,
	/// Keep the current errors
	pub keep_errors: bool,
	/// Keep the form's submitted flag
	pub keep_submitted: bool,
}

/// Insert an item, shifting the state of every later slot one to the
/// right; the new slot gets a fresh identity
pub async fn insert(form: &FormStore, options: InsertOptions) -> StoreResult<()> {
	let array = get_field_store(form, &options.path)?;
	batch(|| {
		untrack(|| -> StoreResult<()> {
			let state = array.as_array()?;
			let mut items = state.items.get_untracked();
			let len = items.len();
			let at = options.at.unwrap_or(len);
			if at > len {
				return Err(StoreError::IndexOutOfBounds {
					index: at,
					len,
					name: array.name.clone(),
				});
			}
			debug!(name = %array.name, at, "inserting array item");
			ensure_child_at(&array, len, None)?;
			let children = state.children.borrow().clone();
			for index in (at..len).rev() {
				copy_item_state(&children[index], &children[index + 1])?;
			}
			reset_item_state(&children[at], options.initial_input.as_ref())?;
			items.insert(at, next_item_id());
			state.items.set(items);
			array.is_touched.set(true);
			refresh_array_dirty(&array)?;
			Ok(())
		})
	})?;
	validate_if_required(form, &array, ValidationEvent::Touch).await;
	Ok(())
}

/// Remove an item, shifting the state of every later slot one to the
/// left and dropping the last identity; physical slots stay reusable
pub async fn remove(form: &FormStore, options: RemoveOptions) -> StoreResult<()> {
	let array = get_field_store(form, &options.path)?;
	batch(|| {
		untrack(|| -> StoreResult<()> {
			let state = array.as_array()?;
			let mut items = state.items.get_untracked();
			let len = items.len();
			if options.at >= len {
				return Err(StoreError::IndexOutOfBounds {
					index: options.at,
					len,
					name: array.name.clone(),
				});
			}
			debug!(name = %array.name, at = options.at, "removing array item");
			let children = state.children.borrow().clone();
			for index in options.at + 1..len {
				copy_item_state(&children[index], &children[index - 1])?;
			}
			items.pop();
			state.items.set(items);
			array.is_touched.set(true);
			refresh_array_dirty(&array)?;
			Ok(())
		})
	})?;
	validate_if_required(form, &array, ValidationEvent::Touch).await;
	Ok(())
}

/// Move an item to another index as a rotation of sequential swaps;
/// identities travel with their state
pub async fn move_item(form: &FormStore, options: MoveOptions) -> StoreResult<()> {
	let array = get_field_store(form, &options.path)?;
	if options.from == options.to {
		return Ok(());
	}
	batch(|| {
		untrack(|| -> StoreResult<()> {
			let state = array.as_array()?;
			let mut items = state.items.get_untracked();
			let len = items.len();
			for index in [options.from, options.to] {
				if index >= len {
					return Err(StoreError::IndexOutOfBounds {
						index,
						len,
						name: array.name.clone(),
					});
				}
			}
			let children = state.children.borrow().clone();
			if options.from < options.to {
				for index in options.from..options.to {
					swap_item_state(&children[index], &children[index + 1])?;
					items.swap(index, index + 1);
				}
			} else {
				for index in (options.to + 1..=options.from).rev() {
					swap_item_state(&children[index], &children[index - 1])?;
					items.swap(index, index - 1);
				}
			}
			state.items.set(items);
			array.is_touched.set(true);
			refresh_array_dirty(&array)?;
			Ok(())
		})
	})?;
	validate_if_required(form, &array, ValidationEvent::Touch).await;
	Ok(())
}

/// Replace an item's state in place; the slot keeps its identity
pub async fn replace(form: &FormStore, options: ReplaceOptions) -> StoreResult<()> {
	let array = get_field_store(form, &options.path)?;
	batch(|| {
		untrack(|| -> StoreResult<()> {
			let state = array.as_array()?;
			let len = state.items.get_untracked().len();
			if options.at >= len {
				return Err(StoreError::IndexOutOfBounds {
					index: options.at,
					len,
					name: array.name.clone(),
				});
			}
			let child = ensure_child_at(&array, options.at, None)?;
			reset_item_state(&child, options.initial_input.as_ref())?;
			array.is_touched.set(true);
			refresh_array_dirty(&array)?;
			Ok(())
		})
	})?;
	validate_if_required(form, &array, ValidationEvent::Touch).await;
	Ok(())
}

/// Exchange two items' state; their identities swap along with it
pub async fn swap(form: &FormStore, options: SwapOptions) -> StoreResult<()> {
	let array = get_field_store(form, &options.path)?;
	if options.at == options.and {
		return Ok(());
	}
	batch(|| {
		untrack(|| -> StoreResult<()> {
			let state = array.as_array()?;
			let mut items = state.items.get_untracked();
			let len = items.len();
			for index in [options.at, options.and] {
				if index >= len {
					return Err(StoreError::IndexOutOfBounds {
						index,
						len,
						name: array.name.clone(),
					});
				}
			}
			let children = state.children.borrow().clone();
			swap_item_state(&children[options.at], &children[options.and])?;
			items.swap(options.at, options.and);
			state.items.set(items);
			array.is_touched.set(true);
			refresh_array_dirty(&array)?;
			Ok(())
		})
	})?;
	validate_if_required(form, &array, ValidationEvent::Touch).await;
	Ok(())
}

/// Recompute an array's dirty flag from its baselines; item order
/// counts, so a swap followed by its inverse goes clean again
fn refresh_array_dirty(store: &Rc<FieldStore>) -> StoreResult<()> {
	let state = store.as_array()?;
	let dirty = state.start_input.get_untracked() != state.input.get_untracked()
		|| state.start_items.get_untracked() != state.items.get_untracked();
	store.is_dirty.set(dirty);
	Ok(())
}

/// Write an input at a path and run the trigger table with an input
/// event
pub async fn set_input(form: &FormStore, options: SetInputOptions) -> StoreResult<()> {
	let target = set_field_input(form, &options.path, options.input)?;
	validate_if_required(form, &target, ValidationEvent::Input).await;
	Ok(())
}

/// Overwrite a field's errors; empty lists normalize to `None`
pub fn set_errors(form: &FormStore, options: SetErrorsOptions) -> StoreResult<()> {
	let store = get_field_store(form, &options.path)?;
	let errors = options.errors.filter(|errors| !errors.is_empty());
	store.errors.set(errors);
	Ok(())
}

/// Run one validation pass; returns the parsed output on success
pub async fn validate(form: &FormStore, options: ValidateOptions) -> Option<Value> {
	validate_form_input(form, options).await
}

/// Focus the first element bound to the field at `path`
pub fn focus(form: &FormStore, path: &Path) -> StoreResult<()> {
	let store = get_field_store(form, path)?;
	if let Some(element) = store.elements.borrow().first() {
		element.focus();
	}
	Ok(())
}

/// Read the logical input at `path`, or the whole form's when absent
pub fn get_input(form: &FormStore, path: Option<&Path>) -> StoreResult<Option<Value>> {
	let store = match path {
		Some(path) => get_field_store(form, path)?,
		None => form.root.clone(),
	};
	Ok(get_field_input(&store))
}

/// Read a single field's errors, or the form-level ones when absent
pub fn get_errors(form: &FormStore, path: Option<&Path>) -> StoreResult<Option<Vec<String>>> {
	let store = match path {
		Some(path) => get_field_store(form, path)?,
		None => form.root.clone(),
	};
	Ok(store.errors.get())
}

/// Collect every error in the tree, pre-order
pub fn get_all_errors(form: &FormStore) -> Vec<String> {
	let mut all = Vec::new();
	walk_field_store(&form.root, &mut |store| {
		if let Some(errors) = store.errors.get() {
			all.extend(errors);
		}
	});
	all
}

/// Restore a subtree (or the whole form) to its initial baseline
///
/// With `initial_input` set, the baseline itself is rebased first. The
/// `keep_*` switches pin individual facets to their current state; the
/// dirty flag always clears because the start baseline follows whatever
/// input survives the reset.
pub fn reset(form: &FormStore, options: ResetOptions) -> StoreResult<()> {
	let target = match &options.path {
		Some(path) => get_field_store(form, path)?,
		None => form.root.clone(),
	};
	batch(|| {
		untrack(|| -> StoreResult<()> {
			if let Some(initial) = &options.initial_input {
				rebase_initial(&target, Some(initial))?;
			}
			restore(&target, &options)?;
			if options.path.is_none() {
				if !options.keep_submitted {
					form.is_submitted.set(false);
				}
				form.is_submitting.set(false);
			}
			Ok(())
		})
	})
}

/// Rewrite the initial baselines of a subtree from a new input
fn rebase_initial(store: &Rc<FieldStore>, input: Option<&Value>) -> StoreResult<()> {
	match &store.state {
		FieldState::Value(state) => state.initial_input.set(input.cloned()),
		FieldState::Object(state) => {
			state.initial_input.set(Presence::of(input));
			for (key, child) in &state.children {
				rebase_initial(child, input.and_then(|value| value.get(key)))?;
			}
		}
		FieldState::Array(_) => {
			let state = store.as_array()?;
			state.initial_input.set(Presence::of(input));
			let values = match input {
				Some(Value::Array(values)) => values.as_slice(),
				_ => &[],
			};
			let items: Vec<_> = values.iter().map(|_| next_item_id()).collect();
			state.initial_items.set(items);
			for (index, value) in values.iter().enumerate() {
				let child = ensure_child_at(store, index, Some(value))?;
				rebase_initial(&child, Some(value))?;
			}
		}
	}
	Ok(())
}

/// Apply the reset to every node of the subtree
fn restore(store: &Rc<FieldStore>, options: &ResetOptions) -> StoreResult<()> {
	match &store.state {
		FieldState::Value(state) => {
			let input = if options.keep_input {
				state.input.get_untracked()
			} else {
				state.initial_input.get_untracked()
			};
			state.input.set(input.clone());
			state.start_input.set(input);
		}
		FieldState::Object(state) => {
			let presence = if options.keep_input {
				state.input.get_untracked()
			} else {
				state.initial_input.get_untracked()
			};
			state.input.set(presence);
			state.start_input.set(presence);
			for (_, child) in &state.children {
				restore(child, options)?;
			}
		}
		FieldState::Array(_) => {
			let state = store.as_array()?;
			let presence = if options.keep_input {
				state.input.get_untracked()
			} else {
				state.initial_input.get_untracked()
			};
			state.input.set(presence);
			state.start_input.set(presence);
			let items = if options.keep_input {
				state.items.get_untracked()
			} else {
				state.initial_items.get_untracked()
			};
			state.items.set(items.clone());
			state.start_items.set(items);
			let children = state.children.borrow().clone();
			for child in &children {
				restore(child, options)?;
			}
		}
	}
	if !options.keep_touched {
		store.is_touched.set(false);
	}
	if !options.keep_errors {
		store.errors.set(None);
	}
	store.is_dirty.set(false);
	*store.elements.borrow_mut() = store.initial_elements.borrow().clone();
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::access::get_field_bool;
	use crate::store::BoolField;
	use crate::testing::tags_form;
	use futures::executor::block_on;
	use serde_json::json;

	fn tag_values(form: &FormStore) -> Vec<Value> {
		match get_input(form, Some(&Path::of(["tags"]))).unwrap() {
			Some(Value::Array(values)) => values,
			other => panic!("tags must be an array, got {other:?}"),
		}
	}

	fn tag_ids(form: &FormStore) -> Vec<formic_reactive::ItemId> {
		let store = get_field_store(form, &Path::of(["tags"])).unwrap();
		store.as_array().unwrap().items.get()
	}

	#[test]
	fn test_insert_at_index_shifts_state_right() {
		let form = tags_form(json!(["a", "b"]));
		block_on(insert(
			&form,
			InsertOptions {
				path: Path::of(["tags"]),
				at: Some(0),
				initial_input: Some(json!("x")),
			},
		))
		.unwrap();

		assert_eq!(tag_values(&form), [json!("x"), json!("a"), json!("b")]);
		let store = get_field_store(&form, &Path::of(["tags"])).unwrap();
		assert!(store.is_touched.get());
		assert!(store.is_dirty.get());
	}

	#[test]
	fn test_insert_appends_by_default() {
		let form = tags_form(json!(["a"]));
		let before = tag_ids(&form);
		block_on(insert(
			&form,
			InsertOptions {
				path: Path::of(["tags"]),
				at: None,
				initial_input: Some(json!("z")),
			},
		))
		.unwrap();

		assert_eq!(tag_values(&form), [json!("a"), json!("z")]);
		let after = tag_ids(&form);
		assert_eq!(after[0], before[0]);
		assert!(!before.contains(&after[1]));
	}

	#[test]
	fn test_remove_shifts_left_and_drops_last_id() {
		let form = tags_form(json!(["a", "b", "c"]));
		let before = tag_ids(&form);
		block_on(remove(
			&form,
			RemoveOptions {
				path: Path::of(["tags"]),
				at: 0,
			},
		))
		.unwrap();

		assert_eq!(tag_values(&form), [json!("b"), json!("c")]);
		assert_eq!(tag_ids(&form), &before[..2]);
	}

	#[test]
	fn test_swap_moves_ids_with_state() {
		let form = tags_form(json!(["a", "b", "c"]));
		let before = tag_ids(&form);
		block_on(swap(
			&form,
			SwapOptions {
				path: Path::of(["tags"]),
				at: 0,
				and: 2,
			},
		))
		.unwrap();

		assert_eq!(tag_values(&form), [json!("c"), json!("b"), json!("a")]);
		assert_eq!(tag_ids(&form), [before[2], before[1], before[0]]);

		// swapping back restores order and clears the dirty flag
		block_on(swap(
			&form,
			SwapOptions {
				path: Path::of(["tags"]),
				at: 0,
				and: 2,
			},
		))
		.unwrap();
		assert_eq!(tag_ids(&form), before);
		let store = get_field_store(&form, &Path::of(["tags"])).unwrap();
		assert!(!store.is_dirty.get());
	}

	#[test]
	fn test_move_rotates_state_and_ids() {
		let form = tags_form(json!(["a", "b", "c", "d"]));
		let before = tag_ids(&form);
		block_on(move_item(
			&form,
			MoveOptions {
				path: Path::of(["tags"]),
				from: 3,
				to: 1,
			},
		))
		.unwrap();

		assert_eq!(
			tag_values(&form),
			[json!("a"), json!("d"), json!("b"), json!("c")]
		);
		assert_eq!(
			tag_ids(&form),
			[before[0], before[3], before[1], before[2]]
		);
	}

	#[test]
	fn test_replace_keeps_the_slot_identity() {
		let form = tags_form(json!(["a", "b"]));
		let before = tag_ids(&form);
		block_on(replace(
			&form,
			ReplaceOptions {
				path: Path::of(["tags"]),
				at: 1,
				initial_input: Some(json!("B")),
			},
		))
		.unwrap();

		assert_eq!(tag_values(&form), [json!("a"), json!("B")]);
		assert_eq!(tag_ids(&form), before);
	}

	#[test]
	fn test_out_of_bounds_mutations_fail() {
		let form = tags_form(json!(["a"]));
		assert!(matches!(
			block_on(remove(
				&form,
				RemoveOptions {
					path: Path::of(["tags"]),
					at: 1,
				},
			)),
			Err(StoreError::IndexOutOfBounds { .. })
		));
		assert!(matches!(
			block_on(insert(
				&form,
				InsertOptions {
					path: Path::of(["tags"]),
					at: Some(5),
					initial_input: None,
				},
			)),
			Err(StoreError::IndexOutOfBounds { .. })
		));
	}

	#[test]
	fn test_set_errors_normalizes_empty_lists() {
		let form = tags_form(json!([]));
		set_errors(
			&form,
			SetErrorsOptions {
				path: Path::root(),
				errors: Some(vec![]),
			},
		)
		.unwrap();
		assert_eq!(get_errors(&form, None).unwrap(), None);

		set_errors(
			&form,
			SetErrorsOptions {
				path: Path::root(),
				errors: Some(vec!["Broken".to_string()]),
			},
		)
		.unwrap();
		assert_eq!(
			get_all_errors(&form),
			vec!["Broken".to_string()]
		);
	}

	#[test]
	fn test_reset_restores_initial_input() {
		let form = tags_form(json!(["a"]));
		block_on(set_input(
			&form,
			SetInputOptions {
				path: Path::of(["tags"]).child_index(0),
				input: Some(json!("edited")),
			},
		))
		.unwrap();
		assert!(get_field_bool(form.root(), BoolField::Dirty));

		reset(&form, ResetOptions::default()).unwrap();

		assert_eq!(tag_values(&form), [json!("a")]);
		assert!(!get_field_bool(form.root(), BoolField::Dirty));
		assert!(!get_field_bool(form.root(), BoolField::Touched));
	}

	#[test]
	fn test_reset_keep_input_clears_flags_only() {
		let form = tags_form(json!(["a"]));
		block_on(set_input(
			&form,
			SetInputOptions {
				path: Path::of(["tags"]).child_index(0),
				input: Some(json!("Jane")),
			},
		))
		.unwrap();
		set_errors(
			&form,
			SetErrorsOptions {
				path: Path::of(["tags"]).child_index(0),
				errors: Some(vec!["E".to_string()]),
			},
		)
		.unwrap();

		reset(
			&form,
			ResetOptions {
				keep_input: true,
				..Default::default()
			},
		)
		.unwrap();

		assert_eq!(tag_values(&form), [json!("Jane")]);
		let leaf = get_field_store(&form, &Path::of(["tags"]).child_index(0)).unwrap();
		assert!(!leaf.is_touched.get());
		assert!(!leaf.is_dirty.get());
		assert_eq!(leaf.errors.get(), None);
	}

	#[test]
	fn test_reset_rebases_initial_input() {
		let form = tags_form(json!(["a"]));
		reset(
			&form,
			ResetOptions {
				initial_input: Some(json!({ "tags": ["x", "y"] })),
				..Default::default()
			},
		)
		.unwrap();

		assert_eq!(tag_values(&form), [json!("x"), json!("y")]);
		assert!(!get_field_bool(form.root(), BoolField::Dirty));
	}
}
