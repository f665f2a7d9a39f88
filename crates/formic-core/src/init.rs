//! Store tree construction
//!
//! Construction runs in two phases. A mutable draft tree first
//! accumulates the shape contributed by every schema arm reachable at a
//! path — union, intersect and variant options all land on the same
//! draft node, and a kind disagreement between two arms is a hard
//! [`StoreError::KindConflict`]. The draft is then concretized into the
//! immutable-shape [`FieldStore`] tree with all signals seeded.
//!
//! Array children are initialized lazily: only slots covered by the
//! initial input exist up front, and [`ensure_child_at`] grows the
//! physical slot list on demand.

use crate::error::{StoreError, StoreResult};
use crate::store::{
	ArrayState, FieldState, FieldStore, FormConfig, FormStore, ObjectState, Path, Presence,
	ValueState,
};
use formic_reactive::{next_item_id, Signal};
use formic_schema::Schema;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, trace};

/// Draft node accumulating schema arms before concretization
struct StoreDraft {
	/// The outermost schema first seen at this path
	schema: Option<Rc<Schema>>,
	kind: DraftKind,
}

enum DraftKind {
	/// No arm reached this node yet
	Unset,
	Value {
		input: Option<Value>,
		/// Later arms must not overwrite an earlier arm's input
		seeded: bool,
	},
	Object {
		entries: Vec<(String, StoreDraft)>,
		present: Presence,
	},
	Array {
		children: Vec<StoreDraft>,
		item_schema: Option<Rc<Schema>>,
		tuple_items: Option<Vec<Rc<Schema>>>,
		present: Presence,
	},
}

impl DraftKind {
	fn kind_name(&self) -> &'static str {
		match self {
			DraftKind::Unset => "unset",
			DraftKind::Value { .. } => "value",
			DraftKind::Object { .. } => "object",
			DraftKind::Array { .. } => "array",
		}
	}
}

impl StoreDraft {
	fn unset() -> Self {
		Self {
			schema: None,
			kind: DraftKind::Unset,
		}
	}

	fn conflict(&self, requested: &'static str, path: &Path) -> StoreError {
		StoreError::KindConflict {
			name: path.encode(),
			existing: self.kind.kind_name(),
			requested,
		}
	}
}

/// Merge one schema arm into the draft at `path`
fn fill_draft(
	draft: &mut StoreDraft,
	schema: &Rc<Schema>,
	input: Option<&Value>,
	path: &Path,
) -> StoreResult<()> {
	if draft.schema.is_none() {
		draft.schema = Some(schema.clone());
	}
	match &**schema {
		Schema::Record | Schema::ObjectWithRest | Schema::TupleWithRest | Schema::Promise => {
			Err(StoreError::UnsupportedSchema {
				kind: schema.type_name(),
				name: path.encode(),
			})
		}
		Schema::Lazy { resolve } => fill_draft(draft, &resolve(), input, path),
		Schema::Optional { wrapped, default }
		| Schema::Nullable { wrapped, default }
		| Schema::Nullish { wrapped, default }
		| Schema::ExactOptional { wrapped, default }
		| Schema::Undefinedable { wrapped, default } => {
			let input = input.or(default.as_ref());
			fill_draft(draft, wrapped, input, path)
		}
		Schema::NonOptional { wrapped }
		| Schema::NonNullable { wrapped }
		| Schema::NonNullish { wrapped } => fill_draft(draft, wrapped, input, path),
		Schema::Union { options } | Schema::Intersect { options } | Schema::Variant { options } => {
			for option in options {
				fill_draft(draft, option, input, path)?;
			}
			Ok(())
		}
		Schema::Object { entries } => {
			if matches!(draft.kind, DraftKind::Unset) {
				draft.kind = DraftKind::Object {
					entries: Vec::new(),
					present: Presence::of(input),
				};
			}
			let DraftKind::Object { entries: drafts, .. } = &mut draft.kind else {
				return Err(draft.conflict("object", path));
			};
			for (key, child_schema) in entries {
				let position = drafts.iter().position(|(name, _)| name == key);
				let child = match position {
					Some(index) => &mut drafts[index].1,
					None => {
						drafts.push((key.clone(), StoreDraft::unset()));
						// just pushed, the list is non-empty
						let last = drafts.len() - 1;
						&mut drafts[last].1
					}
				};
				let child_input = input.and_then(|value| value.get(key));
				fill_draft(child, child_schema, child_input, &path.child_key(key))?;
			}
			Ok(())
		}
		Schema::Array { item } => {
			if matches!(draft.kind, DraftKind::Unset) {
				draft.kind = DraftKind::Array {
					children: Vec::new(),
					item_schema: None,
					tuple_items: None,
					present: Presence::of(input),
				};
			}
			let DraftKind::Array {
				children,
				item_schema,
				..
			} = &mut draft.kind
			else {
				return Err(draft.conflict("array", path));
			};
			if item_schema.is_none() {
				*item_schema = Some(item.clone());
			}
			let values = match input {
				Some(Value::Array(values)) => values.as_slice(),
				_ => &[],
			};
			while children.len() < values.len() {
				children.push(StoreDraft::unset());
			}
			for (index, value) in values.iter().enumerate() {
				fill_draft(
					&mut children[index],
					item,
					Some(value),
					&path.child_index(index),
				)?;
			}
			Ok(())
		}
		Schema::Tuple { items } => {
			if matches!(draft.kind, DraftKind::Unset) {
				draft.kind = DraftKind::Array {
					children: Vec::new(),
					item_schema: None,
					tuple_items: None,
					present: Presence::of(input),
				};
			}
			let DraftKind::Array {
				children,
				tuple_items,
				..
			} = &mut draft.kind
			else {
				return Err(draft.conflict("array", path));
			};
			if tuple_items.is_none() {
				*tuple_items = Some(items.clone());
			}
			let values = match input {
				Some(Value::Array(values)) => values.as_slice(),
				_ => &[],
			};
			// tuples always materialize their full arity
			while children.len() < items.len() {
				children.push(StoreDraft::unset());
			}
			for (index, item) in items.iter().enumerate() {
				fill_draft(
					&mut children[index],
					item,
					values.get(index),
					&path.child_index(index),
				)?;
			}
			Ok(())
		}
		Schema::String | Schema::Number | Schema::Boolean | Schema::Unknown => {
			if matches!(draft.kind, DraftKind::Unset) {
				draft.kind = DraftKind::Value {
					input: None,
					seeded: false,
				};
			}
			let DraftKind::Value {
				input: draft_input,
				seeded,
			} = &mut draft.kind
			else {
				return Err(draft.conflict("value", path));
			};
			if !*seeded {
				*draft_input = input.cloned();
				*seeded = true;
			}
			Ok(())
		}
	}
}

/// Turn a finished draft into a live store node
fn concretize(draft: StoreDraft, path: Path) -> StoreResult<Rc<FieldStore>> {
	let name = path.encode();
	let schema = draft
		.schema
		.unwrap_or_else(|| Rc::new(Schema::Unknown));
	let state = match draft.kind {
		// a node no arm reached behaves as an empty leaf
		DraftKind::Unset => FieldState::Value(ValueState {
			input: Signal::new(None),
			start_input: Signal::new(None),
			initial_input: Signal::new(None),
		}),
		DraftKind::Value { input, .. } => FieldState::Value(ValueState {
			input: Signal::new(input.clone()),
			start_input: Signal::new(input.clone()),
			initial_input: Signal::new(input),
		}),
		DraftKind::Object { entries, present } => {
			let mut children = Vec::with_capacity(entries.len());
			for (key, child) in entries {
				let child_path = path.child_key(&key);
				children.push((key, concretize(child, child_path)?));
			}
			FieldState::Object(ObjectState {
				children,
				input: Signal::new(present),
				start_input: Signal::new(present),
				initial_input: Signal::new(present),
			})
		}
		DraftKind::Array {
			children: drafts,
			item_schema,
			tuple_items,
			present,
		} => {
			let mut children = Vec::with_capacity(drafts.len());
			let mut items = Vec::with_capacity(drafts.len());
			for (index, child) in drafts.into_iter().enumerate() {
				children.push(concretize(child, path.child_index(index))?);
				items.push(next_item_id());
			}
			FieldState::Array(ArrayState {
				children: RefCell::new(children),
				item_schema,
				tuple_items,
				items: Signal::new(items.clone()),
				start_items: Signal::new(items.clone()),
				initial_items: Signal::new(items),
				input: Signal::new(present),
				start_input: Signal::new(present),
				initial_input: Signal::new(present),
			})
		}
	};
	Ok(Rc::new(FieldStore {
		schema,
		path,
		name,
		errors: Signal::new(None),
		is_touched: Signal::new(false),
		is_dirty: Signal::new(false),
		elements: RefCell::new(Vec::new()),
		initial_elements: RefCell::new(Vec::new()),
		state,
	}))
}

/// Build the store subtree for one schema at one path
pub fn create_field_store(
	schema: &Rc<Schema>,
	input: Option<&Value>,
	path: Path,
) -> StoreResult<Rc<FieldStore>> {
	let mut draft = StoreDraft::unset();
	fill_draft(&mut draft, schema, input, &path)?;
	concretize(draft, path)
}

/// Build the form store for a schema and initial input
///
/// The root schema must concretize to an object. When `validate_on` is
/// [`crate::ValidationMode::Initial`], run [`crate::ops::validate`]
/// right after creation; construction itself stays synchronous.
///
/// # Examples
///
/// ```ignore
/// let schema = Schema::object([("email", Schema::string())]);
/// let form = create_form_store(FormConfig::new(schema, parse))?;
/// assert!(!form.is_submitted().get());
/// ```
pub fn create_form_store(config: FormConfig) -> StoreResult<FormStore> {
	let root = create_field_store(&config.schema, config.initial_input.as_ref(), Path::root())?;
	if !matches!(root.state, FieldState::Object(_)) {
		return Err(StoreError::RootNotObject {
			kind: root.kind_name(),
		});
	}
	debug!(
		validate_on = ?config.validate_on,
		revalidate_on = ?config.revalidate_on,
		"created form store"
	);
	Ok(FormStore {
		root,
		element: RefCell::new(None),
		validators: Cell::new(0),
		validate_on: config.validate_on,
		revalidate_on: config.revalidate_on,
		parse: config.parse,
		behavior: config.behavior,
		is_submitting: Signal::new(false),
		is_submitted: Signal::new(false),
		is_validating: Signal::new(false),
	})
}

/// Make sure the physical child slot at `index` exists, creating any
/// missing slots from the array's item schema
///
/// Idempotent: existing slots are returned as-is and `initial` is only
/// consulted for slots created by this call.
pub fn ensure_child_at(
	store: &Rc<FieldStore>,
	index: usize,
	initial: Option<&Value>,
) -> StoreResult<Rc<FieldStore>> {
	let state = store.as_array()?;
	loop {
		let len = state.children.borrow().len();
		if index < len {
			break;
		}
		let item_schema = match (&state.tuple_items, &state.item_schema) {
			(Some(items), _) => items.get(len).cloned(),
			(None, Some(item)) => Some(item.clone()),
			(None, None) => None,
		};
		let Some(item_schema) = item_schema else {
			return Err(StoreError::IndexOutOfBounds {
				index,
				len,
				name: store.name.clone(),
			});
		};
		let input = if len == index { initial } else { None };
		trace!(name = %store.name, index = len, "initializing array slot");
		let child = create_field_store(&item_schema, input, store.path.child_index(len))?;
		state.children.borrow_mut().push(child);
	}
	let child = state
		.children
		.borrow()
		.get(index)
		.cloned()
		.ok_or_else(|| StoreError::IndexOutOfBounds {
			index,
			len: state.children.borrow().len(),
			name: store.name.clone(),
		})?;
	Ok(child)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::PathSegment;
	use crate::testing::{accept_parse, profile_schema};
	use serde_json::json;

	#[test]
	fn test_create_seeds_signals_from_input() {
		let form = create_form_store(
			FormConfig::new(profile_schema(), accept_parse()).with_initial_input(json!({
				"name": "Jane",
				"emails": [{ "address": "jane@example.com" }],
			})),
		)
		.unwrap();
		let root = form.root();
		let FieldState::Object(object) = &root.state else {
			panic!("root must be an object");
		};
		assert_eq!(object.children.len(), 2);
		assert_eq!(object.input.get(), Presence::Present);

		let name = &object.children[0].1;
		let FieldState::Value(value) = &name.state else {
			panic!("name must be a value");
		};
		assert_eq!(value.input.get(), Some(json!("Jane")));
		assert_eq!(value.initial_input.get(), Some(json!("Jane")));
		assert_eq!(name.name, r#"["name"]"#);
		assert!(!name.is_touched.get());
		assert!(!name.is_dirty.get());

		let emails = object.children[1].1.as_array().unwrap();
		assert_eq!(emails.items.get().len(), 1);
		assert_eq!(emails.items.get(), emails.initial_items.get());
	}

	#[test]
	fn test_create_without_input_leaves_arrays_empty() {
		let form =
			create_form_store(FormConfig::new(profile_schema(), accept_parse())).unwrap();
		let FieldState::Object(object) = &form.root().state else {
			panic!("root must be an object");
		};
		assert_eq!(object.input.get(), Presence::Absent);
		let emails = object.children[1].1.as_array().unwrap();
		assert!(emails.items.get().is_empty());
		assert!(emails.children.borrow().is_empty());
	}

	#[test]
	fn test_optional_default_seeds_the_leaf() {
		let schema = Schema::object([(
			"nickname",
			Schema::optional(Schema::string(), Some(json!("anon"))),
		)]);
		let form = create_form_store(FormConfig::new(schema, accept_parse())).unwrap();
		let FieldState::Object(object) = &form.root().state else {
			panic!("root must be an object");
		};
		let FieldState::Value(value) = &object.children[0].1.state else {
			panic!("nickname must be a value");
		};
		assert_eq!(value.input.get(), Some(json!("anon")));
	}

	#[test]
	fn test_union_arms_accumulate_on_one_draft() {
		let schema = Schema::object([(
			"contact",
			Schema::union([
				Schema::object([("email", Schema::string())]),
				Schema::object([("phone", Schema::string())]),
			]),
		)]);
		let form = create_form_store(FormConfig::new(schema, accept_parse())).unwrap();
		let FieldState::Object(object) = &form.root().state else {
			panic!("root must be an object");
		};
		let FieldState::Object(contact) = &object.children[0].1.state else {
			panic!("contact must be an object");
		};
		let keys: Vec<_> = contact.children.iter().map(|(k, _)| k.as_str()).collect();
		assert_eq!(keys, ["email", "phone"]);
	}

	#[test]
	fn test_union_kind_conflict_is_rejected() {
		let schema = Schema::object([(
			"mixed",
			Schema::union([Schema::string(), Schema::object([])]),
		)]);
		let error = create_form_store(FormConfig::new(schema, accept_parse())).unwrap_err();
		assert!(matches!(error, StoreError::KindConflict { .. }));
	}

	#[test]
	fn test_union_first_arm_wins_leaf_input() {
		let schema = Schema::object([(
			"id",
			Schema::union([Schema::string(), Schema::number()]),
		)]);
		let form = create_form_store(
			FormConfig::new(schema, accept_parse()).with_initial_input(json!({ "id": "a7" })),
		)
		.unwrap();
		let FieldState::Object(object) = &form.root().state else {
			panic!("root must be an object");
		};
		let FieldState::Value(value) = &object.children[0].1.state else {
			panic!("id must be a value");
		};
		assert_eq!(value.input.get(), Some(json!("a7")));
	}

	#[test]
	fn test_unsupported_schema_is_rejected() {
		let schema = Schema::object([("meta", Rc::new(Schema::Record))]);
		let error = create_form_store(FormConfig::new(schema, accept_parse())).unwrap_err();
		assert!(matches!(
			error,
			StoreError::UnsupportedSchema { kind: "record", .. }
		));
	}

	#[test]
	fn test_root_must_be_an_object() {
		let error =
			create_form_store(FormConfig::new(Schema::string(), accept_parse())).unwrap_err();
		assert!(matches!(error, StoreError::RootNotObject { kind: "value" }));
	}

	#[test]
	fn test_tuple_materializes_full_arity() {
		let schema = Schema::object([(
			"point",
			Schema::tuple([Schema::number(), Schema::number()]),
		)]);
		let form = create_form_store(
			FormConfig::new(schema, accept_parse()).with_initial_input(json!({ "point": [1] })),
		)
		.unwrap();
		let FieldState::Object(object) = &form.root().state else {
			panic!("root must be an object");
		};
		let point = object.children[0].1.as_array().unwrap();
		assert_eq!(point.children.borrow().len(), 2);
		assert_eq!(point.items.get().len(), 2);
	}

	#[test]
	fn test_lazy_schema_resolves_without_consuming_a_segment() {
		let schema = Schema::object([("name", Schema::lazy(Schema::string))]);
		let form = create_form_store(
			FormConfig::new(schema, accept_parse()).with_initial_input(json!({ "name": "x" })),
		)
		.unwrap();
		let FieldState::Object(object) = &form.root().state else {
			panic!("root must be an object");
		};
		assert_eq!(object.children[0].1.path.segments(), &[
			PathSegment::Key("name".to_string())
		]);
	}

	#[test]
	fn test_ensure_child_at_is_idempotent() {
		let form = create_form_store(
			FormConfig::new(profile_schema(), accept_parse()).with_initial_input(json!({
				"emails": [{ "address": "a@b.c" }],
			})),
		)
		.unwrap();
		let FieldState::Object(object) = &form.root().state else {
			panic!("root must be an object");
		};
		let emails = &object.children[1].1;

		let existing = ensure_child_at(emails, 0, Some(&json!({ "address": "ignored" }))).unwrap();
		let FieldState::Object(slot) = &existing.state else {
			panic!("slot must be an object");
		};
		let FieldState::Value(address) = &slot.children[0].1.state else {
			panic!("address must be a value");
		};
		// existing slot: the initial argument is ignored
		assert_eq!(address.input.get(), Some(json!("a@b.c")));

		let created = ensure_child_at(emails, 2, None).unwrap();
		assert_eq!(emails.as_array().unwrap().children.borrow().len(), 3);
		assert_eq!(created.name, r#"["emails",2]"#);
		// physical growth does not change the logical item list
		assert_eq!(emails.as_array().unwrap().items.get().len(), 1);
	}
}
