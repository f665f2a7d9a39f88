//! Store tree data model
//!
//! A form is a tree of [`FieldStore`] nodes mirroring the schema shape.
//! Every node carries validation errors plus touched/dirty flags as
//! signals; the kind-specific payload lives in [`FieldState`]. The
//! [`FormStore`] wraps the root with form-level lifecycle signals and
//! the injected parse capability.

use crate::element::ElementRef;
use crate::error::{StoreError, StoreResult};
use formic_reactive::{ItemId, Signal};
use formic_schema::{ParseFn, Schema};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// One step of a field path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
	/// Object property name
	Key(String),
	/// Array index
	Index(usize),
}

impl From<&str> for PathSegment {
	fn from(key: &str) -> Self {
		PathSegment::Key(key.to_string())
	}
}

impl From<String> for PathSegment {
	fn from(key: String) -> Self {
		PathSegment::Key(key)
	}
}

impl From<usize> for PathSegment {
	fn from(index: usize) -> Self {
		PathSegment::Index(index)
	}
}

/// Path from the form root to a field
///
/// The canonical string form is the JSON encoding of the segment list,
/// e.g. `["emails",0,"address"]`. That string doubles as the field's
/// stable `name`, usable as an element id and decodable back via
/// [`Path::parse`].
///
/// # Examples
///
/// ```ignore
/// let path = Path::root().child_key("emails").child_index(0);
/// assert_eq!(path.encode(), r#"["emails",0]"#);
/// assert_eq!(Path::parse(&path.encode())?, path);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path(Vec<PathSegment>);

impl Path {
	/// The empty path addressing the form root
	pub fn root() -> Self {
		Path(Vec::new())
	}

	/// Build a path from an iterator of segments
	pub fn of<I>(segments: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<PathSegment>,
	{
		Path(segments.into_iter().map(Into::into).collect())
	}

	/// Whether this path addresses the root
	pub fn is_root(&self) -> bool {
		self.0.is_empty()
	}

	/// The segments, root first
	pub fn segments(&self) -> &[PathSegment] {
		&self.0
	}

	/// This path extended by an object key
	pub fn child_key(&self, key: impl Into<String>) -> Path {
		let mut segments = self.0.clone();
		segments.push(PathSegment::Key(key.into()));
		Path(segments)
	}

	/// This path extended by an array index
	pub fn child_index(&self, index: usize) -> Path {
		let mut segments = self.0.clone();
		segments.push(PathSegment::Index(index));
		Path(segments)
	}

	/// The canonical JSON-encoded field name
	pub fn encode(&self) -> String {
		let items: Vec<Value> = self
			.0
			.iter()
			.map(|segment| match segment {
				PathSegment::Key(key) => Value::String(key.clone()),
				PathSegment::Index(index) => Value::from(*index),
			})
			.collect();
		// Vec<Value> serialization cannot fail
		serde_json::to_string(&Value::Array(items)).unwrap_or_default()
	}

	/// Decode a field name produced by [`Path::encode`]
	pub fn parse(name: &str) -> StoreResult<Path> {
		let invalid = || StoreError::InvalidPath {
			name: name.to_string(),
		};
		let value: Value = serde_json::from_str(name).map_err(|_| invalid())?;
		let Value::Array(items) = value else {
			return Err(invalid());
		};
		let mut segments = Vec::with_capacity(items.len());
		for item in items {
			match item {
				Value::String(key) => segments.push(PathSegment::Key(key)),
				Value::Number(number) => {
					let index = number.as_u64().ok_or_else(invalid)?;
					segments.push(PathSegment::Index(index as usize));
				}
				_ => return Err(invalid()),
			}
		}
		Ok(Path(segments))
	}
}

impl core::fmt::Display for Path {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.write_str(&self.encode())
	}
}

/// Presence of a container's input
///
/// Containers do not duplicate their children's values; their input
/// signal only records whether the container itself was given a value,
/// given an explicit null, or not given at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
	/// A concrete (non-null) input was provided
	Present,
	/// An explicit null was provided
	Null,
	/// No input was provided
	Absent,
}

impl Presence {
	/// Classify an optional input value
	pub fn of(input: Option<&Value>) -> Presence {
		match input {
			Some(Value::Null) => Presence::Null,
			Some(_) => Presence::Present,
			None => Presence::Absent,
		}
	}

	/// Whether a concrete value is present
	pub fn is_present(self) -> bool {
		matches!(self, Presence::Present)
	}

	/// The logical input this presence stands for, when not present
	pub fn sentinel(self) -> Option<Value> {
		match self {
			Presence::Present => None,
			Presence::Null => Some(Value::Null),
			Presence::Absent => None,
		}
	}
}

/// Kind-specific payload of a value (leaf) store
pub struct ValueState {
	/// Current input
	pub input: Signal<Option<Value>>,
	/// Baseline the dirty flag compares against
	pub start_input: Signal<Option<Value>>,
	/// Input the store was created with; only `reset` rebases it
	pub initial_input: Signal<Option<Value>>,
}

/// Kind-specific payload of an object store
pub struct ObjectState {
	/// Children in schema entry order; the set is fixed at creation
	pub children: Vec<(String, Rc<FieldStore>)>,
	/// Current presence
	pub input: Signal<Presence>,
	/// Baseline presence for the dirty flag
	pub start_input: Signal<Presence>,
	/// Presence at creation
	pub initial_input: Signal<Presence>,
}

/// Kind-specific payload of an array (or tuple) store
pub struct ArrayState {
	/// Physical child slots; may outlive the logical item list, which
	/// only ever shrinks by exclusion so slots can be reused
	pub children: RefCell<Vec<Rc<FieldStore>>>,
	/// Item schema for dynamic arrays
	pub item_schema: Option<Rc<Schema>>,
	/// Per-position schemas for tuples
	pub tuple_items: Option<Vec<Rc<Schema>>>,
	/// Logical item identities, one per current item
	pub items: Signal<Vec<ItemId>>,
	/// Baseline item identities for the dirty flag
	pub start_items: Signal<Vec<ItemId>>,
	/// Item identities at creation
	pub initial_items: Signal<Vec<ItemId>>,
	/// Current presence
	pub input: Signal<Presence>,
	/// Baseline presence for the dirty flag
	pub start_input: Signal<Presence>,
	/// Presence at creation
	pub initial_input: Signal<Presence>,
}

impl ArrayState {
	/// Current logical length
	pub fn len(&self) -> usize {
		self.items.get_untracked().len()
	}

	/// Whether the array currently has no items
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// The child store at a logical index, if initialized
	pub fn child(&self, index: usize) -> Option<Rc<FieldStore>> {
		self.children.borrow().get(index).cloned()
	}
}

/// Kind-specific payload of a field store
pub enum FieldState {
	/// Leaf carrying the value itself
	Value(ValueState),
	/// Object with fixed children
	Object(ObjectState),
	/// Array or tuple with identity-tracked items
	Array(ArrayState),
}

impl FieldState {
	/// Short kind tag, used in errors and logs
	pub fn kind_name(&self) -> &'static str {
		match self {
			FieldState::Value(_) => "value",
			FieldState::Object(_) => "object",
			FieldState::Array(_) => "array",
		}
	}
}

/// One node of the store tree
pub struct FieldStore {
	/// The schema node this store was built from, as given (wrappers
	/// and composites included)
	pub schema: Rc<Schema>,
	/// Path from the root
	pub path: Path,
	/// Canonical JSON-encoded name, stable for the life of the store
	pub name: String,
	/// Validation errors currently attached to this node
	pub errors: Signal<Option<Vec<String>>>,
	/// Whether the field was interacted with
	pub is_touched: Signal<bool>,
	/// Whether the input differs from its baseline
	pub is_dirty: Signal<bool>,
	/// UI elements currently bound to this field
	pub elements: RefCell<Vec<ElementRef>>,
	/// Elements bound at creation; `reset` restores this set
	pub initial_elements: RefCell<Vec<ElementRef>>,
	/// Kind-specific payload
	pub state: FieldState,
}

impl FieldStore {
	/// Short kind tag, used in errors and logs
	pub fn kind_name(&self) -> &'static str {
		self.state.kind_name()
	}

	/// The array payload, or a typed error
	pub fn as_array(&self) -> StoreResult<&ArrayState> {
		match &self.state {
			FieldState::Array(state) => Ok(state),
			_ => Err(StoreError::NotAnArray {
				name: self.name.clone(),
			}),
		}
	}
}

impl core::fmt::Debug for FieldStore {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("FieldStore")
			.field("name", &self.name)
			.field("kind", &self.kind_name())
			.finish_non_exhaustive()
	}
}

/// Boolean facet readable through `get_field_bool`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolField {
	/// Any errors on the node or its descendants
	Errors,
	/// Touched flag, OR-reduced over the subtree
	Touched,
	/// Dirty flag, OR-reduced over the subtree
	Dirty,
}

/// Boolean facet writable through `set_field_bool`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedFlag {
	Touched,
	Dirty,
}

/// When the first validation pass runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
	/// Immediately after the form store is created
	Initial,
	/// On every touch event
	Touch,
	/// On every input event
	Input,
	/// On change (commit) events
	Change,
	/// On blur events
	Blur,
	/// Only when the form is submitted
	#[default]
	Submit,
}

impl ValidationMode {
	/// The event that satisfies this mode, if any
	pub fn event(self) -> Option<ValidationEvent> {
		match self {
			ValidationMode::Initial => None,
			ValidationMode::Touch => Some(ValidationEvent::Touch),
			ValidationMode::Input => Some(ValidationEvent::Input),
			ValidationMode::Change => Some(ValidationEvent::Change),
			ValidationMode::Blur => Some(ValidationEvent::Blur),
			ValidationMode::Submit => Some(ValidationEvent::Submit),
		}
	}
}

/// When subsequent passes run once a field already has errors, or once
/// the form has been submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevalidateMode {
	Touch,
	#[default]
	Input,
	Change,
	Blur,
	Submit,
}

impl RevalidateMode {
	/// The event that satisfies this mode
	pub fn event(self) -> ValidationEvent {
		match self {
			RevalidateMode::Touch => ValidationEvent::Touch,
			RevalidateMode::Input => ValidationEvent::Input,
			RevalidateMode::Change => ValidationEvent::Change,
			RevalidateMode::Blur => ValidationEvent::Blur,
			RevalidateMode::Submit => ValidationEvent::Submit,
		}
	}
}

/// The interaction event a mutation reports to the trigger table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationEvent {
	Touch,
	Input,
	Change,
	Blur,
	Submit,
}

/// Per-schema behavior overrides for leaf writes
#[derive(Default, Clone)]
pub struct SchemaBehavior {
	/// Custom equality for the dirty comparison; defaults to structural
	/// value equality when absent
	pub equals: Option<Rc<dyn Fn(&Value, &Value) -> bool>>,
	/// Transform applied to every concrete leaf input before storing
	pub transform: Option<Rc<dyn Fn(Value) -> Value>>,
}

/// Configuration for [`crate::init::create_form_store`]
pub struct FormConfig {
	/// Root schema; must concretize to an object
	pub schema: Rc<Schema>,
	/// Initial input the store tree is seeded with
	pub initial_input: Option<Value>,
	/// First-pass trigger mode
	pub validate_on: ValidationMode,
	/// Follow-up trigger mode
	pub revalidate_on: RevalidateMode,
	/// The injected async parse capability
	pub parse: ParseFn,
	/// Optional leaf-write overrides
	pub behavior: Option<SchemaBehavior>,
}

impl FormConfig {
	/// A config with default trigger modes and no overrides
	pub fn new(schema: Rc<Schema>, parse: ParseFn) -> Self {
		Self {
			schema,
			initial_input: None,
			validate_on: ValidationMode::default(),
			revalidate_on: RevalidateMode::default(),
			parse,
			behavior: None,
		}
	}

	/// Seed the tree with an initial input
	pub fn with_initial_input(mut self, input: Value) -> Self {
		self.initial_input = Some(input);
		self
	}

	/// Set the first-pass trigger mode
	pub fn with_validate_on(mut self, mode: ValidationMode) -> Self {
		self.validate_on = mode;
		self
	}

	/// Set the follow-up trigger mode
	pub fn with_revalidate_on(mut self, mode: RevalidateMode) -> Self {
		self.revalidate_on = mode;
		self
	}

	/// Attach leaf-write overrides
	pub fn with_behavior(mut self, behavior: SchemaBehavior) -> Self {
		self.behavior = Some(behavior);
		self
	}
}

/// The form-level store wrapping the root field tree
pub struct FormStore {
	pub(crate) root: Rc<FieldStore>,
	pub(crate) element: RefCell<Option<ElementRef>>,
	/// Count of in-flight validation passes
	pub(crate) validators: Cell<usize>,
	pub(crate) validate_on: ValidationMode,
	pub(crate) revalidate_on: RevalidateMode,
	pub(crate) parse: ParseFn,
	pub(crate) behavior: Option<SchemaBehavior>,
	pub(crate) is_submitting: Signal<bool>,
	pub(crate) is_submitted: Signal<bool>,
	pub(crate) is_validating: Signal<bool>,
}

impl FormStore {
	/// The root field store; always object kind
	pub fn root(&self) -> &Rc<FieldStore> {
		&self.root
	}

	/// Whether a submit handler is currently running
	pub fn is_submitting(&self) -> &Signal<bool> {
		&self.is_submitting
	}

	/// Whether the form has been submitted at least once
	pub fn is_submitted(&self) -> &Signal<bool> {
		&self.is_submitted
	}

	/// Whether at least one validation pass is in flight
	pub fn is_validating(&self) -> &Signal<bool> {
		&self.is_validating
	}

	/// The first-pass trigger mode
	pub fn validate_on(&self) -> ValidationMode {
		self.validate_on
	}

	/// The follow-up trigger mode
	pub fn revalidate_on(&self) -> RevalidateMode {
		self.revalidate_on
	}

	/// The element registered for the form itself, if any
	pub fn element(&self) -> Option<ElementRef> {
		self.element.borrow().clone()
	}

	/// Register or clear the form-level element
	pub fn set_element(&self, element: Option<ElementRef>) {
		*self.element.borrow_mut() = element;
	}
}

impl core::fmt::Debug for FormStore {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("FormStore")
			.field("validate_on", &self.validate_on)
			.field("revalidate_on", &self.revalidate_on)
			.finish_non_exhaustive()
	}
}
