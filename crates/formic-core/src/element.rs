//! Element binding seam
//!
//! The engine is renderer-agnostic: anything that can receive focus and
//! report its current input implements [`FieldElement`]. Stores keep
//! plain lists of bound elements so one field can drive several
//! controls (radio groups, mirrored inputs).

use crate::store::FieldStore;
use serde_json::Value;
use std::rc::Rc;

/// A UI control bound to a field store
pub trait FieldElement {
	/// Move focus to this control
	fn focus(&self);

	/// The control's current input, `None` when it has none
	fn read_input(&self) -> Option<Value>;
}

/// Shared handle to a bound element
pub type ElementRef = Rc<dyn FieldElement>;

/// Bind an element to a field
pub fn register_element(store: &FieldStore, element: ElementRef) {
	store.elements.borrow_mut().push(element);
}

/// Unbind an element from a field; no-op when it is not bound
pub fn unregister_element(store: &FieldStore, element: &ElementRef) {
	store
		.elements
		.borrow_mut()
		.retain(|bound| !Rc::ptr_eq(bound, element));
}
