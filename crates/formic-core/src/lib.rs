//! # formic-core
//!
//! The reactive form-state engine: a schema-shaped tree of field
//! stores with fine-grained signals for input, errors and the
//! touched/dirty flags, plus the mutation surface UI bindings drive.
//!
//! A form is created once from a schema and an optional initial input
//! ([`create_form_store`]), mutated in place through the operations in
//! [`ops`], validated through an injected async parse function, and
//! discarded with the form. Array items carry stable identities
//! ([`formic_reactive::ItemId`]) so list UIs can reconcile through
//! insertions and reorders.
//!
//! # Examples
//!
//! ```ignore
//! let schema = Schema::object([
//!     ("email", Schema::string()),
//!     ("tags", Schema::array(Schema::string())),
//! ]);
//! let form = create_form_store(FormConfig::new(schema, parse))?;
//!
//! set_input(&form, SetInputOptions {
//!     path: Path::of(["email"]),
//!     input: Some(json!("jane@example.com")),
//! })
//! .await?;
//!
//! handle_submit(&form, |output| async move {
//!     api.save(output).await?;
//!     Ok(())
//! })
//! .await;
//! ```

pub mod access;
pub mod element;
pub mod error;
pub mod init;
pub mod items;
pub mod ops;
pub mod store;
pub mod submit;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

pub use access::{
	get_field_bool, get_field_input, get_field_store, set_field_bool, set_field_input,
	walk_field_store,
};
pub use element::{register_element, unregister_element, ElementRef, FieldElement};
pub use error::{StoreError, StoreResult};
pub use init::{create_field_store, create_form_store, ensure_child_at};
pub use items::{copy_item_state, reset_item_state, swap_item_state};
pub use ops::{
	focus, get_all_errors, get_errors, get_input, insert, move_item, remove, replace, reset,
	set_errors, set_input, swap, validate, InsertOptions, MoveOptions, RemoveOptions,
	ReplaceOptions, ResetOptions, SetErrorsOptions, SetInputOptions, SwapOptions,
};
pub use store::{
	ArrayState, BoolField, FieldState, FieldStore, FormConfig, FormStore, ObjectState, Path,
	PathSegment, Presence, RevalidateMode, SchemaBehavior, TrackedFlag, ValidationEvent,
	ValidationMode, ValueState,
};
pub use submit::{handle_submit, UNKNOWN_ERROR_MESSAGE};
pub use validate::{validate_form_input, validate_if_required, ValidateOptions};
