//! # Formic
//!
//! A framework-agnostic reactive form-state engine for Rust.
//!
//! Formic keeps form state in a tree of fine-grained signals shaped by
//! a schema: every field tracks its input, validation errors and
//! touched/dirty flags independently, array items carry stable
//! identities through insertions and reorders, and validation runs as
//! an injected async parse over the whole logical input.
//!
//! ## Crates
//!
//! - [`reactive`] — signals, effects, batching and untracked reads
//! - [`schema`] — the introspected schema tree and the parse contract
//! - [`engine`] — the store tree, mutation surface and submit flow
//!
//! ## Quick start
//!
//! ```ignore
//! use formic::prelude::*;
//!
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

pub use formic_core as engine;
pub use formic_reactive as reactive;
pub use formic_schema as schema;

/// The common imports for building and driving forms
pub mod prelude {
	pub use formic_core::{
		create_form_store, focus, get_all_errors, get_errors, get_field_bool, get_field_input,
		get_field_store, get_input, handle_submit, insert, move_item, register_element, remove,
		replace, reset, set_errors, set_field_bool, set_field_input, set_input, swap,
		unregister_element, validate, BoolField, ElementRef, FieldElement, FieldState,
		FieldStore, FormConfig, FormStore, InsertOptions, MoveOptions, Path, PathSegment,
		Presence, RemoveOptions, ReplaceOptions, ResetOptions, RevalidateMode, SchemaBehavior,
		SetErrorsOptions, SetInputOptions, StoreError, StoreResult, SwapOptions, TrackedFlag,
		ValidateOptions, ValidationEvent, ValidationMode,
	};
	pub use formic_reactive::{batch, untrack, Effect, ItemId, Signal};
	pub use formic_schema::{
		Issue, ParseFn, ParseOutcome, PathItem, PathKey, PathKind, Schema,
	};
}
