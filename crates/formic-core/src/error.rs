//! Error taxonomy
//!
//! Construction errors are fatal and synchronous: `create_form_store`
//! either returns a complete tree or no tree at all. Validation findings
//! are data (`errors` signals on the stores), never values of this type.

/// Errors raised by store construction, path lookup, and mutation ops
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	/// The schema contains a kind the store tree cannot represent
	#[error("unsupported schema type `{kind}` for field `{name}`")]
	UnsupportedSchema { kind: &'static str, name: String },
	/// Two union/intersect arms disagree on the store kind at one path
	#[error("field `{name}` cannot be reinitialized as `{requested}`: already initialized as `{existing}`")]
	KindConflict {
		name: String,
		existing: &'static str,
		requested: &'static str,
	},
	/// A path names a key the schema does not have
	#[error("no child found at key `{key}` in field `{name}`")]
	ChildNotFound { key: String, name: String },
	/// A path or mutation names an index outside the array
	#[error("index {index} is out of bounds for array `{name}` of length {len}")]
	IndexOutOfBounds {
		index: usize,
		len: usize,
		name: String,
	},
	/// An array operation targeted a non-array field
	#[error("field `{name}` is not an array")]
	NotAnArray { name: String },
	/// The root schema did not concretize to an object store
	#[error("form schema must resolve to an object, got `{kind}`")]
	RootNotObject { kind: &'static str },
	/// A field name could not be decoded back into a path
	#[error("invalid field name `{name}`: not a JSON-encoded path")]
	InvalidPath { name: String },
}

/// Convenience alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
