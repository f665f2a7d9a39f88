//! Parse contract
//!
//! Validation is an injected capability: the form engine hands the full
//! logical input to an async parse function and gets back either the
//! parsed output or a list of issues. Issues are data, never errors —
//! the engine maps them onto the field tree by path.

use futures::future::LocalBoxFuture;
use serde_json::Value;
use std::rc::Rc;

/// The kind of structure a path segment steps through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
	/// An object property
	Object,
	/// An array index
	Array,
	/// A map entry — not addressable in the store tree
	Map,
	/// A set entry — not addressable in the store tree
	Set,
	/// Anything else — not addressable in the store tree
	Unknown,
}

/// The key of a path segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathKey {
	/// Object property name
	Key(String),
	/// Array index
	Index(usize),
	/// A key the store tree cannot walk (symbols, composite map keys, …)
	Other(String),
}

/// One step of an issue's path from the root of the validated input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathItem {
	pub kind: PathKind,
	pub key: PathKey,
}

impl PathItem {
	/// An object-property step
	pub fn key(name: impl Into<String>) -> Self {
		Self {
			kind: PathKind::Object,
			key: PathKey::Key(name.into()),
		}
	}

	/// An array-index step
	pub fn index(index: usize) -> Self {
		Self {
			kind: PathKind::Array,
			key: PathKey::Index(index),
		}
	}
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
	/// Human-readable message, rendered next to the field it maps to
	pub message: String,
	/// Path from the root of the input; empty means a form-level issue
	pub path: Vec<PathItem>,
}

impl Issue {
	/// A form-level issue with no path
	pub fn root(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			path: Vec::new(),
		}
	}

	/// An issue at the given path
	pub fn at(path: Vec<PathItem>, message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			path,
		}
	}
}

/// Result of one parse pass over the full form input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
	/// The input is valid; carries the parsed (possibly transformed) output
	Success(Value),
	/// The input is invalid; carries at least one issue
	Failure(Vec<Issue>),
}

impl ParseOutcome {
	/// Whether this outcome is a success
	pub fn is_success(&self) -> bool {
		matches!(self, ParseOutcome::Success(_))
	}
}

/// The injected async parse capability
///
/// Receives the current logical input (`None` when the root input is
/// absent) and resolves to a [`ParseOutcome`]. The function must not
/// panic; invalid input is a `Failure`, not an error.
pub type ParseFn = Rc<dyn Fn(Option<Value>) -> LocalBoxFuture<'static, ParseOutcome>>;
