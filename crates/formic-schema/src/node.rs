//! Schema nodes
//!
//! The form engine consumes schemas through introspection only: every node
//! reports a `type` tag and its structural children. The actual validation
//! logic lives behind the injected parse function (see [`crate::parse`]),
//! so this tree is deliberately free of any validation semantics.

use core::fmt;
use serde_json::Value;
use std::rc::Rc;

/// Resolver for lazily defined (possibly recursive) schemas
pub type LazyResolver = Rc<dyn Fn() -> Rc<Schema>>;

/// A schema node, introspected by type tag
///
/// The variant set mirrors the schema library the engine is designed
/// against: concrete leaves and containers, composite options, nullish
/// wrappers carrying an optional default input, pass-through wrappers,
/// lazy indirection, and the kinds the store tree explicitly rejects.
#[derive(Clone)]
pub enum Schema {
	/// String leaf
	String,
	/// Number leaf
	Number,
	/// Boolean leaf
	Boolean,
	/// Any other leaf value
	Unknown,
	/// Object with a fixed, ordered set of entries
	Object {
		/// Property name to schema, in declaration order
		entries: Vec<(String, Rc<Schema>)>,
	},
	/// Dynamic-length array
	Array {
		/// Schema of every item
		item: Rc<Schema>,
	},
	/// Fixed-arity tuple
	Tuple {
		/// Schema per position
		items: Vec<Rc<Schema>>,
	},
	/// Union of options
	Union {
		/// Option schemas, all applied to the same store position
		options: Vec<Rc<Schema>>,
	},
	/// Intersection of options
	Intersect {
		/// Option schemas, all applied to the same store position
		options: Vec<Rc<Schema>>,
	},
	/// Discriminated union of options
	Variant {
		/// Option schemas, all applied to the same store position
		options: Vec<Rc<Schema>>,
	},
	/// `T | undefined`, with an optional default input
	Optional {
		wrapped: Rc<Schema>,
		default: Option<Value>,
	},
	/// `T | null`, with an optional default input
	Nullable {
		wrapped: Rc<Schema>,
		default: Option<Value>,
	},
	/// `T | null | undefined`, with an optional default input
	Nullish {
		wrapped: Rc<Schema>,
		default: Option<Value>,
	},
	/// Optional only when the key is genuinely missing
	ExactOptional {
		wrapped: Rc<Schema>,
		default: Option<Value>,
	},
	/// `T | undefined` without key-omission semantics
	Undefinedable {
		wrapped: Rc<Schema>,
		default: Option<Value>,
	},
	/// Strips `undefined` from the wrapped schema
	NonOptional { wrapped: Rc<Schema> },
	/// Strips `null` from the wrapped schema
	NonNullable { wrapped: Rc<Schema> },
	/// Strips `null | undefined` from the wrapped schema
	NonNullish { wrapped: Rc<Schema> },
	/// Lazily resolved schema; resolution consumes no path segment
	Lazy { resolve: LazyResolver },
	/// Unsupported: records have unknown keys, so no fixed store shape
	Record,
	/// Unsupported: rest entries have unknown keys
	ObjectWithRest,
	/// Unsupported: rest items have unknown arity
	TupleWithRest,
	/// Unsupported: promises cannot be stored as form input
	Promise,
}

impl Schema {
	/// The `type` tag of this node, as the schema library spells it
	pub fn type_name(&self) -> &'static str {
		match self {
			Schema::String => "string",
			Schema::Number => "number",
			Schema::Boolean => "boolean",
			Schema::Unknown => "unknown",
			Schema::Object { .. } => "object",
			Schema::Array { .. } => "array",
			Schema::Tuple { .. } => "tuple",
			Schema::Union { .. } => "union",
			Schema::Intersect { .. } => "intersect",
			Schema::Variant { .. } => "variant",
			Schema::Optional { .. } => "optional",
			Schema::Nullable { .. } => "nullable",
			Schema::Nullish { .. } => "nullish",
			Schema::ExactOptional { .. } => "exact_optional",
			Schema::Undefinedable { .. } => "undefinedable",
			Schema::NonOptional { .. } => "non_optional",
			Schema::NonNullable { .. } => "non_nullable",
			Schema::NonNullish { .. } => "non_nullish",
			Schema::Lazy { .. } => "lazy",
			Schema::Record => "record",
			Schema::ObjectWithRest => "object_with_rest",
			Schema::TupleWithRest => "tuple_with_rest",
			Schema::Promise => "promise",
		}
	}

	/// Build an object schema from `(name, schema)` pairs
	pub fn object<I>(entries: I) -> Rc<Schema>
	where
		I: IntoIterator<Item = (&'static str, Rc<Schema>)>,
	{
		Rc::new(Schema::Object {
			entries: entries
				.into_iter()
				.map(|(key, schema)| (key.to_string(), schema))
				.collect(),
		})
	}

	/// Build a dynamic array schema
	pub fn array(item: Rc<Schema>) -> Rc<Schema> {
		Rc::new(Schema::Array { item })
	}

	/// Build a fixed-arity tuple schema
	pub fn tuple<I>(items: I) -> Rc<Schema>
	where
		I: IntoIterator<Item = Rc<Schema>>,
	{
		Rc::new(Schema::Tuple {
			items: items.into_iter().collect(),
		})
	}

	/// Build a string leaf
	pub fn string() -> Rc<Schema> {
		Rc::new(Schema::String)
	}

	/// Build a number leaf
	pub fn number() -> Rc<Schema> {
		Rc::new(Schema::Number)
	}

	/// Build a boolean leaf
	pub fn boolean() -> Rc<Schema> {
		Rc::new(Schema::Boolean)
	}

	/// Wrap a schema as optional, with an optional default input
	pub fn optional(wrapped: Rc<Schema>, default: Option<Value>) -> Rc<Schema> {
		Rc::new(Schema::Optional { wrapped, default })
	}

	/// Wrap a schema as nullable, with an optional default input
	pub fn nullable(wrapped: Rc<Schema>, default: Option<Value>) -> Rc<Schema> {
		Rc::new(Schema::Nullable { wrapped, default })
	}

	/// Build a union schema
	pub fn union<I>(options: I) -> Rc<Schema>
	where
		I: IntoIterator<Item = Rc<Schema>>,
	{
		Rc::new(Schema::Union {
			options: options.into_iter().collect(),
		})
	}

	/// Build a lazily resolved schema
	pub fn lazy(resolve: impl Fn() -> Rc<Schema> + 'static) -> Rc<Schema> {
		Rc::new(Schema::Lazy {
			resolve: Rc::new(resolve),
		})
	}
}

impl fmt::Debug for Schema {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Schema::Object { entries } => f
				.debug_struct("Object")
				.field("entries", &entries.iter().map(|(k, _)| k).collect::<Vec<_>>())
				.finish(),
			Schema::Tuple { items } => {
				f.debug_struct("Tuple").field("len", &items.len()).finish()
			}
			other => f.write_str(other.type_name()),
		}
	}
}
