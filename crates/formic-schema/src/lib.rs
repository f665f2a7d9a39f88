//! # formic-schema
//!
//! The schema capability consumed by the formic form engine: a schema
//! node tree introspected by `type` tag, and the async parse contract
//! (`ParseOutcome` / `Issue` / path items) the engine maps back onto its
//! field stores.
//!
//! This crate carries no validation logic of its own — validation is
//! injected as a [`ParseFn`] when the form store is created.

pub mod node;
pub mod parse;

pub use node::{LazyResolver, Schema};
pub use parse::{Issue, ParseFn, ParseOutcome, PathItem, PathKey, PathKind};
