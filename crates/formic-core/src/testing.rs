//! Shared test fixtures

use crate::init::create_form_store;
use crate::store::{FormConfig, FormStore};
use formic_schema::{Issue, ParseFn, ParseOutcome, Schema};
use serde_json::{json, Value};
use std::cell::Cell;
use std::rc::Rc;

/// Parse function that accepts any input and echoes it as output
pub(crate) fn accept_parse() -> ParseFn {
	Rc::new(|input| {
		Box::pin(async move { ParseOutcome::Success(input.unwrap_or(Value::Null)) })
	})
}

/// Parse function that always fails with the given issues
pub(crate) fn reject_parse(issues: Vec<Issue>) -> ParseFn {
	Rc::new(move |_| {
		let issues = issues.clone();
		Box::pin(async move { ParseOutcome::Failure(issues) })
	})
}

/// Accepting parse function that counts how often it runs
pub(crate) fn counting_parse() -> (ParseFn, Rc<Cell<usize>>) {
	let count = Rc::new(Cell::new(0));
	let counter = count.clone();
	let parse: ParseFn = Rc::new(move |input| {
		counter.set(counter.get() + 1);
		Box::pin(async move { ParseOutcome::Success(input.unwrap_or(Value::Null)) })
	});
	(parse, count)
}

/// `{ name: string, emails: [{ address: string }] }`
pub(crate) fn profile_schema() -> Rc<Schema> {
	Schema::object([
		("name", Schema::string()),
		(
			"emails",
			Schema::array(Schema::object([("address", Schema::string())])),
		),
	])
}

pub(crate) fn form_with(initial: Option<Value>, parse: ParseFn) -> FormStore {
	let mut config = FormConfig::new(profile_schema(), parse);
	config.initial_input = initial;
	match create_form_store(config) {
		Ok(form) => form,
		Err(error) => panic!("fixture form must build: {error}"),
	}
}

pub(crate) fn profile_form(initial: Option<Value>) -> FormStore {
	form_with(initial, accept_parse())
}

/// `{ tags: [string] }` seeded with the given tag array
pub(crate) fn tags_form(tags: Value) -> FormStore {
	let schema = Schema::object([("tags", Schema::array(Schema::string()))]);
	let config = FormConfig::new(schema, accept_parse())
		.with_initial_input(json!({ "tags": tags }));
	match create_form_store(config) {
		Ok(form) => form,
		Err(error) => panic!("fixture form must build: {error}"),
	}
}
