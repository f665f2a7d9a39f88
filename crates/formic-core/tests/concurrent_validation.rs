//! Overlapping validation passes: the counter keeps `is_validating`
//! alive until the last pass settles, and the last pass to resolve owns
//! the error tree regardless of call order.

use formic_core::{
	create_form_store, get_all_errors, validate_form_input, FormConfig, FormStore,
	ValidateOptions,
};
use formic_schema::{Issue, ParseFn, ParseOutcome, Schema};
use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

/// Parse function whose outcomes are released manually, one receiver
/// per call in call order
fn gated_parse(gates: Vec<oneshot::Receiver<ParseOutcome>>) -> ParseFn {
	let gates = Rc::new(RefCell::new(gates.into_iter()));
	Rc::new(move |_| {
		let gate = gates.borrow_mut().next();
		Box::pin(async move {
			match gate {
				Some(gate) => match gate.await {
					Ok(outcome) => outcome,
					Err(_) => ParseOutcome::Success(json!({})),
				},
				None => ParseOutcome::Success(json!({})),
			}
		})
	})
}

fn gated_form(gates: Vec<oneshot::Receiver<ParseOutcome>>) -> Rc<FormStore> {
	let schema = Schema::object([("name", Schema::string())]);
	let form = create_form_store(
		FormConfig::new(schema, gated_parse(gates)).with_initial_input(json!({ "name": "x" })),
	)
	.expect("form builds");
	Rc::new(form)
}

#[test]
fn test_last_resolved_pass_owns_the_error_tree() {
	let (first_tx, first_rx) = oneshot::channel();
	let (second_tx, second_rx) = oneshot::channel();
	let form = gated_form(vec![first_rx, second_rx]);

	let mut pool = LocalPool::new();
	let spawner = pool.spawner();
	for _ in 0..2 {
		let form = form.clone();
		spawner
			.spawn_local(async move {
				validate_form_input(&form, ValidateOptions::default()).await;
			})
			.expect("spawn validation");
	}
	pool.run_until_stalled();
	assert!(form.is_validating().get());

	// the second call resolves first, with a failure
	second_tx
		.send(ParseOutcome::Failure(vec![Issue::root("From second pass")]))
		.expect("second gate open");
	pool.run_until_stalled();
	assert_eq!(get_all_errors(&form), ["From second pass"]);
	// one pass still in flight
	assert!(form.is_validating().get());

	// the first call resolves last and overwrites the tree
	first_tx
		.send(ParseOutcome::Failure(vec![Issue::root("From first pass")]))
		.expect("first gate open");
	pool.run_until_stalled();
	assert_eq!(get_all_errors(&form), ["From first pass"]);
	assert!(!form.is_validating().get());
}

#[test]
fn test_late_success_clears_an_earlier_failure() {
	let (first_tx, first_rx) = oneshot::channel();
	let (second_tx, second_rx) = oneshot::channel();
	let form = gated_form(vec![first_rx, second_rx]);

	let mut pool = LocalPool::new();
	let spawner = pool.spawner();
	for _ in 0..2 {
		let form = form.clone();
		spawner
			.spawn_local(async move {
				validate_form_input(&form, ValidateOptions::default()).await;
			})
			.expect("spawn validation");
	}
	pool.run_until_stalled();

	first_tx
		.send(ParseOutcome::Failure(vec![Issue::root("Stale failure")]))
		.expect("first gate open");
	pool.run_until_stalled();
	assert_eq!(get_all_errors(&form), ["Stale failure"]);

	second_tx
		.send(ParseOutcome::Success(json!({ "name": "x" })))
		.expect("second gate open");
	pool.run_until_stalled();
	assert!(get_all_errors(&form).is_empty());
	assert!(!form.is_validating().get());
}
