//! Validation
//!
//! Validation is one parse pass over the whole logical input. The
//! trigger table decides when a mutation causes a pass; the pass itself
//! clears the error tree and reapplies whatever issues come back.
//!
//! Concurrent passes are allowed: the `validators` counter keeps
//! `is_validating` true until the last one settles, and the last pass
//! to resolve owns the error tree. There is no cancellation.

use crate::access::{get_field_bool, get_field_input, walk_field_store};
use crate::store::{
	BoolField, FieldStore, FormStore, ValidationEvent, ValidationMode,
};
use formic_reactive::{batch, untrack};
use formic_schema::{ParseOutcome, PathItem, PathKey, PathKind};
use serde_json::Value;
use std::rc::Rc;
use tracing::{debug, trace};

/// Options for a validation pass
#[derive(Debug, Default, Clone, Copy)]
pub struct ValidateOptions {
	/// Move focus to the first errored field with a bound element
	pub should_focus: bool,
}

/// Decide whether `event` on `target` triggers a pass, and run it if so
///
/// The effective mode starts as `validate_on`; it degrades to
/// `revalidate_on` once the form has been submitted (submit mode) or
/// once the target subtree already carries errors (field-event modes).
/// A field thus validates lazily until it is wrong, then revalidates
/// eagerly.
pub async fn validate_if_required(
	form: &FormStore,
	target: &Rc<FieldStore>,
	event: ValidationEvent,
) {
	let effective = untrack(|| match form.validate_on {
		ValidationMode::Initial => form.revalidate_on.event(),
		ValidationMode::Submit => {
			if form.is_submitted.get() {
				form.revalidate_on.event()
			} else {
				ValidationEvent::Submit
			}
		}
		ValidationMode::Touch | ValidationMode::Input | ValidationMode::Change
		| ValidationMode::Blur => {
			if get_field_bool(target, BoolField::Errors) {
				form.revalidate_on.event()
			} else {
				match form.validate_on {
					ValidationMode::Touch => ValidationEvent::Touch,
					ValidationMode::Input => ValidationEvent::Input,
					ValidationMode::Change => ValidationEvent::Change,
					_ => ValidationEvent::Blur,
				}
			}
		}
	});
	if event == effective {
		validate_form_input(form, ValidateOptions::default()).await;
	} else {
		trace!(name = %target.name, ?event, ?effective, "skipping validation");
	}
}

/// Run one full validation pass
///
/// Returns the parsed output on success, `None` on failure. The error
/// tree is rewritten wholesale: every store starts the pass at `None`
/// and issues append in the order encountered.
pub async fn validate_form_input(form: &FormStore, options: ValidateOptions) -> Option<Value> {
	form.validators.set(form.validators.get() + 1);
	form.is_validating.set(true);

	let input = untrack(|| get_field_input(&form.root));
	let outcome = (form.parse)(input).await;

	let output = batch(|| {
		untrack(|| {
			walk_field_store(&form.root, &mut |store| store.errors.set(None));
			match outcome {
				ParseOutcome::Success(output) => Some(output),
				ParseOutcome::Failure(issues) => {
					debug!(issues = issues.len(), "validation failed");
					for issue in issues {
						let store = resolve_issue_store(&form.root, &issue.path);
						store.errors.update(|errors| match errors {
							Some(messages) => messages.push(issue.message.clone()),
							None => *errors = Some(vec![issue.message.clone()]),
						});
					}
					None
				}
			}
		})
	});

	if options.should_focus && output.is_none() {
		focus_first_error(&form.root);
	}

	let remaining = form.validators.get().saturating_sub(1);
	form.validators.set(remaining);
	form.is_validating.set(remaining > 0);
	output
}

/// Walk an issue path as far as the store tree can follow it
///
/// Accumulation stops at the first segment the tree cannot address —
/// unsupported path kinds, unknown keys, out-of-range indices — and the
/// issue attaches to the deepest store reached. An empty or fully
/// unwalkable path lands on the root.
fn resolve_issue_store(root: &Rc<FieldStore>, path: &[PathItem]) -> Rc<FieldStore> {
	let mut current = root.clone();
	for item in path {
		let next = match (item.kind, &item.key) {
			(PathKind::Object, PathKey::Key(key)) => {
				crate::access::child_at(&current, &crate::store::PathSegment::Key(key.clone()))
			}
			(PathKind::Array, PathKey::Index(index)) => {
				crate::access::child_at(&current, &crate::store::PathSegment::Index(*index))
			}
			_ => break,
		};
		match next {
			Ok(child) => current = child,
			Err(_) => break,
		}
	}
	current
}

/// Focus the first element of the first errored store, in tree order
fn focus_first_error(root: &Rc<FieldStore>) -> bool {
	if root.errors.get_untracked().is_some() {
		if let Some(element) = root.elements.borrow().first() {
			element.focus();
			return true;
		}
	}
	match &root.state {
		crate::store::FieldState::Value(_) => false,
		crate::store::FieldState::Object(state) => state
			.children
			.iter()
			.any(|(_, child)| focus_first_error(child)),
		crate::store::FieldState::Array(state) => {
			let children = state.children.borrow().clone();
			children.iter().any(focus_first_error)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::access::get_field_store;
	use crate::element::mock::MockElement;
	use crate::element::register_element;
	use crate::store::{Path, RevalidateMode};
	use crate::testing::{form_with, profile_form, reject_parse};
	use crate::{create_form_store, FormConfig};
	use formic_schema::Issue;
	use futures::executor::block_on;
	use rstest::rstest;
	use serde_json::json;

	#[test]
	fn test_success_clears_the_whole_tree() {
		let form = profile_form(Some(json!({ "name": "Jane", "emails": [] })));
		form.root().errors.set(Some(vec!["Old".to_string()]));
		let name = get_field_store(&form, &Path::of(["name"])).unwrap();
		name.errors.set(Some(vec!["Old".to_string()]));

		let output = block_on(validate_form_input(&form, ValidateOptions::default()));

		assert!(output.is_some());
		assert_eq!(form.root().errors.get(), None);
		assert_eq!(name.errors.get(), None);
		assert!(!form.is_validating().get());
	}

	#[test]
	fn test_nested_path_issue_lands_on_the_leaf() {
		let form = form_with(
			Some(json!({ "name": "", "emails": [] })),
			reject_parse(vec![Issue::at(
				vec![formic_schema::PathItem::key("name")],
				"Name is required",
			)]),
		);
		let output = block_on(validate_form_input(&form, ValidateOptions::default()));

		assert!(output.is_none());
		let name = get_field_store(&form, &Path::of(["name"])).unwrap();
		assert_eq!(name.errors.get(), Some(vec!["Name is required".to_string()]));
		assert_eq!(form.root().errors.get(), None);
	}

	#[test]
	fn test_issues_on_one_field_append_in_order() {
		let form = form_with(
			Some(json!({ "name": "", "emails": [] })),
			reject_parse(vec![
				Issue::at(vec![formic_schema::PathItem::key("name")], "Too short"),
				Issue::at(vec![formic_schema::PathItem::key("name")], "Bad characters"),
			]),
		);
		block_on(validate_form_input(&form, ValidateOptions::default()));

		let name = get_field_store(&form, &Path::of(["name"])).unwrap();
		assert_eq!(
			name.errors.get(),
			Some(vec!["Too short".to_string(), "Bad characters".to_string()])
		);
	}

	#[test]
	fn test_unwalkable_path_degrades_to_deepest_reached() {
		let form = form_with(
			Some(json!({ "name": "x", "emails": [{ "address": "a@x" }] })),
			reject_parse(vec![
				// map keys cannot be addressed, stops at `emails`
				Issue::at(
					vec![
						formic_schema::PathItem::key("emails"),
						formic_schema::PathItem {
							kind: formic_schema::PathKind::Map,
							key: formic_schema::PathKey::Other("k".to_string()),
						},
					],
					"Bad entry",
				),
				// out-of-range index stops at `emails` too
				Issue::at(
					vec![
						formic_schema::PathItem::key("emails"),
						formic_schema::PathItem::index(9),
					],
					"Missing",
				),
				Issue::root("Form broken"),
			]),
		);
		block_on(validate_form_input(&form, ValidateOptions::default()));

		let emails = get_field_store(&form, &Path::of(["emails"])).unwrap();
		assert_eq!(
			emails.errors.get(),
			Some(vec!["Bad entry".to_string(), "Missing".to_string()])
		);
		assert_eq!(
			form.root().errors.get(),
			Some(vec!["Form broken".to_string()])
		);
	}

	#[test]
	fn test_focus_goes_to_first_errored_element_in_tree_order() {
		let form = form_with(
			Some(json!({ "name": "", "emails": [{ "address": "" }] })),
			reject_parse(vec![
				Issue::at(
					vec![
						formic_schema::PathItem::key("emails"),
						formic_schema::PathItem::index(0),
						formic_schema::PathItem::key("address"),
					],
					"Required",
				),
				Issue::at(vec![formic_schema::PathItem::key("name")], "Required"),
			]),
		);
		let name = get_field_store(&form, &Path::of(["name"])).unwrap();
		let address = get_field_store(
			&form,
			&Path::of(["emails"]).child_index(0).child_key("address"),
		)
		.unwrap();
		let name_element = MockElement::new(None);
		let address_element = MockElement::new(None);
		register_element(&name, name_element.clone());
		register_element(&address, address_element.clone());

		block_on(validate_form_input(
			&form,
			ValidateOptions { should_focus: true },
		));

		// `name` precedes `emails` in schema order
		assert_eq!(name_element.focus_count.get(), 1);
		assert_eq!(address_element.focus_count.get(), 0);
	}

	#[rstest]
	#[case(ValidationMode::Blur, ValidationEvent::Blur, false, true)]
	#[case(ValidationMode::Blur, ValidationEvent::Input, false, false)]
	#[case(ValidationMode::Blur, ValidationEvent::Input, true, true)]
	#[case(ValidationMode::Blur, ValidationEvent::Blur, true, false)]
	#[case(ValidationMode::Touch, ValidationEvent::Touch, false, true)]
	#[case(ValidationMode::Touch, ValidationEvent::Input, true, true)]
	#[case(ValidationMode::Input, ValidationEvent::Input, false, true)]
	#[case(ValidationMode::Submit, ValidationEvent::Submit, false, true)]
	#[case(ValidationMode::Submit, ValidationEvent::Input, false, false)]
	#[case(ValidationMode::Initial, ValidationEvent::Input, false, true)]
	#[case(ValidationMode::Initial, ValidationEvent::Blur, false, false)]
	fn test_trigger_matrix(
		#[case] validate_on: ValidationMode,
		#[case] event: ValidationEvent,
		#[case] has_errors: bool,
		#[case] expect_validated: bool,
	) {
		// revalidate_on is `input` throughout
		let (parse, count) = crate::testing::counting_parse();
		let form = create_form_store(
			FormConfig::new(crate::testing::profile_schema(), parse)
				.with_validate_on(validate_on)
				.with_revalidate_on(RevalidateMode::Input)
				.with_initial_input(json!({ "name": "x", "emails": [] })),
		)
		.unwrap();
		let name = get_field_store(&form, &Path::of(["name"])).unwrap();
		if has_errors {
			name.errors.set(Some(vec!["Bad".to_string()]));
		}

		block_on(validate_if_required(&form, &name, event));

		assert_eq!(count.get() > 0, expect_validated);
	}

	#[test]
	fn test_submit_mode_revalidates_after_submission() {
		let (parse, count) = crate::testing::counting_parse();
		let form = create_form_store(
			FormConfig::new(crate::testing::profile_schema(), parse)
				.with_initial_input(json!({ "name": "x", "emails": [] })),
		)
		.unwrap();
		let name = get_field_store(&form, &Path::of(["name"])).unwrap();

		block_on(validate_if_required(&form, &name, ValidationEvent::Input));
		assert_eq!(count.get(), 0);

		form.is_submitted().set(true);
		block_on(validate_if_required(&form, &name, ValidationEvent::Input));
		assert_eq!(count.get(), 1);
	}
}
