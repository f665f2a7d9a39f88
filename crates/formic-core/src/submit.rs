//! Submission
//!
//! `handle_submit` is the whole submit flow: flag the form as
//! submitting, validate with focus-on-error, hand the parsed output to
//! the author's handler, and surface a handler failure as a single
//! form-level error. The submitting flag clears on every path out.

use crate::store::FormStore;
use crate::validate::{validate_form_input, ValidateOptions};
use formic_reactive::batch;
use serde_json::Value;
use std::future::Future;
use tracing::debug;

/// Root error used when a failing handler has no message of its own
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error has occurred.";

/// Run the submit flow for one submission event
///
/// The handler only runs when validation succeeds; it receives the
/// parsed output. A handler error is written as the sole form-level
/// error, replacing whatever was there.
///
/// # Examples
///
/// ```ignore
/// handle_submit(&form, |output| async move {
///     api.save(output).await?;
///     Ok(())
/// })
/// .await;
/// ```
pub async fn handle_submit<H, F>(form: &FormStore, handler: H)
where
	H: FnOnce(Value) -> F,
	F: Future<Output = anyhow::Result<()>>,
{
	batch(|| {
		form.is_submitted.set(true);
		form.is_submitting.set(true);
	});
	let output = validate_form_input(form, ValidateOptions { should_focus: true }).await;
	if let Some(output) = output {
		if let Err(error) = handler(output).await {
			let mut message = error.to_string();
			if message.is_empty() {
				message = UNKNOWN_ERROR_MESSAGE.to_string();
			}
			debug!(%message, "submit handler failed");
			form.root.errors.set(Some(vec![message]));
		}
	}
	form.is_submitting.set(false);
}
