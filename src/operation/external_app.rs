//! External app launch (`bankid`).

// self
use crate::{
	_prelude::*,
	model::{Action, ClientOperationModel},
	obs,
	operation::{ClientOperationHandler, ExternalRedirector, OperationFuture, OperationOutcome},
};

/// Opens an external app and branches on whether the platform accepted the URL.
///
/// The app URL is the `href` argument when present, otherwise a `bankid:///` autostart URL
/// built from `autoStartToken`. Success selects the model's continue actions and failure
/// its error actions; an empty branch finishes the operation.
#[derive(Clone, Debug)]
pub struct ExternalAppOperation {
	model: ClientOperationModel,
}
impl ExternalAppOperation {
	/// Registry name of the operation.
	pub const NAME: &'static str = "bankid";

	/// Creates a handler for the provided model.
	pub fn new(model: ClientOperationModel) -> Self {
		Self { model }
	}

	/// URL that launches the app, when the arguments describe one.
	pub fn launch_url(&self) -> Option<Url> {
		if let Some(href) = self.model.argument("href") {
			return Url::parse(href).ok();
		}

		let token = self.model.argument("autoStartToken")?;
		let mut url = Url::parse("bankid:///").ok()?;

		url.query_pairs_mut().append_pair("autostarttoken", token).append_pair("redirect", "null");

		Some(url)
	}

	fn branch(actions: &[Action]) -> OperationOutcome {
		if actions.is_empty() {
			OperationOutcome::Finished
		} else {
			OperationOutcome::Continue(actions.to_vec())
		}
	}
}
impl ClientOperationHandler for ExternalAppOperation {
	fn model(&self) -> &ClientOperationModel {
		&self.model
	}

	fn start<'a>(
		&'a self,
		redirector: &'a dyn ExternalRedirector,
	) -> OperationFuture<'a, OperationOutcome> {
		Box::pin(async move {
			let opened = match self.launch_url() {
				Some(url) => redirector.open(&url).await,
				None => {
					obs::warn_event!("Client operation `{}` has no launchable URL.", self.model.name);

					false
				},
			};

			if opened {
				Self::branch(&self.model.continue_actions)
			} else {
				Self::branch(&self.model.error_actions)
			}
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicBool, Ordering};
	// self
	use super::*;
	use crate::model::Representation;

	#[derive(Debug)]
	struct FixedRedirector {
		accept: bool,
		opened: Mutex<Vec<Url>>,
	}
	impl ExternalRedirector for FixedRedirector {
		fn open<'a>(&'a self, url: &'a Url) -> OperationFuture<'a, bool> {
			self.opened.lock().push(url.clone());

			Box::pin(async move { self.accept })
		}
	}

	fn model(arguments: &str) -> ClientOperationModel {
		let representation = Representation::parse(
			format!(
				r#"{{"type":"authentication-step","actions":[{{"template":"client-operation","kind":"login",
				"model":{{"name":"bankid","arguments":{arguments},
				"continueActions":[{{"template":"form","kind":"redirect","model":{{"href":"/ok"}}}}],
				"errorActions":[{{"template":"form","kind":"redirect","model":{{"href":"/failed"}}}}]}}}}]}}"#
			)
			.as_bytes(),
		)
		.expect("Operation fixture should parse.");

		representation.actions[0]
			.as_client_operation()
			.cloned()
			.expect("Fixture should expose a client operation.")
	}

	fn first_href(outcome: OperationOutcome) -> String {
		let OperationOutcome::Continue(actions) = outcome else {
			panic!("Both branches carry actions.");
		};

		actions[0].as_form().map(|form| form.href.clone()).unwrap_or_default()
	}

	#[tokio::test]
	async fn accepted_launch_continues() {
		let redirector = FixedRedirector { accept: true, opened: Mutex::new(Vec::new()) };
		let operation = ExternalAppOperation::new(model(r#"{"autoStartToken":"tok-1"}"#));
		let outcome = operation.start(&redirector).await;

		assert_eq!(first_href(outcome), "/ok");
		assert_eq!(
			redirector.opened.lock()[0].as_str(),
			"bankid:///?autostarttoken=tok-1&redirect=null"
		);
	}

	#[tokio::test]
	async fn rejected_launch_takes_error_branch() {
		let redirector = FixedRedirector { accept: false, opened: Mutex::new(Vec::new()) };
		let operation = ExternalAppOperation::new(model(r#"{"href":"https://app.bankid.com/"}"#));

		assert_eq!(first_href(operation.start(&redirector).await), "/failed");
		assert_eq!(redirector.opened.lock()[0].as_str(), "https://app.bankid.com/");
	}

	#[tokio::test]
	async fn missing_url_skips_the_redirector() {
		#[derive(Debug)]
		struct Unreachable(AtomicBool);
		impl ExternalRedirector for Unreachable {
			fn open<'a>(&'a self, _: &'a Url) -> OperationFuture<'a, bool> {
				self.0.store(true, Ordering::SeqCst);

				Box::pin(async { true })
			}
		}

		let redirector = Unreachable(AtomicBool::new(false));
		let operation = ExternalAppOperation::new(model("{}"));

		assert_eq!(first_href(operation.start(&redirector).await), "/failed");
		assert!(!redirector.0.load(Ordering::SeqCst));
	}
}
