//! System browser round trip (`external-browser-flow`).

// self
use crate::{
	_prelude::*,
	model::{ActionTemplate, ClientOperationModel, Field, FieldType},
	obs,
	operation::{
		ClientOperationHandler, ExternalRedirector, OperationContinuation, OperationError,
		OperationFuture, OperationOutcome,
	},
	profile::Profile,
};

/// Query parameter carrying the nonce back to the app.
pub const RESUME_NONCE_PARAM: &str = "_resume_nonce";

/// Opens `href` in a browser with the app's redirect URI and resumes from the return URL.
#[derive(Clone, Debug)]
pub struct ExternalBrowserOperation {
	model: ClientOperationModel,
	base_url: Url,
	redirect_uri: Url,
}
impl ExternalBrowserOperation {
	/// Registry name of the operation.
	pub const NAME: &'static str = "external-browser-flow";

	/// Creates a handler resolving hrefs and redirects through the profile.
	pub fn new(model: ClientOperationModel, profile: &Profile) -> Self {
		Self { model, base_url: profile.base_url.clone(), redirect_uri: profile.redirect_uri.clone() }
	}

	/// Browser URL with `redirect_uri` appended, when `href` resolves.
	pub fn browser_url(&self) -> Option<Url> {
		let href = self.model.argument("href")?;
		let mut url = self.base_url.join(href).ok()?;

		url.query_pairs_mut().append_pair("redirect_uri", self.redirect_uri.as_str());

		Some(url)
	}
}
impl ClientOperationHandler for ExternalBrowserOperation {
	fn model(&self) -> &ClientOperationModel {
		&self.model
	}

	fn start<'a>(
		&'a self,
		redirector: &'a dyn ExternalRedirector,
	) -> OperationFuture<'a, OperationOutcome> {
		Box::pin(async move {
			let Some(url) = self.browser_url() else {
				obs::warn_event!("Client operation `{}` has no usable href.", self.model.name);

				return OperationOutcome::Finished;
			};

			if redirector.open(&url).await {
				return OperationOutcome::AwaitExternal;
			}

			obs::warn_event!("Browser refused to open `{url}`.");

			if self.model.error_actions.is_empty() {
				OperationOutcome::Finished
			} else {
				OperationOutcome::Continue(self.model.error_actions.clone())
			}
		})
	}

	fn continue_operation(&self, input: &Url) -> Result<OperationContinuation, OperationError> {
		let nonce = input
			.query_pairs()
			.find(|(name, _)| name == RESUME_NONCE_PARAM)
			.map(|(_, value)| value.into_owned())
			.filter(|value| !value.is_empty())
			.ok_or(OperationError::MissingResumeNonce)?;
		let mut form = self
			.model
			.continue_actions
			.iter()
			.filter(|action| action.template() == ActionTemplate::Form)
			.find_map(|action| action.as_form())
			.cloned()
			.ok_or_else(|| OperationError::MissingContinuation { name: self.model.name.clone() })?;

		if form.field(RESUME_NONCE_PARAM).is_none() {
			form.fields.push(Field {
				name: RESUME_NONCE_PARAM.to_owned(),
				r#type: FieldType::Hidden,
				label: None,
				value: None,
				placeholder: None,
			});
		}

		Ok(OperationContinuation {
			form,
			overrides: BTreeMap::from([(RESUME_NONCE_PARAM.to_owned(), nonce)]),
		})
	}
}
