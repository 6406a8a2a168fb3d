//! Client operations: platform side channels requested by the server.
//!
//! A step may carry one `client-operation` action (launch an external app, open the system
//! browser, run a platform authenticator). [`ClientOperationRegistry::select_operation`]
//! resolves that action to a [`ClientOperationHandler`] by name. The controller starts the
//! handler while committing the step and reacts to its [`OperationOutcome`]: finishing
//! releases the processing flag, continuation actions are processed right away, and
//! awaiting external input holds the flag until
//! [`FlowController::resume_client_operation`](crate::flow::FlowController::resume_client_operation)
//! delivers the return URL.

pub mod external_app;
pub mod external_browser;

pub use external_app::*;
pub use external_browser::*;

// self
use crate::{
	_prelude::*,
	model::{Action, ClientOperationModel, FormModel},
	obs,
	profile::Profile,
};

/// Boxed future returned by redirectors and operation handlers.
pub type OperationFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a + Send>>;

/// Factory that builds a handler for a matched client-operation model.
pub type OperationFactory =
	Arc<dyn Fn(&ClientOperationModel, &Profile) -> Arc<dyn ClientOperationHandler> + Send + Sync>;

/// Platform seam that opens URLs outside the flow (apps, system browser).
pub trait ExternalRedirector
where
	Self: 'static + Send + Sync,
{
	/// Opens the URL and resolves to `true` when the platform accepted it.
	fn open<'a>(&'a self, url: &'a Url) -> OperationFuture<'a, bool>;
}

/// Result of starting a client operation.
#[derive(Clone, Debug, PartialEq)]
pub enum OperationOutcome {
	/// The operation completed; the processing flag can be released.
	Finished,
	/// The operation selected continuation actions to process immediately.
	Continue(Vec<Action>),
	/// The operation waits for external input delivered through a resume call.
	AwaitExternal,
}
impl OperationOutcome {
	/// Returns `true` when the controller must keep its processing flag after the commit.
	pub fn remain_transitioning(&self) -> bool {
		!matches!(self, Self::Finished)
	}
}

/// Form submission produced by resuming a client operation.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationContinuation {
	/// Form to submit.
	pub form: FormModel,
	/// Parameters merged over the form's field defaults.
	pub overrides: BTreeMap<String, String>,
}

/// Reasons external input cannot resume an operation.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum OperationError {
	/// The return URL did not carry a non-empty `_resume_nonce`.
	#[error("Return URL does not carry a resume nonce.")]
	MissingResumeNonce,
	/// The operation has no form to submit the external input with.
	#[error("Client operation `{name}` has no continuation form.")]
	MissingContinuation {
		/// Operation name.
		name: String,
	},
	/// The operation does not accept external input.
	#[error("Client operation `{name}` does not accept external input.")]
	Unsupported {
		/// Operation name.
		name: String,
	},
}

/// A started or startable client operation.
pub trait ClientOperationHandler
where
	Self: 'static + Debug + Send + Sync,
{
	/// Model the handler was built from.
	fn model(&self) -> &ClientOperationModel;

	/// Performs the side-channel action. Resolves exactly once.
	fn start<'a>(
		&'a self,
		redirector: &'a dyn ExternalRedirector,
	) -> OperationFuture<'a, OperationOutcome>;

	/// Validates external input and names the form to submit with it.
	fn continue_operation(&self, input: &Url) -> Result<OperationContinuation, OperationError> {
		let _ = input;

		Err(OperationError::Unsupported { name: self.model().name.clone() })
	}

	/// Operation name.
	fn name(&self) -> &str {
		&self.model().name
	}
}

/// Name-keyed registry of client-operation factories.
#[derive(Clone)]
pub struct ClientOperationRegistry {
	factories: BTreeMap<String, OperationFactory>,
}
impl ClientOperationRegistry {
	/// Creates a registry without any handlers.
	pub fn empty() -> Self {
		Self { factories: BTreeMap::new() }
	}

	/// Registers or replaces the factory for `name`.
	pub fn register<F>(mut self, name: impl Into<String>, factory: F) -> Self
	where
		F: 'static + Fn(&ClientOperationModel, &Profile) -> Arc<dyn ClientOperationHandler> + Send + Sync,
	{
		self.factories.insert(name.into(), Arc::new(factory));

		self
	}

	/// Returns `true` when a factory is registered for `name`.
	pub fn contains(&self, name: &str) -> bool {
		self.factories.contains_key(name)
	}

	/// Resolves the single client operation in `actions`.
	///
	/// Several client operations in one list are ambiguous and yield `None`, as do names
	/// without a registered factory. Both cases only log a warning.
	pub fn select_operation(
		&self,
		actions: &[Action],
		profile: &Profile,
	) -> Option<Arc<dyn ClientOperationHandler>> {
		let mut operations = actions.iter().filter_map(Action::as_client_operation);
		let model = operations.next()?;

		if operations.next().is_some() {
			obs::warn_event!("Ignoring ambiguous step with more than one client operation.");

			return None;
		}

		let Some(factory) = self.factories.get(&model.name) else {
			obs::warn_event!("Client operation `{}` is not registered.", model.name);

			return None;
		};

		Some(factory(model, profile))
	}
}
impl Default for ClientOperationRegistry {
	fn default() -> Self {
		Self::empty()
			.register(ExternalAppOperation::NAME, |model, _| {
				Arc::new(ExternalAppOperation::new(model.clone()))
			})
			.register(ExternalBrowserOperation::NAME, |model, profile| {
				Arc::new(ExternalBrowserOperation::new(model.clone(), profile))
			})
	}
}
impl Debug for ClientOperationRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientOperationRegistry")
			.field("operations", &self.factories.keys().collect::<Vec<_>>())
			.finish()
	}
}
