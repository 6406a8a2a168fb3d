//! Flow controller: the state machine that drives one hypermedia login.
//!
//! [`FlowController`] owns the observable [`FlowState`] and a single processing flag.
//! Every public operation takes the flag, runs the request/commit pipeline, and resolves
//! to a [`Dispatch`] describing what happened. Calls arriving while the flag is set are
//! dropped with [`Dispatch::Busy`]. Each run remembers the session generation it started
//! in, and a completion that arrives after [`FlowController::reset`] is discarded with
//! [`Dispatch::Reset`] instead of touching the state.

pub mod state;

mod authorize;
mod pipeline;
mod processing;
mod request;
mod token;

pub use request::HAAPI_MEDIA_TYPE;
pub use state::*;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::{StepHttpClient, TransportErrorMapper},
	model::{Action, FormModel, Link},
	obs::{self, Operation, Outcome, StepSpan},
	operation::{ClientOperationRegistry, ExternalRedirector},
	profile::Profile,
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};
use authorize::PkcePair;
use pipeline::Step;
use processing::{ControllerInner, ProcessingGuard, Session};
use request::StepRequest;

/// Longest chain of automatic steps followed by one operation.
pub const MAX_CHAINED_STEPS: usize = 32;

#[cfg(feature = "reqwest")]
/// Controller specialized for the crate's default reqwest transport stack.
pub type ReqwestFlowController = FlowController<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Callback invoked after every observable state change.
pub type Observer = Arc<dyn Fn(&FlowState) + Send + Sync>;

/// Result of one controller call.
#[derive(Clone, Debug, PartialEq)]
pub enum Dispatch {
	/// The call committed this state.
	Committed(FlowState),
	/// Another operation was in flight; nothing happened.
	Busy,
	/// The input was rejected without a state change.
	Ignored,
	/// The flow was reset while the call was in flight; its result was discarded.
	Reset,
}
impl Dispatch {
	/// Committed state, if any.
	pub fn state(&self) -> Option<&FlowState> {
		match self {
			Self::Committed(state) => Some(state),
			_ => None,
		}
	}

	/// Consumes the dispatch and returns the committed state, if any.
	pub fn into_state(self) -> Option<FlowState> {
		match self {
			Self::Committed(state) => Some(state),
			_ => None,
		}
	}

	fn outcome(&self) -> Outcome {
		match self {
			Self::Committed(FlowState::SystemError(_)) => Outcome::Failure,
			Self::Committed(_) => Outcome::Success,
			Self::Busy => Outcome::Busy,
			Self::Ignored | Self::Reset => Outcome::Discarded,
		}
	}
}

/// Handle returned by [`FlowController::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Observers {
	next_id: AtomicU64,
	entries: Mutex<BTreeMap<SubscriptionId, Observer>>,
}

/// Drives one hypermedia authentication flow.
///
/// Clones share the same state, so a clone can be moved into a task while another clone
/// observes or resets the flow. Transports plug in through [`StepHttpClient`] and platform
/// side channels through [`ExternalRedirector`] and the [`ClientOperationRegistry`].
pub struct FlowController<C, M>
where
	C: ?Sized + StepHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client used for every outbound request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before they reach the state.
	pub transport_mapper: Arc<M>,
	/// Platform seam used by client operations.
	pub redirector: Arc<dyn ExternalRedirector>,
	/// Client operations the controller can dispatch.
	pub operations: Arc<ClientOperationRegistry>,
	inner: Arc<Mutex<ControllerInner>>,
	observers: Arc<Observers>,
}
impl<C, M> FlowController<C, M>
where
	C: ?Sized + StepHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a controller that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
		redirector: Arc<dyn ExternalRedirector>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			redirector,
			operations: Arc::new(ClientOperationRegistry::default()),
			inner: Default::default(),
			observers: Default::default(),
		}
	}

	/// Replaces the client operation registry.
	pub fn with_operations(mut self, operations: ClientOperationRegistry) -> Self {
		self.operations = Arc::new(operations);

		self
	}

	/// Current state.
	pub fn state(&self) -> FlowState {
		self.inner.lock().state.clone()
	}

	/// Returns `true` while an operation owns the processing flag.
	pub fn is_processing(&self) -> bool {
		self.inner.lock().processing
	}

	/// Returns `true` while a client operation waits for external input.
	pub fn is_awaiting_external(&self) -> bool {
		self.inner.lock().awaiting_external
	}

	/// Profile of the running flow.
	pub fn profile(&self) -> Option<Profile> {
		self.inner.lock().session.as_ref().map(|session| session.profile.clone())
	}

	/// Registers an observer notified after every state change.
	///
	/// Observers run on the task that committed the state, after the controller's lock is
	/// released, so they may call back into the controller.
	pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
	where
		F: 'static + Fn(&FlowState) + Send + Sync,
	{
		let id = SubscriptionId(self.observers.next_id.fetch_add(1, Ordering::Relaxed));

		self.observers.entries.lock().insert(id, Arc::new(observer));

		id
	}

	/// Removes an observer; returns `false` when the id is unknown.
	pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
		self.observers.entries.lock().remove(&id).is_some()
	}

	/// Tears down the running flow and commits [`FlowState::None`].
	///
	/// Aborts a pending token exchange, drops the active client operation and profile, and
	/// clears the processing flag. In-flight requests finish on their own and are discarded.
	/// Calling it repeatedly has no further effect.
	pub fn reset(&self) {
		let changed = {
			let mut inner = self.inner.lock();

			inner.invalidate();

			let changed = !inner.state.is_none();

			inner.state = FlowState::None;

			changed
		};

		if changed {
			self.notify(&FlowState::None);
		}
	}

	/// Starts a flow with the authorization request described by `profile`.
	pub async fn start(&self, profile: Profile) -> Dispatch {
		const OPERATION: Operation = Operation::Start;

		self.run(OPERATION, "start", async move {
			let Some(mut guard) = ProcessingGuard::try_begin(&self.inner) else {
				return Dispatch::Busy;
			};

			if let Err(e) = profile.validate() {
				return self.fail(&mut guard, e.into());
			}

			let pkce = profile.use_pkce.then(PkcePair::generate);
			let request = authorize::authorization_request(&profile, pkce.as_ref());
			let session = Session { profile, pkce_verifier: pkce.map(|pkce| pkce.verifier) };

			if !guard.begin_session(session) {
				return Dispatch::Reset;
			}

			self.drive(OPERATION, &mut guard, Step::Fetch { request, continuations: Vec::new() })
				.await
		})
		.await
	}

	/// Submits `form`, with `overrides` replacing field defaults.
	pub async fn submit_form(
		&self,
		form: &FormModel,
		overrides: &BTreeMap<String, String>,
	) -> Dispatch {
		const OPERATION: Operation = Operation::SubmitForm;

		self.run(OPERATION, "submit_form", async move {
			let Some(mut guard) = ProcessingGuard::try_begin(&self.inner) else {
				return Dispatch::Busy;
			};

			self.submit(OPERATION, &mut guard, form, overrides).await
		})
		.await
	}

	/// Follows a link offered by the current step.
	pub async fn follow_link(&self, link: &Link) -> Dispatch {
		const OPERATION: Operation = Operation::FollowLink;

		self.run(OPERATION, "follow_link", async move {
			let Some(mut guard) = ProcessingGuard::try_begin(&self.inner) else {
				return Dispatch::Busy;
			};
			let Some(session) = guard.session() else {
				return self.fail(&mut guard, ConfigError::NoActiveProfile.into());
			};
			let request = match session.profile.resolve(&link.href) {
				Ok(url) => StepRequest::get(url),
				Err(e) => return self.fail(&mut guard, e.into()),
			};

			self.drive(OPERATION, &mut guard, Step::Fetch { request, continuations: Vec::new() })
				.await
		})
		.await
	}

	/// Processes actions selected out of band, such as a finished selector or operation.
	///
	/// A single redirect form is submitted when redirects are followed; anything else
	/// re-renders the current step with `actions` as its continuation actions. Without a
	/// running flow the call commits [`Error::NoCurrentState`].
	pub async fn handle_continue_actions(&self, actions: Vec<Action>) -> Dispatch {
		const OPERATION: Operation = Operation::ContinueActions;

		self.run(OPERATION, "handle_continue_actions", async move {
			let Some(mut guard) = ProcessingGuard::try_begin(&self.inner) else {
				return Dispatch::Busy;
			};

			if guard.session().is_none() {
				return self.fail(&mut guard, Error::NoCurrentState);
			}

			self.drive(OPERATION, &mut guard, Step::Continue { actions }).await
		})
		.await
	}

	/// Resubmits the poll form of the current polling step.
	pub async fn poll(&self) -> Dispatch {
		const OPERATION: Operation = Operation::Poll;

		self.run(OPERATION, "poll", async move {
			let Some(mut guard) = ProcessingGuard::try_begin(&self.inner) else {
				return Dispatch::Busy;
			};
			let form = match &self.inner.lock().state {
				FlowState::Polling(step) => step.poll_form().cloned(),
				_ => None,
			};
			let Some(form) = form else {
				obs::warn_event!("Poll requested without a pollable step.");

				return Dispatch::Ignored;
			};

			self.submit(OPERATION, &mut guard, &form, &BTreeMap::new()).await
		})
		.await
	}

	/// Delivers external input, usually the app's return URL, to the waiting client operation.
	///
	/// Input the operation rejects is logged and ignored; the operation keeps waiting.
	pub async fn resume_client_operation(&self, input: &Url) -> Dispatch {
		const OPERATION: Operation = Operation::ResumeClientOperation;

		self.run(OPERATION, "resume_client_operation", async move {
			let resumed = {
				let mut inner = self.inner.lock();
				let operation = match (&inner.client_operation, inner.awaiting_external) {
					(Some(operation), true) => operation.clone(),
					_ => {
						obs::warn_event!("No client operation is waiting for external input.");

						return Dispatch::Ignored;
					},
				};

				match operation.continue_operation(input) {
					Ok(continuation) =>
						(ProcessingGuard::adopt(&self.inner, &mut inner), continuation),
					Err(e) => {
						obs::warn_event!(
							"Client operation `{}` rejected external input: {e}",
							operation.name()
						);

						return Dispatch::Ignored;
					},
				}
			};
			let (mut guard, continuation) = resumed;

			self.submit(OPERATION, &mut guard, &continuation.form, &continuation.overrides).await
		})
		.await
	}

	/// Drops a client operation waiting for external input and releases the processing flag.
	///
	/// Returns `false` when no operation was waiting.
	pub fn abandon_client_operation(&self) -> bool {
		let mut inner = self.inner.lock();

		if !inner.awaiting_external {
			return false;
		}

		inner.awaiting_external = false;
		inner.client_operation = None;
		inner.processing = false;

		true
	}

	async fn submit(
		&self,
		operation: Operation,
		guard: &mut ProcessingGuard,
		form: &FormModel,
		overrides: &BTreeMap<String, String>,
	) -> Dispatch {
		let Some(session) = guard.session() else {
			return self.fail(guard, ConfigError::NoActiveProfile.into());
		};
		let request = match StepRequest::form(&session.profile, form, overrides) {
			Ok(request) => request,
			Err(e) => return self.fail(guard, e.into()),
		};

		let continuations = form.continue_actions.clone();

		self.drive(operation, guard, Step::Fetch { request, continuations }).await
	}

	async fn run<F>(&self, operation: Operation, stage: &'static str, fut: F) -> Dispatch
	where
		F: Future<Output = Dispatch>,
	{
		let span = StepSpan::new(operation, stage);

		obs::record_outcome(operation, Outcome::Attempt);

		let dispatch = span.instrument(fut).await;

		obs::record_outcome(operation, dispatch.outcome());

		dispatch
	}

	fn notify(&self, state: &FlowState) {
		let observers = self.observers.entries.lock().values().cloned().collect::<Vec<_>>();

		for observer in observers {
			observer(state);
		}
	}
}
#[cfg(feature = "reqwest")]
impl FlowController<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a controller backed by the default reqwest transport.
	pub fn new(redirector: Arc<dyn ExternalRedirector>) -> Self {
		Self::with_http_client(
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
			redirector,
		)
	}

	/// Creates a controller whose transport honors the profile's certificate policy.
	pub fn for_profile(
		profile: &Profile,
		redirector: Arc<dyn ExternalRedirector>,
	) -> Result<Self, ConfigError> {
		Ok(Self::with_http_client(
			ReqwestHttpClient::for_profile(profile)?,
			Arc::new(ReqwestTransportErrorMapper),
			redirector,
		))
	}
}
impl<C, M> Clone for FlowController<C, M>
where
	C: ?Sized + StepHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			redirector: self.redirector.clone(),
			operations: self.operations.clone(),
			inner: self.inner.clone(),
			observers: self.observers.clone(),
		}
	}
}
impl<C, M> Debug for FlowController<C, M>
where
	C: ?Sized + StepHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let inner = self.inner.lock();

		f.debug_struct("FlowController")
			.field("state", &inner.state)
			.field("processing", &inner.processing)
			.field("awaiting_external", &inner.awaiting_external)
			.field("operations", &self.operations)
			.finish()
	}
}
