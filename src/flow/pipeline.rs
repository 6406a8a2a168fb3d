//! Request/commit pipeline shared by every controller operation.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	flow::{
		Dispatch, FlowContent, FlowController, FlowState, MAX_CHAINED_STEPS,
		processing::{ProcessingGuard, Session},
		request::StepRequest,
	},
	http::{HttpResponse, StepHttpClient, TransportErrorMapper},
	model::{Action, FormModel, Representation, StepType},
	obs::Operation,
	operation::{ClientOperationHandler, OperationOutcome},
	profile::Profile,
	step::{AuthorizationResponse, PollingStatus, PollingStep, Problem, ProblemKind, RedirectionStep},
};

/// Work item of the pipeline loop.
pub(crate) enum Step {
	/// Issue a request and interpret its response.
	Fetch {
		request: StepRequest,
		/// Continuation actions used if the server answers with continue-same-step.
		continuations: Vec<Action>,
	},
	/// Exchange an authorization code.
	Exchange { code: String },
	/// Process out-of-band continuation actions.
	Continue { actions: Vec<Action> },
}

enum Transition {
	Follow(Step),
	Commit(Commit),
}

struct Commit {
	state: FlowState,
	operation: Option<Arc<dyn ClientOperationHandler>>,
}
impl Commit {
	fn state(state: FlowState) -> Self {
		Self { state, operation: None }
	}

	fn error(error: Error) -> Self {
		Self::state(FlowState::SystemError(error.into()))
	}
}

enum Committed {
	Done(FlowState),
	Continue(Vec<Action>),
}

impl<C, M> FlowController<C, M>
where
	C: ?Sized + StepHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Runs steps until one commits, following automatic steps up to [`MAX_CHAINED_STEPS`].
	pub(super) async fn drive(
		&self,
		operation: Operation,
		guard: &mut ProcessingGuard,
		mut step: Step,
	) -> Dispatch {
		let Some(session) = guard.session() else {
			return self.fail(guard, ConfigError::NoActiveProfile.into());
		};

		for _ in 0..MAX_CHAINED_STEPS {
			let transition = match self.advance(operation, guard, &session, step).await {
				Ok(transition) => transition,
				Err(Error::IllegalReset) => return Dispatch::Reset,
				Err(e) => Transition::Commit(Commit::error(e)),
			};

			step = match transition {
				Transition::Follow(next) => next,
				Transition::Commit(commit) => match self.commit(guard, commit).await {
					Ok(Committed::Done(state)) => return Dispatch::Committed(state),
					Ok(Committed::Continue(actions)) => Step::Continue { actions },
					Err(_) => return Dispatch::Reset,
				},
			};
		}

		self.fail(guard, Error::RedirectLimit { limit: MAX_CHAINED_STEPS })
	}

	/// Commits a system error without starting any client operation.
	pub(super) fn fail(&self, guard: &mut ProcessingGuard, error: Error) -> Dispatch {
		let state = FlowState::SystemError(error.into());

		match self.apply(guard, &state, None, &OperationOutcome::Finished) {
			Ok(()) => Dispatch::Committed(state),
			Err(_) => Dispatch::Reset,
		}
	}

	async fn advance(
		&self,
		operation: Operation,
		guard: &ProcessingGuard,
		session: &Session,
		step: Step,
	) -> Result<Transition> {
		match step {
			Step::Fetch { request, continuations } => {
				let fetched = self.fetch(operation, request).await;

				ensure_current(guard)?;

				self.select_transition(session, fetched?, continuations)
			},
			Step::Exchange { code } => {
				let tokens = self.exchange(guard.generation(), session, &code).await;

				ensure_current(guard)?;

				Ok(Transition::Commit(Commit::state(FlowState::AccessToken(tokens?))))
			},
			Step::Continue { actions } => self.continue_actions(session, actions),
		}
	}

	async fn fetch(&self, operation: Operation, request: StepRequest) -> Result<Representation> {
		let request = request.into_http()?;
		let response = self
			.http_client
			.execute(request)
			.await
			.map_err(|e| self.transport_mapper.map_transport_error(operation, e))?;

		interpret(&response)
	}

	fn select_transition(
		&self,
		session: &Session,
		representation: Representation,
		continuations: Vec<Action>,
	) -> Result<Transition> {
		let profile = &session.profile;

		if let Some(problem) = Problem::classify(&representation) {
			if matches!(problem.kind, ProblemKind::Authorization { .. }) {
				return Ok(Transition::Commit(Commit::error(Error::Problem(Box::new(problem)))));
			}

			let operation = self.operations.select_operation(&problem.representation.actions, profile);

			return Ok(Transition::Commit(Commit { state: FlowState::Problem(problem), operation }));
		}
		if representation.step_type == StepType::ContinueSameStep {
			return self.continue_same_step(session, continuations);
		}
		if profile.follow_redirects {
			if let Some(redirect) = RedirectionStep::from_representation(&representation) {
				return Ok(Transition::Follow(form_step(profile, redirect.form())?));
			}
			if let Some(polling) = PollingStep::from_representation(&representation) {
				if matches!(polling.status, PollingStatus::Pending | PollingStatus::Unknown) {
					return Ok(Transition::Commit(Commit::state(FlowState::Polling(polling))));
				}

				return match polling.next_form() {
					Some(form) => Ok(Transition::Follow(form_step(profile, form)?)),
					None => Ok(Transition::Commit(self.next(profile, representation))),
				};
			}
		}
		if let Some(response) = AuthorizationResponse::from_representation(&representation) {
			return Ok(if profile.follow_redirects {
				Transition::Follow(Step::Exchange { code: response.code })
			} else {
				Transition::Commit(Commit::state(FlowState::AuthorizationResponse(response.code)))
			});
		}
		if let Some(polling) = PollingStep::from_representation(&representation) {
			return Ok(Transition::Commit(Commit::state(FlowState::Polling(polling))));
		}

		Ok(Transition::Commit(self.next(profile, representation)))
	}

	fn continue_actions(&self, session: &Session, actions: Vec<Action>) -> Result<Transition> {
		let redirect = match actions.as_slice() {
			[action] if session.profile.follow_redirects && action.is_redirect_form() =>
				action.as_form(),
			_ => None,
		};

		if let Some(form) = redirect {
			return Ok(Transition::Follow(form_step(&session.profile, form)?));
		}

		self.continue_same_step(session, actions)
	}

	fn continue_same_step(&self, session: &Session, actions: Vec<Action>) -> Result<Transition> {
		let representation =
			self.inner.lock().state.representation().cloned().ok_or(Error::NoCurrentState)?;
		let operation = self.operations.select_operation(&actions, &session.profile);

		Ok(Transition::Commit(Commit {
			state: FlowState::Next(FlowContent { representation, actions }),
			operation,
		}))
	}

	fn next(&self, profile: &Profile, representation: Representation) -> Commit {
		let operation = self.operations.select_operation(&representation.actions, profile);

		Commit { state: FlowState::Next(FlowContent::new(representation)), operation }
	}

	/// Starts the commit's client operation, then applies the state.
	async fn commit(&self, guard: &mut ProcessingGuard, commit: Commit) -> Result<Committed> {
		let Commit { state, operation } = commit;
		let outcome = match &operation {
			Some(handler) => handler.start(self.redirector.as_ref()).await,
			None => OperationOutcome::Finished,
		};

		self.apply(guard, &state, operation, &outcome)?;

		Ok(match outcome {
			OperationOutcome::Continue(actions) => Committed::Continue(actions),
			OperationOutcome::Finished | OperationOutcome::AwaitExternal => Committed::Done(state),
		})
	}

	/// The single state mutation point; observers are notified only on change.
	fn apply(
		&self,
		guard: &mut ProcessingGuard,
		state: &FlowState,
		operation: Option<Arc<dyn ClientOperationHandler>>,
		outcome: &OperationOutcome,
	) -> Result<()> {
		let changed = {
			let mut inner = self.inner.lock();

			if inner.generation != guard.generation() {
				return Err(Error::IllegalReset);
			}

			let awaiting = matches!(outcome, OperationOutcome::AwaitExternal);

			if awaiting {
				guard.hold();
			}

			inner.client_operation = operation;
			inner.awaiting_external = awaiting;

			let changed = inner.state != *state;

			inner.state = state.clone();

			changed
		};

		if changed {
			self.notify(state);
		}

		Ok(())
	}
}

fn ensure_current(guard: &ProcessingGuard) -> Result<()> {
	if guard.is_current() { Ok(()) } else { Err(Error::IllegalReset) }
}

fn form_step(profile: &Profile, form: &FormModel) -> Result<Step, ConfigError> {
	Ok(Step::Fetch {
		request: StepRequest::form(profile, form, &BTreeMap::new())?,
		continuations: form.continue_actions.clone(),
	})
}

/// Maps a step response to a representation.
///
/// Problem documents are honored whatever the status; any other non-success response is a
/// server error.
fn interpret(response: &HttpResponse) -> Result<Representation> {
	let status = response.status();
	let body = response.body();

	if body.is_empty() {
		return Err(if status.is_success() {
			Error::NoResponseBody
		} else {
			Error::ServerError { status: status.as_u16() }
		});
	}
	if status.is_success() {
		return Ok(Representation::parse(body)?);
	}

	match Representation::parse(body) {
		Ok(representation) if representation.step_type.is_problem() => Ok(representation),
		_ => Err(Error::ServerError { status: status.as_u16() }),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::StatusCode;
	// self
	use super::*;

	fn response(status: u16, body: &str) -> HttpResponse {
		let mut response = HttpResponse::new(body.as_bytes().to_vec());

		*response.status_mut() = StatusCode::from_u16(status).expect("Status fixture is valid.");

		response
	}

	#[test]
	fn empty_bodies_depend_on_status() {
		assert!(matches!(interpret(&response(200, "")), Err(Error::NoResponseBody)));
		assert!(matches!(interpret(&response(503, "")), Err(Error::ServerError { status: 503 })));
	}

	#[test]
	fn problem_documents_survive_error_statuses() {
		let representation = interpret(&response(
			400,
			r#"{"type":"https://curity.se/problems/invalid-input","invalidFields":[]}"#,
		))
		.expect("Problem documents should be honored on 400.");

		assert!(representation.step_type.is_problem());
		assert!(matches!(
			interpret(&response(500, r#"{"type":"authentication-step"}"#)),
			Err(Error::ServerError { status: 500 })
		));
		assert!(matches!(interpret(&response(502, "<html>")), Err(Error::ServerError { status: 502 })));
	}

	#[test]
	fn malformed_success_bodies_are_decoding_errors() {
		assert!(matches!(interpret(&response(200, "{")), Err(Error::Decoding(_))));
	}
}
