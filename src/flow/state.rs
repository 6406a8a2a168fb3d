//! Observable flow states.

// self
use crate::{
	_prelude::*,
	error::ErrorKind,
	model::{Action, Representation},
	step::{PollingStep, Problem},
	token::TokenSet,
};

/// Observable state of one flow.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum FlowState {
	/// No flow is running.
	#[default]
	None,
	/// The flow failed; see the wrapped error.
	SystemError(FlowError),
	/// A step waiting for user input.
	Next(FlowContent),
	/// A server problem; invalid-input problems keep the flow alive.
	Problem(Problem),
	/// Authorization code waiting for an explicit exchange.
	AuthorizationResponse(String),
	/// Tokens obtained from the exchange.
	AccessToken(TokenSet),
	/// Server-side work in progress.
	Polling(PollingStep),
}
impl FlowState {
	/// Representation that continue-same-step responses re-render.
	pub fn representation(&self) -> Option<&Representation> {
		match self {
			Self::Next(content) => Some(&content.representation),
			Self::Polling(step) => Some(&step.representation),
			Self::Problem(problem) => Some(&problem.representation),
			_ => None,
		}
	}

	/// Returns the wrapped error for [`FlowState::SystemError`].
	pub fn error(&self) -> Option<&Error> {
		match self {
			Self::SystemError(error) => Some(error.error()),
			_ => None,
		}
	}

	/// Returns `true` for [`FlowState::None`].
	pub fn is_none(&self) -> bool {
		matches!(self, Self::None)
	}
}

/// A step shown to the user together with its active actions.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowContent {
	/// Step document.
	pub representation: Representation,
	/// Active actions; continuation actions after a continue-same-step response.
	pub actions: Vec<Action>,
}
impl FlowContent {
	/// Wraps a representation with its own actions.
	pub fn new(representation: Representation) -> Self {
		let actions = representation.actions.clone();

		Self { representation, actions }
	}
}

/// Shared error payload of [`FlowState::SystemError`].
///
/// Equality compares the error kind and rendered message.
#[derive(Clone, Debug)]
pub struct FlowError(Arc<Error>);
impl FlowError {
	/// Borrows the underlying error.
	pub fn error(&self) -> &Error {
		&self.0
	}

	/// Stable error category.
	pub fn kind(&self) -> ErrorKind {
		self.0.kind()
	}
}
impl From<Error> for FlowError {
	fn from(error: Error) -> Self {
		Self(Arc::new(error))
	}
}
impl PartialEq for FlowError {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
			|| (self.kind() == other.kind() && self.0.to_string() == other.0.to_string())
	}
}
impl Display for FlowError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Display::fmt(&self.0, f)
	}
}
