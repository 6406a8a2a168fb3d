//! Redirection step recognition.

// self
use crate::model::{FormModel, Representation, StepType};

/// A redirection step: exactly one redirect-kind form action.
#[derive(Clone, Copy, Debug)]
pub struct RedirectionStep<'a> {
	form: &'a FormModel,
}
impl<'a> RedirectionStep<'a> {
	/// Matches the representation strictly; any other shape yields `None`.
	pub fn from_representation(representation: &'a Representation) -> Option<Self> {
		if representation.step_type != StepType::RedirectionStep {
			return None;
		}

		let [action] = representation.actions.as_slice() else {
			return None;
		};

		if !action.is_redirect_form() {
			return None;
		}

		action.as_form().map(|form| Self { form })
	}

	/// The form to submit.
	pub fn form(&self) -> &'a FormModel {
		self.form
	}
}
