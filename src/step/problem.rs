//! Problem classification.

// self
use crate::{
	_prelude::*,
	model::{InvalidField, ProblemType, Representation, StepType},
	obs,
};

/// Classified problem variants.
#[derive(Clone, Debug, PartialEq)]
pub enum ProblemKind {
	/// Any problem without a dedicated shape.
	Generic,
	/// Field-level validation failure; the flow continues on the same step.
	InvalidInput {
		/// Fields that failed validation.
		invalid_fields: Vec<InvalidField>,
	},
	/// OAuth error authorization response; always ends the flow.
	Authorization {
		/// OAuth `error` code.
		error: String,
		/// OAuth `error_description`.
		error_description: String,
	},
}

/// A server problem derived from a representation.
#[derive(Clone, Debug, PartialEq)]
pub struct Problem {
	/// Classified variant.
	pub kind: ProblemKind,
	/// Problem document; its actions and messages stay available for display.
	pub representation: Representation,
}
impl Problem {
	/// Classifies a representation, returning `None` when it is not a problem.
	///
	/// An error authorization response missing either `error` or `error_description` is
	/// dropped with a warning rather than classified.
	pub fn classify(representation: &Representation) -> Option<Self> {
		let StepType::Problem(problem_type) = &representation.step_type else {
			return None;
		};
		let kind = match problem_type {
			ProblemType::InvalidInput => ProblemKind::InvalidInput {
				invalid_fields: representation.invalid_fields.clone(),
			},
			ProblemType::ErrorAuthorizationResponse => {
				let error = representation.property_str("error");
				let description = representation
					.property_str("error_description")
					.or_else(|| representation.property_str("errorDescription"));
				let (Some(error), Some(description)) = (error, description) else {
					obs::warn_event!(
						"Dropping error authorization response without error and error_description."
					);

					return None;
				};

				ProblemKind::Authorization {
					error: error.to_owned(),
					error_description: description.to_owned(),
				}
			},
			ProblemType::IncorrectCredentials | ProblemType::Unexpected | ProblemType::Other(_) =>
				ProblemKind::Generic,
		};

		Some(Self { kind, representation: representation.clone() })
	}

	/// Returns `true` when the problem ends the flow.
	pub fn is_aborting(&self) -> bool {
		!matches!(self.kind, ProblemKind::InvalidInput { .. })
	}

	/// Invalid fields for invalid-input problems, empty otherwise.
	pub fn invalid_fields(&self) -> &[InvalidField] {
		match &self.kind {
			ProblemKind::InvalidInput { invalid_fields } => invalid_fields,
			_ => &[],
		}
	}
}
impl Display for Problem {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match (&self.kind, &self.representation.title) {
			(ProblemKind::Authorization { error, error_description }, _) =>
				write!(f, "{error}: {error_description}"),
			(_, Some(title)) => f.write_str(title),
			(_, None) => f.write_str(self.representation.step_type.as_str()),
		}
	}
}
