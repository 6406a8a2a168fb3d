//! Polling step recognition and next-form selection.

// self
use crate::model::{
	ActionTemplate, CANCEL_KIND, FormModel, POLL_KIND, REDIRECT_KIND, Representation, StepType,
};

/// Status reported by a polling step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PollingStatus {
	/// Work is still in progress.
	Pending,
	/// Work completed.
	Done,
	/// Work failed.
	Failed,
	/// Missing or unrecognized status.
	Unknown,
}
impl PollingStatus {
	/// Maps a raw `status` property.
	pub fn from_wire(raw: Option<&str>) -> Self {
		match raw {
			Some("pending") => Self::Pending,
			Some("done") => Self::Done,
			Some("failed") => Self::Failed,
			_ => Self::Unknown,
		}
	}
}

/// A polling step.
#[derive(Clone, Debug, PartialEq)]
pub struct PollingStep {
	/// Status parsed from `properties["status"]`.
	pub status: PollingStatus,
	/// Underlying document.
	pub representation: Representation,
}
impl PollingStep {
	/// Matches polling-step representations.
	pub fn from_representation(representation: &Representation) -> Option<Self> {
		if representation.step_type != StepType::PollingStep {
			return None;
		}

		Some(Self {
			status: PollingStatus::from_wire(representation.property_str("status")),
			representation: representation.clone(),
		})
	}

	/// Form that re-queries the step.
	pub fn poll_form(&self) -> Option<&FormModel> {
		self.representation.form_of_kind(POLL_KIND)
	}

	/// Form that cancels the step.
	pub fn cancel_form(&self) -> Option<&FormModel> {
		self.representation.form_of_kind(CANCEL_KIND)
	}

	/// Form to follow once the step settled: the redirect-kind form, else the sole form action.
	///
	/// Only form-templated actions are counted for the sole-form fallback.
	pub fn next_form(&self) -> Option<&FormModel> {
		if let Some(redirect) = self.representation.form_of_kind(REDIRECT_KIND) {
			return Some(redirect);
		}

		let mut forms = self
			.representation
			.actions
			.iter()
			.filter(|action| action.template() == ActionTemplate::Form)
			.filter_map(|action| action.as_form());

		match (forms.next(), forms.next()) {
			(Some(form), None) => Some(form),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn polling(status: &str, actions: &str) -> PollingStep {
		let representation = Representation::parse(
			format!(r#"{{"type":"polling-step","properties":{{"status":"{status}"}},"actions":[{actions}]}}"#)
				.as_bytes(),
		)
		.expect("Polling fixture should parse.");

		PollingStep::from_representation(&representation).expect("Polling steps should match.")
	}

	fn form(kind: &str, href: &str) -> String {
		format!(r#"{{"template":"form","kind":"{kind}","model":{{"href":"{href}","method":"GET"}}}}"#)
	}

	#[test]
	fn status_mapping_is_exact() {
		assert_eq!(PollingStatus::from_wire(Some("pending")), PollingStatus::Pending);
		assert_eq!(PollingStatus::from_wire(Some("done")), PollingStatus::Done);
		assert_eq!(PollingStatus::from_wire(Some("failed")), PollingStatus::Failed);
		assert_eq!(PollingStatus::from_wire(Some("Done")), PollingStatus::Unknown);
		assert_eq!(PollingStatus::from_wire(None), PollingStatus::Unknown);
		assert_eq!(polling("waiting", "").status, PollingStatus::Unknown);
	}

	#[test]
	fn redirect_form_wins_over_other_forms() {
		let step = polling(
			"done",
			&format!("{},{}", form("cancel", "/authn/cancel"), form("redirect", "/authn/done")),
		);

		assert_eq!(step.next_form().map(|f| f.href.as_str()), Some("/authn/done"));
		assert_eq!(step.cancel_form().map(|f| f.href.as_str()), Some("/authn/cancel"));
	}

	#[test]
	fn sole_form_is_used_without_redirect() {
		let step = polling("failed", &form("continue", "/authn/failed"));

		assert_eq!(step.next_form().map(|f| f.href.as_str()), Some("/authn/failed"));
	}

	#[test]
	fn several_forms_without_redirect_yield_none() {
		let step = polling("done", &format!("{},{}", form("poll", "/p"), form("cancel", "/c")));

		assert!(step.next_form().is_none());
		assert_eq!(step.poll_form().map(|f| f.href.as_str()), Some("/p"));
	}
}
