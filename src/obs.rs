//! Optional observability helpers for controller operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit structured spans named `haapi_flow.step` with the
//!   `operation` and `stage` fields, plus `warn` events for ambiguous or ignorable conditions
//!   such as multiple client operations or unconsumed form overrides.
//! - Enable `metrics` to increment the `haapi_flow_operation_total` counter for every
//!   attempt/success/failure/busy outcome, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

pub(crate) use tracing::warn_event;

// self
use crate::_prelude::*;

/// Controller operations observed by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Initial GET against the authorization endpoint.
	Start,
	/// Form submission.
	SubmitForm,
	/// Link navigation.
	FollowLink,
	/// Out-of-band continuation actions.
	ContinueActions,
	/// Resubmission of a polling step.
	Poll,
	/// External input delivered to a client operation.
	ResumeClientOperation,
	/// Authorization code exchange.
	AccessToken,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Start => "start",
			Operation::SubmitForm => "submit_form",
			Operation::FollowLink => "follow_link",
			Operation::ContinueActions => "continue_actions",
			Operation::Poll => "poll",
			Operation::ResumeClientOperation => "resume_client_operation",
			Operation::AccessToken => "access_token",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to a controller operation.
	Attempt,
	/// A non-error state was committed.
	Success,
	/// A system error was committed.
	Failure,
	/// The call was dropped because another operation was in flight.
	Busy,
	/// The completion was discarded or the input ignored.
	Discarded,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
			Outcome::Busy => "busy",
			Outcome::Discarded => "discarded",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
