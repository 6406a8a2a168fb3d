//! Parsed hypermedia documents and their step types.

// self
use crate::{
	_prelude::*,
	model::{
		Action, DecodingError, FormModel,
		action::{WireAction, decode_actions},
		decode_json,
	},
};

/// URI prefix shared by every problem step type.
pub const PROBLEM_PREFIX: &str = "https://curity.se/problems/";
/// Problem type for rejected credentials.
pub const INCORRECT_CREDENTIALS: &str = "https://curity.se/problems/incorrect-credentials";
/// Problem type for field-level validation failures.
pub const INVALID_INPUT: &str = "https://curity.se/problems/invalid-input";
/// Problem type for unexpected server conditions.
pub const UNEXPECTED: &str = "https://curity.se/problems/unexpected";
/// Problem type for OAuth error authorization responses.
pub const ERROR_AUTHORIZATION_RESPONSE: &str =
	"https://curity.se/problems/error-authorization-response";

/// Step kind of a representation, computed once from the `type` field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StepType {
	/// Regular authentication step.
	AuthenticationStep,
	/// Registration step, rendered like an authentication step.
	RegistrationStep,
	/// Re-render the current step with the carried continuation actions.
	ContinueSameStep,
	/// Step that must be answered by submitting its single redirect form.
	RedirectionStep,
	/// User consent step.
	UserConsentStep,
	/// Terminal step carrying the authorization code.
	OAuthAuthorizationResponse,
	/// Server-side asynchronous work in progress.
	PollingStep,
	/// Problem document.
	Problem(ProblemType),
	/// Any other type string.
	Unknown(String),
}
impl StepType {
	/// Classifies a raw `type` value.
	pub fn from_wire(raw: &str) -> Self {
		match raw {
			"authentication-step" => Self::AuthenticationStep,
			"registration-step" => Self::RegistrationStep,
			"continue-same-step" => Self::ContinueSameStep,
			"redirection-step" => Self::RedirectionStep,
			"user-consent-step" => Self::UserConsentStep,
			"oauth-authorization-response" => Self::OAuthAuthorizationResponse,
			"polling-step" => Self::PollingStep,
			other if other.starts_with(PROBLEM_PREFIX) =>
				Self::Problem(ProblemType::from_wire(other)),
			other => Self::Unknown(other.to_owned()),
		}
	}

	/// Returns the wire value of the step type.
	pub fn as_str(&self) -> &str {
		match self {
			Self::AuthenticationStep => "authentication-step",
			Self::RegistrationStep => "registration-step",
			Self::ContinueSameStep => "continue-same-step",
			Self::RedirectionStep => "redirection-step",
			Self::UserConsentStep => "user-consent-step",
			Self::OAuthAuthorizationResponse => "oauth-authorization-response",
			Self::PollingStep => "polling-step",
			Self::Problem(problem) => problem.as_str(),
			Self::Unknown(raw) => raw,
		}
	}

	/// Returns `true` for problem documents.
	pub fn is_problem(&self) -> bool {
		matches!(self, Self::Problem(_))
	}
}
impl Display for StepType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Problem step types.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ProblemType {
	/// Credentials were rejected.
	IncorrectCredentials,
	/// One or more fields failed validation.
	InvalidInput,
	/// The server hit an unexpected condition.
	Unexpected,
	/// OAuth error authorization response.
	ErrorAuthorizationResponse,
	/// Any other problem URI.
	Other(String),
}
impl ProblemType {
	fn from_wire(raw: &str) -> Self {
		match raw {
			INCORRECT_CREDENTIALS => Self::IncorrectCredentials,
			INVALID_INPUT => Self::InvalidInput,
			UNEXPECTED => Self::Unexpected,
			ERROR_AUTHORIZATION_RESPONSE => Self::ErrorAuthorizationResponse,
			other => Self::Other(other.to_owned()),
		}
	}

	/// Returns the problem URI.
	pub fn as_str(&self) -> &str {
		match self {
			Self::IncorrectCredentials => INCORRECT_CREDENTIALS,
			Self::InvalidInput => INVALID_INPUT,
			Self::Unexpected => UNEXPECTED,
			Self::ErrorAuthorizationResponse => ERROR_AUTHORIZATION_RESPONSE,
			Self::Other(raw) => raw,
		}
	}
}

/// Navigation link offered by a step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
	/// Target href, resolved against the profile base URL.
	pub href: String,
	/// Link relation.
	#[serde(default)]
	pub rel: String,
	/// Optional display title.
	#[serde(default)]
	pub title: Option<String>,
	/// Optional media type.
	#[serde(rename = "type", default)]
	pub r#type: Option<String>,
}

/// User-facing message attached to a step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
	/// Message text.
	pub text: String,
	/// Presentation classes (`error`, `info`, ...).
	#[serde(default)]
	pub class_list: Vec<String>,
}

/// Per-field validation failure carried by invalid-input problems.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidField {
	/// Field name.
	pub name: String,
	/// Human-readable detail.
	#[serde(default)]
	pub detail: Option<String>,
	/// Machine-readable reason.
	#[serde(default)]
	pub reason: Option<String>,
}

/// Hypermedia document describing the current step and its actions.
#[derive(Clone, Debug, PartialEq)]
pub struct Representation {
	/// Step kind; never changes after parsing.
	pub step_type: StepType,
	/// Step metadata.
	pub metadata: BTreeMap<String, Value>,
	/// Step properties (`code`, `status`, ...).
	pub properties: BTreeMap<String, Value>,
	/// Ordered actions.
	pub actions: Vec<Action>,
	/// Links.
	pub links: Vec<Link>,
	/// Messages.
	pub messages: Vec<Message>,
	/// Field-level validation failures.
	pub invalid_fields: Vec<InvalidField>,
	/// Optional title.
	pub title: Option<String>,
	/// Optional problem or step code.
	pub code: Option<String>,
}
impl Representation {
	/// Parses a response body.
	pub fn parse(bytes: &[u8]) -> Result<Self, DecodingError> {
		let wire: WireRepresentation = decode_json(bytes)?;

		Ok(Self {
			step_type: StepType::from_wire(&wire.step_type),
			metadata: wire.metadata,
			properties: wire.properties,
			actions: decode_actions(wire.actions, 0)?,
			links: wire.links,
			messages: wire.messages,
			invalid_fields: wire.invalid_fields,
			title: wire.title,
			code: wire.code,
		})
	}

	/// Returns a property value.
	pub fn property(&self, name: &str) -> Option<&Value> {
		self.properties.get(name)
	}

	/// Returns a property value when it is a string.
	pub fn property_str(&self, name: &str) -> Option<&str> {
		self.property(name).and_then(Value::as_str)
	}

	/// Iterates over form-templated actions.
	pub fn forms(&self) -> impl Iterator<Item = (&Action, &FormModel)> {
		self.actions.iter().filter_map(|action| action.as_form().map(|form| (action, form)))
	}

	/// Returns the first form action of the given kind.
	pub fn form_of_kind(&self, kind: &str) -> Option<&FormModel> {
		self.forms().find(|(action, _)| action.kind == kind).map(|(_, form)| form)
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRepresentation {
	#[serde(rename = "type", default)]
	step_type: String,
	#[serde(default)]
	metadata: BTreeMap<String, Value>,
	#[serde(default)]
	properties: BTreeMap<String, Value>,
	#[serde(default)]
	actions: Vec<WireAction>,
	#[serde(default)]
	links: Vec<Link>,
	#[serde(default)]
	messages: Vec<Message>,
	#[serde(default)]
	invalid_fields: Vec<InvalidField>,
	#[serde(default)]
	title: Option<String>,
	#[serde(default)]
	code: Option<String>,
}
