//! Action tree: form submissions, selectors, and client operations.

// self
use crate::{
	_prelude::*,
	model::{DecodingError, MAX_ACTION_DEPTH, decode_value},
};

/// Action kind of the single form carried by redirection steps.
pub const REDIRECT_KIND: &str = "redirect";
/// Action kind of the form that re-queries a polling step.
pub const POLL_KIND: &str = "poll";
/// Action kind of the form that cancels a polling step.
pub const CANCEL_KIND: &str = "cancel";

/// Template tag carried by every action on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionTemplate {
	/// HTTP form submission.
	Form,
	/// A named list of nested actions.
	Selector,
	/// Client-side side-channel operation.
	ClientOperation,
}
impl ActionTemplate {
	/// Resolves a wire template name, failing on anything unknown.
	pub fn from_wire(raw: &str) -> Result<Self, DecodingError> {
		match raw {
			"form" => Ok(Self::Form),
			"selector" => Ok(Self::Selector),
			"client-operation" => Ok(Self::ClientOperation),
			other => Err(DecodingError::UnknownTemplate(other.to_owned())),
		}
	}

	/// Returns the wire name of the template.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Form => "form",
			Self::Selector => "selector",
			Self::ClientOperation => "client-operation",
		}
	}
}
impl Display for ActionTemplate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One action offered by a step.
#[derive(Clone, Debug, PartialEq)]
pub struct Action {
	/// Server-defined action kind (`login`, `redirect`, `poll`, ...).
	pub kind: String,
	/// Optional display title.
	pub title: Option<String>,
	/// Free-form action properties.
	pub properties: BTreeMap<String, Value>,
	/// Template-dependent payload.
	pub model: ActionModel,
	/// Actions to process once this action's selection or operation completes.
	pub continue_actions: Vec<Action>,
}
impl Action {
	/// Template tag derived from the model.
	pub fn template(&self) -> ActionTemplate {
		match &self.model {
			ActionModel::Form(_) => ActionTemplate::Form,
			ActionModel::Selector(_) => ActionTemplate::Selector,
			ActionModel::ClientOperation(_) => ActionTemplate::ClientOperation,
		}
	}

	/// Returns the form payload when the action is form-templated.
	pub fn as_form(&self) -> Option<&FormModel> {
		match &self.model {
			ActionModel::Form(form) => Some(form),
			_ => None,
		}
	}

	/// Returns the client-operation payload when the action is client-operation-templated.
	pub fn as_client_operation(&self) -> Option<&ClientOperationModel> {
		match &self.model {
			ActionModel::ClientOperation(operation) => Some(operation),
			_ => None,
		}
	}

	/// Returns `true` for redirect-kind form actions.
	pub fn is_redirect_form(&self) -> bool {
		self.kind == REDIRECT_KIND && self.as_form().is_some()
	}

	pub(crate) fn from_wire(wire: WireAction, depth: usize) -> Result<Self, DecodingError> {
		if depth > MAX_ACTION_DEPTH {
			return Err(DecodingError::DepthExceeded { limit: MAX_ACTION_DEPTH });
		}

		let model = match ActionTemplate::from_wire(&wire.template)? {
			ActionTemplate::Form =>
				ActionModel::Form(FormModel::from_wire(decode_value(wire.model)?, depth)?),
			ActionTemplate::Selector =>
				ActionModel::Selector(SelectorModel::from_wire(decode_value(wire.model)?, depth)?),
			ActionTemplate::ClientOperation => ActionModel::ClientOperation(
				ClientOperationModel::from_wire(decode_value(wire.model)?, depth)?,
			),
		};

		Ok(Self {
			kind: wire.kind,
			title: wire.title,
			properties: wire.properties,
			model,
			continue_actions: decode_actions(wire.continue_actions, depth + 1)?,
		})
	}
}

/// Template-dependent action payload.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionModel {
	/// HTTP submission descriptor.
	Form(FormModel),
	/// Nested options to choose from.
	Selector(SelectorModel),
	/// Named client-side operation.
	ClientOperation(ClientOperationModel),
}

/// HTTP submission descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct FormModel {
	/// Target href, resolved against the profile base URL.
	pub href: String,
	/// HTTP method (`GET`, `POST`, ...).
	pub method: String,
	/// Fields with their default values.
	pub fields: Vec<Field>,
	/// Actions used when the server answers with continue-same-step.
	pub continue_actions: Vec<Action>,
	/// Optional encoding type hint.
	pub r#type: Option<String>,
	/// Optional form title.
	pub title: Option<String>,
	/// Optional submit-button title.
	pub action_title: Option<String>,
}
impl FormModel {
	fn from_wire(wire: WireFormModel, depth: usize) -> Result<Self, DecodingError> {
		Ok(Self {
			href: wire.href,
			method: wire.method,
			fields: wire.fields,
			continue_actions: decode_actions(wire.continue_actions, depth + 1)?,
			r#type: wire.r#type,
			title: wire.title,
			action_title: wire.action_title,
		})
	}

	/// Returns `true` when the form is submitted with `GET`.
	pub fn is_get(&self) -> bool {
		self.method.eq_ignore_ascii_case("GET")
	}

	/// Looks up a field by name.
	pub fn field(&self, name: &str) -> Option<&Field> {
		self.fields.iter().find(|field| field.name == name)
	}
}

/// Form field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
	/// Parameter name.
	pub name: String,
	/// Field type.
	#[serde(rename = "type", default)]
	pub r#type: FieldType,
	/// Optional display label.
	#[serde(default)]
	pub label: Option<String>,
	/// Default value submitted when no override is supplied.
	#[serde(default)]
	pub value: Option<String>,
	/// Optional input placeholder.
	#[serde(default)]
	pub placeholder: Option<String>,
}

/// Supported field types; anything else decodes as [`FieldType::Unsupported`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
	/// Username input.
	Username,
	/// Password input.
	Password,
	/// Free text input.
	Text,
	/// Hidden value.
	Hidden,
	/// Checkbox.
	Checkbox,
	/// Unknown field type.
	#[default]
	#[serde(other)]
	Unsupported,
}

/// A named list of options, each a full action.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectorModel {
	/// Available options.
	pub options: Vec<Action>,
}
impl SelectorModel {
	fn from_wire(wire: WireSelectorModel, depth: usize) -> Result<Self, DecodingError> {
		Ok(Self { options: decode_actions(wire.options, depth + 1)? })
	}
}

/// Opaque named client-side operation.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientOperationModel {
	/// Operation name, resolved against the operation registry.
	pub name: String,
	/// Operation arguments; non-string JSON values are kept as their JSON text.
	pub arguments: BTreeMap<String, String>,
	/// Actions to process when the operation succeeds.
	pub continue_actions: Vec<Action>,
	/// Actions to process when the operation fails.
	pub error_actions: Vec<Action>,
}
impl ClientOperationModel {
	fn from_wire(wire: WireClientOperationModel, depth: usize) -> Result<Self, DecodingError> {
		let arguments = wire
			.arguments
			.into_iter()
			.map(|(key, value)| match value {
				Value::String(text) => (key, text),
				other => (key, other.to_string()),
			})
			.collect();

		Ok(Self {
			name: wire.name,
			arguments,
			continue_actions: decode_actions(wire.continue_actions, depth + 1)?,
			error_actions: decode_actions(wire.error_actions, depth + 1)?,
		})
	}

	/// Returns an argument by name.
	pub fn argument(&self, name: &str) -> Option<&str> {
		self.arguments.get(name).map(String::as_str)
	}
}

pub(crate) fn decode_actions(
	wire: Vec<WireAction>,
	depth: usize,
) -> Result<Vec<Action>, DecodingError> {
	wire.into_iter().map(|action| Action::from_wire(action, depth)).collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireAction {
	template: String,
	#[serde(default)]
	kind: String,
	#[serde(default)]
	model: Value,
	#[serde(default)]
	title: Option<String>,
	#[serde(default)]
	properties: BTreeMap<String, Value>,
	#[serde(default)]
	continue_actions: Vec<WireAction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFormModel {
	href: String,
	#[serde(default = "default_method")]
	method: String,
	#[serde(rename = "type", default)]
	r#type: Option<String>,
	#[serde(default)]
	title: Option<String>,
	#[serde(default)]
	action_title: Option<String>,
	#[serde(default)]
	fields: Vec<Field>,
	#[serde(default)]
	continue_actions: Vec<WireAction>,
}

#[derive(Debug, Deserialize)]
struct WireSelectorModel {
	#[serde(default)]
	options: Vec<WireAction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireClientOperationModel {
	name: String,
	#[serde(default)]
	arguments: BTreeMap<String, Value>,
	#[serde(default)]
	continue_actions: Vec<WireAction>,
	#[serde(default)]
	error_actions: Vec<WireAction>,
}

fn default_method() -> String {
	"POST".into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn wire(json: &str) -> WireAction {
		serde_json::from_str(json).expect("Wire action fixture should deserialize.")
	}

	#[test]
	fn form_actions_decode_fields_and_defaults() {
		let action = Action::from_wire(
			wire(
				r#"{"template":"form","kind":"login","model":{"href":"/authn/login","fields":[
					{"name":"username","type":"username"},
					{"name":"remember","type":"checkbox","value":"on"},
					{"name":"otp","type":"one-time-code"}
				]}}"#,
			),
			0,
		)
		.expect("Form action should decode.");
		let form = action.as_form().expect("Form action should expose its form model.");

		assert_eq!(action.template(), ActionTemplate::Form);
		assert_eq!(form.method, "POST");
		assert_eq!(form.fields[0].r#type, FieldType::Username);
		assert_eq!(form.field("remember").and_then(|f| f.value.as_deref()), Some("on"));
		assert_eq!(form.fields[2].r#type, FieldType::Unsupported);
	}

	#[test]
	fn client_operation_arguments_are_stringified() {
		let action = Action::from_wire(
			wire(
				r#"{"template":"client-operation","kind":"login","model":{"name":"bankid",
					"arguments":{"autoStartToken":"tok","timeout":30}}}"#,
			),
			0,
		)
		.expect("Client operation should decode.");
		let operation =
			action.as_client_operation().expect("Action should expose its client operation.");

		assert_eq!(operation.argument("autoStartToken"), Some("tok"));
		assert_eq!(operation.argument("timeout"), Some("30"));
	}

	#[test]
	fn unknown_selector_options_fail_decoding() {
		let err = Action::from_wire(
			wire(
				r#"{"template":"selector","kind":"select-authenticator","model":{"options":[
					{"template":"form","kind":"select","model":{"href":"/a"}},
					{"template":"carousel","kind":"select","model":{}}
				]}}"#,
			),
			0,
		)
		.expect_err("Unknown option templates must fail decoding.");

		assert!(matches!(err, DecodingError::UnknownTemplate(name) if name == "carousel"));
	}

	#[test]
	fn depth_guard_rejects_deep_trees() {
		let mut json = String::from(r#"{"template":"form","kind":"k","model":{"href":"/x"}}"#);

		for _ in 0..=MAX_ACTION_DEPTH {
			json = format!(
				r#"{{"template":"form","kind":"k","model":{{"href":"/x"}},"continueActions":[{json}]}}"#
			);
		}

		let err = Action::from_wire(wire(&json), 0).expect_err("Deep trees must be rejected.");

		assert!(matches!(err, DecodingError::DepthExceeded { limit: MAX_ACTION_DEPTH }));
	}
}
