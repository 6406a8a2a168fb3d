//! Terminal OAuth authorization responses.

// self
use crate::model::{Representation, StepType};

/// An authorization response carrying the code to exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationResponse {
	/// Authorization code.
	pub code: String,
	/// Returned `state`, when present.
	pub state: Option<String>,
}
impl AuthorizationResponse {
	/// Matches oauth-authorization-response steps that carry a `code` property.
	pub fn from_representation(representation: &Representation) -> Option<Self> {
		if representation.step_type != StepType::OAuthAuthorizationResponse {
			return None;
		}

		let code = representation.property_str("code")?;

		Some(Self {
			code: code.to_owned(),
			state: representation.property_str("state").map(str::to_owned),
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn extracts_code_and_state() {
		let representation = Representation::parse(
			br#"{"type":"oauth-authorization-response","properties":{"code":"abc123","state":"s1"}}"#,
		)
		.expect("Authorization response should parse.");
		let response = AuthorizationResponse::from_representation(&representation)
			.expect("Responses with a code should match.");

		assert_eq!(response.code, "abc123");
		assert_eq!(response.state.as_deref(), Some("s1"));
	}

	#[test]
	fn missing_code_does_not_match() {
		let representation =
			Representation::parse(br#"{"type":"oauth-authorization-response","properties":{}}"#)
				.expect("Authorization response should parse.");

		assert!(AuthorizationResponse::from_representation(&representation).is_none());
	}
}
