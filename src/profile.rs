//! Server profile consumed by the flow controller.
//!
//! A [`Profile`] names the client, the authorization server endpoints, and the flow toggles
//! for one login attempt. Profiles are plain serde documents so hosts can persist them in
//! any store; [`Profile::from_json`] and [`ProfileBuilder::build`] both run the same
//! validation before a profile reaches the controller.

pub mod builder;
pub mod id;

pub use builder::*;
pub use id::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// Validated server configuration for one flow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
	/// OAuth client identifier.
	pub client_id: ClientId,
	/// Base URL that server-supplied hrefs are resolved against.
	pub base_url: Url,
	/// Authorization endpoint queried by `start`.
	pub authorization_endpoint: Url,
	/// Token endpoint used for the code exchange.
	pub token_endpoint: Url,
	/// Redirect URI registered for the client; also the return channel for external browsers.
	pub redirect_uri: Url,
	/// Requested scopes, sent space-delimited.
	#[serde(default)]
	pub scope: Vec<String>,
	/// Follow redirection steps, settled polling steps, and authorization responses
	/// automatically.
	#[serde(default = "default_true")]
	pub follow_redirects: bool,
	/// Hint for callers that pending polling steps should be resubmitted on a timer.
	#[serde(default)]
	pub automatic_polling: bool,
	/// Accept invalid TLS certificates (development servers only).
	#[serde(default)]
	pub trust_all_certificates: bool,
	/// Send an S256 PKCE challenge with the authorization request.
	#[serde(default)]
	pub use_pkce: bool,
}
impl Profile {
	/// Creates a new builder for the provided client identifier.
	pub fn builder(client_id: impl Into<String>) -> ProfileBuilder {
		ProfileBuilder::new(client_id)
	}

	/// Loads and validates a JSON profile document.
	pub fn from_json(bytes: &[u8]) -> Result<Self, ProfileError> {
		let mut deserializer = serde_json::Deserializer::from_slice(bytes);
		let profile: Self = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ProfileError::Parse { source })?;

		profile.validate()?;

		Ok(profile)
	}

	/// Validates endpoint schemes.
	pub fn validate(&self) -> Result<(), ProfileError> {
		validate_endpoint("base_url", &self.base_url)?;
		validate_endpoint("authorization_endpoint", &self.authorization_endpoint)?;
		validate_endpoint("token_endpoint", &self.token_endpoint)?;

		if self.base_url.cannot_be_a_base() {
			return Err(ProfileError::UnsupportedUrl {
				field: "base_url",
				url: self.base_url.to_string(),
			});
		}

		Ok(())
	}

	/// Resolves a server-supplied href against [`Profile::base_url`].
	pub fn resolve(&self, href: &str) -> Result<Url, ConfigError> {
		self.base_url
			.join(href)
			.map_err(|source| ConfigError::InvalidHref { href: href.to_owned(), source })
	}

	/// Space-delimited scope parameter, or `None` when no scope is configured.
	pub fn scope_param(&self) -> Option<String> {
		let scopes = self.scope.iter().map(String::as_str).filter(|scope| !scope.is_empty());
		let joined = scopes.collect::<Vec<_>>().join(" ");

		if joined.is_empty() { None } else { Some(joined) }
	}
}

fn validate_endpoint(field: &'static str, url: &Url) -> Result<(), ProfileError> {
	match url.scheme() {
		"http" | "https" => Ok(()),
		_ => Err(ProfileError::UnsupportedUrl { field, url: url.to_string() }),
	}
}

fn default_true() -> bool {
	true
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const PROFILE: &str = r#"{
		"clientId": "haapi-android-client",
		"baseUrl": "https://login.example.com",
		"authorizationEndpoint": "https://login.example.com/oauth/v2/oauth-authorize",
		"tokenEndpoint": "https://login.example.com/oauth/v2/oauth-token",
		"redirectUri": "app://haapi",
		"scope": ["openid", "profile"]
	}"#;

	#[test]
	fn json_profiles_apply_defaults() {
		let profile = Profile::from_json(PROFILE.as_bytes()).expect("Profile fixture should load.");

		assert!(profile.follow_redirects, "Redirect following defaults to on.");
		assert!(!profile.automatic_polling);
		assert!(!profile.use_pkce);
		assert_eq!(profile.scope_param().as_deref(), Some("openid profile"));
		assert_eq!(profile.redirect_uri.as_str(), "app://haapi");
	}

	#[test]
	fn json_errors_carry_the_failing_path() {
		let err = Profile::from_json(br#"{"clientId":"c","baseUrl":42}"#)
			.expect_err("Numeric URLs must be rejected.");
		let ProfileError::Parse { source } = err else {
			panic!("Schema mismatches should surface as parse errors.");
		};

		assert_eq!(source.path().to_string(), "baseUrl");
	}

	#[test]
	fn non_http_endpoints_are_rejected() {
		let document = PROFILE.replace(
			"https://login.example.com/oauth/v2/oauth-token",
			"ftp://login.example.com/token",
		);
		let err = Profile::from_json(document.as_bytes())
			.expect_err("Token endpoints must use HTTP(S).");

		assert!(matches!(err, ProfileError::UnsupportedUrl { field: "token_endpoint", .. }));
	}

	#[test]
	fn hrefs_resolve_against_base_url() {
		let profile = Profile::from_json(PROFILE.as_bytes()).expect("Profile fixture should load.");

		assert_eq!(
			profile.resolve("/authn/authentication/form1").map(String::from).ok().as_deref(),
			Some("https://login.example.com/authn/authentication/form1")
		);
		assert_eq!(
			profile.resolve("https://other.example.com/x").map(String::from).ok().as_deref(),
			Some("https://other.example.com/x")
		);
	}
}
