//! Builder that parses and validates profile fields.

// self
use crate::{
	_prelude::*,
	profile::{ClientId, IdentifierError, Profile},
};

/// Errors raised while constructing or validating profiles.
#[derive(Debug, ThisError)]
pub enum ProfileError {
	/// A required field was not supplied.
	#[error("Profile is missing `{field}`.")]
	MissingField {
		/// Name of the missing field.
		field: &'static str,
	},
	/// A URL field could not be parsed.
	#[error("Profile field `{field}` is not a valid URL.")]
	InvalidUrl {
		/// Name of the offending field.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A URL field uses a scheme or shape the controller cannot call.
	#[error("Profile field `{field}` must be an absolute HTTP(S) URL: {url}.")]
	UnsupportedUrl {
		/// Name of the offending field.
		field: &'static str,
		/// Rejected URL.
		url: String,
	},
	/// The client identifier failed validation.
	#[error(transparent)]
	InvalidClientId(#[from] IdentifierError),
	/// The profile document does not match the expected schema.
	#[error("Profile document does not match the expected schema.")]
	Parse {
		/// Structured parsing failure, including the failing path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Builder for [`Profile`] values.
#[derive(Clone, Debug)]
pub struct ProfileBuilder {
	client_id: String,
	base_url: Option<String>,
	authorization_endpoint: Option<String>,
	token_endpoint: Option<String>,
	redirect_uri: Option<String>,
	scope: Vec<String>,
	follow_redirects: bool,
	automatic_polling: bool,
	trust_all_certificates: bool,
	use_pkce: bool,
}
impl ProfileBuilder {
	/// Creates a new builder seeded with the provided client identifier.
	pub fn new(client_id: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			base_url: None,
			authorization_endpoint: None,
			token_endpoint: None,
			redirect_uri: None,
			scope: Vec::new(),
			follow_redirects: true,
			automatic_polling: false,
			trust_all_certificates: false,
			use_pkce: false,
		}
	}

	/// Sets the base URL.
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = Some(url.into());

		self
	}

	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: impl Into<String>) -> Self {
		self.authorization_endpoint = Some(url.into());

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: impl Into<String>) -> Self {
		self.token_endpoint = Some(url.into());

		self
	}

	/// Sets the redirect URI.
	pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
		self.redirect_uri = Some(uri.into());

		self
	}

	/// Appends requested scopes.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scope.extend(scopes.into_iter().map(Into::into));

		self
	}

	/// Toggles automatic redirect following.
	pub fn follow_redirects(mut self, enabled: bool) -> Self {
		self.follow_redirects = enabled;

		self
	}

	/// Toggles the automatic polling hint.
	pub fn automatic_polling(mut self, enabled: bool) -> Self {
		self.automatic_polling = enabled;

		self
	}

	/// Toggles acceptance of invalid TLS certificates.
	pub fn trust_all_certificates(mut self, enabled: bool) -> Self {
		self.trust_all_certificates = enabled;

		self
	}

	/// Toggles PKCE on the authorization request.
	pub fn use_pkce(mut self, enabled: bool) -> Self {
		self.use_pkce = enabled;

		self
	}

	/// Consumes the builder and validates the resulting profile.
	pub fn build(self) -> Result<Profile, ProfileError> {
		let profile = Profile {
			client_id: ClientId::new(&self.client_id)?,
			base_url: parse_url("base_url", self.base_url)?,
			authorization_endpoint: parse_url(
				"authorization_endpoint",
				self.authorization_endpoint,
			)?,
			token_endpoint: parse_url("token_endpoint", self.token_endpoint)?,
			redirect_uri: parse_url("redirect_uri", self.redirect_uri)?,
			scope: self.scope,
			follow_redirects: self.follow_redirects,
			automatic_polling: self.automatic_polling,
			trust_all_certificates: self.trust_all_certificates,
			use_pkce: self.use_pkce,
		};

		profile.validate()?;

		Ok(profile)
	}
}

fn parse_url(field: &'static str, raw: Option<String>) -> Result<Url, ProfileError> {
	let raw = raw.ok_or(ProfileError::MissingField { field })?;

	Url::parse(&raw).map_err(|source| ProfileError::InvalidUrl { field, source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn builder() -> ProfileBuilder {
		Profile::builder("haapi-client")
			.base_url("https://idp.example.com")
			.authorization_endpoint("https://idp.example.com/oauth/authorize")
			.token_endpoint("https://idp.example.com/oauth/token")
			.redirect_uri("app://callback")
	}

	#[test]
	fn builder_produces_validated_profiles() {
		let profile = builder()
			.scopes(["openid"])
			.follow_redirects(false)
			.use_pkce(true)
			.build()
			.expect("Builder fixture should succeed.");

		assert_eq!(&*profile.client_id, "haapi-client");
		assert!(!profile.follow_redirects);
		assert!(profile.use_pkce);
		assert_eq!(profile.scope, vec!["openid".to_owned()]);
	}

	#[test]
	fn missing_and_malformed_urls_fail() {
		let missing = Profile::builder("haapi-client")
			.base_url("https://idp.example.com")
			.build()
			.expect_err("Missing endpoints must fail.");

		assert!(matches!(missing, ProfileError::MissingField { field: "authorization_endpoint" }));

		let malformed = builder()
			.token_endpoint("not a url")
			.build()
			.expect_err("Malformed endpoints must fail.");

		assert!(matches!(malformed, ProfileError::InvalidUrl { field: "token_endpoint", .. }));
	}

	#[test]
	fn invalid_client_ids_fail() {
		let err = ProfileBuilder::new(" ")
			.base_url("https://idp.example.com")
			.build()
			.expect_err("Blank client ids must fail.");

		assert!(matches!(err, ProfileError::InvalidClientId(_)));
	}
}
