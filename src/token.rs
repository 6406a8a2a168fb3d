//! Token set produced by the authorization code exchange.

pub mod secret;

pub use secret::*;

// self
use crate::{
	_prelude::*,
	model::{DecodingError, decode_json},
};

/// Tokens returned by the token endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenSet {
	/// Access token.
	pub access_token: TokenSecret,
	/// Token type reported by the server (usually `bearer`).
	pub token_type: Option<String>,
	/// Granted scope, when the server reports it.
	pub scope: Option<String>,
	/// Lifetime reported by the server.
	pub expires_in: Duration,
	/// Local time the response was received.
	pub issued_at: OffsetDateTime,
	/// `issued_at + expires_in`.
	pub expires_at: OffsetDateTime,
	/// Refresh token.
	pub refresh_token: TokenSecret,
	/// OpenID Connect ID token, when issued.
	pub id_token: Option<TokenSecret>,
}
impl TokenSet {
	/// Decodes a token response body received at `issued_at`.
	pub fn from_response(bytes: &[u8], issued_at: OffsetDateTime) -> Result<Self, DecodingError> {
		let wire: WireTokenResponse = decode_json(bytes)?;

		if wire.access_token.is_empty() {
			return Err(DecodingError::InvalidTokenResponse { reason: "access_token is empty" });
		}
		if wire.expires_in <= 0 {
			return Err(DecodingError::InvalidTokenResponse {
				reason: "expires_in must be positive",
			});
		}

		let expires_in = Duration::seconds(wire.expires_in);
		let expires_at = issued_at.checked_add(expires_in).ok_or(
			DecodingError::InvalidTokenResponse { reason: "expires_in exceeds the supported range" },
		)?;

		Ok(Self {
			access_token: wire.access_token,
			token_type: wire.token_type,
			scope: wire.scope,
			expires_in,
			issued_at,
			expires_at,
			refresh_token: wire.refresh_token,
			id_token: wire.id_token,
		})
	}

	/// Returns `true` once `now` reached [`TokenSet::expires_at`].
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		now >= self.expires_at
	}
}

#[derive(Debug, Deserialize)]
struct WireTokenResponse {
	access_token: TokenSecret,
	#[serde(default)]
	token_type: Option<String>,
	#[serde(default)]
	scope: Option<String>,
	expires_in: i64,
	refresh_token: TokenSecret,
	#[serde(default)]
	id_token: Option<TokenSecret>,
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn decodes_token_documents() {
		let issued_at = datetime!(2026-03-01 12:00 UTC);
		let tokens = TokenSet::from_response(
			br#"{"access_token":"at","token_type":"bearer","scope":"openid","expires_in":300,
				"refresh_token":"rt","id_token":"idt"}"#,
			issued_at,
		)
		.expect("Token fixture should decode.");

		assert_eq!(tokens.access_token.expose(), "at");
		assert_eq!(tokens.refresh_token.expose(), "rt");
		assert_eq!(tokens.id_token.as_ref().map(TokenSecret::expose), Some("idt"));
		assert_eq!(tokens.expires_at, datetime!(2026-03-01 12:05 UTC));
		assert!(!tokens.is_expired_at(datetime!(2026-03-01 12:04 UTC)));
		assert!(tokens.is_expired_at(datetime!(2026-03-01 12:05 UTC)));
		assert!(!format!("{tokens:?}").contains("\"at\""), "Debug output must redact tokens.");
	}

	#[test]
	fn non_positive_lifetimes_are_rejected() {
		let err = TokenSet::from_response(
			br#"{"access_token":"at","expires_in":0,"refresh_token":"rt"}"#,
			OffsetDateTime::UNIX_EPOCH,
		)
		.expect_err("Zero lifetimes must be rejected.");

		assert!(matches!(err, DecodingError::InvalidTokenResponse { .. }));
	}

	#[test]
	fn out_of_range_lifetimes_are_rejected() {
		let err = TokenSet::from_response(
			br#"{"access_token":"at","expires_in":9223372036854775807,"refresh_token":"rt"}"#,
			OffsetDateTime::now_utc(),
		)
		.expect_err("Lifetimes past the supported date range must be rejected.");

		assert!(matches!(
			err,
			DecodingError::InvalidTokenResponse { reason } if reason.contains("supported range")
		));
	}

	#[test]
	fn missing_refresh_token_is_a_schema_error() {
		let err = TokenSet::from_response(
			br#"{"access_token":"at","expires_in":60}"#,
			OffsetDateTime::UNIX_EPOCH,
		)
		.expect_err("Refresh tokens are required.");

		assert!(matches!(err, DecodingError::Json { .. }));
	}
}
