//! Redacted wrapper for token material.

// self
use crate::_prelude::*;

/// Access, refresh, or ID token whose value never reaches `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps token material received from the token endpoint.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Raw token value, for building `Authorization` headers.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the server sent an empty string.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TokenSecret(<redacted, {} bytes>)", self.0.len())
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn formatters_never_print_the_value() {
		let secret = TokenSecret::new("eyJhbGciOi");

		assert_eq!(format!("{secret:?}"), "TokenSecret(<redacted, 10 bytes>)");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(secret.expose(), "eyJhbGciOi");
		assert!(TokenSecret::new("").is_empty());
	}

	#[test]
	fn secrets_deserialize_from_plain_strings() {
		let secret: TokenSecret =
			serde_json::from_str(r#""rt-1""#).expect("Secrets should decode from JSON strings.");

		assert_eq!(secret.expose(), "rt-1");
	}
}
