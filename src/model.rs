//! Hypermedia representation model: typed steps, action trees, and their wire decoding.
//!
//! [`Representation::parse`] is the single entry point. It decodes the response body into
//! wire structs first and then converts every action, at any nesting depth, into the
//! [`ActionModel`] sum type. An unrecognized template anywhere in the tree fails the whole
//! parse with [`DecodingError::UnknownTemplate`].

pub mod action;
pub mod representation;

pub use action::*;
pub use representation::*;

// self
use crate::_prelude::*;

/// Deepest action nesting accepted while decoding continuation and selector trees.
pub const MAX_ACTION_DEPTH: usize = 32;

/// Errors raised while decoding server documents.
#[derive(Debug, ThisError)]
pub enum DecodingError {
	/// The body is not valid JSON or does not match the expected schema.
	#[error("Response body does not match the expected schema.")]
	Json {
		/// Structured parsing failure, including the failing path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// An action carried a template this crate does not understand.
	#[error("Action template `{0}` is not supported.")]
	UnknownTemplate(String),
	/// Action trees nest deeper than [`MAX_ACTION_DEPTH`].
	#[error("Action tree exceeds the maximum depth of {limit}.")]
	DepthExceeded {
		/// Maximum accepted depth.
		limit: usize,
	},
	/// A token response violated its contract.
	#[error("Token response is invalid: {reason}.")]
	InvalidTokenResponse {
		/// Human-readable reason.
		reason: &'static str,
	},
}
impl From<serde_path_to_error::Error<serde_json::Error>> for DecodingError {
	fn from(source: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self::Json { source }
	}
}

/// Decodes a JSON byte slice while recording the path of the first mismatch.
pub(crate) fn decode_json<T>(bytes: &[u8]) -> Result<T, DecodingError>
where
	T: for<'de> Deserialize<'de>,
{
	let mut deserializer = serde_json::Deserializer::from_slice(bytes);

	Ok(serde_path_to_error::deserialize(&mut deserializer)?)
}

/// Decodes an already-parsed JSON value (used for template-dependent action models).
pub(crate) fn decode_value<T>(value: Value) -> Result<T, DecodingError>
where
	T: for<'de> Deserialize<'de>,
{
	let value = if value.is_null() { Value::Object(Default::default()) } else { value };

	Ok(serde_path_to_error::deserialize(value)?)
}
