//! Flow-level error types shared across the controller, transports, and parsers.

// self
use crate::{_prelude::*, model::DecodingError, profile::ProfileError, step::Problem};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical flow error surfaced through [`FlowState::SystemError`](crate::flow::FlowState).
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem (profile, request construction, client build).
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded.
	#[error(transparent)]
	Decoding(#[from] DecodingError),

	/// Server answered with a status the flow does not handle.
	#[error("Server responded with HTTP status {status}.")]
	ServerError {
		/// HTTP status code returned by the server.
		status: u16,
	},
	/// Server answered successfully but without a body.
	#[error("Server response did not contain a body.")]
	NoResponseBody,
	/// An operation that continues the current step ran without a step to continue.
	#[error("There is no current step to continue from.")]
	NoCurrentState,
	/// Server reported a problem that ends the flow.
	#[error("Server reported a flow-ending problem: {0}.")]
	Problem(Box<Problem>),
	/// A pending completion finished after the flow was reset.
	#[error("The flow was reset while the operation was in flight.")]
	IllegalReset,
	/// Token endpoint rejected the authorization code.
	#[error("Token endpoint rejected the exchange: {error}.")]
	TokenRejected {
		/// OAuth `error` code.
		error: String,
		/// OAuth `error_description`, when supplied.
		description: Option<String>,
	},
	/// Server chained more automatic steps than the controller follows.
	#[error("Server chained more than {limit} automatic steps.")]
	RedirectLimit {
		/// Maximum number of chained steps.
		limit: usize,
	},
}
impl Error {
	/// Returns the stable category of this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Config(_) => ErrorKind::InvalidConfiguration,
			Self::Transport(_) => ErrorKind::TransportFailure,
			Self::Decoding(_) => ErrorKind::DecodingFailure,
			Self::ServerError { .. } => ErrorKind::ServerError,
			Self::NoResponseBody => ErrorKind::NoResponseBody,
			Self::NoCurrentState => ErrorKind::NoCurrentState,
			Self::Problem(_) => ErrorKind::Problem,
			Self::IllegalReset => ErrorKind::IllegalReset,
			Self::TokenRejected { .. } => ErrorKind::TokenRejected,
			Self::RedirectLimit { .. } => ErrorKind::RedirectLimit,
		}
	}
}
impl From<ProfileError> for Error {
	fn from(e: ProfileError) -> Self {
		ConfigError::from(e).into()
	}
}

/// Stable error categories, independent of the concrete error payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Bad or missing configuration.
	InvalidConfiguration,
	/// Network or timeout failure.
	TransportFailure,
	/// Unhandled HTTP status.
	ServerError,
	/// Empty response body.
	NoResponseBody,
	/// Continuation requested without a current step.
	NoCurrentState,
	/// Malformed JSON or schema mismatch.
	DecodingFailure,
	/// Flow-ending server problem.
	Problem,
	/// Completion arrived after a reset.
	IllegalReset,
	/// Token endpoint rejected the code.
	TokenRejected,
	/// Too many chained automatic steps.
	RedirectLimit,
}
impl ErrorKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::InvalidConfiguration => "invalid_configuration",
			Self::TransportFailure => "transport_failure",
			Self::ServerError => "server_error",
			Self::NoResponseBody => "no_response_body",
			Self::NoCurrentState => "no_current_state",
			Self::DecodingFailure => "decoding_failure",
			Self::Problem => "problem",
			Self::IllegalReset => "illegal_reset",
			Self::TokenRejected => "token_rejected",
			Self::RedirectLimit => "redirect_limit",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Configuration and validation failures raised by the controller.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Profile failed validation.
	#[error(transparent)]
	InvalidProfile(#[from] ProfileError),
	/// A server-supplied href could not be resolved against the base URL.
	#[error("Href `{href}` cannot be resolved against the base URL.")]
	InvalidHref {
		/// Raw href supplied by the server.
		href: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A server-supplied form method is not a valid HTTP method.
	#[error("Form method `{method}` is not a valid HTTP method.")]
	InvalidMethod {
		/// Raw method supplied by the server.
		method: String,
	},
	/// An operation needing a profile ran before `start`.
	#[error("No profile is active; start the flow first.")]
	NoActiveProfile,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the server.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request or resource timeout elapsed.
	#[error("Request timed out while calling the server.")]
	Timeout,
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the server.")]
	Io(#[from] std::io::Error),
	/// Transport reported a failure with only a message.
	#[error("HTTP client error occurred while calling the server: {message}.")]
	Other {
		/// Transport-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn kinds_follow_variants() {
		assert_eq!(Error::ServerError { status: 502 }.kind(), ErrorKind::ServerError);
		assert_eq!(Error::NoCurrentState.kind(), ErrorKind::NoCurrentState);
		assert_eq!(
			Error::from(TransportError::Timeout).kind(),
			ErrorKind::TransportFailure,
			"Timeouts must surface as transport failures."
		);
		assert_eq!(Error::from(ConfigError::NoActiveProfile).kind().as_str(), "invalid_configuration");
	}
}
