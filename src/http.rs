//! Transport primitives for hypermedia step requests and token exchanges.
//!
//! The module exposes [`StepHttpClient`], the controller's only dependency on an HTTP
//! stack, together with [`TransportErrorMapper`] so downstream crates can plug in custom
//! transports while keeping the controller's error taxonomy intact. Requests and
//! responses use the `oauth2` crate's [`HttpRequest`]/[`HttpResponse`] aliases.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
pub use oauth2::{HttpClientError, HttpRequest, HttpResponse};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
	obs::Operation,
};
#[cfg(feature = "reqwest")] use crate::profile::Profile;

/// Fixed request and resource timeout applied to every call.
pub const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(20);

/// Boxed future returned by [`StepHttpClient::execute`].
pub type HttpFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, HttpClientError<E>>> + 'a + Send>>;

/// Abstraction over HTTP transports that can execute one step request.
///
/// Implementations perform exactly one request per call and never retry; a failure is
/// terminal for the step that issued it. Implementations must be `Send + Sync + 'static`
/// so controllers can be cloned across tasks, and the returned future must be `Send`.
pub trait StepHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Executes the request and resolves to the raw response (status, headers, body).
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError>;
}

/// Maps HTTP transport failures into flow [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a flow error.
	fn map_transport_error(&self, operation: Operation, error: HttpClientError<E>) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, operation: Operation, err: HttpClientError<ReqwestError>) -> Error {
		// Operation reserved for future use.
		let _ = operation;

		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(*inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => TransportError::Other { message }.into(),
			_ => TransportError::Other { message: "unknown transport failure".into() }.into(),
		}
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransportError::Timeout.into();
	}

	TransportError::from(err).into()
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Hypermedia steps describe redirects as actions, so the wrapped client must not follow
/// HTTP redirects on its own. Clients built through [`ReqwestHttpClient::for_profile`] or
/// [`Default`] apply [`REQUEST_TIMEOUT`] and disable redirect following.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client honoring the profile's certificate policy.
	pub fn for_profile(profile: &Profile) -> Result<Self, ConfigError> {
		let client = Self::builder()
			.danger_accept_invalid_certs(profile.trust_all_certificates)
			.build()?;

		Ok(Self(client))
	}

	fn builder() -> reqwest::ClientBuilder {
		ReqwestClient::builder().timeout(REQUEST_TIMEOUT).redirect(reqwest::redirect::Policy::none())
	}
}
#[cfg(feature = "reqwest")]
impl Default for ReqwestHttpClient {
	fn default() -> Self {
		Self::build_or_fallback(Self::builder())
	}
}
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	fn build_or_fallback(builder: reqwest::ClientBuilder) -> Self {
		match builder.build() {
			Ok(client) => Self(client),
			Err(e) => {
				crate::obs::warn_event!(
					"Falling back to a reqwest client without timeout or redirect policy: {e}"
				);

				Self(ReqwestClient::default())
			},
		}
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl StepHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
