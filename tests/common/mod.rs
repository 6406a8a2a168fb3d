//! Shared fixtures for controller integration tests.

#![allow(dead_code)]

// std
use std::{
	collections::VecDeque,
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};
// crates.io
use haapi_flow::{
	error::{Error, TransportError},
	flow::FlowController,
	http::{HttpClientError, HttpFuture, HttpRequest, HttpResponse, StepHttpClient, TransportErrorMapper},
	obs::Operation,
	operation::{ExternalRedirector, OperationFuture},
	profile::Profile,
	url::Url,
};
use oauth2::http::StatusCode;
use parking_lot::Mutex;
use tokio::sync::Notify;

pub const BASE_URL: &str = "https://idp.example.com";

pub type FakeController = FlowController<FakeHttpClient, FakeTransportErrorMapper>;

/// One request observed by [`FakeHttpClient`].
#[derive(Clone, Debug)]
pub struct RecordedRequest {
	pub method: String,
	pub url: Url,
	pub accept: Option<String>,
	pub body: String,
}

#[derive(Debug)]
pub struct FakeTransportError;
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Connection reset by fake transport.")
	}
}
impl StdError for FakeTransportError {}

#[derive(Debug, Default)]
pub struct FakeTransportErrorMapper;
impl TransportErrorMapper<FakeTransportError> for FakeTransportErrorMapper {
	fn map_transport_error(
		&self,
		_operation: Operation,
		error: HttpClientError<FakeTransportError>,
	) -> Error {
		TransportError::network(std::io::Error::other(error.to_string())).into()
	}
}

enum Canned {
	Response(u16, String),
	Failure,
}

/// Scripted transport that replays canned responses in order.
///
/// When a gate is installed every request announces itself on `started` and then waits for
/// the gate before answering.
#[derive(Default)]
pub struct FakeHttpClient {
	responses: Mutex<VecDeque<Canned>>,
	requests: Mutex<Vec<RecordedRequest>>,
	gate: Mutex<Option<Arc<Notify>>>,
	started: Notify,
	calls: AtomicUsize,
}
impl FakeHttpClient {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn respond(&self, status: u16, body: impl Into<String>) -> &Self {
		self.responses.lock().push_back(Canned::Response(status, body.into()));

		self
	}

	pub fn fail_transport(&self) -> &Self {
		self.responses.lock().push_back(Canned::Failure);

		self
	}

	/// Installs a gate; requests block until the returned handle is notified.
	pub fn gate(&self) -> Arc<Notify> {
		let gate = Arc::new(Notify::new());

		*self.gate.lock() = Some(gate.clone());

		gate
	}

	pub fn open_gate(&self) {
		*self.gate.lock() = None;
	}

	/// Resolves once a request reached the transport.
	pub async fn request_started(&self) {
		self.started.notified().await;
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.requests.lock().clone()
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl StepHttpClient for FakeHttpClient {
	type TransportError = FakeTransportError;

	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);
			self.requests.lock().push(RecordedRequest {
				method: request.method().to_string(),
				url: Url::parse(&request.uri().to_string()).expect("Requests carry absolute URLs."),
				accept: request
					.headers()
					.get("accept")
					.and_then(|value| value.to_str().ok())
					.map(str::to_owned),
				body: String::from_utf8(request.body().clone()).expect("Bodies are UTF-8."),
			});

			let gate = self.gate.lock().clone();

			if let Some(gate) = gate {
				self.started.notify_one();
				gate.notified().await;
			}

			let canned = self.responses.lock().pop_front();

			match canned {
				Some(Canned::Response(status, body)) => {
					let mut response = HttpResponse::new(body.into_bytes());

					*response.status_mut() =
						StatusCode::from_u16(status).expect("Canned statuses are valid.");

					Ok(response)
				},
				Some(Canned::Failure) =>
					Err(HttpClientError::Reqwest(Box::new(FakeTransportError))),
				None => panic!("Fake transport ran out of canned responses."),
			}
		})
	}
}

/// Redirector that records every URL and answers with a fixed verdict.
#[derive(Debug)]
pub struct RecordingRedirector {
	accept: bool,
	opened: Mutex<Vec<Url>>,
}
impl RecordingRedirector {
	pub fn accepting() -> Arc<Self> {
		Arc::new(Self { accept: true, opened: Mutex::new(Vec::new()) })
	}

	pub fn rejecting() -> Arc<Self> {
		Arc::new(Self { accept: false, opened: Mutex::new(Vec::new()) })
	}

	pub fn opened(&self) -> Vec<Url> {
		self.opened.lock().clone()
	}
}
impl ExternalRedirector for RecordingRedirector {
	fn open<'a>(&'a self, url: &'a Url) -> OperationFuture<'a, bool> {
		Box::pin(async move {
			self.opened.lock().push(url.clone());

			self.accept
		})
	}
}

pub fn profile(base_url: &str) -> haapi_flow::profile::ProfileBuilder {
	Profile::builder("haapi-client")
		.base_url(base_url)
		.authorization_endpoint(format!("{base_url}/oauth/authorize"))
		.token_endpoint(format!("{base_url}/oauth/token"))
		.redirect_uri("app://callback")
}

pub fn fake_controller(
	client: &Arc<FakeHttpClient>,
	redirector: &Arc<RecordingRedirector>,
) -> FakeController {
	FlowController::with_http_client(
		client.clone(),
		Arc::new(FakeTransportErrorMapper),
		redirector.clone(),
	)
}

pub fn login_step(href: &str) -> String {
	format!(
		r#"{{"type":"authentication-step","actions":[{{"template":"form","kind":"login",
		"model":{{"href":"{href}","method":"POST","fields":[
			{{"name":"userName","type":"username"}},
			{{"name":"password","type":"password"}}
		]}}}}]}}"#
	)
}

pub fn authorization_response(code: &str) -> String {
	format!(r#"{{"type":"oauth-authorization-response","properties":{{"code":"{code}"}}}}"#)
}

pub const TOKENS: &str = r#"{"access_token":"at-1","token_type":"bearer","expires_in":300,
	"refresh_token":"rt-1","id_token":"idt-1"}"#;
