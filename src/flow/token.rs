//! Authorization code exchange.

// crates.io
use futures_util::future;
// self
use crate::{
	_prelude::*,
	flow::{
		Dispatch, FlowController,
		pipeline::Step,
		processing::{ProcessingGuard, Session},
		request::StepRequest,
	},
	http::{HttpResponse, StepHttpClient, TransportErrorMapper},
	model::decode_json,
	obs::Operation,
	token::TokenSet,
};

const JSON_MEDIA_TYPE: &str = "application/json";

/// OAuth error document returned by rejecting token endpoints.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
	error: String,
	#[serde(default)]
	error_description: Option<String>,
}

impl<C, M> FlowController<C, M>
where
	C: ?Sized + StepHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges an authorization code for tokens and commits [`FlowState::AccessToken`].
	///
	/// [`FlowController::reset`] cancels a pending exchange.
	///
	/// [`FlowState::AccessToken`]: crate::flow::FlowState::AccessToken
	pub async fn get_access_token(&self, code: &str) -> Dispatch {
		const OPERATION: Operation = Operation::AccessToken;

		self.run(OPERATION, "get_access_token", async move {
			let Some(mut guard) = ProcessingGuard::try_begin(&self.inner) else {
				return Dispatch::Busy;
			};

			self.drive(OPERATION, &mut guard, Step::Exchange { code: code.to_owned() }).await
		})
		.await
	}

	/// Runs one abortable token request for the session of `generation`.
	pub(super) async fn exchange(
		&self,
		generation: u64,
		session: &Session,
		code: &str,
	) -> Result<TokenSet> {
		let (request, handle) = future::abortable(self.request_tokens(session, code));

		{
			let mut inner = self.inner.lock();

			if inner.generation != generation {
				return Err(Error::IllegalReset);
			}

			inner.token_exchange = Some(handle);
		}

		let result = request.await;
		let mut inner = self.inner.lock();

		if inner.generation == generation {
			inner.token_exchange = None;
		}

		result.map_err(|_| Error::IllegalReset)?
	}

	async fn request_tokens(&self, session: &Session, code: &str) -> Result<TokenSet> {
		let profile = &session.profile;
		let mut params = vec![
			("grant_type", "authorization_code"),
			("code", code),
			("client_id", &*profile.client_id),
			("redirect_uri", profile.redirect_uri.as_str()),
		];

		if let Some(verifier) = session.pkce_verifier.as_deref() {
			params.push(("code_verifier", verifier));
		}

		let request =
			StepRequest::post_form(profile.token_endpoint.clone(), params).accept(JSON_MEDIA_TYPE);
		let response = self
			.http_client
			.execute(request.into_http()?)
			.await
			.map_err(|e| self.transport_mapper.map_transport_error(Operation::AccessToken, e))?;

		interpret_token_response(&response, OffsetDateTime::now_utc())
	}
}

fn interpret_token_response(
	response: &HttpResponse,
	received_at: OffsetDateTime,
) -> Result<TokenSet> {
	let status = response.status();
	let body = response.body();

	if status.is_success() {
		if body.is_empty() {
			return Err(Error::NoResponseBody);
		}

		return Ok(TokenSet::from_response(body, received_at)?);
	}

	match decode_json::<TokenErrorResponse>(body) {
		Ok(rejection) => Err(Error::TokenRejected {
			error: rejection.error,
			description: rejection.error_description,
		}),
		Err(_) => Err(Error::ServerError { status: status.as_u16() }),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::StatusCode;
	// self
	use super::*;

	fn response(status: u16, body: &str) -> HttpResponse {
		let mut response = HttpResponse::new(body.as_bytes().to_vec());

		*response.status_mut() = StatusCode::from_u16(status).expect("Status fixture is valid.");

		response
	}

	#[test]
	fn oauth_errors_become_rejections() {
		let err = interpret_token_response(
			&response(400, r#"{"error":"invalid_grant","error_description":"Code expired"}"#),
			OffsetDateTime::UNIX_EPOCH,
		)
		.expect_err("Rejected codes must fail.");

		assert!(matches!(
			err,
			Error::TokenRejected { ref error, description: Some(ref description) }
				if error == "invalid_grant" && description == "Code expired"
		));
	}

	#[test]
	fn other_failures_keep_their_status() {
		assert!(matches!(
			interpret_token_response(&response(503, "busy"), OffsetDateTime::UNIX_EPOCH),
			Err(Error::ServerError { status: 503 })
		));
		assert!(matches!(
			interpret_token_response(&response(200, ""), OffsetDateTime::UNIX_EPOCH),
			Err(Error::NoResponseBody)
		));
	}

	#[test]
	fn successful_responses_decode_tokens() {
		let tokens = interpret_token_response(
			&response(200, r#"{"access_token":"at","expires_in":60,"refresh_token":"rt"}"#),
			OffsetDateTime::UNIX_EPOCH,
		)
		.expect("Token documents should decode.");

		assert_eq!(tokens.access_token.expose(), "at");
		assert_eq!(tokens.expires_at, OffsetDateTime::UNIX_EPOCH + Duration::seconds(60));
	}
}
