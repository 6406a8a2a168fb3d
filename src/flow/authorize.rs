//! Authorization request construction and PKCE material.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, flow::request::StepRequest, profile::Profile};

const PKCE_VERIFIER_LEN: usize = 64;

/// S256 PKCE verifier and challenge.
#[derive(Clone)]
pub(crate) struct PkcePair {
	pub(crate) verifier: String,
	pub(crate) challenge: String,
}
impl PkcePair {
	pub(crate) const METHOD: &'static str = "S256";

	pub(crate) fn generate() -> Self {
		let verifier = random_string(PKCE_VERIFIER_LEN);
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier, challenge }
	}
}
impl Debug for PkcePair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PkcePair").field("challenge", &self.challenge).finish_non_exhaustive()
	}
}

/// Builds the initial GET against the authorization endpoint.
pub(crate) fn authorization_request(profile: &Profile, pkce: Option<&PkcePair>) -> StepRequest {
	let mut url = profile.authorization_endpoint.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("client_id", &profile.client_id);
	pairs.append_pair("response_type", "code");
	pairs.append_pair("redirect_uri", profile.redirect_uri.as_str());

	if let Some(scope) = profile.scope_param() {
		pairs.append_pair("scope", &scope);
	}
	if let Some(pkce) = pkce {
		pairs.append_pair("code_challenge", &pkce.challenge);
		pairs.append_pair("code_challenge_method", PkcePair::METHOD);
	}

	drop(pairs);

	StepRequest::get(url)
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn compute_pkce_challenge(verifier: &str) -> String {
	let digest = Sha256::digest(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(digest)
}
