//! Outgoing step requests.

// crates.io
use oauth2::http::{
	Method, Request,
	header::{ACCEPT, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::HttpRequest,
	model::FormModel,
	obs,
	profile::Profile,
};

/// Media type of hypermedia authentication documents.
pub const HAAPI_MEDIA_TYPE: &str = "application/vnd.auth+json";

const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";

/// One HTTP request issued by the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct StepRequest {
	pub(crate) method: Method,
	pub(crate) url: Url,
	pub(crate) accept: &'static str,
	pub(crate) body: Option<String>,
}
impl StepRequest {
	pub(crate) fn get(url: Url) -> Self {
		Self { method: Method::GET, url, accept: HAAPI_MEDIA_TYPE, body: None }
	}

	pub(crate) fn post_form<'a, I>(url: Url, params: I) -> Self
	where
		I: IntoIterator<Item = (&'a str, &'a str)>,
	{
		let body = url::form_urlencoded::Serializer::new(String::new()).extend_pairs(params).finish();

		Self { method: Method::POST, url, accept: HAAPI_MEDIA_TYPE, body: Some(body) }
	}

	pub(crate) fn accept(mut self, media_type: &'static str) -> Self {
		self.accept = media_type;

		self
	}

	/// Builds a request for a form submission.
	///
	/// Overrides replace field defaults and fields without any value are omitted. Overrides
	/// that match no field are logged and not sent.
	pub(crate) fn form(
		profile: &Profile,
		form: &FormModel,
		overrides: &BTreeMap<String, String>,
	) -> Result<Self, ConfigError> {
		let method = Method::from_bytes(form.method.to_ascii_uppercase().as_bytes())
			.map_err(|_| ConfigError::InvalidMethod { method: form.method.clone() })?;
		let mut url = profile.resolve(&form.href)?;
		let params = form
			.fields
			.iter()
			.filter_map(|field| {
				overrides
					.get(&field.name)
					.or(field.value.as_ref())
					.map(|value| (field.name.as_str(), value.as_str()))
			})
			.collect::<Vec<_>>();

		for name in overrides.keys().filter(|name| form.field(name).is_none()) {
			obs::warn_event!("Form `{}` has no field named `{name}`; dropping the override.", form.href);
		}

		if method == Method::GET {
			if !params.is_empty() {
				url.query_pairs_mut().extend_pairs(params);
			}

			return Ok(Self { method, url, accept: HAAPI_MEDIA_TYPE, body: None });
		}

		let mut request = Self::post_form(url, params);

		request.method = method;

		Ok(request)
	}

	pub(crate) fn into_http(self) -> Result<HttpRequest, ConfigError> {
		let mut builder =
			Request::builder().method(self.method).uri(self.url.as_str()).header(ACCEPT, self.accept);

		if self.body.is_some() {
			builder = builder.header(CONTENT_TYPE, FORM_MEDIA_TYPE);
		}

		Ok(builder.body(self.body.unwrap_or_default().into_bytes())?)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::model::Representation;

	fn profile() -> Profile {
		Profile::builder("haapi-client")
			.base_url("https://idp.example.com")
			.authorization_endpoint("https://idp.example.com/oauth/authorize")
			.token_endpoint("https://idp.example.com/oauth/token")
			.redirect_uri("app://callback")
			.build()
			.expect("Profile fixture should build.")
	}

	fn form(method: &str) -> FormModel {
		let body = format!(
			r#"{{"type":"authentication-step","actions":[{{"template":"form","kind":"login",
			"model":{{"href":"/authn/login","method":"{method}","fields":[
				{{"name":"userName","type":"username"}},
				{{"name":"password","type":"password"}},
				{{"name":"remember","type":"checkbox","value":"on"}},
				{{"name":"csrf","type":"hidden","value":"c-1"}}
			]}}}}]}}"#
		);
		let representation =
			Representation::parse(body.as_bytes()).expect("Form fixture should parse.");

		representation.actions[0].as_form().cloned().expect("Fixture should expose a form.")
	}

	fn overrides(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
		pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
	}

	#[test]
	fn post_forms_merge_overrides_into_the_body() {
		let request = StepRequest::form(
			&profile(),
			&form("POST"),
			&overrides(&[("userName", "alice"), ("remember", "off"), ("unknown", "x")]),
		)
		.expect("POST forms should build.");

		assert_eq!(request.method, Method::POST);
		assert_eq!(request.url.as_str(), "https://idp.example.com/authn/login");
		assert_eq!(request.body.as_deref(), Some("userName=alice&remember=off&csrf=c-1"));

		let http = request.into_http().expect("HTTP request should build.");

		assert_eq!(http.headers()[ACCEPT], HAAPI_MEDIA_TYPE);
		assert_eq!(http.headers()[CONTENT_TYPE], FORM_MEDIA_TYPE);
	}

	#[test]
	fn get_forms_encode_into_the_query() {
		let request =
			StepRequest::form(&profile(), &form("get"), &overrides(&[("password", "p w")]))
				.expect("GET forms should build.");
		let http = request.clone().into_http().expect("HTTP request should build.");

		assert_eq!(request.method, Method::GET);
		assert_eq!(
			request.url.as_str(),
			"https://idp.example.com/authn/login?password=p+w&remember=on&csrf=c-1"
		);
		assert!(request.body.is_none());
		assert!(http.headers().get(CONTENT_TYPE).is_none());
	}

	#[test]
	fn invalid_methods_are_configuration_errors() {
		let err = StepRequest::form(&profile(), &form("NOT A METHOD"), &BTreeMap::new())
			.expect_err("Methods with spaces must be rejected.");

		assert!(matches!(err, ConfigError::InvalidMethod { .. }));
	}
}
