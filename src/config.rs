//! Validated, immutable client configuration.
//!
//! [`ClientConfig`] pins the API base URL, the refresh endpoint, the login route
//! announced when a session expires, and the default headers every request
//! carries. Values are fixed for the lifetime of an [`ApiClient`](crate::client::ApiClient).

// crates.io
use http::{
	HeaderMap, HeaderValue,
	header::{CONTENT_TYPE, IntoHeaderName},
};
// self
use crate::{_prelude::*, error::ConfigError};

/// Path prefix under which the backend API is mounted.
pub const API_PREFIX: &str = "/api";
/// Refresh endpoint, relative to the API base.
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh/";
/// Route announced to the application shell when re-authentication is required.
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// Errors raised while validating a [`ClientConfig`].
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ClientConfigError {
	/// Base URL could not be parsed.
	#[error("Base URL is invalid: {0}.")]
	InvalidBaseUrl(#[from] url::ParseError),
	/// Base URL must use HTTP(S).
	#[error("Base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Base URL that failed validation.
		url: String,
	},
	/// Base URL must be a plain path without query or fragment.
	#[error("Base URL must not carry a query string or fragment: {url}.")]
	UnexpectedQuery {
		/// Base URL that failed validation.
		url: String,
	},
	/// Paths must be absolute.
	#[error("The {field} must start with `/`: {value}.")]
	RelativePath {
		/// Which setting failed validation.
		field: &'static str,
		/// Offending value.
		value: String,
	},
	/// Preemptive window must not be negative.
	#[error("Preemptive refresh window must not be negative.")]
	NegativePreemptiveWindow,
}

/// Immutable configuration consumed by the client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// Absolute API base; request paths are appended to its path.
	pub base_url: Url,
	/// Refresh endpoint, relative to the API base.
	pub refresh_path: String,
	/// Route carried by session-expiry and logout events.
	pub login_route: String,
	/// Headers attached to every request before per-request overrides.
	pub default_headers: HeaderMap,
	/// Refresh ahead of time when the access token expires within this window.
	pub preemptive_window: Option<Duration>,
}
impl ClientConfig {
	/// Creates a new builder for the provided API base URL.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Builds the default configuration for a backend served at `origin`, mounting the
	/// API under `/api`.
	pub fn from_origin(origin: &str) -> Result<Self, ClientConfigError> {
		let mut base_url = Url::parse(origin)?;
		let path = format!("{}{API_PREFIX}", base_url.path().trim_end_matches('/'));

		base_url.set_path(&path);

		Self::builder(base_url).build()
	}

	/// Resolves `path` (and optional query pairs) against the API base.
	pub fn endpoint_url(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
		if path.contains(['?', '#']) {
			return Err(ConfigError::InvalidPath { path: path.to_owned() }.into());
		}

		let mut url = self.base_url.clone();
		let joined =
			format!("{}/{}", self.base_url.path().trim_end_matches('/'), path.trim_start_matches('/'));

		url.set_path(&joined);

		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
		}

		Ok(url)
	}

	/// Absolute URL of the refresh endpoint.
	pub fn refresh_url(&self) -> Result<Url> {
		self.endpoint_url(&self.refresh_path, &[])
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// API base URL.
	pub base_url: Url,
	/// Refresh endpoint path.
	pub refresh_path: String,
	/// Login route carried by events.
	pub login_route: String,
	/// Headers attached to every request.
	pub default_headers: HeaderMap,
	/// Optional preemptive refresh window.
	pub preemptive_window: Option<Duration>,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with the API base and the JSON content type.
	pub fn new(base_url: Url) -> Self {
		let mut default_headers = HeaderMap::new();

		default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		Self {
			base_url,
			refresh_path: DEFAULT_REFRESH_PATH.into(),
			login_route: DEFAULT_LOGIN_ROUTE.into(),
			default_headers,
			preemptive_window: None,
		}
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the login route announced on session expiry.
	pub fn login_route(mut self, route: impl Into<String>) -> Self {
		self.login_route = route.into();

		self
	}

	/// Adds or replaces a default header. `Content-Type` stays `application/json`.
	pub fn default_header<K>(mut self, name: K, value: HeaderValue) -> Self
	where
		K: IntoHeaderName,
	{
		self.default_headers.insert(name, value);

		self
	}

	/// Enables refreshing JWT access tokens that expire within `window`.
	pub fn preemptive_window(mut self, window: Duration) -> Self {
		self.preemptive_window = Some(window);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ClientConfigError> {
		let mut base_url = self.base_url;

		if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
			return Err(ClientConfigError::UnsupportedScheme { url: base_url.to_string() });
		}
		if base_url.query().is_some() || base_url.fragment().is_some() {
			return Err(ClientConfigError::UnexpectedQuery { url: base_url.to_string() });
		}

		let trimmed = base_url.path().trim_end_matches('/').to_owned();

		base_url.set_path(&trimmed);

		validate_path("refresh path", &self.refresh_path)?;
		validate_path("login route", &self.login_route)?;

		if self.preemptive_window.is_some_and(|window| window.is_negative()) {
			return Err(ClientConfigError::NegativePreemptiveWindow);
		}

		let mut default_headers = self.default_headers;

		default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		Ok(ClientConfig {
			base_url,
			refresh_path: self.refresh_path,
			login_route: self.login_route,
			default_headers,
			preemptive_window: self.preemptive_window,
		})
	}
}

fn validate_path(field: &'static str, value: &str) -> Result<(), ClientConfigError> {
	if value.starts_with('/') {
		Ok(())
	} else {
		Err(ClientConfigError::RelativePath { field, value: value.to_owned() })
	}
}
