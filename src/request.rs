//! Outbound request descriptor carrying the one-shot retry marker.

// crates.io
use http::{HeaderMap, HeaderValue, Method, header::IntoHeaderName};
// self
use crate::{_prelude::*, error::DecodeError};

/// Describes a single API call relative to the configured base URL.
///
/// The retry marker is private: the client sets it before the one refresh-and-retry
/// cycle a request may go through and nothing clears it afterwards. Clones carry the
/// marker with them.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the API base, e.g. `/sessions/`.
	pub path: String,
	/// Query pairs appended to the URL.
	pub query: Vec<(String, String)>,
	/// Per-request headers, applied over the configured defaults.
	pub headers: HeaderMap,
	/// JSON body bytes.
	pub body: Option<Vec<u8>>,
	retried: bool,
}
impl ApiRequest {
	/// Creates a request without body or extra headers.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			headers: HeaderMap::new(),
			body: None,
			retried: false,
		}
	}

	/// Shorthand for a `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// Shorthand for a `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// Shorthand for a `PATCH` request.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::PATCH, path)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Serializes `body` as the JSON payload.
	pub fn json<T>(mut self, body: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(body).map_err(DecodeError::Encode)?);

		Ok(self)
	}

	/// Appends a query pair.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Adds or replaces a header.
	pub fn header<K>(mut self, name: K, value: HeaderValue) -> Self
	where
		K: IntoHeaderName,
	{
		self.headers.insert(name, value);

		self
	}

	/// Returns `true` once the request went through its refresh-and-retry cycle.
	pub fn is_retry(&self) -> bool {
		self.retried
	}

	pub(crate) fn mark_retry(&mut self) {
		self.retried = true;
	}
}
