//! Client-level error types shared across the transport, stores, and refresh protocol.

// crates.io
use http::{Method, StatusCode};
// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response or request body could not be (de)serialized.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Backend answered with a non-success status.
	#[error(transparent)]
	Status(Box<ApiError>),
	/// Login redirect did not carry usable credentials.
	#[error(transparent)]
	Login(#[from] crate::auth::LoginRedirectError),

	/// Access token refresh failed; the stored credentials were cleared.
	#[error("Access token refresh failed.")]
	Refresh {
		/// Failure reported while calling the refresh endpoint; shared by every
		/// request that waited on the same refresh.
		#[source]
		source: Arc<Error>,
	},
}
impl Error {
	/// Wraps a refresh endpoint failure.
	pub fn refresh(source: Error) -> Self {
		Self::Refresh { source: Arc::new(source) }
	}

	/// Returns the backend error response embedded in this error, if any.
	///
	/// Refresh failures expose the refresh endpoint's response, not the one that
	/// triggered the refresh.
	pub fn api(&self) -> Option<&ApiError> {
		match self {
			Self::Status(api) => Some(api.as_ref()),
			Self::Refresh { source } => source.api(),
			_ => None,
		}
	}

	/// Returns the HTTP status embedded in this error, if any.
	pub fn status(&self) -> Option<StatusCode> {
		self.api().map(|api| api.status)
	}

	/// Returns `true` when the backend rejected the request with 401.
	pub fn is_unauthorized(&self) -> bool {
		self.status() == Some(StatusCode::UNAUTHORIZED)
	}
}

impl From<ApiError> for Error {
	fn from(e: ApiError) -> Self {
		Self::Status(Box::new(e))
	}
}

/// Configuration and validation failures raised by the client.
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
	HttpRequest(#[from] http::Error),
	/// Header value cannot be sent on the wire.
	#[error(transparent)]
	InvalidHeader(#[from] http::header::InvalidHeaderValue),
	/// Client configuration failed validation.
	#[error(transparent)]
	InvalidConfig(#[from] crate::config::ClientConfigError),
	/// Request path cannot be joined onto the API base.
	#[error("Request path `{path}` must not carry a query string or fragment.")]
	InvalidPath {
		/// Offending request path.
		path: String,
	},
	/// No refresh token is stored.
	#[error("No refresh token is stored.")]
	MissingRefreshToken,
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
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
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

/// Body (de)serialization failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Response body is not the JSON shape the caller asked for.
	#[error("Response body from {status} is not valid JSON for the requested type.")]
	Json {
		/// Structured parsing failure with the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status of the response being decoded.
		status: StatusCode,
	},
	/// Request payload could not be encoded as JSON.
	#[error("Request body could not be encoded as JSON.")]
	Encode(#[source] serde_json::Error),
}

/// Non-success response returned by the backend.
///
/// The body is kept verbatim so callers can inspect validation messages the
/// backend produced.
#[derive(Clone, ThisError)]
#[error("Backend returned {status} for {method} {url}.")]
pub struct ApiError {
	/// Method of the failed request.
	pub method: Method,
	/// Absolute URL of the failed request.
	pub url: Url,
	/// Response status.
	pub status: StatusCode,
	/// Raw response body.
	pub body: Vec<u8>,
	/// Retry-After hint from the backend, if supplied.
	pub retry_after: Option<Duration>,
}
impl ApiError {
	/// Decodes the response body as JSON.
	pub fn json<T>(&self) -> Result<T>
	where
		T: serde::de::DeserializeOwned,
	{
		crate::response::decode_json(self.status, &self.body)
	}

	/// Returns the backend's `detail` message when the body carries one.
	pub fn detail(&self) -> Option<String> {
		let value = serde_json::from_slice::<serde_json::Value>(&self.body).ok()?;

		match value {
			serde_json::Value::Object(mut map) => match map.remove("detail")? {
				serde_json::Value::String(detail) => Some(detail),
				other => Some(other.to_string()),
			},
			// Validation errors raised outside a field arrive as a bare list.
			serde_json::Value::Array(items) =>
				items.into_iter().find_map(|item| item.as_str().map(ToOwned::to_owned)),
			_ => None,
		}
	}

	/// Returns the body as lossy UTF-8 text.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}
impl Debug for ApiError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiError")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("status", &self.status)
			.field("body_len", &self.body.len())
			.field("retry_after", &self.retry_after)
			.finish()
	}
}
