//! Authenticated API client with transparent, single-shot token refresh.
//!
//! [`ApiClient::execute`] resolves a request against the configured base URL, attaches
//! `Authorization: Bearer <access token>` from the credential store, and sends it
//! through the [`ApiTransport`]. A 401 on a request that has not been retried yet
//! marks the request, refreshes the access token once (coalesced across concurrent
//! callers), and re-issues it. Every other failure is returned to the caller as-is.

pub mod refresh;
pub mod resources;
pub mod session;

pub use refresh::RefreshMetrics;

// crates.io
use http::{
	HeaderValue, Method, StatusCode,
	header::{AUTHORIZATION, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessClaims, CredentialKey, TokenSecret},
	client::refresh::{RefreshFailure, RefreshGate},
	config::ClientConfig,
	error::{ApiError, ConfigError},
	events::{AuthEvent, AuthEventListener, AuthEvents, ExpiryReason},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	request::ApiRequest,
	response::ApiResponse,
	store::CredentialStore,
	transport::{ApiTransport, HttpRequest, HttpResponse, parse_retry_after},
};
#[cfg(feature = "reqwest")] use crate::{store::MemoryStore, transport::ReqwestTransport};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestTransport>;

/// Issues API requests with stored credentials and recovers from expired access
/// tokens exactly once per request.
///
/// The client owns the transport, the credential store handle, the immutable
/// configuration, and the listener registry. Clones share all of them, including the
/// refresh guard, so a 401 storm across clones still results in a single refresh call.
pub struct ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Transport used for every outbound call, refreshes included.
	pub transport: Arc<T>,
	/// Credential store consulted on every request.
	pub store: Arc<dyn CredentialStore>,
	/// Immutable client configuration.
	pub config: ClientConfig,
	/// Listener registry receiving [`AuthEvent`]s.
	pub events: AuthEvents,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	refresh_gate: Arc<RefreshGate>,
}
impl<T> ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_transport(
		config: ClientConfig,
		store: Arc<dyn CredentialStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			config,
			events: AuthEvents::default(),
			refresh_metrics: Default::default(),
			refresh_gate: Default::default(),
		}
	}

	/// Registers a listener for authentication events.
	pub fn with_listener(self, listener: Arc<dyn AuthEventListener>) -> Self {
		self.events.subscribe(listener);

		self
	}

	/// Sends `request`, refreshing the access token and retrying once on a 401.
	pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: OperationKind = OperationKind::Request;

		let span = OperationSpan::new(KIND, "execute");

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);

		let result = span
			.instrument(async move {
				let seen_generation = self.refresh_gate.generation();

				self.refresh_if_expiring(seen_generation).await;

				let (outcome, sent_token) = self.dispatch(&request).await?;

				match outcome {
					Ok(response) => Ok(response),
					Err(Error::Status(error))
						if error.status == StatusCode::UNAUTHORIZED && !request.is_retry() =>
						self.recover_unauthorized(request, sent_token, seen_generation, error).await,
					Err(error) => Err(error),
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_operation_outcome(KIND, OperationOutcome::Success),
			Err(_) => obs::record_operation_outcome(KIND, OperationOutcome::Failure),
		}

		result
	}

	/// Attaches the stored access token to `request` as a bearer credential.
	///
	/// Returns the token that was attached. A missing token is not an error; the
	/// request simply goes out unauthenticated.
	pub async fn authorize(&self, request: &mut HttpRequest) -> Result<Option<TokenSecret>> {
		let token = self.store.get(CredentialKey::AccessToken).await?;

		if let Some(token) = &token {
			let mut value = HeaderValue::from_str(&token.bearer()).map_err(ConfigError::from)?;

			value.set_sensitive(true);
			request.headers_mut().insert(AUTHORIZATION, value);
		}

		Ok(token)
	}

	/// Builds the wire request for `request`, without credentials.
	///
	/// Per-request headers replace default headers of the same name, except
	/// `Content-Type`, which is always `application/json`.
	pub fn build_request(&self, request: &ApiRequest) -> Result<(Url, HttpRequest)> {
		let url = self.config.endpoint_url(&request.path, &request.query)?;
		let mut http_request = http::Request::builder()
			.method(request.method.clone())
			.uri(url.as_str())
			.body(request.body.clone().unwrap_or_default())
			.map_err(ConfigError::from)?;
		let mut headers = self.config.default_headers.clone();

		for name in request.headers.keys() {
			headers.remove(name);
		}
		for (name, value) in &request.headers {
			headers.append(name.clone(), value.clone());
		}

		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		*http_request.headers_mut() = headers;

		Ok((url, http_request))
	}

	async fn dispatch(
		&self,
		request: &ApiRequest,
	) -> Result<(Result<ApiResponse>, Option<TokenSecret>)> {
		let (url, mut http_request) = self.build_request(request)?;
		let sent_token = self.authorize(&mut http_request).await?;
		let response = self.transport.send(http_request).await?;

		Ok((classify_response(request.method.clone(), url, response), sent_token))
	}

	async fn recover_unauthorized(
		&self,
		mut request: ApiRequest,
		sent_token: Option<TokenSecret>,
		seen_generation: u64,
		original: Box<ApiError>,
	) -> Result<ApiResponse> {
		request.mark_retry();

		match self.refresh_coalesced(sent_token.as_ref(), seen_generation, true).await {
			Ok(_) => {},
			Err(RefreshFailure::MissingRefreshToken) => {
				self.expire_session(ExpiryReason::MissingRefreshToken);

				return Err(Error::Status(original));
			},
			Err(RefreshFailure::Rejected(source)) => {
				self.expire_session(ExpiryReason::RefreshRejected);

				return Err(Error::Refresh { source });
			},
			Err(RefreshFailure::Shared(source)) => return Err(Error::Refresh { source }),
			Err(RefreshFailure::Storage(err)) => return Err(err.into()),
		}

		let (outcome, _) = self.dispatch(&request).await?;

		outcome
	}

	async fn refresh_if_expiring(&self, seen_generation: u64) {
		let Some(window) = self.config.preemptive_window else {
			return;
		};
		let Ok(Some(token)) = self.store.get(CredentialKey::AccessToken).await else {
			return;
		};
		let expiring = AccessClaims::peek(token.expose())
			.is_some_and(|claims| claims.expires_within(OffsetDateTime::now_utc(), window));

		if expiring {
			// A failure is kept on the gate; the 401 path settles it without calling the
			// endpoint again.
			let _ = self.refresh_coalesced(Some(&token), seen_generation, false).await;
		}
	}

	fn expire_session(&self, reason: ExpiryReason) {
		let redirect_to = self.config.login_route.clone();

		obs::record_session_expired(reason, &redirect_to);
		self.events.emit(AuthEvent::SessionExpired { reason, redirect_to });
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestTransport> {
	/// Creates a client backed by a default reqwest transport.
	pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Self {
		Self::with_transport(config, store, ReqwestTransport::default())
	}

	/// Creates a client for a backend served at `origin` with an in-memory store.
	pub fn for_origin(origin: &str) -> Result<Self> {
		let config = ClientConfig::from_origin(origin).map_err(ConfigError::from)?;

		Ok(Self::new(config, Arc::new(MemoryStore::default())))
	}
}
impl<T> Clone for ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			events: self.events.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			refresh_gate: self.refresh_gate.clone(),
		}
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("events", &self.events)
			.field("refresh_metrics", &self.refresh_metrics)
			.finish()
	}
}

/// Splits a raw response into the success value or the backend error.
pub(crate) fn classify_response(
	method: Method,
	url: Url,
	response: HttpResponse,
) -> Result<ApiResponse> {
	let (parts, body) = response.into_parts();

	if parts.status.is_success() {
		Ok(ApiResponse { status: parts.status, headers: parts.headers, body })
	} else {
		Err(ApiError {
			method,
			url,
			status: parts.status,
			retry_after: parse_retry_after(&parts.headers),
			body,
		}
		.into())
	}
}
