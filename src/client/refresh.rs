//! Access token refresh with a singleflight guard.
//!
//! Every refresh, whether triggered by a 401, by the preemptive window, or by an
//! explicit [`ApiClient::refresh_access_token`] call, runs under the client's refresh
//! guard. A caller that acquires the guard after another caller already rotated the
//! access token reuses the stored token instead of calling the endpoint again, and a
//! caller that waited on a round that failed reports that round's failure.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use http::{HeaderValue, Method, StatusCode, header::CONTENT_TYPE};
// self
use crate::{
	_prelude::*,
	auth::{CredentialKey, TokenSecret},
	client::{ApiClient, classify_response},
	error::{ApiError, ConfigError, DecodeError},
	events::AuthEvent,
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	store::StoreError,
	transport::ApiTransport,
};

#[derive(Serialize)]
struct RefreshRequest<'a> {
	refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshGrant {
	access: String,
	#[serde(default)]
	refresh: Option<String>,
}

/// Why a coalesced refresh produced no token.
#[derive(Debug)]
pub(crate) enum RefreshFailure {
	MissingRefreshToken,
	/// This caller settled the failure: credentials are cleared and the session must
	/// be announced as expired.
	Rejected(Arc<Error>),
	/// Another caller already settled the failure this caller was waiting on.
	Shared(Arc<Error>),
	Storage(StoreError),
}

/// Singleflight guard plus the outcome of the most recent refresh round.
///
/// The generation advances after every round that reached the refresh endpoint.
/// Callers read it before sending a request; a caller that later finds a newer
/// generation whose round failed reuses that failure instead of starting another.
#[derive(Debug, Default)]
pub(crate) struct RefreshGate {
	round: AsyncMutex<RefreshRound>,
	generation: AtomicU64,
}
impl RefreshGate {
	pub(crate) fn generation(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}
}

#[derive(Debug, Default)]
struct RefreshRound {
	failure: Option<FailedRefresh>,
}

#[derive(Debug)]
struct FailedRefresh {
	error: Arc<Error>,
	/// Whether the stored credentials were cleared and the expiry announced.
	settled: bool,
}

impl<T> ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Exchanges the stored refresh token for a new access token and persists it.
	///
	/// When another task rotates the access token while this call waits for the
	/// refresh guard, that token is returned without a second endpoint call. A
	/// rejected refresh clears the stored credentials and returns [`Error::Refresh`].
	pub async fn refresh_access_token(&self) -> Result<TokenSecret> {
		let seen_generation = self.refresh_gate.generation();
		let current = self.store.get(CredentialKey::AccessToken).await?;

		match self.refresh_coalesced(current.as_ref(), seen_generation, true).await {
			Ok(token) => Ok(token),
			Err(RefreshFailure::MissingRefreshToken) => Err(ConfigError::MissingRefreshToken.into()),
			Err(RefreshFailure::Rejected(source) | RefreshFailure::Shared(source)) =>
				Err(Error::Refresh { source }),
			Err(RefreshFailure::Storage(err)) => Err(err.into()),
		}
	}

	/// Refreshes unless the stored access token already differs from `stale`, or a
	/// round that failed finished after `seen_generation` was read.
	///
	/// With `settle` unset a failure leaves the credentials in place; the next
	/// settling caller that observes it clears them without calling the endpoint.
	pub(crate) async fn refresh_coalesced(
		&self,
		stale: Option<&TokenSecret>,
		seen_generation: u64,
		settle: bool,
	) -> Result<TokenSecret, RefreshFailure> {
		let mut round = self.refresh_gate.round.lock().await;
		let current =
			self.store.get(CredentialKey::AccessToken).await.map_err(RefreshFailure::Storage)?;

		if let Some(current) = current.filter(|token| Some(token) != stale) {
			self.refresh_metrics.record_coalesced();

			return Ok(current);
		}

		let newer_generation = self.refresh_gate.generation() != seen_generation;

		if let Some(failure) = round.failure.as_mut().filter(|_| newer_generation) {
			self.refresh_metrics.record_coalesced();

			if failure.settled || !settle {
				return Err(RefreshFailure::Shared(failure.error.clone()));
			}

			failure.settled = true;
			self.invalidate_credentials().await;

			return Err(RefreshFailure::Rejected(failure.error.clone()));
		}

		let refresh_token = self
			.store
			.get(CredentialKey::RefreshToken)
			.await
			.map_err(RefreshFailure::Storage)?
			.ok_or(RefreshFailure::MissingRefreshToken)?;
		let outcome = match self.exchange_refresh_token(&refresh_token).await {
			Ok(access_token) => {
				round.failure = None;

				Ok(access_token)
			},
			Err(err) => {
				let error = Arc::new(err);

				if settle {
					self.invalidate_credentials().await;
				}

				round.failure = Some(FailedRefresh { error: error.clone(), settled: settle });

				Err(RefreshFailure::Rejected(error))
			},
		};

		self.refresh_gate.generation.fetch_add(1, Ordering::Release);

		outcome
	}

	async fn invalidate_credentials(&self) {
		if let Err(err) = self.store.clear_all().await {
			obs::record_credentials_retained(&err);
		}
	}

	async fn exchange_refresh_token(&self, refresh_token: &TokenSecret) -> Result<TokenSecret> {
		const KIND: OperationKind = OperationKind::Refresh;

		let span = OperationSpan::new(KIND, "exchange_refresh_token");

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let result = span
			.instrument(async move {
				let url = self.config.refresh_url()?;
				let body = serde_json::to_vec(&RefreshRequest { refresh: refresh_token.expose() })
					.map_err(DecodeError::Encode)?;
				let request = http::Request::builder()
					.method(Method::POST)
					.uri(url.as_str())
					.header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
					.body(body)
					.map_err(ConfigError::from)?;
				let response = self.transport.send(request).await?;
				let response = classify_response(Method::POST, url.clone(), response)?;

				if response.status != StatusCode::OK {
					return Err(ApiError {
						method: Method::POST,
						url,
						status: response.status,
						body: response.body,
						retry_after: None,
					}
					.into());
				}

				let grant = response.json::<RefreshGrant>()?;
				let access_token = TokenSecret::new(grant.access);

				self.store.set(CredentialKey::AccessToken, access_token.clone()).await?;

				if let Some(rotated) = grant.refresh {
					self.store.set(CredentialKey::RefreshToken, TokenSecret::new(rotated)).await?;
				}

				Ok(access_token)
			})
			.await;

		match &result {
			Ok(_) => {
				self.refresh_metrics.record_success();
				obs::record_operation_outcome(KIND, OperationOutcome::Success);
				self.events.emit(AuthEvent::TokenRefreshed);
			},
			Err(_) => {
				self.refresh_metrics.record_failure();
				obs::record_operation_outcome(KIND, OperationOutcome::Failure);
			},
		}

		result
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::VecDeque;
	// self
	use super::*;
	use crate::{
		config::ClientConfig,
		error::TransportError,
		events::RecordingListener,
		store::MemoryStore,
		transport::{HttpRequest, HttpResponse, TransportFuture},
	};

	struct RefreshEndpoint {
		responses: Mutex<VecDeque<(u16, &'static str)>>,
		bodies: Mutex<Vec<serde_json::Value>>,
	}
	impl RefreshEndpoint {
		fn new(responses: impl IntoIterator<Item = (u16, &'static str)>) -> Self {
			Self {
				responses: Mutex::new(responses.into_iter().collect()),
				bodies: Default::default(),
			}
		}
	}
	impl ApiTransport for RefreshEndpoint {
		fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
			assert_eq!(request.uri().path(), "/api/auth/refresh/");
			assert_eq!(request.method(), Method::POST);
			assert!(request.headers().get(http::header::AUTHORIZATION).is_none());

			self.bodies.lock().push(
				serde_json::from_slice(request.body()).expect("Refresh body should be JSON."),
			);

			let next = self.responses.lock().pop_front();

			Box::pin(async move {
				let (status, body) = next.ok_or_else(|| {
					TransportError::Io(std::io::Error::other("No scripted response left."))
				})?;
				let mut response = HttpResponse::new(body.as_bytes().to_vec());

				*response.status_mut() =
					StatusCode::from_u16(status).expect("Scripted status should be valid.");

				Ok(response)
			})
		}
	}

	fn client(
		endpoint: RefreshEndpoint,
		store: MemoryStore,
	) -> (ApiClient<RefreshEndpoint>, Arc<RefreshEndpoint>, RecordingListener) {
		let endpoint = Arc::new(endpoint);
		let recorder = RecordingListener::default();
		let config =
			ClientConfig::from_origin("http://localhost").expect("Origin fixture should be valid.");
		let client = ApiClient::with_transport(config, Arc::new(store), endpoint.clone())
			.with_listener(Arc::new(recorder.clone()));

		(client, endpoint, recorder)
	}

	#[tokio::test]
	async fn refresh_persists_access_and_rotated_refresh_tokens() {
		let store = MemoryStore::with_tokens("old-access", "old-refresh");
		let (client, endpoint, recorder) = client(
			RefreshEndpoint::new([(200, r#"{"access":"new-access","refresh":"new-refresh"}"#)]),
			store.clone(),
		);
		let token = client.refresh_access_token().await.expect("Refresh should succeed.");

		assert_eq!(token, TokenSecret::new("new-access"));
		assert_eq!(store.peek(CredentialKey::AccessToken), Some(TokenSecret::new("new-access")));
		assert_eq!(store.peek(CredentialKey::RefreshToken), Some(TokenSecret::new("new-refresh")));
		assert_eq!(*endpoint.bodies.lock(), vec![serde_json::json!({ "refresh": "old-refresh" })]);
		assert_eq!(recorder.events(), vec![AuthEvent::TokenRefreshed]);
		assert_eq!(client.refresh_metrics.successes(), 1);
	}

	#[tokio::test]
	async fn refresh_keeps_refresh_token_when_not_rotated() {
		let store = MemoryStore::with_tokens("old-access", "old-refresh");
		let (client, _, _) =
			client(RefreshEndpoint::new([(200, r#"{"access":"new-access"}"#)]), store.clone());

		client.refresh_access_token().await.expect("Refresh should succeed.");

		assert_eq!(store.peek(CredentialKey::RefreshToken), Some(TokenSecret::new("old-refresh")));
	}

	#[tokio::test]
	async fn non_ok_success_status_is_a_failure() {
		let store = MemoryStore::with_tokens("old-access", "old-refresh");
		let (client, _, recorder) =
			client(RefreshEndpoint::new([(204, "")]), store.clone());
		let err = client.refresh_access_token().await.expect_err("204 should not count as refreshed.");

		assert!(matches!(err, Error::Refresh { .. }));
		assert_eq!(err.status(), Some(StatusCode::NO_CONTENT));
		assert_eq!(store.peek(CredentialKey::AccessToken), None);
		assert_eq!(store.peek(CredentialKey::RefreshToken), None);
		assert!(recorder.events().is_empty());
		assert_eq!(client.refresh_metrics.failures(), 1);
	}

	#[tokio::test]
	async fn missing_refresh_token_is_a_config_error() {
		let store = MemoryStore::default();
		let (client, endpoint, _) = client(RefreshEndpoint::new([]), store);
		let err = client.refresh_access_token().await.expect_err("Refresh needs a refresh token.");

		assert!(matches!(err, Error::Config(ConfigError::MissingRefreshToken)));
		assert!(endpoint.bodies.lock().is_empty());
		assert_eq!(client.refresh_metrics.attempts(), 0);
	}

	#[tokio::test]
	async fn rotated_token_is_reused_without_calling_the_endpoint() {
		let store = MemoryStore::with_tokens("fresh-access", "refresh");
		let (client, endpoint, _) = client(RefreshEndpoint::new([]), store);
		let stale = TokenSecret::new("stale-access");
		let token = client
			.refresh_coalesced(Some(&stale), client.refresh_gate.generation(), true)
			.await
			.expect("A rotated token should be reused.");

		assert_eq!(token, TokenSecret::new("fresh-access"));
		assert!(endpoint.bodies.lock().is_empty());
		assert_eq!(client.refresh_metrics.coalesced(), 1);
	}

	#[tokio::test]
	async fn unsettled_failure_is_settled_once_without_another_exchange() {
		let store = MemoryStore::with_tokens("stale-access", "refresh");
		let (client, endpoint, _) = client(RefreshEndpoint::new([(500, "{}")]), store.clone());
		let stale = TokenSecret::new("stale-access");
		let seen = client.refresh_gate.generation();
		let first = client.refresh_coalesced(Some(&stale), seen, false).await;

		assert!(matches!(first, Err(RefreshFailure::Rejected(_))));
		assert_eq!(store.peek(CredentialKey::AccessToken), Some(stale.clone()));
		assert_eq!(store.peek(CredentialKey::RefreshToken), Some(TokenSecret::new("refresh")));

		let settled = client.refresh_coalesced(Some(&stale), seen, true).await;

		assert!(matches!(settled, Err(RefreshFailure::Rejected(_))));
		assert_eq!(store.peek(CredentialKey::AccessToken), None);
		assert_eq!(store.peek(CredentialKey::RefreshToken), None);

		let shared = client.refresh_coalesced(None, seen, true).await;

		assert!(matches!(shared, Err(RefreshFailure::Shared(_))));
		assert_eq!(endpoint.bodies.lock().len(), 1);
		assert_eq!(client.refresh_metrics.attempts(), 1);
	}
}
