//! In-process fake of the marketplace backend shared by integration tests.

#![allow(dead_code)]

// std
use std::{collections::HashMap, sync::Arc};
// crates.io
use http::{StatusCode, header::AUTHORIZATION};
use parking_lot::Mutex;
// self
use session_market_client::{
	client::ApiClient,
	config::ClientConfig,
	error::TransportError,
	events::RecordingListener,
	store::{CredentialStore, MemoryStore},
	transport::{ApiTransport, HttpRequest, HttpResponse, TransportFuture},
};

pub const REFRESH_PATH: &str = "/api/auth/refresh/";
pub const TOKEN_NOT_VALID: &str =
	r#"{"detail":"Given token not valid for any token type","code":"token_not_valid"}"#;

/// Request as observed by the fake backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeenRequest {
	pub method: String,
	pub path: String,
	pub authorization: Option<String>,
	pub body: Option<serde_json::Value>,
}

#[derive(Default)]
struct BackendState {
	valid_access: Option<String>,
	valid_refresh: Option<String>,
	next_access: String,
	refresh_status: Option<u16>,
	reject_all: bool,
	routes: HashMap<String, Option<(u16, String)>>,
}

/// Backend that accepts one access token at a time and rotates it on refresh.
///
/// Protected paths answer 200 with `{"path": ...}` for the currently valid token and
/// 401 otherwise. Routes registered with [`FakeBackend::route`] bypass the token check.
#[derive(Default)]
pub struct FakeBackend {
	state: Mutex<BackendState>,
	seen: Mutex<Vec<SeenRequest>>,
}
impl FakeBackend {
	pub fn new(valid_refresh: &str, next_access: &str) -> Self {
		let backend = Self::default();

		{
			let mut state = backend.state.lock();

			state.valid_refresh = Some(valid_refresh.to_owned());
			state.next_access = next_access.to_owned();
		}

		backend
	}

	pub fn accept_access(self, token: &str) -> Self {
		self.state.lock().valid_access = Some(token.to_owned());

		self
	}

	pub fn fail_refresh_with(self, status: u16) -> Self {
		self.state.lock().refresh_status = Some(status);

		self
	}

	pub fn reject_all(self) -> Self {
		self.state.lock().reject_all = true;

		self
	}

	pub fn route(self, path: &str, status: u16, body: &str) -> Self {
		self.state.lock().routes.insert(path.to_owned(), Some((status, body.to_owned())));

		self
	}

	pub fn unreachable(self, path: &str) -> Self {
		self.state.lock().routes.insert(path.to_owned(), None);

		self
	}

	pub fn seen(&self) -> Vec<SeenRequest> {
		self.seen.lock().clone()
	}

	pub fn refresh_calls(&self) -> usize {
		self.seen.lock().iter().filter(|request| request.path == REFRESH_PATH).count()
	}

	fn respond(&self, request: &SeenRequest) -> Option<(u16, String)> {
		let mut state = self.state.lock();

		if let Some(route) = state.routes.get(&request.path) {
			return route.clone();
		}
		if request.path == REFRESH_PATH {
			if let Some(status) = state.refresh_status {
				return Some((status, TOKEN_NOT_VALID.to_owned()));
			}

			let presented = request
				.body
				.as_ref()
				.and_then(|body| body.get("refresh"))
				.and_then(|refresh| refresh.as_str());

			if presented.is_none() || presented != state.valid_refresh.as_deref() {
				return Some((401, TOKEN_NOT_VALID.to_owned()));
			}

			let access = state.next_access.clone();

			state.valid_access = Some(access.clone());

			return Some((200, serde_json::json!({ "access": access }).to_string()));
		}

		let expected = state.valid_access.as_ref().map(|token| format!("Bearer {token}"));

		if !state.reject_all && expected.is_some() && request.authorization == expected {
			Some((200, serde_json::json!({ "path": request.path }).to_string()))
		} else {
			Some((401, TOKEN_NOT_VALID.to_owned()))
		}
	}
}
impl ApiTransport for FakeBackend {
	fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
		let seen = SeenRequest {
			method: request.method().to_string(),
			path: request.uri().path().to_owned(),
			authorization: request
				.headers()
				.get(AUTHORIZATION)
				.and_then(|value| value.to_str().ok())
				.map(ToOwned::to_owned),
			body: serde_json::from_slice(request.body()).ok(),
		};

		Box::pin(async move {
			// Let concurrent callers interleave the way real network round trips do.
			tokio::task::yield_now().await;

			self.seen.lock().push(seen.clone());

			let (status, body) = self.respond(&seen).ok_or_else(|| {
				TransportError::Io(std::io::Error::new(
					std::io::ErrorKind::ConnectionRefused,
					"Backend unreachable.",
				))
			})?;
			let mut response = HttpResponse::new(body.into_bytes());

			*response.status_mut() =
				StatusCode::from_u16(status).expect("Fixture status should be valid.");

			Ok(response)
		})
	}
}

pub fn config() -> ClientConfig {
	ClientConfig::from_origin("http://localhost:8000").expect("Origin fixture should be valid.")
}

pub fn client_with_config(
	config: ClientConfig,
	backend: FakeBackend,
	store: MemoryStore,
) -> (ApiClient<FakeBackend>, Arc<FakeBackend>, RecordingListener) {
	let backend = Arc::new(backend);
	let recorder = RecordingListener::default();
	let store: Arc<dyn CredentialStore> = Arc::new(store);
	let client = ApiClient::with_transport(config, store, backend.clone())
		.with_listener(Arc::new(recorder.clone()));

	(client, backend, recorder)
}

pub fn client(
	backend: FakeBackend,
	store: MemoryStore,
) -> (ApiClient<FakeBackend>, Arc<FakeBackend>, RecordingListener) {
	client_with_config(config(), backend, store)
}
