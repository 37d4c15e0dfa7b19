//! Typed calls for the marketplace resources.
//!
//! Responses decode into any `DeserializeOwned` type, so callers may use the
//! [`models`](crate::models) structs or plain `serde_json::Value`.

// self
use crate::{_prelude::*, client::ApiClient, request::ApiRequest, transport::ApiTransport};

/// Current account profile, relative to the API base.
pub const ME_PATH: &str = "/auth/me/";
/// Session collection, relative to the API base.
pub const SESSIONS_PATH: &str = "/sessions/";
/// Sessions published by the current creator, relative to the API base.
pub const MY_SESSIONS_PATH: &str = "/sessions/my_sessions/";
/// Booking collection, relative to the API base.
pub const BOOKINGS_PATH: &str = "/bookings/";

#[derive(Serialize)]
struct NewBooking {
	session: u64,
}

impl<T> ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Executes `request` and decodes the JSON response body.
	pub async fn send_json<R>(&self, request: ApiRequest) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.execute(request).await?.json()
	}

	/// Issues `GET path` and decodes the JSON response body.
	pub async fn get_json<R>(&self, path: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.send_json(ApiRequest::get(path)).await
	}

	/// Loads the signed-in profile.
	pub async fn me<R>(&self) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.get_json(ME_PATH).await
	}

	/// Applies a partial profile update and returns the stored profile.
	pub async fn update_me<B, R>(&self, update: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.send_json(ApiRequest::patch(ME_PATH).json(update)?).await
	}

	/// Lists published sessions.
	pub async fn sessions<R>(&self) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.get_json(SESSIONS_PATH).await
	}

	/// Lists sessions published by the signed-in creator.
	pub async fn my_sessions<R>(&self) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.get_json(MY_SESSIONS_PATH).await
	}

	/// Loads one session.
	pub async fn session<R>(&self, id: u64) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.get_json(&format!("{SESSIONS_PATH}{id}/")).await
	}

	/// Publishes a session as the signed-in creator.
	pub async fn create_session<B, R>(&self, session: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.send_json(ApiRequest::post(SESSIONS_PATH).json(session)?).await
	}

	/// Lists bookings held by the signed-in account.
	pub async fn bookings<R>(&self) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.get_json(BOOKINGS_PATH).await
	}

	/// Books a spot in `session_id`.
	pub async fn create_booking<R>(&self, session_id: u64) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.send_json(ApiRequest::post(BOOKINGS_PATH).json(&NewBooking { session: session_id })?)
			.await
	}
}
