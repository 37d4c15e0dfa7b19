//! Sign-in state helpers built on the credential store.
//!
//! The backend hands out token pairs through an OAuth redirect or the development-only
//! mock login. Either way the pair lands in the store, and the client picks it up on
//! the next request.

// self
use crate::{
	_prelude::*,
	auth::{CredentialKey, CredentialPair, LoginRedirect},
	client::{ApiClient, resources::ME_PATH},
	events::AuthEvent,
	models::{LoginGrant, Role},
	request::ApiRequest,
	transport::ApiTransport,
};

/// Development-only login endpoint, relative to the API base.
pub const MOCK_LOGIN_PATH: &str = "/auth/mock-login/";

#[derive(Serialize)]
struct MockLoginRequest<'a> {
	username: &'a str,
	role: Role,
}

impl<T> ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Stores `pair` and loads the profile it belongs to.
	pub async fn login<U>(&self, pair: &CredentialPair) -> Result<Option<U>>
	where
		U: DeserializeOwned,
	{
		self.store.save_pair(pair).await?;
		self.events.emit(AuthEvent::LoggedIn);

		self.current_user().await
	}

	/// Parses the backend's post-login redirect and stores the carried credentials.
	pub async fn complete_login(&self, redirect: &Url) -> Result<LoginRedirect> {
		let redirect = LoginRedirect::parse(redirect)?;

		self.store.save_pair(&redirect.credentials).await?;
		self.events.emit(AuthEvent::LoggedIn);

		Ok(redirect)
	}

	/// Loads the signed-in profile, or `None` when no access token is stored.
	pub async fn current_user<U>(&self) -> Result<Option<U>>
	where
		U: DeserializeOwned,
	{
		if self.store.get(CredentialKey::AccessToken).await?.is_none() {
			return Ok(None);
		}

		self.get_json(ME_PATH).await.map(Some)
	}

	/// Removes the stored credentials and announces the login route.
	pub async fn logout(&self) -> Result<()> {
		self.store.clear_all().await?;
		self.events.emit(AuthEvent::LoggedOut { redirect_to: self.config.login_route.clone() });

		Ok(())
	}

	/// Signs in through the backend's development login and stores the issued pair.
	pub async fn mock_login(&self, username: &str, role: Role) -> Result<LoginGrant> {
		let request = ApiRequest::post(MOCK_LOGIN_PATH).json(&MockLoginRequest { username, role })?;
		let grant: LoginGrant = self.send_json(request).await?;

		self.store
			.save_pair(&CredentialPair::new(grant.access.as_str(), grant.refresh.as_str()))
			.await?;
		self.events.emit(AuthEvent::LoggedIn);

		Ok(grant)
	}
}
