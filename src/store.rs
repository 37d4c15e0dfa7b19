//! Credential storage contract and built-in store implementations.
//!
//! The client never reads a process-wide global: every [`ApiClient`](crate::client::ApiClient)
//! is handed an `Arc<dyn CredentialStore>`, and several clients may share one.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{CredentialKey, CredentialPair, TokenSecret},
};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Durable key-value storage for the access and refresh tokens.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Reads the secret stored under `key`, if present.
	fn get(&self, key: CredentialKey) -> StoreFuture<'_, Option<TokenSecret>>;

	/// Writes (or overwrites) the secret stored under `key`.
	fn set(&self, key: CredentialKey, value: TokenSecret) -> StoreFuture<'_, ()>;

	/// Removes the secret stored under `key`; absent keys are not an error.
	fn clear(&self, key: CredentialKey) -> StoreFuture<'_, ()>;
}
impl dyn CredentialStore {
	/// Persists both tokens of a freshly issued pair.
	pub async fn save_pair(&self, pair: &CredentialPair) -> Result<(), StoreError> {
		self.set(CredentialKey::AccessToken, pair.access_token.clone()).await?;
		self.set(CredentialKey::RefreshToken, pair.refresh_token.clone()).await
	}

	/// Loads the stored pair when both tokens are present.
	pub async fn load_pair(&self) -> Result<Option<CredentialPair>, StoreError> {
		let access_token = self.get(CredentialKey::AccessToken).await?;
		let refresh_token = self.get(CredentialKey::RefreshToken).await?;

		Ok(access_token
			.zip(refresh_token)
			.map(|(access_token, refresh_token)| CredentialPair { access_token, refresh_token }))
	}

	/// Removes every stored token.
	///
	/// Every key is attempted even when an earlier one fails; the first failure is
	/// returned.
	pub async fn clear_all(&self) -> Result<(), StoreError> {
		let mut first_failure = None;

		for key in CredentialKey::ALL {
			if let Err(err) = self.clear(key).await {
				first_failure.get_or_insert(err);
			}
		}

		first_failure.map_or(Ok(()), Err)
	}
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
