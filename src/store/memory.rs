//! Thread-safe in-memory [`CredentialStore`] for tests and short-lived processes.

// self
use crate::{
	_prelude::*,
	auth::{CredentialKey, TokenSecret},
	store::{CredentialStore, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<CredentialKey, TokenSecret>>>;

/// Storage backend that keeps credentials in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Seeds a store with both tokens.
	pub fn with_tokens(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		let store = Self::default();

		{
			let mut guard = store.0.write();

			guard.insert(CredentialKey::AccessToken, TokenSecret::new(access_token));
			guard.insert(CredentialKey::RefreshToken, TokenSecret::new(refresh_token));
		}

		store
	}

	/// Returns the stored secret without going through the async contract.
	pub fn peek(&self, key: CredentialKey) -> Option<TokenSecret> {
		self.0.read().get(&key).cloned()
	}
}
impl CredentialStore for MemoryStore {
	fn get(&self, key: CredentialKey) -> StoreFuture<'_, Option<TokenSecret>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(&key).cloned()) })
	}

	fn set(&self, key: CredentialKey, value: TokenSecret) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(key, value);

			Ok(())
		})
	}

	fn clear(&self, key: CredentialKey) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().remove(&key);

			Ok(())
		})
	}
}
