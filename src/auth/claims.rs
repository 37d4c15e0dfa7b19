//! Unverified JWT claim peeking used to schedule preemptive refreshes.
//!
//! The backend is the only party that validates signatures; the client reads the
//! payload segment purely to learn when the access token will expire.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::_prelude::*;

/// Subset of claims carried by the backend's access tokens.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AccessClaims {
	/// Expiry as seconds since the Unix epoch.
	pub exp: Option<i64>,
	/// Issued-at as seconds since the Unix epoch.
	pub iat: Option<i64>,
	/// Token kind (`access` or `refresh`).
	pub token_type: Option<String>,
	/// Backend user identifier.
	pub user_id: Option<serde_json::Value>,
}
impl AccessClaims {
	/// Decodes the payload segment of a JWT without verifying its signature.
	///
	/// Returns `None` for opaque tokens or malformed payloads.
	pub fn peek(token: &str) -> Option<Self> {
		let mut segments = token.split('.');
		let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);

		if segments.next().is_some() {
			return None;
		}

		let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;

		serde_json::from_slice(&bytes).ok()
	}

	/// Expiry instant, when the token carries a valid `exp` claim.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		OffsetDateTime::from_unix_timestamp(self.exp?).ok()
	}

	/// Returns `true` when the token expires within `window` of `now`.
	pub fn expires_within(&self, now: OffsetDateTime, window: Duration) -> bool {
		self.expires_at().is_some_and(|expires_at| expires_at - now <= window)
	}
}
