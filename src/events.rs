//! Authentication lifecycle events delivered to the surrounding application shell.
//!
//! The client never navigates on its own. When credentials become unusable it emits
//! [`AuthEvent::SessionExpired`] carrying the configured login route, and the shell
//! decides how to bring the user back to sign-in.

// self
use crate::_prelude::*;

/// Why the client gave up on the stored credentials.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExpiryReason {
	/// A request was rejected with 401 and no refresh token was stored.
	MissingRefreshToken,
	/// The refresh endpoint rejected the refresh token or could not be reached.
	RefreshRejected,
}
impl ExpiryReason {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ExpiryReason::MissingRefreshToken => "missing_refresh_token",
			ExpiryReason::RefreshRejected => "refresh_rejected",
		}
	}
}
impl Display for ExpiryReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Event emitted by the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthEvent {
	/// Credentials can no longer be used; the user must sign in again.
	SessionExpired {
		/// Why the session ended.
		reason: ExpiryReason,
		/// Route the shell should navigate to.
		redirect_to: String,
	},
	/// A new access token was obtained from the refresh endpoint.
	TokenRefreshed,
	/// Credentials were stored by a login call.
	LoggedIn,
	/// Credentials were removed by an explicit logout.
	LoggedOut {
		/// Route the shell should navigate to.
		redirect_to: String,
	},
}

/// Receives [`AuthEvent`]s. Closures taking `&AuthEvent` implement this trait.
pub trait AuthEventListener
where
	Self: Send + Sync,
{
	/// Handles a single event. Called synchronously on the emitting task.
	fn on_auth_event(&self, event: &AuthEvent);
}
impl<F> AuthEventListener for F
where
	F: Send + Sync + Fn(&AuthEvent),
{
	fn on_auth_event(&self, event: &AuthEvent) {
		self(event)
	}
}

/// Listener registry shared by clones of a client.
#[derive(Clone, Default)]
pub struct AuthEvents(Arc<RwLock<Vec<Arc<dyn AuthEventListener>>>>);
impl AuthEvents {
	/// Registers a listener; listeners run in registration order.
	pub fn subscribe(&self, listener: Arc<dyn AuthEventListener>) {
		self.0.write().push(listener);
	}

	/// Delivers `event` to every registered listener.
	pub fn emit(&self, event: AuthEvent) {
		let listeners = self.0.read().clone();

		for listener in listeners {
			listener.on_auth_event(&event);
		}
	}

	/// Number of registered listeners.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no listener is registered.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
impl Debug for AuthEvents {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthEvents").field("listeners", &self.len()).finish()
	}
}

/// Listener that records every event, for tests and simple shells that poll.
#[derive(Clone, Debug, Default)]
pub struct RecordingListener(Arc<Mutex<Vec<AuthEvent>>>);
impl RecordingListener {
	/// Returns a copy of the recorded events.
	pub fn events(&self) -> Vec<AuthEvent> {
		self.0.lock().clone()
	}

	/// Removes and returns the recorded events.
	pub fn drain(&self) -> Vec<AuthEvent> {
		std::mem::take(&mut *self.0.lock())
	}
}
impl AuthEventListener for RecordingListener {
	fn on_auth_event(&self, event: &AuthEvent) {
		self.0.lock().push(event.clone());
	}
}
