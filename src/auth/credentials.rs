//! Persisted credential pair, storage keys, and the OAuth completion redirect parser.

// self
use crate::{_prelude::*, auth::TokenSecret, models::Role};

/// Fixed storage keys under which credentials are persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKey {
	/// Short-lived bearer token attached to API requests.
	AccessToken,
	/// Longer-lived token exchanged for new access tokens.
	RefreshToken,
}
impl CredentialKey {
	/// Every key, in a stable order.
	pub const ALL: [CredentialKey; 2] = [CredentialKey::AccessToken, CredentialKey::RefreshToken];

	/// Returns the storage name of the key.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialKey::AccessToken => "access_token",
			CredentialKey::RefreshToken => "refresh_token",
		}
	}
}
impl Display for CredentialKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Access + refresh token pair written on login and read on every request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
	/// Bearer token attached to API requests.
	pub access_token: TokenSecret,
	/// Token used to mint new access tokens.
	pub refresh_token: TokenSecret,
}
impl CredentialPair {
	/// Creates a pair from raw token strings.
	pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
		}
	}
}

/// Failures raised while reading the login redirect issued after an OAuth sign-in.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum LoginRedirectError {
	/// The backend reported that the sign-in did not complete.
	#[error("Sign-in failed: {reason}.")]
	AuthFailed {
		/// Value of the `error` query parameter.
		reason: String,
	},
	/// A required query parameter is absent or empty.
	#[error("Login redirect is missing the `{0}` parameter.")]
	MissingParameter(&'static str),
	/// The `role` parameter is not a known role.
	#[error("Login redirect carries an unknown role `{0}`.")]
	UnknownRole(String),
}

/// Credentials and identity carried by the `/login?access=..&refresh=..` redirect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginRedirect {
	/// Tokens minted by the backend.
	pub credentials: CredentialPair,
	/// Role of the signed-in account, when reported.
	pub role: Option<Role>,
	/// Username of the signed-in account, when reported.
	pub username: Option<String>,
}
impl LoginRedirect {
	/// Extracts credentials from the redirect URL's query string.
	pub fn parse(url: &Url) -> Result<Self, LoginRedirectError> {
		let mut access = None;
		let mut refresh = None;
		let mut role = None;
		let mut username = None;

		for (key, value) in url.query_pairs() {
			match key.as_ref() {
				"error" => return Err(LoginRedirectError::AuthFailed { reason: value.into_owned() }),
				"access" => access = Some(value.into_owned()),
				"refresh" => refresh = Some(value.into_owned()),
				"role" => role = Some(value.into_owned()),
				"username" => username = Some(value.into_owned()),
				_ => {},
			}
		}

		let access = access
			.filter(|value| !value.is_empty())
			.ok_or(LoginRedirectError::MissingParameter("access"))?;
		let refresh = refresh
			.filter(|value| !value.is_empty())
			.ok_or(LoginRedirectError::MissingParameter("refresh"))?;
		let role = role
			.filter(|value| !value.is_empty())
			.map(|value| value.parse::<Role>().map_err(|_| LoginRedirectError::UnknownRole(value)))
			.transpose()?;

		Ok(Self {
			credentials: CredentialPair::new(access, refresh),
			role,
			username: username.filter(|value| !value.is_empty()),
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse redirect fixture.")
	}

	#[test]
	fn keys_use_fixed_storage_names() {
		assert_eq!(CredentialKey::AccessToken.as_str(), "access_token");
		assert_eq!(CredentialKey::RefreshToken.to_string(), "refresh_token");
		assert_eq!(
			serde_json::to_string(&CredentialKey::RefreshToken)
				.expect("Credential key should serialize."),
			"\"refresh_token\"",
		);
	}

	#[test]
	fn parses_completed_sign_in() {
		let redirect = LoginRedirect::parse(&url(
			"http://localhost/login?access=a.b.c&refresh=r.s.t&role=CREATOR&username=ada",
		))
		.expect("Completed sign-in redirect should parse.");

		assert_eq!(redirect.credentials, CredentialPair::new("a.b.c", "r.s.t"));
		assert_eq!(redirect.role, Some(Role::Creator));
		assert_eq!(redirect.username.as_deref(), Some("ada"));
	}

	#[test]
	fn reports_failed_sign_in() {
		let err = LoginRedirect::parse(&url("http://localhost/login?error=auth_failed"))
			.expect_err("Error redirect should be rejected.");

		assert_eq!(err, LoginRedirectError::AuthFailed { reason: "auth_failed".into() });
	}

	#[test]
	fn requires_both_tokens() {
		let err = LoginRedirect::parse(&url("http://localhost/login?access=abc"))
			.expect_err("Redirect without refresh token should be rejected.");

		assert_eq!(err, LoginRedirectError::MissingParameter("refresh"));

		let err = LoginRedirect::parse(&url("http://localhost/login?access=&refresh=xyz"))
			.expect_err("Redirect with empty access token should be rejected.");

		assert_eq!(err, LoginRedirectError::MissingParameter("access"));
	}
}
