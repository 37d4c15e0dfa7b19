//! Buffered API response and JSON decoding helpers.

// crates.io
use http::{HeaderMap, StatusCode};
// self
use crate::{_prelude::*, error::DecodeError};

/// Successful response returned to callers.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// Response status (always 2xx).
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Decodes the body as JSON, reporting the failing path on mismatch.
	pub fn json<T>(&self) -> Result<T>
	where
		T: serde::de::DeserializeOwned,
	{
		decode_json(self.status, &self.body)
	}

	/// Returns the body as lossy UTF-8 text.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

pub(crate) fn decode_json<T>(status: StatusCode, body: &[u8]) -> Result<T>
where
	T: serde::de::DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| DecodeError::Json { source, status }.into())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, Deserialize)]
	struct Grant {
		#[allow(dead_code)]
		access: String,
	}

	fn response(body: &str) -> ApiResponse {
		ApiResponse { status: StatusCode::OK, headers: HeaderMap::new(), body: body.into() }
	}

	#[test]
	fn json_decodes_payload() {
		let value: serde_json::Value =
			response(r#"[{"id":1}]"#).json().expect("Array payload should decode.");

		assert_eq!(value[0]["id"], 1);
	}

	#[test]
	fn json_reports_failing_path() {
		let err = response(r#"{"access":5}"#)
			.json::<Grant>()
			.expect_err("Numeric access token should be rejected.");

		match err {
			Error::Decode(DecodeError::Json { source, status }) => {
				assert_eq!(source.path().to_string(), "access");
				assert_eq!(status, StatusCode::OK);
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}
}
