//! Optional view models mirroring the marketplace backend's JSON payloads.
//!
//! The client never requires these shapes; resource calls are generic so callers
//! can decode into these structs or into `serde_json::Value`.

// self
use crate::_prelude::*;

/// Account role reported by the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
	/// Books sessions.
	#[default]
	User,
	/// Publishes sessions.
	Creator,
}
impl Role {
	/// Returns the wire label of the role.
	pub const fn as_str(self) -> &'static str {
		match self {
			Role::User => "USER",
			Role::Creator => "CREATOR",
		}
	}
}
impl Display for Role {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Role {
	type Err = UnknownRole;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"USER" => Ok(Role::User),
			"CREATOR" => Ok(Role::Creator),
			other => Err(UnknownRole(other.to_owned())),
		}
	}
}

/// Error returned when a role label is not recognized.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown role `{0}`.")]
pub struct UnknownRole(pub String);

/// Current account profile (`/auth/me/`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	/// Backend identifier.
	pub id: u64,
	/// Login name.
	pub username: String,
	/// Contact email; empty when unset.
	#[serde(default)]
	pub email: String,
	/// Given name; empty when unset.
	#[serde(default)]
	pub first_name: String,
	/// Family name; empty when unset.
	#[serde(default)]
	pub last_name: String,
	/// Account role.
	#[serde(default)]
	pub role: Role,
	/// Avatar URL.
	#[serde(default)]
	pub avatar: Option<String>,
}
impl User {
	/// Returns `true` for accounts allowed to publish sessions.
	pub fn is_creator(&self) -> bool {
		self.role == Role::Creator
	}

	/// Full name, or `None` when neither name part is set.
	pub fn display_name(&self) -> Option<String> {
		let name = format!("{} {}", self.first_name, self.last_name).trim().to_owned();

		if name.is_empty() { None } else { Some(name) }
	}
}

/// Partial profile update sent with `PATCH /auth/me/`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
	/// New given name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	/// New family name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
	/// New contact email.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// New avatar URL.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub avatar: Option<String>,
}

/// Published session as listed by `/sessions/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
	/// Backend identifier.
	pub id: u64,
	/// Session title.
	pub title: String,
	/// Long-form description.
	pub description: String,
	/// Scheduled start.
	#[serde(with = "time::serde::rfc3339")]
	pub date: OffsetDateTime,
	/// Length in minutes.
	pub duration: u32,
	/// Maximum number of bookings.
	pub capacity: u32,
	/// Decimal price in USD, as rendered by the backend (`"0.00"` is free).
	pub price: String,
	/// Publishing creator.
	pub creator: Option<User>,
	/// Remaining spots as computed by the backend.
	pub available_spots: i64,
	/// Creation instant.
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	/// Whether the requesting account holds a confirmed booking.
	#[serde(default)]
	pub is_booked_by_user: bool,
}
impl Session {
	/// Returns `true` when the backend reports no remaining spots.
	pub fn is_full(&self) -> bool {
		self.available_spots <= 0
	}
}

/// Payload for `POST /sessions/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
	/// Session title.
	pub title: String,
	/// Long-form description.
	pub description: String,
	/// Scheduled start.
	#[serde(with = "time::serde::rfc3339")]
	pub date: OffsetDateTime,
	/// Length in minutes.
	pub duration: u32,
	/// Maximum number of bookings.
	pub capacity: u32,
	/// Decimal price in USD.
	pub price: String,
}

/// Booking lifecycle status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
	/// Spot reserved.
	#[default]
	Confirmed,
	/// Reservation withdrawn.
	Cancelled,
}

/// Booking as listed by `/bookings/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
	/// Backend identifier.
	pub id: u64,
	/// Booked session identifier.
	pub session: u64,
	/// Expanded session, when the backend embeds it.
	#[serde(default)]
	pub session_details: Option<Session>,
	/// Booking status.
	#[serde(default)]
	pub status: BookingStatus,
	/// Creation instant.
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}

/// Tokens and identity returned by `/auth/mock-login/`.
#[derive(Clone, Debug, Deserialize)]
pub struct LoginGrant {
	/// Access token.
	pub access: String,
	/// Refresh token.
	pub refresh: String,
	/// Account role.
	#[serde(default)]
	pub role: Role,
	/// Login name.
	pub username: String,
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn role_labels_round_trip() {
		assert_eq!("CREATOR".parse::<Role>(), Ok(Role::Creator));
		assert_eq!(Role::User.to_string(), "USER");
		assert_eq!("ADMIN".parse::<Role>(), Err(UnknownRole("ADMIN".into())));
	}

	#[test]
	fn session_decodes_backend_payload() {
		let payload = serde_json::json!({
			"id": 3,
			"title": "Intro to Rust",
			"description": "Ownership and borrowing.",
			"date": "2025-03-01T10:00:00Z",
			"duration": 60,
			"capacity": 10,
			"price": "15.00",
			"creator": {
				"id": 9,
				"username": "ferris",
				"email": "",
				"first_name": "",
				"last_name": "",
				"role": "CREATOR",
				"avatar": null
			},
			"available_spots": 0,
			"created_at": "2025-02-01T08:30:00.123456Z",
			"is_booked_by_user": true
		});
		let session: Session =
			serde_json::from_value(payload).expect("Session payload should decode.");

		assert_eq!(session.date, macros::datetime!(2025-03-01 10:00 UTC));
		assert!(session.is_full());
		assert!(session.is_booked_by_user);

		let creator = session.creator.expect("Creator should be embedded.");

		assert!(creator.is_creator());
		assert_eq!(creator.display_name(), None);
	}

	#[test]
	fn profile_update_skips_unset_fields() {
		let update = ProfileUpdate { first_name: Some("Ada".into()), ..Default::default() };
		let payload = serde_json::to_value(&update).expect("Profile update should serialize.");

		assert_eq!(payload, serde_json::json!({ "first_name": "Ada" }));
	}
}
