//! Demonstrates an expired access token being refreshed transparently while browsing the
//! marketplace, with the backend replaced by an in-process mock server.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use session_market_client::{
	auth::CredentialKey,
	client::ReqwestApiClient,
	config::ClientConfig,
	events::AuthEvent,
	models::Session,
	store::MemoryStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/sessions/").header("authorization", "Bearer expired-access");
			then.status(401)
				.header("content-type", "application/json")
				.json_body(json!({ "detail": "Given token not valid for any token type" }));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh/");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "access": "fresh-access" }));
		})
		.await;
	let listing = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/sessions/").header("authorization", "Bearer fresh-access");
			then.status(200).header("content-type", "application/json").json_body(json!([{
				"id": 1,
				"title": "Morning yoga",
				"description": "Gentle flow for all levels.",
				"date": "2025-06-01T07:00:00Z",
				"duration": 45,
				"capacity": 8,
				"price": "0.00",
				"creator": null,
				"available_spots": 3,
				"created_at": "2025-05-01T12:00:00Z",
				"is_booked_by_user": false
			}]));
		})
		.await;
	let store = MemoryStore::with_tokens("expired-access", "demo-refresh");
	let client = ReqwestApiClient::new(
		ClientConfig::from_origin(&server.base_url())?,
		Arc::new(store.clone()),
	)
	.with_listener(Arc::new(|event: &AuthEvent| println!("auth event: {event:?}")));
	let sessions: Vec<Session> = client.sessions().await?;

	for session in &sessions {
		println!(
			"#{} {} at {} ({} spots left, price {})",
			session.id, session.title, session.date, session.available_spots, session.price
		);
	}

	expired.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
	listing.assert_calls_async(1).await;

	println!(
		"stored access token rotated: {}",
		store.peek(CredentialKey::AccessToken).is_some_and(|token| token.expose() == "fresh-access")
	);
	println!("refresh calls: {}", client.refresh_metrics.attempts());

	Ok(())
}
