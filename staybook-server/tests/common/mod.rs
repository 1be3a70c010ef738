use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, header::AUTHORIZATION};
use axum_test::{TestRequest, TestServer};
use serde_json::{Value, json};

use staybook_core::Marketplace;
use staybook_core::config::BookingConfig;
use staybook_core::feed::StaticFeeds;
use staybook_core::payment::LocalGateway;
use staybook_core::store::Store;
use staybook_server::{AppState, build_router};

pub const ADMIN_TOKEN: &str = "admin-test-token";
pub const WEBHOOK_SECRET: &str = "whsec-test";
pub const FEED: &str = "https://feeds.test/listing.ics";

pub const FEED_BODY: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:block-1@feeds.test\r\n\
DTSTART;VALUE=DATE:20250402\r\n\
DTEND;VALUE=DATE:20250404\r\n\
SUMMARY:Reserved\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

/// An API server over an in-memory store and canned iCal feeds.
pub struct TestEnv {
    pub server: TestServer,
    pub feeds: Arc<StaticFeeds>,
}

impl TestEnv {
    pub fn start() -> Self {
        let store = Store::in_memory();
        let feeds = Arc::new(StaticFeeds::new());
        feeds.set(FEED, FEED_BODY);

        let market = Marketplace::new(
            store.clone(),
            feeds.clone(),
            Arc::new(LocalGateway::new(store, "http://pay.test")),
            BookingConfig {
                hold_ttl: Duration::from_secs(30 * 60),
                currency: "jpy".to_string(),
                default_cleaning_fee: 2_000,
            },
        );
        let state = AppState::new(
            Arc::new(market),
            Some(ADMIN_TOKEN.to_string()),
            Some(WEBHOOK_SECRET.to_string()),
        );

        let server = TestServer::builder()
            .build(build_router(state))
            .expect("Failed to build TestServer");

        TestEnv { server, feeds }
    }

    /// Create and publish a property covering April 2025.
    pub async fn published_property(&self) -> Value {
        let created = as_admin(self.server.post("/properties"))
            .json(&json!({
                "title": "Riverside flat",
                "price": 8000,
                "max_guests": 3,
                "available_from": "2025-04-01",
                "available_to": "2025-04-30",
                "ical_urls": [FEED]
            }))
            .await;
        created.assert_status(axum::http::StatusCode::CREATED);
        let property: Value = created.json();
        let id = property["id"].as_str().unwrap().to_string();

        let published = as_admin(self.server.post(&format!("/properties/{id}/status")))
            .json(&json!({ "status": "published" }))
            .await;
        published.assert_status_ok();
        published.json()
    }
}

pub fn as_admin(request: TestRequest) -> TestRequest {
    request.add_header(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {ADMIN_TOKEN}")).unwrap(),
    )
}

pub fn with_webhook_secret(request: TestRequest, secret: &str) -> TestRequest {
    request.add_header(
        HeaderName::from_static("x-webhook-secret"),
        HeaderValue::from_str(secret).unwrap(),
    )
}

pub fn booking_body(property_id: &str, start: &str, end: &str) -> Value {
    json!({
        "property_id": property_id,
        "guest": { "name": "Ren", "email": "ren@example.jp" },
        "guests": 2,
        "start_date": start,
        "end_date": end
    })
}
