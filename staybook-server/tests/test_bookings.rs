mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::{TestEnv, WEBHOOK_SECRET, as_admin, booking_body, with_webhook_secret};

#[tokio::test]
async fn booking_opens_a_checkout_session() {
    let env = TestEnv::start();
    let property = env.published_property().await;
    let id = property["id"].as_str().unwrap();

    let response = env
        .server
        .post("/bookings")
        .json(&booking_body(id, "2025-04-10", "2025-04-13"))
        .await;
    response.assert_status(StatusCode::CREATED);
    let receipt: Value = response.json();

    assert_eq!(receipt["booking"]["status"], "pending_payment");
    assert_eq!(receipt["booking"]["pricing"]["total"], 3 * 8000 + 2000);
    let session_id = receipt["session"]["id"].as_str().unwrap();
    assert_eq!(
        receipt["session"]["payment_url"],
        format!("http://pay.test/payment/{session_id}")
    );

    let session: Value = env
        .server
        .get(&format!("/payments/sessions/{session_id}"))
        .await
        .json();
    assert_eq!(session["start_date"], "2025-04-10");
    assert_eq!(session["end_date"], "2025-04-13");
    assert_eq!(session["amount"], 26_000);
}

#[tokio::test]
async fn overlapping_booking_is_a_conflict() {
    let env = TestEnv::start();
    let property = env.published_property().await;
    let id = property["id"].as_str().unwrap();

    env.server
        .post("/bookings")
        .json(&booking_body(id, "2025-04-10", "2025-04-13"))
        .await
        .assert_status(StatusCode::CREATED);

    let clash = env
        .server
        .post("/bookings")
        .json(&booking_body(id, "2025-04-12", "2025-04-14"))
        .await;
    clash.assert_status(StatusCode::CONFLICT);
    let error: Value = clash.json();
    assert!(error["error"].as_str().unwrap().contains("2025-04-12"));

    env.server
        .post("/bookings")
        .json(&booking_body(id, "2025-04-13", "2025-04-14"))
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn unknown_property_is_not_found() {
    let env = TestEnv::start();
    env.server
        .post("/bookings")
        .json(&booking_body("no-such-property", "2025-04-10", "2025-04-13"))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn webhook_confirms_booking() {
    let env = TestEnv::start();
    let property = env.published_property().await;
    let id = property["id"].as_str().unwrap();

    let receipt: Value = env
        .server
        .post("/bookings")
        .json(&booking_body(id, "2025-04-20", "2025-04-22"))
        .await
        .json();
    let session_id = receipt["session"]["id"].as_str().unwrap();
    let event = json!({ "session_id": session_id, "outcome": "succeeded" });

    with_webhook_secret(env.server.post("/payments/webhook"), "wrong")
        .json(&event)
        .await
        .assert_status_unauthorized();

    let confirmed = with_webhook_secret(env.server.post("/payments/webhook"), WEBHOOK_SECRET)
        .json(&event)
        .await;
    confirmed.assert_status_ok();
    let booking: Value = confirmed.json();
    assert_eq!(booking["status"], "confirmed");

    let failed = with_webhook_secret(env.server.post("/payments/webhook"), WEBHOOK_SECRET)
        .json(&json!({ "session_id": session_id, "outcome": "failed" }))
        .await;
    failed.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn failed_payment_frees_the_nights() {
    let env = TestEnv::start();
    let property = env.published_property().await;
    let id = property["id"].as_str().unwrap();

    let receipt: Value = env
        .server
        .post("/bookings")
        .json(&booking_body(id, "2025-04-20", "2025-04-22"))
        .await
        .json();
    let session_id = receipt["session"]["id"].as_str().unwrap();

    let booking: Value = with_webhook_secret(env.server.post("/payments/webhook"), WEBHOOK_SECRET)
        .json(&json!({ "session_id": session_id, "outcome": "expired" }))
        .await
        .json();
    assert_eq!(booking["status"], "cancelled");

    env.server
        .post("/bookings")
        .json(&booking_body(id, "2025-04-20", "2025-04-22"))
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn admin_cancels_and_lists_bookings() {
    let env = TestEnv::start();
    let property = env.published_property().await;
    let id = property["id"].as_str().unwrap();

    let receipt: Value = env
        .server
        .post("/bookings")
        .json(&booking_body(id, "2025-04-15", "2025-04-17"))
        .await
        .json();
    let booking_id = receipt["booking"]["id"].as_str().unwrap();

    env.server
        .post(&format!("/bookings/{booking_id}/cancel"))
        .json(&json!({}))
        .await
        .assert_status_unauthorized();

    let cancelled: Value = as_admin(env.server.post(&format!("/bookings/{booking_id}/cancel")))
        .json(&json!({ "reason": "guest called" }))
        .await
        .json();
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(cancelled["cancel_reason"], "guest called");

    let bookings: Vec<Value> = as_admin(env.server.get(&format!("/properties/{id}/bookings")))
        .await
        .json();
    assert_eq!(bookings.len(), 1);

    let fetched: Value = env.server.get(&format!("/bookings/{booking_id}")).await.json();
    assert_eq!(fetched["status"], "cancelled");
}
