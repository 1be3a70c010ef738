mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::{FEED, TestEnv, as_admin};

#[tokio::test]
async fn health_is_public() {
    let env = TestEnv::start();
    let response = env.server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn creating_a_property_needs_the_admin_token() {
    let env = TestEnv::start();
    let body = json!({
        "title": "Loft",
        "price": 5000,
        "available_from": "2025-04-01",
        "available_to": "2025-04-30"
    });

    env.server.post("/properties").json(&body).await.assert_status_unauthorized();

    let wrong = env
        .server
        .post("/properties")
        .add_header(
            axum::http::header::AUTHORIZATION,
            axum::http::HeaderValue::from_static("Bearer nope"),
        )
        .json(&body)
        .await;
    wrong.assert_status_unauthorized();
    let error: Value = wrong.json();
    assert!(error["error"].as_str().is_some());

    as_admin(env.server.post("/properties"))
        .json(&body)
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn only_published_properties_are_listed() {
    let env = TestEnv::start();
    let published = env.published_property().await;
    as_admin(env.server.post("/properties"))
        .json(&json!({
            "title": "Unfinished",
            "price": 5000,
            "available_from": "2025-04-01",
            "available_to": "2025-04-30"
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let listed: Vec<Value> = env.server.get("/properties").await.json();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], published["id"]);
}

#[tokio::test]
async fn invalid_property_is_a_bad_request() {
    let env = TestEnv::start();
    as_admin(env.server.post("/properties"))
        .json(&json!({
            "title": "Backwards",
            "price": 5000,
            "available_from": "2025-04-30",
            "available_to": "2025-04-01"
        }))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn refresh_then_query_availability() {
    let env = TestEnv::start();
    let property = env.published_property().await;
    let id = property["id"].as_str().unwrap();

    let report = as_admin(env.server.post(&format!("/properties/{id}/availability/refresh"))).await;
    report.assert_status_ok();
    let report: Value = report.json();
    assert_eq!(report["old_count"], 30);
    assert_eq!(report["new_count"], 28);
    assert_eq!(report["removed"], json!(["2025-04-02", "2025-04-03"]));

    let availability: Value = env
        .server
        .get(&format!("/properties/{id}/availability"))
        .add_query_param("from", "2025-04-01")
        .add_query_param("to", "2025-04-05")
        .await
        .json();
    assert_eq!(
        availability["dates"],
        json!(["2025-04-01", "2025-04-04", "2025-04-05"])
    );
}

#[tokio::test]
async fn failing_feed_is_reported_and_cache_kept() {
    let env = TestEnv::start();
    let property = env.published_property().await;
    let id = property["id"].as_str().unwrap();

    as_admin(env.server.post("/availability/refresh")).await.assert_status_ok();
    env.feeds.fail(FEED, "HTTP 500");

    let reports: Vec<Value> = as_admin(env.server.post("/availability/refresh")).await.json();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["feed_errors"].as_array().unwrap().len(), 1);
    assert_eq!(reports[0]["new_count"], 28);

    let stored: Value = env.server.get(&format!("/properties/{id}")).await.json();
    assert!(!stored["available_dates"].as_array().unwrap().contains(&json!("2025-04-02")));
}

#[tokio::test]
async fn patch_and_delete_property() {
    let env = TestEnv::start();
    let property = env.published_property().await;
    let id = property["id"].as_str().unwrap();

    let patched = as_admin(env.server.patch(&format!("/properties/{id}")))
        .json(&json!({ "price": 9500, "closed_days": ["Mon"] }))
        .await;
    patched.assert_status_ok();
    let patched: Value = patched.json();
    assert_eq!(patched["price"], 9500);
    assert!(!patched["available_dates"].as_array().unwrap().contains(&json!("2025-04-07")));

    as_admin(env.server.delete(&format!("/properties/{id}")))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    env.server
        .get(&format!("/properties/{id}"))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn calendar_export_is_ical() {
    let env = TestEnv::start();
    let property = env.published_property().await;
    let id = property["id"].as_str().unwrap();

    let response = env.server.get(&format!("/properties/{id}/calendar.ics")).await;
    response.assert_status_ok();
    assert!(response.text().starts_with("BEGIN:VCALENDAR"));
}

#[tokio::test]
async fn feed_preview_parses_events() {
    let env = TestEnv::start();
    let events: Vec<Value> = env
        .server
        .get("/ical/preview")
        .add_query_param("url", FEED)
        .await
        .json();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["uid"], "block-1@feeds.test");

    env.server
        .get("/ical/preview")
        .add_query_param("url", "https://feeds.test/missing.ics")
        .await
        .assert_status(StatusCode::BAD_GATEWAY);

    env.server
        .get("/ical/preview")
        .add_query_param("url", "http://127.0.0.1:4100/health")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
