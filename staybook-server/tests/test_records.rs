mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::{TestEnv, as_admin};

fn job(title: &str, location: &str, salary: i64) -> Value {
    json!({
        "shop_name": "Kappo Hana", "job_title": title, "job_description": "Counter and prep",
        "location": location, "industry": "washoku", "salary": salary,
        "working_hours": "16:00-23:00", "requirements": "3 years", "customer_unit_price": "12000",
        "seats": "14", "smoking_info": "non-smoking", "nearest_station": "Shijo",
        "holidays": "Wednesday", "company": "Hana Ltd", "days_off": "8 per month",
        "benefits": "transport", "ideal_candidate": "patient", "skills_to_acquire": "dashi"
    })
}

#[tokio::test]
async fn invoice_payment_books_the_stay() {
    let env = TestEnv::start();
    let property = env.published_property().await;
    let id = property["id"].as_str().unwrap();

    let created = as_admin(env.server.post("/invoices"))
        .json(&json!({
            "customer_name": "Kobayashi",
            "amount": 50000,
            "check_in_date": "2025-04-24",
            "check_out_date": "2025-04-27",
            "due_date": "2099-12-31",
            "property_id": id
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let invoice: Value = created.json();
    let invoice_id = invoice["id"].as_str().unwrap();
    assert_eq!(invoice["status"], "unpaid");

    let public: Value = env.server.get(&format!("/invoices/{invoice_id}")).await.json();
    assert_eq!(public["amount"], 50000);

    env.server
        .post(&format!("/invoices/{invoice_id}/pay"))
        .json(&json!({}))
        .await
        .assert_status_unauthorized();

    let paid = as_admin(env.server.post(&format!("/invoices/{invoice_id}/pay")))
        .json(&json!({
            "payment_intent_id": "pi_42",
            "payment_method": "card",
            "payment_status": "succeeded"
        }))
        .await;
    paid.assert_status_ok();
    let paid: Value = paid.json();
    assert_eq!(paid["status"], "paid");
    assert_eq!(paid["payment"]["payment_intent_id"], "pi_42");

    let availability: Value = env
        .server
        .get(&format!("/properties/{id}/availability"))
        .add_query_param("from", "2025-04-24")
        .add_query_param("to", "2025-04-27")
        .await
        .json();
    assert_eq!(availability["dates"], json!(["2025-04-27"]));
}

#[tokio::test]
async fn invoices_list_is_admin_only() {
    let env = TestEnv::start();
    env.server.get("/invoices").await.assert_status_unauthorized();
    let invoices: Vec<Value> = as_admin(env.server.get("/invoices")).await.json();
    assert!(invoices.is_empty());
}

#[tokio::test]
async fn job_posting_requires_every_field() {
    let env = TestEnv::start();
    let mut incomplete = job("Itamae", "kyoto", 320000);
    incomplete["benefits"] = json!("");

    let response = as_admin(env.server.post("/jobs")).json(&incomplete).await;
    response.assert_status_bad_request();
    let error: Value = response.json();
    assert!(error["error"].as_str().unwrap().contains("benefits"));
}

#[tokio::test]
async fn job_search_pages_through_results() {
    let env = TestEnv::start();
    for (title, location, salary) in [
        ("Itamae", "kyoto", 320000),
        ("Prep cook", "kyoto", 240000),
        ("Head chef", "kyoto", 480000),
        ("Itamae", "osaka", 300000),
    ] {
        as_admin(env.server.post("/jobs"))
            .json(&job(title, location, salary))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let first: Value = env
        .server
        .get("/jobs/search")
        .add_query_param("location", "kyoto")
        .add_query_param("sort_by", "salary")
        .add_query_param("sort_order", "desc")
        .add_query_param("page_size", "2")
        .await
        .json();
    let salaries: Vec<i64> = first["jobs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|j| j["salary"].as_i64().unwrap())
        .collect();
    assert_eq!(salaries, vec![480000, 320000]);
    let token = first["next_page_token"].as_str().unwrap();

    let second: Value = env
        .server
        .get("/jobs/search")
        .add_query_param("location", "kyoto")
        .add_query_param("sort_by", "salary")
        .add_query_param("sort_order", "desc")
        .add_query_param("page_size", "2")
        .add_query_param("page_token", token)
        .await
        .json();
    assert_eq!(second["jobs"].as_array().unwrap().len(), 1);
    assert_eq!(second["next_page_token"], Value::Null);

    let all: Vec<Value> = env.server.get("/jobs").add_query_param("limit", "3").await.json();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn job_update_and_delete() {
    let env = TestEnv::start();
    let created: Value = as_admin(env.server.post("/jobs"))
        .json(&job("Itamae", "kyoto", 320000))
        .await
        .json();
    let id = created["id"].as_str().unwrap();

    let updated: Value = as_admin(env.server.put(&format!("/jobs/{id}")))
        .json(&json!({ "salary": 350000, "status": "closed" }))
        .await
        .json();
    assert_eq!(updated["salary"], 350000);
    assert_eq!(updated["status"], "closed");

    as_admin(env.server.delete(&format!("/jobs/{id}")))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    env.server.get(&format!("/jobs/{id}")).await.assert_status_not_found();
}

#[tokio::test]
async fn employers_and_owners_keep_extra_fields() {
    let env = TestEnv::start();

    env.server.get("/employers").await.assert_status_unauthorized();

    let employer: Value = as_admin(env.server.post("/employers"))
        .json(&json!({ "name": "Hana Ltd", "email": "hr@hana.jp", "line_id": "hana-hr" }))
        .await
        .json();
    assert_eq!(employer["line_id"], "hana-hr");
    let employer_id = employer["id"].as_str().unwrap();

    let updated: Value = as_admin(env.server.put(&format!("/employers/{employer_id}")))
        .json(&json!({ "phone": "075-000-0000" }))
        .await
        .json();
    assert_eq!(updated["phone"], "075-000-0000");
    assert_eq!(updated["line_id"], "hana-hr");

    let owner = as_admin(env.server.post("/owners"))
        .json(&json!({ "name": "Mori", "email": "mori@example.jp", "property_ids": ["p-1"] }))
        .await;
    owner.assert_status(StatusCode::CREATED);
    let owners: Vec<Value> = as_admin(env.server.get("/owners")).await.json();
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0]["property_ids"], json!(["p-1"]));

    as_admin(env.server.delete(&format!("/employers/{employer_id}")))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    as_admin(env.server.get(&format!("/employers/{employer_id}")))
        .await
        .assert_status_not_found();
}
