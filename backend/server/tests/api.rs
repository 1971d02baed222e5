//! Router-level tests: the full axum app driven against an in-memory SQLite
//! store, no sockets bound.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use server::{app, config::Config, state::AppState};
use store::{ids, Backend, SqliteStore, Store};

async fn test_app() -> Router {
    let store = SqliteStore::open_in_memory().expect("open store");
    store
        .seed_ranges(&ids::default_ranges())
        .await
        .expect("seed ranges");
    let config = Config {
        port: 0,
        backend: Backend::Sqlite,
        redis_url: String::new(),
        sqlite_path: String::new(),
        meili_url: None,
        meili_key: None,
        auth_secret: "test-secret".to_owned(),
    };
    app(AppState::from_parts(config, Arc::new(store), None))
}

fn request(method: &str, uri: &str, body: Option<Value>, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    builder.body(body).expect("request")
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

async fn register_and_login(app: &Router) -> String {
    let (status, _) = send(
        app,
        request(
            "POST",
            "/auth/register",
            Some(json!({
                "username": "frontdesk",
                "password": "Work$hop1",
                "email": "frontdesk@example.com",
            })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        request(
            "POST",
            "/auth/login",
            Some(json!({ "email": "frontdesk@example.com", "password": "Work$hop1" })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().expect("token").to_owned()
}

fn customer_payload(plate: &str) -> Value {
    json!({
        "customer_name": "Asha Rao",
        "gstNumber": "29ABCDE1234F1Z5",
        "contact": {
            "phone": "9876543210",
            "address": { "street": "1 MG Road", "city": "Bengaluru", "state": "KA" }
        },
        "vehicles": [{
            "make": "Maruti", "model": "Swift", "fuelType": "petrol",
            "year": 2019, "vin": "VIN-1", "plate_number": plate,
        }]
    })
}

#[tokio::test]
async fn health_answers() {
    let app = test_app().await;
    let (status, body) = send(&app, request("GET", "/api", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "workshop backend running");
}

#[tokio::test]
async fn register_enforces_password_policy() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/auth/register",
            Some(json!({
                "username": "weak",
                "password": "password",
                "email": "weak@example.com",
            })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"].as_array().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = test_app().await;
    register_and_login(&app).await;
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/auth/register",
            Some(json!({
                "username": "frontdesk",
                "password": "Work$hop1",
                "email": "frontdesk@example.com",
            })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = test_app().await;
    register_and_login(&app).await;
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/auth/login",
            Some(json!({ "email": "frontdesk@example.com", "password": "Wr0ng$pwd" })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn customer_routes_require_bearer_token() {
    let app = test_app().await;
    let (status, _) = send(&app, request("GET", "/customer", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, request("GET", "/customer", None, Some("not-a-jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn customer_create_mints_id_and_registers_vehicles() {
    let app = test_app().await;
    let token = register_and_login(&app).await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/customer",
            Some(customer_payload("KA01AB1234")),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["customer_id"], "CUST-1001");
    assert_eq!(body["vehicles"][0]["vehicle_id"], "KA01AB1234");

    // Registry rows are public reads.
    let (status, body) = send(&app, request("GET", "/vehicle/KA01AB1234", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["customer_id"], "CUST-1001");

    let (status, body) = send(
        &app,
        request("GET", "/customer/CUST-1001", None, Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["customer_name"], "Asha Rao");
    assert_eq!(body["gstNumber"], "29ABCDE1234F1Z5");
}

#[tokio::test]
async fn customer_validation_collects_all_violations() {
    let app = test_app().await;
    let token = register_and_login(&app).await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/customer",
            Some(json!({
                "customer_name": "",
                "contact": { "phone": "123" },
                "vehicles": []
            })),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_array().expect("errors array");
    assert!(errors.len() >= 3);
}

#[tokio::test]
async fn search_without_meilisearch_is_unavailable() {
    let app = test_app().await;
    let token = register_and_login(&app).await;
    let (status, _) = send(
        &app,
        request("GET", "/customer/search?q=asha", None, Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn appointment_booking_conflicts_on_open_appointment() {
    let app = test_app().await;

    let booking = json!({
        "customer_id": "CUST-1001",
        "vehicle_id": "KA01AB1234",
        "telecaller": "self",
    });
    let (status, body) = send(
        &app,
        request("POST", "/appointment", Some(booking.clone()), None),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["appointment_id"], "APMT-1");
    assert_eq!(body["status"], "scheduled");

    let (status, body) = send(&app, request("POST", "/appointment", Some(booking), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["appointment"]["appointment_id"], "APMT-1");
}

#[tokio::test]
async fn completed_appointment_frees_the_vehicle() {
    let app = test_app().await;
    let booking = json!({
        "customer_id": "CUST-1001",
        "vehicle_id": "KA01AB1234",
        "telecaller": "self",
    });
    send(&app, request("POST", "/appointment", Some(booking.clone()), None)).await;
    let (status, _) = send(
        &app,
        request(
            "PUT",
            "/appointment/APMT-1",
            Some(json!({ "status": "completed" })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, request("POST", "/appointment", Some(booking), None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["appointment_id"], "APMT-2");
}

#[tokio::test]
async fn service_lane_flow_feeds_invoice_total() {
    let app = test_app().await;
    send(
        &app,
        request(
            "POST",
            "/appointment",
            Some(json!({
                "customer_id": "CUST-1001",
                "vehicle_id": "KA01AB1234",
                "telecaller": "self",
            })),
            None,
        ),
    )
    .await;

    let services = json!([
        {
            "service_description": "Oil change",
            "price": 1500.0,
            "service_type": "maintenance",
            "status": "approved",
            "items_required": [{ "item_id": "ITM-1", "item_name": "engine oil", "qty": "4" }]
        },
        {
            "service_description": "Brake pads",
            "price": 2400.0,
            "service_type": "repair",
            "status": "approved",
            "items_required": [{ "item_id": "ITM-2", "item_name": "brake pad set" }]
        }
    ]);
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/appointment/APMT-1/services_actual",
            Some(services),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["services_actual"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["services_actual"][0]["service_id"], "SER-1");

    let (status, body) = send(
        &app,
        request(
            "PUT",
            "/appointment/APMT-1/update_service_status/SER-1",
            Some(json!({ "service_status": "completed" })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["services_actual"][0]["service_status"], "completed");

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/invoice",
            Some(json!({ "appointment_id": "APMT-1" })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["invoice_id"], "INVC-1");
    assert_eq!(body["total_amount"], 3900.0);
    assert_eq!(body["payment_status"], "pending");

    let (status, body) = send(&app, request("PUT", "/invoice/INVC-1/pay", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payment_status"], "paid");
    assert!(body["payment_date"].is_string());
}

#[tokio::test]
async fn services_upsert_rejects_incomplete_entries() {
    let app = test_app().await;
    send(
        &app,
        request(
            "POST",
            "/appointment",
            Some(json!({
                "customer_id": "CUST-1001",
                "vehicle_id": "KA01AB1234",
                "telecaller": "self",
            })),
            None,
        ),
    )
    .await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/appointment/APMT-1/services_actual",
            Some(json!([{ "service_description": "", "price": 0.0, "items_required": [] }])),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"].as_array().is_some_and(|e| e.len() >= 3));
}

#[tokio::test]
async fn job_card_apply_pushes_estimate_into_open_appointment() {
    let app = test_app().await;
    send(
        &app,
        request(
            "POST",
            "/appointment",
            Some(json!({
                "customer_id": "CUST-1001",
                "vehicle_id": "KA01AB1234",
                "telecaller": "self",
            })),
            None,
        ),
    )
    .await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/jobcard",
            Some(json!({
                "vehicleId": "KA01AB1234",
                "customerId": "CUST-1001",
                "estimateItems": [{
                    "description": "Replace brake pads",
                    "spareList": "Brake pad set",
                    "qty": 1,
                    "rate": 2400.0,
                    "discount": 0.0,
                    "estimatedAmount": 2400.0
                }]
            })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["jobCard_id"], "JOB-1");
    assert_eq!(body["status"], "pending");

    let (status, body) = send(&app, request("POST", "/jobcard/JOB-1/apply", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    let estimate = body["services_estimate"].as_array().expect("estimate lane");
    assert_eq!(estimate.len(), 1);
    assert_eq!(estimate[0]["status"], "saved");
    assert_eq!(estimate[0]["price"], 2400.0);

    let (status, body) = send(
        &app,
        request(
            "PUT",
            "/jobcard/JOB-1/status",
            Some(json!({ "status": "accepted" })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");
}

#[tokio::test]
async fn missing_entities_answer_404() {
    let app = test_app().await;
    let token = register_and_login(&app).await;

    for (method, uri, token) in [
        ("GET", "/appointment/APMT-404", None),
        ("GET", "/jobcard/JOB-404", None),
        ("GET", "/inventory/INV-404", None),
        ("GET", "/mechanic/MECH-404", None),
        ("GET", "/supplier/SUP-404", None),
        ("GET", "/invoice/INVC-404", None),
        ("GET", "/vehicle/ZZ99", None),
        ("GET", "/customer/CUST-404", Some(token.as_str())),
    ] {
        let (status, _) = send(&app, request(method, uri, None, token)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn inventory_and_mechanic_crud() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/inventory",
            Some(json!({
                "part_name": "engine oil",
                "part_number": "EO-5W30",
                "description": "Synthetic 5W30",
                "category": "spares",
                "quantity": 40,
                "price": 450.0,
            })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["inventory_id"], "INV-1");

    let (status, body) = send(
        &app,
        request(
            "PUT",
            "/inventory/INV-1",
            Some(json!({ "quantity": 36 })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 36);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/mechanic",
            Some(json!({
                "mechanic_id": "MECH-9",
                "mechanic_name": "Ravi Kumar",
                "contact": { "phone": "9000000001" },
                "specialties": ["engine"]
            })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/mechanic",
            Some(json!({
                "mechanic_id": "MECH-9",
                "mechanic_name": "Ravi Kumar",
                "contact": { "phone": "9000000001" },
            })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, request("DELETE", "/inventory/INV-1", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Inventory item deleted successfully");
}
