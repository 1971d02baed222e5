//! Smoke driver: exercises a running backend end to end.
//!
//! Registers a user, logs in, creates a customer with a vehicle, books an
//! appointment, adds an actual service and raises an invoice. Exits non-zero
//! on the first unexpected response, so it can gate a deployment.

use clap::Parser;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the running server.
    #[arg(default_value = "http://127.0.0.1:9000")]
    base_url: String,

    /// Suffix appended to generated identities so repeat runs do not collide.
    #[arg(long, default_value = "smoke")]
    run_tag: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let client = Client::new();
    let base = args.base_url.trim_end_matches('/');
    let tag = &args.run_tag;

    let health: Value = expect_json(
        client.get(format!("{base}/api")).send().await,
        StatusCode::OK,
        "health",
    )
    .await;
    println!("health: {health}");

    let register = client
        .post(format!("{base}/auth/register"))
        .json(&json!({
            "username": format!("smoke-{tag}"),
            "password": "Sm0ke$run",
            "email": format!("smoke-{tag}@example.com"),
        }))
        .send()
        .await;
    match register {
        Ok(response) if response.status() == StatusCode::CREATED => println!("registered"),
        Ok(response) if response.status() == StatusCode::CONFLICT => {
            println!("user already present, reusing")
        }
        other => fail("register", other),
    }

    let login: Value = expect_json(
        client
            .post(format!("{base}/auth/login"))
            .json(&json!({
                "email": format!("smoke-{tag}@example.com"),
                "password": "Sm0ke$run",
            }))
            .send()
            .await,
        StatusCode::OK,
        "login",
    )
    .await;
    let token = login["token"].as_str().expect("token in login response").to_owned();
    println!("logged in");

    let plate = format!("KA01-{tag}");
    let customer: Value = expect_json(
        client
            .post(format!("{base}/customer"))
            .bearer_auth(&token)
            .json(&json!({
                "customer_name": "Smoke Test Garage",
                "contact": {
                    "phone": "9876543210",
                    "address": { "street": "1 MG Road", "city": "Bengaluru", "state": "KA" }
                },
                "vehicles": [{
                    "make": "Maruti", "model": "Swift", "fuelType": "petrol",
                    "year": 2020, "vin": format!("VIN-{tag}"), "plate_number": plate.as_str(),
                }]
            }))
            .send()
            .await,
        StatusCode::CREATED,
        "create customer",
    )
    .await;
    let customer_id = customer["customer_id"].as_str().expect("customer_id").to_owned();
    println!("customer {customer_id}");

    let appointment: Value = expect_json(
        client
            .post(format!("{base}/appointment"))
            .json(&json!({
                "customer_id": customer_id,
                "vehicle_id": plate,
                "telecaller": "self",
            }))
            .send()
            .await,
        StatusCode::CREATED,
        "create appointment",
    )
    .await;
    let appointment_id = appointment["appointment_id"]
        .as_str()
        .expect("appointment_id")
        .to_owned();
    println!("appointment {appointment_id}");

    let with_services: Value = expect_json(
        client
            .post(format!("{base}/appointment/{appointment_id}/services_actual"))
            .json(&json!([{
                "service_description": "Oil change",
                "price": 1500.0,
                "service_type": "maintenance",
                "status": "approved",
                "items_required": [{ "item_id": "ITM-1", "item_name": "engine oil", "qty": "4" }]
            }]))
            .send()
            .await,
        StatusCode::OK,
        "add actual service",
    )
    .await;
    println!(
        "services_actual: {}",
        with_services["services_actual"].as_array().map_or(0, Vec::len)
    );

    let invoice: Value = expect_json(
        client
            .post(format!("{base}/invoice"))
            .json(&json!({ "appointment_id": appointment_id }))
            .send()
            .await,
        StatusCode::CREATED,
        "create invoice",
    )
    .await;
    println!(
        "invoice {} total {}",
        invoice["invoice_id"].as_str().unwrap_or("?"),
        invoice["total_amount"]
    );

    println!("smoke run passed");
}

async fn expect_json(
    result: Result<reqwest::Response, reqwest::Error>,
    expected: StatusCode,
    step: &str,
) -> Value {
    match result {
        Ok(response) if response.status() == expected => {
            response.json().await.expect("valid JSON body")
        }
        other => fail(step, other),
    }
}

fn fail(step: &str, result: Result<reqwest::Response, reqwest::Error>) -> ! {
    match result {
        Ok(response) => {
            eprintln!("{step}: unexpected status {}", response.status());
        }
        Err(err) => {
            eprintln!("{step}: request failed: {err}");
        }
    }
    std::process::exit(1);
}
