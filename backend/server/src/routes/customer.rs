use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use store::model::{Contact, Customer, CustomerPatch, CustomerVehicle, VehicleRecord};
use tracing::info;

use crate::{
    auth::AuthUser,
    error::AppError,
    search,
    state::AppState,
    utils::{check, finish, is_email, is_phone, not_blank, opt_not_blank},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_customer).get(list_customers))
        .route("/search", get(search_customers))
        .route(
            "/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/vehicles/{id}", put(update_vehicles))
}

const MIN_VEHICLE_YEAR: i32 = 1886;

#[derive(Deserialize)]
struct NewCustomer {
    #[serde(default)]
    customer_name: String,
    #[serde(rename = "gstNumber", default)]
    gst_number: Option<String>,
    #[serde(default)]
    contact: Contact,
    #[serde(default)]
    vehicles: Vec<CustomerVehicle>,
}

fn check_vehicle(errors: &mut Vec<String>, vehicle: &CustomerVehicle) {
    check(errors, not_blank(&vehicle.make), "Vehicle make is required");
    check(errors, not_blank(&vehicle.model), "Vehicle model is required");
    check(
        errors,
        vehicle.year.is_some_and(|year| year >= MIN_VEHICLE_YEAR),
        "Valid vehicle year is required",
    );
    check(errors, opt_not_blank(vehicle.vin.as_deref()), "Vehicle VIN is required");
    check(
        errors,
        not_blank(&vehicle.plate_number),
        "Vehicle plate number is required",
    );
}

async fn create_customer(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Json(payload): Json<NewCustomer>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = Vec::new();
    check(
        &mut errors,
        not_blank(&payload.customer_name),
        "Customer name is required",
    );
    check(
        &mut errors,
        payload.contact.phone.as_deref().is_some_and(is_phone),
        "Valid phone number is required",
    );
    let address = payload.contact.address.as_ref();
    check(
        &mut errors,
        address.is_some_and(|a| opt_not_blank(a.street.as_deref())),
        "Street is required",
    );
    check(
        &mut errors,
        address.is_some_and(|a| opt_not_blank(a.city.as_deref())),
        "City is required",
    );
    check(
        &mut errors,
        address.is_some_and(|a| opt_not_blank(a.state.as_deref())),
        "State is required",
    );
    for vehicle in &payload.vehicles {
        check_vehicle(&mut errors, vehicle);
    }
    finish(errors)?;

    let customer_id = state.store.allocate_id("CUST").await?;

    // The plate number is the vehicle id throughout.
    let vehicles: Vec<CustomerVehicle> = payload
        .vehicles
        .into_iter()
        .map(|mut vehicle| {
            vehicle.vehicle_id = vehicle.plate_number.clone();
            vehicle
        })
        .collect();

    let customer = Customer {
        customer_id: customer_id.clone(),
        customer_name: payload.customer_name,
        gst_number: payload.gst_number,
        contact: payload.contact,
        vehicles,
    };
    state.store.insert_customer(&customer).await?;

    for vehicle in &customer.vehicles {
        state
            .store
            .register_vehicle(&VehicleRecord {
                vehicle_id: vehicle.vehicle_id.clone(),
                customer_id: customer_id.clone(),
                plate_number: vehicle.plate_number.clone(),
            })
            .await?;
    }

    search::sync_customer(&state, &customer).await;
    info!("New customer created: {customer_id}");
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn list_customers(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let customers = state.store.list_customers().await?;
    Ok(Json(customers))
}

async fn get_customer(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let customer = state
        .store
        .get_customer(&id)
        .await?
        .ok_or(AppError::NotFound("Customer"))?;
    Ok(Json(customer))
}

async fn update_customer(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<CustomerPatch>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = Vec::new();
    if let Some(name) = &patch.customer_name {
        check(&mut errors, not_blank(name), "Customer name is required");
    }
    if let Some(contact) = &patch.contact {
        if let Some(phone) = &contact.phone {
            check(&mut errors, is_phone(phone), "Valid phone number is required");
        }
        if let Some(email) = &contact.email {
            check(&mut errors, is_email(email), "Valid email is required");
        }
    }
    if let Some(vehicles) = &patch.vehicles {
        for vehicle in vehicles {
            check_vehicle(&mut errors, vehicle);
        }
    }
    finish(errors)?;

    let customer = state
        .store
        .update_customer(&id, &patch)
        .await?
        .ok_or(AppError::NotFound("Customer"))?;
    search::sync_customer(&state, &customer).await;
    Ok(Json(customer))
}

#[derive(Deserialize)]
struct VehiclesPayload {
    #[serde(default)]
    vehicles: Vec<CustomerVehicle>,
}

async fn update_vehicles(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<VehiclesPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = Vec::new();
    check(
        &mut errors,
        !payload.vehicles.is_empty(),
        "Vehicles must be a non-empty array",
    );
    for vehicle in &payload.vehicles {
        check(&mut errors, not_blank(&vehicle.make), "Vehicle make is required");
        check(&mut errors, not_blank(&vehicle.model), "Vehicle model is required");
        check(
            &mut errors,
            not_blank(&vehicle.plate_number),
            "Vehicle plate number is required",
        );
        if let Some(year) = vehicle.year {
            check(&mut errors, year >= MIN_VEHICLE_YEAR, "Valid vehicle year is required");
        }
    }
    finish(errors)?;

    let customer = state
        .store
        .upsert_customer_vehicles(&id, &payload.vehicles)
        .await?
        .ok_or(AppError::NotFound("Customer"))?;
    search::sync_customer(&state, &customer).await;
    Ok(Json(customer))
}

async fn delete_customer(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_customer(&id).await? {
        return Err(AppError::NotFound("Customer"));
    }
    search::remove_customer(&state, &id).await;
    Ok(Json(json!({ "message": "Customer deleted" })))
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    city: Option<String>,
}

async fn search_customers(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let client = state.meili.as_ref().ok_or(AppError::SearchUnavailable)?;
    let hits = search::search_customers(client, &params.q, params.city.as_deref()).await?;
    Ok(Json(hits))
}
