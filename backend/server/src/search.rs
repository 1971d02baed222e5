//! # Meilisearch
//!
//! Customer search, proxied through the backend.
//!
//! The frontend never talks to Meilisearch directly: search queries go
//! through `GET /customer/search`, which keeps the search instance off the
//! public surface and lets the backend shape the response.
//!
//! ## Schema
//! - One index for customers
//! - Fields: name (**string**), phone (**string**), city (**string**),
//!   plates (**list of strings**)
//! - name, phone and plates are searchable; city is filterable
//!
//! ## Sync
//! The index is rebuilt from the store at startup and then kept warm on the
//! write path: every customer create/update upserts its document, deletes
//! drop it. A failed sync only logs a warning, the write itself has already
//! succeeded.
//!
//! Search is optional: without `MEILI_URL` the server runs with the search
//! endpoint answering 503.

use std::sync::Arc;

use meilisearch_sdk::{
    client::Client,
    settings::{MinWordSizeForTypos, Settings, TypoToleranceSettings},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use store::model::Customer;

use crate::{error::AppError, state::AppState};

pub const CUSTOMER_INDEX: &str = "customers";
pub const CUSTOMER_ID: &str = "id";
pub const CUSTOMER_NAME: &str = "name";
pub const CUSTOMER_PHONE: &str = "phone";
pub const CUSTOMER_CITY: &str = "city";
pub const CUSTOMER_PLATES: &str = "plates";

#[derive(Debug, Serialize, Deserialize)]
pub struct CustomerDoc {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub city: String,
    pub plates: Vec<String>,
}

pub fn customer_doc(customer: &Customer) -> CustomerDoc {
    CustomerDoc {
        id: customer.customer_id.clone(),
        name: customer.customer_name.clone(),
        phone: customer.contact.phone.clone().unwrap_or_default(),
        city: customer
            .contact
            .address
            .as_ref()
            .and_then(|address| address.city.clone())
            .unwrap_or_default(),
        plates: customer
            .vehicles
            .iter()
            .map(|vehicle| vehicle.plate_number.clone())
            .collect(),
    }
}

pub async fn init_meilisearch(
    meili_url: &str,
    meili_admin_key: Option<&str>,
    customers: &[Customer],
) -> Arc<Client> {
    let meili_client = Arc::new(Client::new(meili_url, meili_admin_key).unwrap());

    meili_client
        .index(CUSTOMER_INDEX)
        .set_settings(&init_settings())
        .await
        .unwrap();

    upsert_customers(meili_client.clone(), customers).await;

    meili_client
}

pub async fn upsert_customers(meili_client: Arc<Client>, customers: &[Customer]) {
    let docs: Vec<CustomerDoc> = customers.iter().map(customer_doc).collect();

    let _result = meili_client
        .index(CUSTOMER_INDEX)
        .add_or_update(&docs, Some(CUSTOMER_ID))
        .await
        .unwrap()
        .wait_for_completion(&meili_client, None, None)
        .await
        .unwrap();
}

/// Write-path sync; failures are logged, never surfaced.
pub async fn sync_customer(state: &AppState, customer: &Customer) {
    let Some(client) = &state.meili else {
        return;
    };
    let doc = customer_doc(customer);
    if let Err(err) = client
        .index(CUSTOMER_INDEX)
        .add_or_update(&[doc], Some(CUSTOMER_ID))
        .await
    {
        warn!("search sync failed for {}: {err}", customer.customer_id);
    }
}

pub async fn remove_customer(state: &AppState, customer_id: &str) {
    let Some(client) = &state.meili else {
        return;
    };
    if let Err(err) = client
        .index(CUSTOMER_INDEX)
        .delete_document(customer_id)
        .await
    {
        warn!("search removal failed for {customer_id}: {err}");
    }
}

pub async fn search_customers(
    client: &Client,
    query: &str,
    city: Option<&str>,
) -> Result<Vec<CustomerDoc>, AppError> {
    let index = client.index(CUSTOMER_INDEX);
    let filter = city.map(|city| format!("{CUSTOMER_CITY} = \"{city}\""));

    let mut search = index.search();
    search.with_query(query);
    if let Some(filter) = &filter {
        search.with_filter(filter);
    }

    let results = search.execute::<CustomerDoc>().await?;
    Ok(results.hits.into_iter().map(|hit| hit.result).collect())
}

fn init_settings() -> Settings {
    Settings::new()
        .with_ranking_rules([
            "words",
            "typo",
            "proximity",
            "exactness",
            "attribute",
            "sort",
        ])
        .with_filterable_attributes([CUSTOMER_CITY])
        .with_searchable_attributes([CUSTOMER_NAME, CUSTOMER_PHONE, CUSTOMER_PLATES])
        .with_typo_tolerance(TypoToleranceSettings {
            enabled: Some(true),
            disable_on_attributes: None,
            disable_on_words: None,
            min_word_size_for_typos: Some(MinWordSizeForTypos {
                one_typo: Some(5),
                two_typos: Some(9),
            }),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::model::{Address, Contact, CustomerVehicle};

    #[test]
    fn customer_doc_flattens_contact_and_plates() {
        let customer = Customer {
            customer_id: "CUST-1001".to_owned(),
            customer_name: "Asha Rao".to_owned(),
            gst_number: None,
            contact: Contact {
                phone: Some("9876543210".to_owned()),
                email: None,
                address: Some(Address {
                    city: Some("Bengaluru".to_owned()),
                    ..Address::default()
                }),
            },
            vehicles: vec![CustomerVehicle {
                vehicle_id: "KA01AB1234".to_owned(),
                make: "Maruti".to_owned(),
                model: "Swift".to_owned(),
                fuel_type: "petrol".to_owned(),
                year: Some(2019),
                vin: Some("VIN1".to_owned()),
                plate_number: "KA01AB1234".to_owned(),
            }],
        };
        let doc = customer_doc(&customer);
        assert_eq!(doc.id, "CUST-1001");
        assert_eq!(doc.city, "Bengaluru");
        assert_eq!(doc.plates, vec!["KA01AB1234".to_owned()]);
    }
}
