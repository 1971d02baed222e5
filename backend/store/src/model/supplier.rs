use serde::{Deserialize, Serialize};

use super::Contact;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingOption {
    pub carrier: String,
    pub estimated_time: String,
    pub cost: f64,
}

/// A part this supplier can deliver, referencing the inventory catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierProduct {
    pub inventory_id: String,
    pub part_name: String,
    pub part_number: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub supplier_id: String,
    pub name: String,
    pub contact: Contact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub shipping_options: Vec<ShippingOption>,
    #[serde(default)]
    pub products: Vec<SupplierProduct>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SupplierPatch {
    pub name: Option<String>,
    pub contact: Option<Contact>,
    pub payment_terms: Option<String>,
    pub shipping_options: Option<Vec<ShippingOption>>,
    pub products: Option<Vec<SupplierProduct>>,
    pub notes: Option<String>,
}
