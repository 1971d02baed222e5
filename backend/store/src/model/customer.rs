use serde::{Deserialize, Serialize};

use super::Contact;

/// A vehicle as embedded in its owner's customer document. The plate number
/// doubles as the vehicle id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerVehicle {
    #[serde(default)]
    pub vehicle_id: String,
    pub make: String,
    pub model: String,
    #[serde(rename = "fuelType")]
    pub fuel_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    pub plate_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub customer_name: String,
    #[serde(rename = "gstNumber", default, skip_serializing_if = "Option::is_none")]
    pub gst_number: Option<String>,
    #[serde(default)]
    pub contact: Contact,
    #[serde(default)]
    pub vehicles: Vec<CustomerVehicle>,
}

/// Partial update for `PUT /customer/{id}`. Present fields replace the stored
/// value wholesale, absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerPatch {
    pub customer_name: Option<String>,
    #[serde(rename = "gstNumber")]
    pub gst_number: Option<String>,
    pub contact: Option<Contact>,
    pub vehicles: Option<Vec<CustomerVehicle>>,
}

/// Row in the flat vehicle registry, mirrored from customer documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub vehicle_id: String,
    pub customer_id: String,
    pub plate_number: String,
}
