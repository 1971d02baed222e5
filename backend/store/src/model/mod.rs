//! Shared domain types.
//!
//! Wire field names follow the JSON the frontend already speaks, which mixes
//! snake_case and camelCase depending on the entity. Serde renames absorb the
//! difference so the Rust side stays uniformly snake_case.

mod appointment;
mod customer;
mod inventory;
mod invoice;
mod jobcard;
mod mechanic;
mod procurement;
mod supplier;
mod user;

pub use appointment::{
    Appointment, AppointmentPatch, ApprovalStatus, Progress, RequiredItem, ServiceEntry,
    ServiceLane, ServiceUpsert,
};
pub use customer::{Customer, CustomerPatch, CustomerVehicle, VehicleRecord};
pub use inventory::{InventoryCategory, InventoryItem, InventoryOrder, InventoryPatch};
pub use invoice::{Invoice, PaymentStatus};
pub use jobcard::{EstimateItem, JobCard, JobCardStatus};
pub use mechanic::{Mechanic, MechanicPatch};
pub use procurement::{Procurement, ProcurementItem, ProcurementPatch, ProcurementService};
pub use supplier::{ShippingOption, Supplier, SupplierPatch, SupplierProduct};
pub use user::{Profile, Role, User};

use serde::{Deserialize, Serialize};

/// Postal address. `country` is only populated for suppliers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Contact block shared by customers, mechanics and suppliers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}
