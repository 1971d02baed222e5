use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Approval state of a service entry (estimate or actual lane).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Approved,
    Pending,
    Rejected,
    Saved,
    Released,
}

impl ApprovalStatus {
    pub const ALLOWED: &'static [&'static str] =
        &["approved", "pending", "rejected", "saved", "released"];
}

/// Lifecycle state shared by appointments and actual services.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Progress {
    #[default]
    Scheduled,
    Completed,
    Canceled,
    Saved,
    Approved,
}

/// Which of the two service lanes an upsert targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceLane {
    Estimate,
    Actual,
}

impl ServiceLane {
    /// Relational table holding this lane.
    pub fn table(self) -> &'static str {
        match self {
            ServiceLane::Estimate => "services_estimate",
            ServiceLane::Actual => "services_actual",
        }
    }
}

/// A part needed by a service. Quantity, tax and discount arrive as strings
/// from the frontend and are stored verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequiredItem {
    pub item_id: String,
    pub item_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub service_id: String,
    pub service_description: String,
    pub price: f64,
    pub service_type: String,
    pub status: ApprovalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_status: Option<Progress>,
    /// Procurement number, joined in by the relational backend only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_no: Option<String>,
    #[serde(default)]
    pub items_required: Vec<RequiredItem>,
}

/// Incoming service entry for a lane upsert. Entries without a `service_id`
/// get one minted on insert.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceUpsert {
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub service_description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub service_type: String,
    pub status: Option<ApprovalStatus>,
    #[serde(default)]
    pub service_status: Option<Progress>,
    #[serde(default)]
    pub items_required: Vec<RequiredItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub appointment_id: String,
    pub customer_id: String,
    pub vehicle_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanic_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub km: Option<u32>,
    #[serde(default)]
    pub services_estimate: Vec<ServiceEntry>,
    #[serde(default)]
    pub services_actual: Vec<ServiceEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<DateTime<Utc>>,
    /// HH:MM wall-clock string, as the frontend sends it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_time: Option<String>,
    #[serde(default)]
    pub status: Progress,
    pub telecaller: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial update for `PUT /appointment/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentPatch {
    pub mechanic_id: Option<String>,
    pub km: Option<u32>,
    pub appointment_date: Option<DateTime<Utc>>,
    pub appointment_time: Option<String>,
    pub status: Option<Progress>,
    pub telecaller: Option<String>,
    pub notes: Option<String>,
}
