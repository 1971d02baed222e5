use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ApprovalStatus, Progress};

/// A part requested for a procured service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcurementItem {
    pub inventory_id: String,
    pub part_name: String,
    pub quantity: u32,
    pub price: f64,
    pub status: ApprovalStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcurementService {
    pub service_id: String,
    pub service_description: String,
    pub price: f64,
    #[serde(default)]
    pub items_required: Vec<ProcurementItem>,
}

/// A procurement request raised from an appointment. Its id doubles as the
/// `pr_no` surfaced on the appointment's services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Procurement {
    pub procurement_id: String,
    pub appointment_id: String,
    pub customer_id: String,
    pub vehicle_id: String,
    pub mechanic_id: String,
    #[serde(default)]
    pub services: Vec<ProcurementService>,
    pub appointment_date: DateTime<Utc>,
    pub appointment_time: String,
    pub status: Progress,
    pub telecaller: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcurementPatch {
    pub mechanic_id: Option<String>,
    pub services: Option<Vec<ProcurementService>>,
    pub appointment_date: Option<DateTime<Utc>>,
    pub appointment_time: Option<String>,
    pub status: Option<Progress>,
    pub telecaller: Option<String>,
    pub notes: Option<String>,
}
