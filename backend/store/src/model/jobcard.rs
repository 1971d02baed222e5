use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobCardStatus {
    Pending,
    Accepted,
}

/// One line of a job card estimate. Discount is a percentage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateItem {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub spare_list: String,
    #[serde(default)]
    pub qty: u32,
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub estimated_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCard {
    #[serde(rename = "jobCard_id")]
    pub job_card_id: String,
    #[serde(rename = "vehicleId")]
    pub vehicle_id: String,
    #[serde(rename = "customerId")]
    pub customer_id: String,
    #[serde(rename = "estimateItems", default)]
    pub estimate_items: Vec<EstimateItem>,
    pub status: JobCardStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}
