use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryCategory {
    Spares,
    Accessories,
}

/// A restock order placed against a supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryOrder {
    pub date: DateTime<Utc>,
    pub supplier_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub inventory_id: String,
    pub part_name: String,
    pub part_number: String,
    pub description: String,
    pub category: InventoryCategory,
    pub quantity: i64,
    pub price: f64,
    #[serde(default)]
    pub orders: Vec<InventoryOrder>,
    #[serde(default)]
    pub suppliers: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryPatch {
    pub part_name: Option<String>,
    pub part_number: Option<String>,
    pub description: Option<String>,
    pub category: Option<InventoryCategory>,
    pub quantity: Option<i64>,
    pub price: Option<f64>,
    pub orders: Option<Vec<InventoryOrder>>,
    pub suppliers: Option<Vec<String>>,
}
