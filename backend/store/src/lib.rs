//! # Store
//!
//! Persistence seam for the shop backend.
//!
//! The same domain is served by two interchangeable backends behind the
//! [`Store`] trait:
//!
//! - [`RedisStore`]: document-oriented. One Redis hash per collection, one
//!   JSON document per entity. Atomic operations (id minting) run server-side
//!   so they stay race-free without client locks.
//! - [`SqliteStore`]: relational. Normalized tables for appointments, their
//!   service lanes and required items; joins reassemble the nested documents
//!   the handlers speak.
//!
//! Handlers hold an `Arc<dyn Store>` and never know which backend is live;
//! the backend is picked once at startup from configuration.

pub mod error;
pub mod ids;
pub mod model;
mod redis_store;
mod sqlite_store;

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use error::StoreError;
pub use ids::NumberRange;
pub use redis_store::RedisStore;
pub use sqlite_store::SqliteStore;

use model::{
    Appointment, AppointmentPatch, Customer, CustomerPatch, CustomerVehicle, InventoryItem,
    InventoryPatch, Invoice, JobCard, JobCardStatus, Mechanic, MechanicPatch, Procurement,
    ProcurementPatch, Progress, ServiceEntry, ServiceLane, ServiceUpsert, Supplier, SupplierPatch,
    User, VehicleRecord,
};

pub type StoreResult<T> = Result<T, StoreError>;

/// Which backend to connect. Parsed from the `STORE_BACKEND` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Redis,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sqlite" => Ok(Backend::Sqlite),
            "redis" => Ok(Backend::Redis),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

/// Connect the configured backend and hand it back as a trait object.
pub async fn connect(
    backend: Backend,
    redis_url: &str,
    sqlite_path: &str,
) -> StoreResult<Arc<dyn Store>> {
    Ok(match backend {
        Backend::Sqlite => Arc::new(SqliteStore::open(sqlite_path)?),
        Backend::Redis => Arc::new(RedisStore::connect(redis_url).await?),
    })
}

/// Every persistence operation the handlers need, duplicated across both
/// backends.
///
/// `Option` returns mean "the addressed entity was not there"; handlers turn
/// that into a 404. Deletes report whether anything was removed.
#[async_trait]
pub trait Store: Send + Sync {
    // --- id ranges ---

    /// Mint the next id for `prefix`, e.g. `CUST-1042`. Atomic per backend.
    async fn allocate_id(&self, prefix: &str) -> StoreResult<String>;

    /// Register ranges that are not present yet. Existing running numbers are
    /// never reset.
    async fn seed_ranges(&self, ranges: &[NumberRange]) -> StoreResult<()>;

    // --- customers ---

    async fn insert_customer(&self, customer: &Customer) -> StoreResult<()>;
    async fn list_customers(&self) -> StoreResult<Vec<Customer>>;
    async fn get_customer(&self, customer_id: &str) -> StoreResult<Option<Customer>>;
    async fn update_customer(
        &self,
        customer_id: &str,
        patch: &CustomerPatch,
    ) -> StoreResult<Option<Customer>>;

    /// Upsert the vehicle list: matching plates are updated in place, new
    /// plates appended, and every vehicle mirrored into the registry.
    async fn upsert_customer_vehicles(
        &self,
        customer_id: &str,
        vehicles: &[CustomerVehicle],
    ) -> StoreResult<Option<Customer>>;

    async fn delete_customer(&self, customer_id: &str) -> StoreResult<bool>;

    // --- vehicle registry ---

    async fn register_vehicle(&self, vehicle: &VehicleRecord) -> StoreResult<()>;
    async fn list_vehicles(&self) -> StoreResult<Vec<VehicleRecord>>;
    async fn get_vehicle(&self, vehicle_id: &str) -> StoreResult<Option<VehicleRecord>>;
    async fn vehicles_for_customer(&self, customer_id: &str) -> StoreResult<Vec<VehicleRecord>>;

    // --- appointments ---

    async fn insert_appointment(&self, appointment: &Appointment) -> StoreResult<()>;

    /// The appointment blocking a new booking for this vehicle, if any: the
    /// first one whose status is not `completed`.
    async fn open_appointment_for_vehicle(
        &self,
        vehicle_id: &str,
    ) -> StoreResult<Option<Appointment>>;

    async fn list_appointments(&self) -> StoreResult<Vec<Appointment>>;
    async fn get_appointment(&self, appointment_id: &str) -> StoreResult<Option<Appointment>>;
    async fn update_appointment(
        &self,
        appointment_id: &str,
        patch: &AppointmentPatch,
    ) -> StoreResult<Option<Appointment>>;
    async fn delete_appointment(&self, appointment_id: &str) -> StoreResult<bool>;

    /// Batch upsert into one service lane. Entries carrying a `service_id`
    /// update that service and upsert its items; the rest are inserted under
    /// minted `SER` ids. Returns the updated appointment.
    async fn upsert_services(
        &self,
        appointment_id: &str,
        lane: ServiceLane,
        services: Vec<ServiceUpsert>,
    ) -> StoreResult<Option<Appointment>>;

    async fn assign_mechanic(
        &self,
        appointment_id: &str,
        mechanic_id: &str,
    ) -> StoreResult<Option<Appointment>>;
    async fn update_km(&self, appointment_id: &str, km: u32) -> StoreResult<Option<Appointment>>;

    /// The actual-services lane with items, or `None` when the appointment is
    /// missing.
    async fn services_actual(
        &self,
        appointment_id: &str,
    ) -> StoreResult<Option<Vec<ServiceEntry>>>;

    /// Set one actual service's lifecycle state. `None` when the service is
    /// not on this appointment.
    async fn update_service_status(
        &self,
        appointment_id: &str,
        service_id: &str,
        progress: Progress,
    ) -> StoreResult<Option<Appointment>>;

    // --- job cards ---

    async fn insert_job_card(&self, card: &JobCard) -> StoreResult<()>;
    async fn list_job_cards(&self) -> StoreResult<Vec<JobCard>>;
    async fn get_job_card(&self, job_card_id: &str) -> StoreResult<Option<JobCard>>;
    async fn set_job_card_status(
        &self,
        job_card_id: &str,
        status: JobCardStatus,
    ) -> StoreResult<Option<JobCard>>;

    // --- inventory ---

    async fn insert_inventory_item(&self, item: &InventoryItem) -> StoreResult<()>;
    async fn list_inventory(&self) -> StoreResult<Vec<InventoryItem>>;
    async fn get_inventory_item(&self, inventory_id: &str) -> StoreResult<Option<InventoryItem>>;
    async fn update_inventory_item(
        &self,
        inventory_id: &str,
        patch: &InventoryPatch,
    ) -> StoreResult<Option<InventoryItem>>;
    async fn delete_inventory_item(&self, inventory_id: &str) -> StoreResult<bool>;

    // --- procurement ---

    /// Insert a procurement and record its (appointment, service) → `pr_no`
    /// links for appointment reads.
    async fn insert_procurement(&self, procurement: &Procurement) -> StoreResult<()>;
    async fn list_procurements(&self) -> StoreResult<Vec<Procurement>>;
    async fn get_procurement(&self, procurement_id: &str) -> StoreResult<Option<Procurement>>;
    async fn update_procurement(
        &self,
        procurement_id: &str,
        patch: &ProcurementPatch,
    ) -> StoreResult<Option<Procurement>>;
    async fn delete_procurement(&self, procurement_id: &str) -> StoreResult<bool>;

    // --- mechanics ---

    async fn insert_mechanic(&self, mechanic: &Mechanic) -> StoreResult<()>;
    async fn list_mechanics(&self) -> StoreResult<Vec<Mechanic>>;
    async fn get_mechanic(&self, mechanic_id: &str) -> StoreResult<Option<Mechanic>>;
    async fn update_mechanic(
        &self,
        mechanic_id: &str,
        patch: &MechanicPatch,
    ) -> StoreResult<Option<Mechanic>>;
    async fn delete_mechanic(&self, mechanic_id: &str) -> StoreResult<bool>;

    // --- suppliers ---

    async fn insert_supplier(&self, supplier: &Supplier) -> StoreResult<()>;
    async fn list_suppliers(&self) -> StoreResult<Vec<Supplier>>;
    async fn get_supplier(&self, supplier_id: &str) -> StoreResult<Option<Supplier>>;
    async fn update_supplier(
        &self,
        supplier_id: &str,
        patch: &SupplierPatch,
    ) -> StoreResult<Option<Supplier>>;
    async fn delete_supplier(&self, supplier_id: &str) -> StoreResult<bool>;

    // --- invoices ---

    async fn insert_invoice(&self, invoice: &Invoice) -> StoreResult<()>;
    async fn list_invoices(&self) -> StoreResult<Vec<Invoice>>;
    async fn get_invoice(&self, invoice_id: &str) -> StoreResult<Option<Invoice>>;
    async fn mark_invoice_paid(
        &self,
        invoice_id: &str,
        paid_at: DateTime<Utc>,
    ) -> StoreResult<Option<Invoice>>;

    // --- users ---

    /// Errors with [`StoreError::Duplicate`] when the username or email is
    /// taken.
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
}
