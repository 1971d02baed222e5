//! Document backend backed by Redis.
//!
//! One hash per collection, one JSON document per entity: the document keeps
//! the full nested shape (service lanes, items, contact blocks) exactly as it
//! travels over the wire, so reads are a straight `HGET` and filtered reads
//! are collection scans, Mongo-style.
//!
//! Id minting is the one operation that must not race, so it runs server-side
//! as a Lua script: check-against-bound and increment happen in one atomic
//! step inside Redis, no client locks involved.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client, Script};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::StoreError;
use crate::ids::{format_id, NumberRange};
use crate::model::{
    Appointment, AppointmentPatch, ApprovalStatus, Customer, CustomerPatch, CustomerVehicle,
    InventoryItem, InventoryPatch, Invoice, JobCard, JobCardStatus, Mechanic, MechanicPatch,
    PaymentStatus, Procurement, ProcurementPatch, Progress, ServiceEntry, ServiceLane,
    ServiceUpsert, Supplier, SupplierPatch, User, VehicleRecord,
};
use crate::{Store, StoreResult};

const CUSTOMERS: &str = "shop:customers";
const VEHICLES: &str = "shop:vehicles";
const APPOINTMENTS: &str = "shop:appointments";
const JOB_CARDS: &str = "shop:jobcards";
const INVENTORY: &str = "shop:inventory";
const PROCUREMENTS: &str = "shop:procurements";
const MECHANICS: &str = "shop:mechanics";
const SUPPLIERS: &str = "shop:suppliers";
const INVOICES: &str = "shop:invoices";
const USERS: &str = "shop:users";
const USER_EMAILS: &str = "shop:users:email";
const USER_NAMES: &str = "shop:users:name";
const RANGES: &str = "shop:ranges";

/// Check-and-increment in one atomic step. Erroring before the increment
/// means a failed mint never consumes a number.
const ALLOCATE_SCRIPT: &str = r#"
local raw = redis.call('HGET', KEYS[1], ARGV[1])
if not raw then
  return redis.error_reply('range missing')
end
local range = cjson.decode(raw)
if range.running_number >= range.range_end then
  return redis.error_reply('range exhausted')
end
range.running_number = range.running_number + 1
redis.call('HSET', KEYS[1], ARGV[1], cjson.encode(range))
return range.running_number
"#;

pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(Duration::from_millis(500));

        let client = Client::open(redis_url)?;
        let conn = client.get_connection_manager_with_config(config).await?;
        Ok(Self { conn })
    }

    async fn mint(&self, prefix: &str) -> StoreResult<String> {
        let mut conn = self.conn.clone();
        let result: Result<u64, redis::RedisError> = Script::new(ALLOCATE_SCRIPT)
            .key(RANGES)
            .arg(prefix)
            .invoke_async(&mut conn)
            .await;
        match result {
            Ok(number) => Ok(format_id(prefix, number)),
            Err(err) => {
                let text = err.to_string();
                if text.contains("exhausted") {
                    warn!("number range for {prefix} is exhausted");
                    Err(StoreError::RangeExhausted(prefix.to_owned()))
                } else if text.contains("missing") {
                    Err(StoreError::RangeMissing(prefix.to_owned()))
                } else {
                    Err(err.into())
                }
            }
        }
    }

    async fn put<T: Serialize + Sync>(
        &self,
        collection: &str,
        id: &str,
        value: &T,
    ) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(value)?;
        let _: () = conn.hset(collection, id, json).await?;
        Ok(())
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> StoreResult<Option<T>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.hget(collection, id).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Full collection scan, ordered by document id so listings are stable.
    async fn all<T: DeserializeOwned>(&self, collection: &str) -> StoreResult<Vec<T>> {
        let mut conn = self.conn.clone();
        let mut raw: Vec<(String, String)> = conn.hgetall(collection).await?;
        raw.sort_by(|a, b| a.0.cmp(&b.0));
        raw.into_iter()
            .map(|(_, json)| serde_json::from_str(&json).map_err(StoreError::from))
            .collect()
    }

    async fn remove(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.hdel(collection, id).await?;
        Ok(removed > 0)
    }
}

/// In-place merge of a vehicle list, plate number as the key. Absent
/// year/vin keep what the document already had.
fn merge_vehicles(existing: &mut Vec<CustomerVehicle>, incoming: &[CustomerVehicle]) {
    for vehicle in incoming {
        let mut vehicle = vehicle.clone();
        vehicle.vehicle_id = vehicle.plate_number.clone();
        match existing
            .iter_mut()
            .find(|v| v.plate_number == vehicle.plate_number)
        {
            Some(current) => {
                current.make = vehicle.make;
                current.model = vehicle.model;
                current.fuel_type = vehicle.fuel_type;
                if vehicle.year.is_some() {
                    current.year = vehicle.year;
                }
                if vehicle.vin.is_some() {
                    current.vin = vehicle.vin;
                }
            }
            None => existing.push(vehicle),
        }
    }
}

fn lane_of(appointment: &mut Appointment, lane: ServiceLane) -> &mut Vec<ServiceEntry> {
    match lane {
        ServiceLane::Estimate => &mut appointment.services_estimate,
        ServiceLane::Actual => &mut appointment.services_actual,
    }
}

fn apply_service_upsert(services: &mut Vec<ServiceEntry>, service_id: String, incoming: ServiceUpsert) {
    let entry = ServiceEntry {
        service_id: service_id.clone(),
        service_description: incoming.service_description,
        price: incoming.price,
        service_type: incoming.service_type,
        status: incoming.status.unwrap_or(ApprovalStatus::Pending),
        service_status: incoming.service_status,
        pr_no: None,
        items_required: incoming.items_required,
    };
    match services.iter_mut().find(|s| s.service_id == service_id) {
        Some(current) => {
            current.service_description = entry.service_description;
            current.price = entry.price;
            current.service_type = entry.service_type;
            current.status = entry.status;
            current.service_status = entry.service_status;
            for item in entry.items_required {
                match current
                    .items_required
                    .iter_mut()
                    .find(|i| i.item_id == item.item_id)
                {
                    Some(existing) => *existing = item,
                    None => current.items_required.push(item),
                }
            }
        }
        None => services.push(entry),
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn allocate_id(&self, prefix: &str) -> StoreResult<String> {
        self.mint(prefix).await
    }

    async fn seed_ranges(&self, ranges: &[NumberRange]) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        for range in ranges {
            let json = serde_json::to_string(range)?;
            let _: bool = conn.hset_nx(RANGES, &range.prefix, json).await?;
        }
        Ok(())
    }

    async fn insert_customer(&self, customer: &Customer) -> StoreResult<()> {
        self.put(CUSTOMERS, &customer.customer_id, customer).await
    }

    async fn list_customers(&self) -> StoreResult<Vec<Customer>> {
        self.all(CUSTOMERS).await
    }

    async fn get_customer(&self, customer_id: &str) -> StoreResult<Option<Customer>> {
        self.fetch(CUSTOMERS, customer_id).await
    }

    async fn update_customer(
        &self,
        customer_id: &str,
        patch: &CustomerPatch,
    ) -> StoreResult<Option<Customer>> {
        let Some(mut customer) = self.get_customer(customer_id).await? else {
            return Ok(None);
        };
        if let Some(name) = &patch.customer_name {
            customer.customer_name = name.clone();
        }
        if let Some(gst) = &patch.gst_number {
            customer.gst_number = Some(gst.clone());
        }
        if let Some(contact) = &patch.contact {
            customer.contact = contact.clone();
        }
        if let Some(vehicles) = &patch.vehicles {
            customer.vehicles = vehicles
                .iter()
                .cloned()
                .map(|mut v| {
                    v.vehicle_id = v.plate_number.clone();
                    v
                })
                .collect();
        }
        self.put(CUSTOMERS, customer_id, &customer).await?;
        Ok(Some(customer))
    }

    async fn upsert_customer_vehicles(
        &self,
        customer_id: &str,
        vehicles: &[CustomerVehicle],
    ) -> StoreResult<Option<Customer>> {
        let Some(mut customer) = self.get_customer(customer_id).await? else {
            return Ok(None);
        };
        merge_vehicles(&mut customer.vehicles, vehicles);
        for vehicle in vehicles {
            self.register_vehicle(&VehicleRecord {
                vehicle_id: vehicle.plate_number.clone(),
                customer_id: customer_id.to_owned(),
                plate_number: vehicle.plate_number.clone(),
            })
            .await?;
        }
        self.put(CUSTOMERS, customer_id, &customer).await?;
        Ok(Some(customer))
    }

    async fn delete_customer(&self, customer_id: &str) -> StoreResult<bool> {
        self.remove(CUSTOMERS, customer_id).await
    }

    async fn register_vehicle(&self, vehicle: &VehicleRecord) -> StoreResult<()> {
        self.put(VEHICLES, &vehicle.vehicle_id, vehicle).await
    }

    async fn list_vehicles(&self) -> StoreResult<Vec<VehicleRecord>> {
        self.all(VEHICLES).await
    }

    async fn get_vehicle(&self, vehicle_id: &str) -> StoreResult<Option<VehicleRecord>> {
        self.fetch(VEHICLES, vehicle_id).await
    }

    async fn vehicles_for_customer(&self, customer_id: &str) -> StoreResult<Vec<VehicleRecord>> {
        let vehicles: Vec<VehicleRecord> = self.all(VEHICLES).await?;
        Ok(vehicles
            .into_iter()
            .filter(|v| v.customer_id == customer_id)
            .collect())
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> StoreResult<()> {
        self.put(APPOINTMENTS, &appointment.appointment_id, appointment)
            .await
    }

    async fn open_appointment_for_vehicle(
        &self,
        vehicle_id: &str,
    ) -> StoreResult<Option<Appointment>> {
        let appointments: Vec<Appointment> = self.all(APPOINTMENTS).await?;
        Ok(appointments
            .into_iter()
            .find(|a| a.vehicle_id == vehicle_id && a.status != Progress::Completed))
    }

    async fn list_appointments(&self) -> StoreResult<Vec<Appointment>> {
        self.all(APPOINTMENTS).await
    }

    async fn get_appointment(&self, appointment_id: &str) -> StoreResult<Option<Appointment>> {
        self.fetch(APPOINTMENTS, appointment_id).await
    }

    async fn update_appointment(
        &self,
        appointment_id: &str,
        patch: &AppointmentPatch,
    ) -> StoreResult<Option<Appointment>> {
        let Some(mut appointment) = self.get_appointment(appointment_id).await? else {
            return Ok(None);
        };
        if let Some(mechanic_id) = &patch.mechanic_id {
            appointment.mechanic_id = Some(mechanic_id.clone());
        }
        if let Some(km) = patch.km {
            appointment.km = Some(km);
        }
        if let Some(date) = &patch.appointment_date {
            appointment.appointment_date = Some(*date);
        }
        if let Some(time) = &patch.appointment_time {
            appointment.appointment_time = Some(time.clone());
        }
        if let Some(status) = patch.status {
            appointment.status = status;
        }
        if let Some(telecaller) = &patch.telecaller {
            appointment.telecaller = telecaller.clone();
        }
        if let Some(notes) = &patch.notes {
            appointment.notes = Some(notes.clone());
        }
        self.put(APPOINTMENTS, appointment_id, &appointment).await?;
        Ok(Some(appointment))
    }

    async fn delete_appointment(&self, appointment_id: &str) -> StoreResult<bool> {
        self.remove(APPOINTMENTS, appointment_id).await
    }

    async fn upsert_services(
        &self,
        appointment_id: &str,
        lane: ServiceLane,
        services: Vec<ServiceUpsert>,
    ) -> StoreResult<Option<Appointment>> {
        let Some(mut appointment) = self.get_appointment(appointment_id).await? else {
            return Ok(None);
        };
        for service in services {
            let service_id = match &service.service_id {
                Some(id) if !id.is_empty() => id.clone(),
                _ => self.mint("SER").await?,
            };
            apply_service_upsert(lane_of(&mut appointment, lane), service_id, service);
        }
        self.put(APPOINTMENTS, appointment_id, &appointment).await?;
        Ok(Some(appointment))
    }

    async fn assign_mechanic(
        &self,
        appointment_id: &str,
        mechanic_id: &str,
    ) -> StoreResult<Option<Appointment>> {
        let Some(mut appointment) = self.get_appointment(appointment_id).await? else {
            return Ok(None);
        };
        appointment.mechanic_id = Some(mechanic_id.to_owned());
        self.put(APPOINTMENTS, appointment_id, &appointment).await?;
        Ok(Some(appointment))
    }

    async fn update_km(&self, appointment_id: &str, km: u32) -> StoreResult<Option<Appointment>> {
        let Some(mut appointment) = self.get_appointment(appointment_id).await? else {
            return Ok(None);
        };
        appointment.km = Some(km);
        self.put(APPOINTMENTS, appointment_id, &appointment).await?;
        Ok(Some(appointment))
    }

    async fn services_actual(
        &self,
        appointment_id: &str,
    ) -> StoreResult<Option<Vec<ServiceEntry>>> {
        let appointment = self.get_appointment(appointment_id).await?;
        Ok(appointment.map(|a| a.services_actual))
    }

    async fn update_service_status(
        &self,
        appointment_id: &str,
        service_id: &str,
        progress: Progress,
    ) -> StoreResult<Option<Appointment>> {
        let Some(mut appointment) = self.get_appointment(appointment_id).await? else {
            return Ok(None);
        };
        let Some(service) = appointment
            .services_actual
            .iter_mut()
            .find(|s| s.service_id == service_id)
        else {
            return Ok(None);
        };
        service.service_status = Some(progress);
        self.put(APPOINTMENTS, appointment_id, &appointment).await?;
        Ok(Some(appointment))
    }

    async fn insert_job_card(&self, card: &JobCard) -> StoreResult<()> {
        self.put(JOB_CARDS, &card.job_card_id, card).await
    }

    async fn list_job_cards(&self) -> StoreResult<Vec<JobCard>> {
        self.all(JOB_CARDS).await
    }

    async fn get_job_card(&self, job_card_id: &str) -> StoreResult<Option<JobCard>> {
        self.fetch(JOB_CARDS, job_card_id).await
    }

    async fn set_job_card_status(
        &self,
        job_card_id: &str,
        status: JobCardStatus,
    ) -> StoreResult<Option<JobCard>> {
        let Some(mut card) = self.get_job_card(job_card_id).await? else {
            return Ok(None);
        };
        card.status = status;
        self.put(JOB_CARDS, job_card_id, &card).await?;
        Ok(Some(card))
    }

    async fn insert_inventory_item(&self, item: &InventoryItem) -> StoreResult<()> {
        self.put(INVENTORY, &item.inventory_id, item).await
    }

    async fn list_inventory(&self) -> StoreResult<Vec<InventoryItem>> {
        self.all(INVENTORY).await
    }

    async fn get_inventory_item(&self, inventory_id: &str) -> StoreResult<Option<InventoryItem>> {
        self.fetch(INVENTORY, inventory_id).await
    }

    async fn update_inventory_item(
        &self,
        inventory_id: &str,
        patch: &InventoryPatch,
    ) -> StoreResult<Option<InventoryItem>> {
        let Some(mut item) = self.get_inventory_item(inventory_id).await? else {
            return Ok(None);
        };
        if let Some(part_name) = &patch.part_name {
            item.part_name = part_name.clone();
        }
        if let Some(part_number) = &patch.part_number {
            item.part_number = part_number.clone();
        }
        if let Some(description) = &patch.description {
            item.description = description.clone();
        }
        if let Some(category) = patch.category {
            item.category = category;
        }
        if let Some(quantity) = patch.quantity {
            item.quantity = quantity;
        }
        if let Some(price) = patch.price {
            item.price = price;
        }
        if let Some(orders) = &patch.orders {
            item.orders = orders.clone();
        }
        if let Some(suppliers) = &patch.suppliers {
            item.suppliers = suppliers.clone();
        }
        self.put(INVENTORY, inventory_id, &item).await?;
        Ok(Some(item))
    }

    async fn delete_inventory_item(&self, inventory_id: &str) -> StoreResult<bool> {
        self.remove(INVENTORY, inventory_id).await
    }

    async fn insert_procurement(&self, procurement: &Procurement) -> StoreResult<()> {
        // No pr_no link table on this backend; appointment reads here never
        // surface pr_no.
        self.put(PROCUREMENTS, &procurement.procurement_id, procurement)
            .await
    }

    async fn list_procurements(&self) -> StoreResult<Vec<Procurement>> {
        self.all(PROCUREMENTS).await
    }

    async fn get_procurement(&self, procurement_id: &str) -> StoreResult<Option<Procurement>> {
        self.fetch(PROCUREMENTS, procurement_id).await
    }

    async fn update_procurement(
        &self,
        procurement_id: &str,
        patch: &ProcurementPatch,
    ) -> StoreResult<Option<Procurement>> {
        let Some(mut procurement) = self.get_procurement(procurement_id).await? else {
            return Ok(None);
        };
        if let Some(mechanic_id) = &patch.mechanic_id {
            procurement.mechanic_id = mechanic_id.clone();
        }
        if let Some(services) = &patch.services {
            procurement.services = services.clone();
        }
        if let Some(date) = &patch.appointment_date {
            procurement.appointment_date = *date;
        }
        if let Some(time) = &patch.appointment_time {
            procurement.appointment_time = time.clone();
        }
        if let Some(status) = patch.status {
            procurement.status = status;
        }
        if let Some(telecaller) = &patch.telecaller {
            procurement.telecaller = telecaller.clone();
        }
        if let Some(notes) = &patch.notes {
            procurement.notes = Some(notes.clone());
        }
        self.put(PROCUREMENTS, procurement_id, &procurement).await?;
        Ok(Some(procurement))
    }

    async fn delete_procurement(&self, procurement_id: &str) -> StoreResult<bool> {
        self.remove(PROCUREMENTS, procurement_id).await
    }

    async fn insert_mechanic(&self, mechanic: &Mechanic) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(mechanic)?;
        let created: bool = conn.hset_nx(MECHANICS, &mechanic.mechanic_id, json).await?;
        if !created {
            return Err(StoreError::Duplicate(mechanic.mechanic_id.clone()));
        }
        Ok(())
    }

    async fn list_mechanics(&self) -> StoreResult<Vec<Mechanic>> {
        self.all(MECHANICS).await
    }

    async fn get_mechanic(&self, mechanic_id: &str) -> StoreResult<Option<Mechanic>> {
        self.fetch(MECHANICS, mechanic_id).await
    }

    async fn update_mechanic(
        &self,
        mechanic_id: &str,
        patch: &MechanicPatch,
    ) -> StoreResult<Option<Mechanic>> {
        let Some(mut mechanic) = self.get_mechanic(mechanic_id).await? else {
            return Ok(None);
        };
        if let Some(name) = &patch.mechanic_name {
            mechanic.mechanic_name = name.clone();
        }
        if let Some(contact) = &patch.contact {
            mechanic.contact = contact.clone();
        }
        if let Some(specialties) = &patch.specialties {
            mechanic.specialties = specialties.clone();
        }
        self.put(MECHANICS, mechanic_id, &mechanic).await?;
        Ok(Some(mechanic))
    }

    async fn delete_mechanic(&self, mechanic_id: &str) -> StoreResult<bool> {
        self.remove(MECHANICS, mechanic_id).await
    }

    async fn insert_supplier(&self, supplier: &Supplier) -> StoreResult<()> {
        self.put(SUPPLIERS, &supplier.supplier_id, supplier).await
    }

    async fn list_suppliers(&self) -> StoreResult<Vec<Supplier>> {
        self.all(SUPPLIERS).await
    }

    async fn get_supplier(&self, supplier_id: &str) -> StoreResult<Option<Supplier>> {
        self.fetch(SUPPLIERS, supplier_id).await
    }

    async fn update_supplier(
        &self,
        supplier_id: &str,
        patch: &SupplierPatch,
    ) -> StoreResult<Option<Supplier>> {
        let Some(mut supplier) = self.get_supplier(supplier_id).await? else {
            return Ok(None);
        };
        if let Some(name) = &patch.name {
            supplier.name = name.clone();
        }
        if let Some(contact) = &patch.contact {
            supplier.contact = contact.clone();
        }
        if let Some(payment_terms) = &patch.payment_terms {
            supplier.payment_terms = Some(payment_terms.clone());
        }
        if let Some(shipping_options) = &patch.shipping_options {
            supplier.shipping_options = shipping_options.clone();
        }
        if let Some(products) = &patch.products {
            supplier.products = products.clone();
        }
        if let Some(notes) = &patch.notes {
            supplier.notes = Some(notes.clone());
        }
        self.put(SUPPLIERS, supplier_id, &supplier).await?;
        Ok(Some(supplier))
    }

    async fn delete_supplier(&self, supplier_id: &str) -> StoreResult<bool> {
        self.remove(SUPPLIERS, supplier_id).await
    }

    async fn insert_invoice(&self, invoice: &Invoice) -> StoreResult<()> {
        self.put(INVOICES, &invoice.invoice_id, invoice).await
    }

    async fn list_invoices(&self) -> StoreResult<Vec<Invoice>> {
        self.all(INVOICES).await
    }

    async fn get_invoice(&self, invoice_id: &str) -> StoreResult<Option<Invoice>> {
        self.fetch(INVOICES, invoice_id).await
    }

    async fn mark_invoice_paid(
        &self,
        invoice_id: &str,
        paid_at: DateTime<Utc>,
    ) -> StoreResult<Option<Invoice>> {
        let Some(mut invoice) = self.get_invoice(invoice_id).await? else {
            return Ok(None);
        };
        invoice.payment_status = PaymentStatus::Paid;
        invoice.payment_date = Some(paid_at);
        self.put(INVOICES, invoice_id, &invoice).await?;
        Ok(Some(invoice))
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let email_free: bool = conn
            .hset_nx(USER_EMAILS, &user.email, &user.user_id)
            .await?;
        if !email_free {
            return Err(StoreError::Duplicate(user.email.clone()));
        }
        let name_free: bool = conn
            .hset_nx(USER_NAMES, &user.username, &user.user_id)
            .await?;
        if !name_free {
            let _: i64 = conn.hdel(USER_EMAILS, &user.email).await?;
            return Err(StoreError::Duplicate(user.username.clone()));
        }
        self.put(USERS, &user.user_id, user).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let mut conn = self.conn.clone();
        let user_id: Option<String> = conn.hget(USER_EMAILS, email).await?;
        match user_id {
            Some(id) => self.fetch(USERS, &id).await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RequiredItem;

    fn upsert(service_id: Option<&str>, description: &str) -> ServiceUpsert {
        ServiceUpsert {
            service_id: service_id.map(str::to_owned),
            service_description: description.to_owned(),
            price: 100.0,
            service_type: "repair".to_owned(),
            status: Some(ApprovalStatus::Pending),
            service_status: None,
            items_required: vec![RequiredItem {
                item_id: "ITM-1".to_owned(),
                item_name: "oil filter".to_owned(),
                qty: Some("1".to_owned()),
                tax: None,
                discount: None,
            }],
        }
    }

    #[test]
    fn upsert_updates_existing_service_in_place() {
        let mut services = Vec::new();
        apply_service_upsert(&mut services, "SER-1".to_owned(), upsert(Some("SER-1"), "first"));
        apply_service_upsert(&mut services, "SER-1".to_owned(), upsert(Some("SER-1"), "second"));
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].service_description, "second");
        assert_eq!(services[0].items_required.len(), 1);
    }

    #[test]
    fn merge_keeps_year_and_vin_when_absent() {
        let mut existing = vec![CustomerVehicle {
            vehicle_id: "KA01AB1234".to_owned(),
            make: "Maruti".to_owned(),
            model: "Swift".to_owned(),
            fuel_type: "petrol".to_owned(),
            year: Some(2018),
            vin: Some("VIN123".to_owned()),
            plate_number: "KA01AB1234".to_owned(),
        }];
        let incoming = vec![CustomerVehicle {
            vehicle_id: String::new(),
            make: "Maruti".to_owned(),
            model: "Swift ZXi".to_owned(),
            fuel_type: "petrol".to_owned(),
            year: None,
            vin: None,
            plate_number: "KA01AB1234".to_owned(),
        }];
        merge_vehicles(&mut existing, &incoming);
        assert_eq!(existing.len(), 1);
        assert_eq!(existing[0].model, "Swift ZXi");
        assert_eq!(existing[0].year, Some(2018));
        assert_eq!(existing[0].vin.as_deref(), Some("VIN123"));
    }
}
