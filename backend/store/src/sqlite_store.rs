//! Relational backend backed by `SQLite`.
//!
//! Appointments are fully normalized: the two service lanes live in their own
//! tables and required items hang off services, so appointment reads
//! reassemble the nested document with left joins the same way the handlers
//! expect it. Procurement numbers reach appointment reads through the
//! `procurement_services` link table; this enrichment exists only on this
//! backend.
//!
//! Low-churn nested lists (contact blocks, specialties, shipping options,
//! orders, estimate items, profiles) are stored as JSON text columns rather
//! than satellite tables.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::StoreError;
use crate::ids::{format_id, NumberRange};
use crate::model::{
    Appointment, AppointmentPatch, ApprovalStatus, Customer, CustomerPatch, CustomerVehicle,
    InventoryItem, InventoryPatch, Invoice, JobCard, JobCardStatus, Mechanic, MechanicPatch,
    Procurement, ProcurementPatch, Progress, RequiredItem, ServiceEntry, ServiceLane,
    ServiceUpsert, Supplier, SupplierPatch, User, VehicleRecord,
};
use crate::{Store, StoreResult};

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &str) -> StoreResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock only means another thread panicked mid-query; the
        // connection itself is still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Guarded mint: bound check, increment and read-back are one statement,
    /// so concurrent mints can neither collide nor overrun the range.
    fn mint(&self, prefix: &str) -> StoreResult<String> {
        let conn = self.conn();
        let number: Option<i64> = conn
            .query_row(
                "UPDATE number_ranges SET running_number = running_number + 1 \
                 WHERE prefix = ?1 AND running_number < range_end \
                 RETURNING running_number",
                params![prefix],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(number) = number {
            return Ok(format_id(prefix, number as u64));
        }
        let known: Option<i64> = conn
            .query_row(
                "SELECT running_number FROM number_ranges WHERE prefix = ?1",
                params![prefix],
                |row| row.get(0),
            )
            .optional()?;
        Err(match known {
            Some(_) => {
                warn!("number range for {prefix} is exhausted");
                StoreError::RangeExhausted(prefix.to_owned())
            }
            None => StoreError::RangeMissing(prefix.to_owned()),
        })
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS number_ranges (
            prefix TEXT PRIMARY KEY,
            id_type TEXT NOT NULL,
            range_start INTEGER NOT NULL,
            range_end INTEGER NOT NULL,
            running_number INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS customers (
            customer_id TEXT PRIMARY KEY,
            customer_name TEXT NOT NULL,
            gst_number TEXT,
            contact TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS customer_vehicles (
            customer_id TEXT NOT NULL,
            vehicle_id TEXT NOT NULL,
            make TEXT NOT NULL,
            model TEXT NOT NULL,
            fuel_type TEXT NOT NULL,
            year INTEGER,
            vin TEXT,
            plate_number TEXT NOT NULL,
            PRIMARY KEY (customer_id, plate_number)
        );
        CREATE TABLE IF NOT EXISTS vehicles (
            vehicle_id TEXT PRIMARY KEY,
            customer_id TEXT NOT NULL,
            plate_number TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS appointments (
            appointment_id TEXT PRIMARY KEY,
            customer_id TEXT NOT NULL,
            vehicle_id TEXT NOT NULL,
            mechanic_id TEXT,
            km INTEGER,
            appointment_date TEXT,
            appointment_time TEXT,
            status TEXT NOT NULL,
            telecaller TEXT NOT NULL,
            notes TEXT
        );
        CREATE TABLE IF NOT EXISTS services_estimate (
            service_id TEXT PRIMARY KEY,
            appointment_id TEXT NOT NULL,
            service_description TEXT NOT NULL,
            price REAL NOT NULL,
            status TEXT NOT NULL,
            service_type TEXT NOT NULL,
            service_status TEXT
        );
        CREATE TABLE IF NOT EXISTS services_actual (
            service_id TEXT PRIMARY KEY,
            appointment_id TEXT NOT NULL,
            service_description TEXT NOT NULL,
            price REAL NOT NULL,
            status TEXT NOT NULL,
            service_type TEXT NOT NULL,
            service_status TEXT
        );
        CREATE TABLE IF NOT EXISTS items_required (
            service_id TEXT NOT NULL,
            item_id TEXT NOT NULL,
            item_name TEXT NOT NULL,
            qty TEXT,
            tax TEXT,
            discount TEXT,
            PRIMARY KEY (service_id, item_id)
        );
        CREATE INDEX IF NOT EXISTS idx_services_estimate_appointment
            ON services_estimate (appointment_id);
        CREATE INDEX IF NOT EXISTS idx_services_actual_appointment
            ON services_actual (appointment_id);
        CREATE TABLE IF NOT EXISTS procurements (
            procurement_id TEXT PRIMARY KEY,
            appointment_id TEXT NOT NULL,
            customer_id TEXT NOT NULL,
            vehicle_id TEXT NOT NULL,
            mechanic_id TEXT NOT NULL,
            services TEXT NOT NULL,
            appointment_date TEXT NOT NULL,
            appointment_time TEXT NOT NULL,
            status TEXT NOT NULL,
            telecaller TEXT NOT NULL,
            notes TEXT
        );
        CREATE TABLE IF NOT EXISTS procurement_services (
            appointment_id TEXT NOT NULL,
            service_id TEXT NOT NULL,
            pr_no TEXT NOT NULL,
            PRIMARY KEY (appointment_id, service_id)
        );
        CREATE TABLE IF NOT EXISTS job_cards (
            job_card_id TEXT PRIMARY KEY,
            vehicle_id TEXT NOT NULL,
            customer_id TEXT NOT NULL,
            estimate_items TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS inventory (
            inventory_id TEXT PRIMARY KEY,
            part_name TEXT NOT NULL,
            part_number TEXT NOT NULL,
            description TEXT NOT NULL,
            category TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            price REAL NOT NULL,
            orders TEXT NOT NULL,
            suppliers TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS mechanics (
            mechanic_id TEXT PRIMARY KEY,
            mechanic_name TEXT NOT NULL,
            contact TEXT NOT NULL,
            specialties TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS suppliers (
            supplier_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            contact TEXT NOT NULL,
            payment_terms TEXT,
            shipping_options TEXT NOT NULL,
            products TEXT NOT NULL,
            notes TEXT
        );
        CREATE TABLE IF NOT EXISTS invoices (
            invoice_id TEXT PRIMARY KEY,
            appointment_id TEXT NOT NULL,
            customer_id TEXT NOT NULL,
            total_amount REAL NOT NULL,
            payment_status TEXT NOT NULL,
            payment_date TEXT
        );
        CREATE TABLE IF NOT EXISTS users (
            user_id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            profile TEXT NOT NULL
        );",
    )
}

// --- column codecs ---

/// Enum -> its bare wire string (serde rename is the single source of truth).
fn wire_text<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

fn from_wire<T: DeserializeOwned>(text: &str) -> StoreResult<T> {
    Ok(serde_json::from_value(serde_json::Value::String(
        text.to_owned(),
    ))?)
}

fn json_text<T: Serialize>(value: &T) -> StoreResult<String> {
    Ok(serde_json::to_string(value)?)
}

fn from_json<T: DeserializeOwned>(text: &str) -> StoreResult<T> {
    Ok(serde_json::from_str(text)?)
}

fn dt_text(value: &DateTime<Utc>) -> String {
    value.to_rfc3339()
}

fn parse_dt(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn is_constraint(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// --- row shapes ---

struct AppointmentRow {
    appointment_id: String,
    customer_id: String,
    vehicle_id: String,
    mechanic_id: Option<String>,
    km: Option<u32>,
    appointment_date: Option<String>,
    appointment_time: Option<String>,
    status: String,
    telecaller: String,
    notes: Option<String>,
}

const APPOINTMENT_COLUMNS: &str = "appointment_id, customer_id, vehicle_id, mechanic_id, km, \
     appointment_date, appointment_time, status, telecaller, notes";

fn appointment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        appointment_id: row.get(0)?,
        customer_id: row.get(1)?,
        vehicle_id: row.get(2)?,
        mechanic_id: row.get(3)?,
        km: row.get(4)?,
        appointment_date: row.get(5)?,
        appointment_time: row.get(6)?,
        status: row.get(7)?,
        telecaller: row.get(8)?,
        notes: row.get(9)?,
    })
}

impl AppointmentRow {
    fn into_appointment(self) -> StoreResult<Appointment> {
        Ok(Appointment {
            appointment_id: self.appointment_id,
            customer_id: self.customer_id,
            vehicle_id: self.vehicle_id,
            mechanic_id: self.mechanic_id,
            km: self.km,
            services_estimate: Vec::new(),
            services_actual: Vec::new(),
            appointment_date: self.appointment_date.as_deref().and_then(parse_dt),
            appointment_time: self.appointment_time,
            status: from_wire(&self.status)?,
            telecaller: self.telecaller,
            notes: self.notes,
        })
    }
}

struct ServiceRow {
    service_id: String,
    service_description: String,
    price: f64,
    status: String,
    service_type: String,
    service_status: Option<String>,
    item_id: Option<String>,
    item_name: Option<String>,
    qty: Option<String>,
    tax: Option<String>,
    discount: Option<String>,
    pr_no: Option<String>,
}

/// One lane of an appointment, reassembled from the service/item left join
/// (plus the procurement link for the actual lane).
fn load_lane(
    conn: &Connection,
    appointment_id: &str,
    lane: ServiceLane,
) -> StoreResult<Vec<ServiceEntry>> {
    let pr_select = match lane {
        ServiceLane::Actual => {
            ", p.pr_no FROM services_actual s \
             LEFT JOIN items_required i ON i.service_id = s.service_id \
             LEFT JOIN procurement_services p ON p.service_id = s.service_id \
                 AND p.appointment_id = s.appointment_id"
        }
        ServiceLane::Estimate => {
            ", NULL FROM services_estimate s \
             LEFT JOIN items_required i ON i.service_id = s.service_id"
        }
    };
    let sql = format!(
        "SELECT s.service_id, s.service_description, s.price, s.status, s.service_type, \
                s.service_status, i.item_id, i.item_name, i.qty, i.tax, i.discount{pr_select} \
         WHERE s.appointment_id = ?1 ORDER BY s.service_id, i.item_id"
    );

    let mut statement = conn.prepare(&sql)?;
    let rows = statement.query_map(params![appointment_id], |row| {
        Ok(ServiceRow {
            service_id: row.get(0)?,
            service_description: row.get(1)?,
            price: row.get(2)?,
            status: row.get(3)?,
            service_type: row.get(4)?,
            service_status: row.get(5)?,
            item_id: row.get(6)?,
            item_name: row.get(7)?,
            qty: row.get(8)?,
            tax: row.get(9)?,
            discount: row.get(10)?,
            pr_no: row.get(11)?,
        })
    })?;

    let mut services: Vec<ServiceEntry> = Vec::new();
    for row in rows {
        let row = row?;
        let position = services.iter().position(|s| s.service_id == row.service_id);
        let service = match position {
            Some(index) => &mut services[index],
            None => {
                services.push(ServiceEntry {
                    service_id: row.service_id.clone(),
                    service_description: row.service_description.clone(),
                    price: row.price,
                    service_type: row.service_type.clone(),
                    status: from_wire::<ApprovalStatus>(&row.status)?,
                    service_status: match &row.service_status {
                        Some(text) => Some(from_wire::<Progress>(text)?),
                        None => None,
                    },
                    pr_no: row.pr_no.clone(),
                    items_required: Vec::new(),
                });
                services.last_mut().expect("just pushed")
            }
        };
        if let Some(item_id) = row.item_id {
            service.items_required.push(RequiredItem {
                item_id,
                item_name: row.item_name.unwrap_or_default(),
                qty: row.qty,
                tax: row.tax,
                discount: row.discount,
            });
        }
    }
    Ok(services)
}

fn load_appointment(conn: &Connection, appointment_id: &str) -> StoreResult<Option<Appointment>> {
    let row = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE appointment_id = ?1"),
            params![appointment_id],
            appointment_row,
        )
        .optional()?;
    let Some(row) = row else {
        return Ok(None);
    };
    let mut appointment = row.into_appointment()?;
    appointment.services_estimate = load_lane(conn, &appointment.appointment_id, ServiceLane::Estimate)?;
    appointment.services_actual = load_lane(conn, &appointment.appointment_id, ServiceLane::Actual)?;
    Ok(Some(appointment))
}

fn upsert_item(conn: &Connection, service_id: &str, item: &RequiredItem) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO items_required (service_id, item_id, item_name, qty, tax, discount) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
         ON CONFLICT (service_id, item_id) DO UPDATE SET \
             item_name = excluded.item_name, qty = excluded.qty, tax = excluded.tax, \
             discount = excluded.discount",
        params![
            service_id,
            item.item_id,
            item.item_name,
            item.qty,
            item.tax,
            item.discount
        ],
    )?;
    Ok(())
}

fn insert_customer_vehicle(
    conn: &Connection,
    customer_id: &str,
    vehicle: &CustomerVehicle,
) -> rusqlite::Result<()> {
    // Absent year/vin keep whatever the row already had.
    conn.execute(
        "INSERT INTO customer_vehicles \
             (customer_id, vehicle_id, make, model, fuel_type, year, vin, plate_number) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
         ON CONFLICT (customer_id, plate_number) DO UPDATE SET \
             make = excluded.make, model = excluded.model, fuel_type = excluded.fuel_type, \
             year = COALESCE(excluded.year, customer_vehicles.year), \
             vin = COALESCE(excluded.vin, customer_vehicles.vin)",
        params![
            customer_id,
            vehicle.plate_number,
            vehicle.make,
            vehicle.model,
            vehicle.fuel_type,
            vehicle.year,
            vehicle.vin,
            vehicle.plate_number
        ],
    )?;
    conn.execute(
        "INSERT INTO vehicles (vehicle_id, customer_id, plate_number) VALUES (?1, ?2, ?3) \
         ON CONFLICT (vehicle_id) DO UPDATE SET \
             customer_id = excluded.customer_id, plate_number = excluded.plate_number",
        params![vehicle.plate_number, customer_id, vehicle.plate_number],
    )?;
    Ok(())
}

fn load_customer(conn: &Connection, customer_id: &str) -> StoreResult<Option<Customer>> {
    let base = conn
        .query_row(
            "SELECT customer_id, customer_name, gst_number, contact FROM customers \
             WHERE customer_id = ?1",
            params![customer_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;
    let Some((customer_id, customer_name, gst_number, contact)) = base else {
        return Ok(None);
    };

    let mut statement = conn.prepare(
        "SELECT vehicle_id, make, model, fuel_type, year, vin, plate_number \
         FROM customer_vehicles WHERE customer_id = ?1 ORDER BY plate_number",
    )?;
    let vehicles = statement
        .query_map(params![customer_id], |row| {
            Ok(CustomerVehicle {
                vehicle_id: row.get(0)?,
                make: row.get(1)?,
                model: row.get(2)?,
                fuel_type: row.get(3)?,
                year: row.get(4)?,
                vin: row.get(5)?,
                plate_number: row.get(6)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Some(Customer {
        customer_id,
        customer_name,
        gst_number,
        contact: from_json(&contact)?,
        vehicles,
    }))
}

/// Run a dynamic partial UPDATE; no-op when the patch is empty.
fn apply_patch(
    conn: &Connection,
    table: &str,
    key_column: &str,
    key: &str,
    sets: Vec<&'static str>,
    mut values: Vec<Value>,
) -> StoreResult<()> {
    if sets.is_empty() {
        return Ok(());
    }
    values.push(Value::Text(key.to_owned()));
    let sql = format!(
        "UPDATE {table} SET {} WHERE {key_column} = ?",
        sets.join(", ")
    );
    conn.execute(&sql, params_from_iter(values))?;
    Ok(())
}

#[async_trait]
impl Store for SqliteStore {
    async fn allocate_id(&self, prefix: &str) -> StoreResult<String> {
        self.mint(prefix)
    }

    async fn seed_ranges(&self, ranges: &[NumberRange]) -> StoreResult<()> {
        let conn = self.conn();
        for range in ranges {
            conn.execute(
                "INSERT OR IGNORE INTO number_ranges \
                     (prefix, id_type, range_start, range_end, running_number) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    range.prefix,
                    range.id_type,
                    range.range_start as i64,
                    range.range_end as i64,
                    range.running_number as i64
                ],
            )?;
        }
        Ok(())
    }

    async fn insert_customer(&self, customer: &Customer) -> StoreResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO customers (customer_id, customer_name, gst_number, contact) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                customer.customer_id,
                customer.customer_name,
                customer.gst_number,
                json_text(&customer.contact)?
            ],
        )?;
        for vehicle in &customer.vehicles {
            insert_customer_vehicle(&tx, &customer.customer_id, vehicle)?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn list_customers(&self) -> StoreResult<Vec<Customer>> {
        let conn = self.conn();
        let ids = {
            let mut statement =
                conn.prepare("SELECT customer_id FROM customers ORDER BY customer_id")?;
            let ids = statement
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            ids
        };
        let mut customers = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(customer) = load_customer(&conn, &id)? {
                customers.push(customer);
            }
        }
        Ok(customers)
    }

    async fn get_customer(&self, customer_id: &str) -> StoreResult<Option<Customer>> {
        load_customer(&self.conn(), customer_id)
    }

    async fn update_customer(
        &self,
        customer_id: &str,
        patch: &CustomerPatch,
    ) -> StoreResult<Option<Customer>> {
        {
            let mut conn = self.conn();
            let tx = conn.transaction()?;
            let mut sets = Vec::new();
            let mut values = Vec::new();
            if let Some(name) = &patch.customer_name {
                sets.push("customer_name = ?");
                values.push(Value::Text(name.clone()));
            }
            if let Some(gst) = &patch.gst_number {
                sets.push("gst_number = ?");
                values.push(Value::Text(gst.clone()));
            }
            if let Some(contact) = &patch.contact {
                sets.push("contact = ?");
                values.push(Value::Text(json_text(contact)?));
            }
            apply_patch(&tx, "customers", "customer_id", customer_id, sets, values)?;
            if let Some(vehicles) = &patch.vehicles {
                tx.execute(
                    "DELETE FROM customer_vehicles WHERE customer_id = ?1",
                    params![customer_id],
                )?;
                for vehicle in vehicles {
                    insert_customer_vehicle(&tx, customer_id, vehicle)?;
                }
            }
            tx.commit()?;
        }
        self.get_customer(customer_id).await
    }

    async fn upsert_customer_vehicles(
        &self,
        customer_id: &str,
        vehicles: &[CustomerVehicle],
    ) -> StoreResult<Option<Customer>> {
        {
            let mut conn = self.conn();
            let exists: Option<String> = conn
                .query_row(
                    "SELECT customer_id FROM customers WHERE customer_id = ?1",
                    params![customer_id],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_none() {
                return Ok(None);
            }
            let tx = conn.transaction()?;
            for vehicle in vehicles {
                insert_customer_vehicle(&tx, customer_id, vehicle)?;
            }
            tx.commit()?;
        }
        self.get_customer(customer_id).await
    }

    async fn delete_customer(&self, customer_id: &str) -> StoreResult<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM customer_vehicles WHERE customer_id = ?1",
            params![customer_id],
        )?;
        let deleted = tx.execute(
            "DELETE FROM customers WHERE customer_id = ?1",
            params![customer_id],
        )?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    async fn register_vehicle(&self, vehicle: &VehicleRecord) -> StoreResult<()> {
        self.conn().execute(
            "INSERT INTO vehicles (vehicle_id, customer_id, plate_number) VALUES (?1, ?2, ?3) \
             ON CONFLICT (vehicle_id) DO UPDATE SET \
                 customer_id = excluded.customer_id, plate_number = excluded.plate_number",
            params![vehicle.vehicle_id, vehicle.customer_id, vehicle.plate_number],
        )?;
        Ok(())
    }

    async fn list_vehicles(&self) -> StoreResult<Vec<VehicleRecord>> {
        let conn = self.conn();
        let mut statement = conn.prepare(
            "SELECT vehicle_id, customer_id, plate_number FROM vehicles ORDER BY vehicle_id",
        )?;
        let vehicles = statement
            .query_map([], |row| {
                Ok(VehicleRecord {
                    vehicle_id: row.get(0)?,
                    customer_id: row.get(1)?,
                    plate_number: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(vehicles)
    }

    async fn get_vehicle(&self, vehicle_id: &str) -> StoreResult<Option<VehicleRecord>> {
        let record = self
            .conn()
            .query_row(
                "SELECT vehicle_id, customer_id, plate_number FROM vehicles \
                 WHERE vehicle_id = ?1",
                params![vehicle_id],
                |row| {
                    Ok(VehicleRecord {
                        vehicle_id: row.get(0)?,
                        customer_id: row.get(1)?,
                        plate_number: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    async fn vehicles_for_customer(&self, customer_id: &str) -> StoreResult<Vec<VehicleRecord>> {
        let conn = self.conn();
        let mut statement = conn.prepare(
            "SELECT vehicle_id, customer_id, plate_number FROM vehicles \
             WHERE customer_id = ?1 ORDER BY vehicle_id",
        )?;
        let vehicles = statement
            .query_map(params![customer_id], |row| {
                Ok(VehicleRecord {
                    vehicle_id: row.get(0)?,
                    customer_id: row.get(1)?,
                    plate_number: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(vehicles)
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> StoreResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO appointments (appointment_id, customer_id, vehicle_id, mechanic_id, \
                 km, appointment_date, appointment_time, status, telecaller, notes) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                appointment.appointment_id,
                appointment.customer_id,
                appointment.vehicle_id,
                appointment.mechanic_id,
                appointment.km,
                appointment.appointment_date.as_ref().map(dt_text),
                appointment.appointment_time,
                wire_text(&appointment.status),
                appointment.telecaller,
                appointment.notes
            ],
        )?;
        for (lane, services) in [
            (ServiceLane::Estimate, &appointment.services_estimate),
            (ServiceLane::Actual, &appointment.services_actual),
        ] {
            for service in services {
                insert_service(&tx, &appointment.appointment_id, lane, service)?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    async fn open_appointment_for_vehicle(
        &self,
        vehicle_id: &str,
    ) -> StoreResult<Option<Appointment>> {
        let conn = self.conn();
        let row = conn
            .query_row(
                &format!(
                    "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
                     WHERE vehicle_id = ?1 AND status != 'completed' \
                     ORDER BY appointment_id LIMIT 1"
                ),
                params![vehicle_id],
                appointment_row,
            )
            .optional()?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut appointment = row.into_appointment()?;
        appointment.services_estimate =
            load_lane(&conn, &appointment.appointment_id, ServiceLane::Estimate)?;
        appointment.services_actual =
            load_lane(&conn, &appointment.appointment_id, ServiceLane::Actual)?;
        Ok(Some(appointment))
    }

    async fn list_appointments(&self) -> StoreResult<Vec<Appointment>> {
        let conn = self.conn();
        let rows = {
            let mut statement = conn.prepare(&format!(
                "SELECT {APPOINTMENT_COLUMNS} FROM appointments ORDER BY appointment_id"
            ))?;
            let rows = statement.query_map([], appointment_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        let mut appointments = Vec::with_capacity(rows.len());
        for row in rows {
            let mut appointment = row.into_appointment()?;
            appointment.services_estimate =
                load_lane(&conn, &appointment.appointment_id, ServiceLane::Estimate)?;
            appointment.services_actual =
                load_lane(&conn, &appointment.appointment_id, ServiceLane::Actual)?;
            appointments.push(appointment);
        }
        Ok(appointments)
    }

    async fn get_appointment(&self, appointment_id: &str) -> StoreResult<Option<Appointment>> {
        load_appointment(&self.conn(), appointment_id)
    }

    async fn update_appointment(
        &self,
        appointment_id: &str,
        patch: &AppointmentPatch,
    ) -> StoreResult<Option<Appointment>> {
        {
            let conn = self.conn();
            let mut sets = Vec::new();
            let mut values = Vec::new();
            if let Some(mechanic_id) = &patch.mechanic_id {
                sets.push("mechanic_id = ?");
                values.push(Value::Text(mechanic_id.clone()));
            }
            if let Some(km) = patch.km {
                sets.push("km = ?");
                values.push(Value::Integer(i64::from(km)));
            }
            if let Some(date) = &patch.appointment_date {
                sets.push("appointment_date = ?");
                values.push(Value::Text(dt_text(date)));
            }
            if let Some(time) = &patch.appointment_time {
                sets.push("appointment_time = ?");
                values.push(Value::Text(time.clone()));
            }
            if let Some(status) = &patch.status {
                sets.push("status = ?");
                values.push(Value::Text(wire_text(status)));
            }
            if let Some(telecaller) = &patch.telecaller {
                sets.push("telecaller = ?");
                values.push(Value::Text(telecaller.clone()));
            }
            if let Some(notes) = &patch.notes {
                sets.push("notes = ?");
                values.push(Value::Text(notes.clone()));
            }
            apply_patch(
                &conn,
                "appointments",
                "appointment_id",
                appointment_id,
                sets,
                values,
            )?;
        }
        self.get_appointment(appointment_id).await
    }

    async fn delete_appointment(&self, appointment_id: &str) -> StoreResult<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        for table in ["services_estimate", "services_actual"] {
            tx.execute(
                &format!(
                    "DELETE FROM items_required WHERE service_id IN \
                     (SELECT service_id FROM {table} WHERE appointment_id = ?1)"
                ),
                params![appointment_id],
            )?;
            tx.execute(
                &format!("DELETE FROM {table} WHERE appointment_id = ?1"),
                params![appointment_id],
            )?;
        }
        tx.execute(
            "DELETE FROM procurement_services WHERE appointment_id = ?1",
            params![appointment_id],
        )?;
        let deleted = tx.execute(
            "DELETE FROM appointments WHERE appointment_id = ?1",
            params![appointment_id],
        )?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    async fn upsert_services(
        &self,
        appointment_id: &str,
        lane: ServiceLane,
        services: Vec<ServiceUpsert>,
    ) -> StoreResult<Option<Appointment>> {
        // Mint outside the transaction: the allocator takes the connection
        // lock itself.
        let mut prepared = Vec::with_capacity(services.len());
        for service in services {
            let service_id = match &service.service_id {
                Some(id) if !id.is_empty() => id.clone(),
                _ => self.mint("SER")?,
            };
            prepared.push((service_id, service));
        }

        {
            let mut conn = self.conn();
            let exists: Option<String> = conn
                .query_row(
                    "SELECT appointment_id FROM appointments WHERE appointment_id = ?1",
                    params![appointment_id],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_none() {
                return Ok(None);
            }
            let tx = conn.transaction()?;
            for (service_id, service) in &prepared {
                tx.execute(
                    &format!(
                        "INSERT INTO {} (service_id, appointment_id, service_description, \
                             price, status, service_type, service_status) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
                         ON CONFLICT (service_id) DO UPDATE SET \
                             service_description = excluded.service_description, \
                             price = excluded.price, status = excluded.status, \
                             service_type = excluded.service_type, \
                             service_status = excluded.service_status",
                        lane.table()
                    ),
                    params![
                        service_id,
                        appointment_id,
                        service.service_description,
                        service.price,
                        wire_text(&service.status.unwrap_or(ApprovalStatus::Pending)),
                        service.service_type,
                        service.service_status.as_ref().map(wire_text),
                    ],
                )?;
                for item in &service.items_required {
                    upsert_item(&tx, service_id, item)?;
                }
            }
            tx.commit()?;
        }
        self.get_appointment(appointment_id).await
    }

    async fn assign_mechanic(
        &self,
        appointment_id: &str,
        mechanic_id: &str,
    ) -> StoreResult<Option<Appointment>> {
        let updated = self.conn().execute(
            "UPDATE appointments SET mechanic_id = ?1 WHERE appointment_id = ?2",
            params![mechanic_id, appointment_id],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        self.get_appointment(appointment_id).await
    }

    async fn update_km(&self, appointment_id: &str, km: u32) -> StoreResult<Option<Appointment>> {
        let updated = self.conn().execute(
            "UPDATE appointments SET km = ?1 WHERE appointment_id = ?2",
            params![km, appointment_id],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        self.get_appointment(appointment_id).await
    }

    async fn services_actual(
        &self,
        appointment_id: &str,
    ) -> StoreResult<Option<Vec<ServiceEntry>>> {
        let conn = self.conn();
        let exists: Option<String> = conn
            .query_row(
                "SELECT appointment_id FROM appointments WHERE appointment_id = ?1",
                params![appointment_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Ok(None);
        }
        Ok(Some(load_lane(&conn, appointment_id, ServiceLane::Actual)?))
    }

    async fn update_service_status(
        &self,
        appointment_id: &str,
        service_id: &str,
        progress: Progress,
    ) -> StoreResult<Option<Appointment>> {
        let updated = self.conn().execute(
            "UPDATE services_actual SET service_status = ?1 \
             WHERE appointment_id = ?2 AND service_id = ?3",
            params![wire_text(&progress), appointment_id, service_id],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        self.get_appointment(appointment_id).await
    }

    async fn insert_job_card(&self, card: &JobCard) -> StoreResult<()> {
        self.conn().execute(
            "INSERT INTO job_cards (job_card_id, vehicle_id, customer_id, estimate_items, \
                 status, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                card.job_card_id,
                card.vehicle_id,
                card.customer_id,
                json_text(&card.estimate_items)?,
                wire_text(&card.status),
                dt_text(&card.created_at)
            ],
        )?;
        Ok(())
    }

    async fn list_job_cards(&self) -> StoreResult<Vec<JobCard>> {
        let conn = self.conn();
        let rows = {
            let mut statement = conn.prepare(
                "SELECT job_card_id, vehicle_id, customer_id, estimate_items, status, created_at \
                 FROM job_cards ORDER BY job_card_id",
            )?;
            let rows = statement.query_map([], job_card_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        rows.into_iter().map(raw_job_card).collect()
    }

    async fn get_job_card(&self, job_card_id: &str) -> StoreResult<Option<JobCard>> {
        let row = self
            .conn()
            .query_row(
                "SELECT job_card_id, vehicle_id, customer_id, estimate_items, status, created_at \
                 FROM job_cards WHERE job_card_id = ?1",
                params![job_card_id],
                job_card_row,
            )
            .optional()?;
        row.map(raw_job_card).transpose()
    }

    async fn set_job_card_status(
        &self,
        job_card_id: &str,
        status: JobCardStatus,
    ) -> StoreResult<Option<JobCard>> {
        let updated = self.conn().execute(
            "UPDATE job_cards SET status = ?1 WHERE job_card_id = ?2",
            params![wire_text(&status), job_card_id],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        self.get_job_card(job_card_id).await
    }

    async fn insert_inventory_item(&self, item: &InventoryItem) -> StoreResult<()> {
        self.conn().execute(
            "INSERT INTO inventory (inventory_id, part_name, part_number, description, \
                 category, quantity, price, orders, suppliers) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                item.inventory_id,
                item.part_name,
                item.part_number,
                item.description,
                wire_text(&item.category),
                item.quantity,
                item.price,
                json_text(&item.orders)?,
                json_text(&item.suppliers)?
            ],
        )?;
        Ok(())
    }

    async fn list_inventory(&self) -> StoreResult<Vec<InventoryItem>> {
        let conn = self.conn();
        let rows = {
            let mut statement = conn.prepare(
                "SELECT inventory_id, part_name, part_number, description, category, quantity, \
                     price, orders, suppliers \
                 FROM inventory ORDER BY inventory_id",
            )?;
            let rows = statement.query_map([], inventory_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        rows.into_iter().map(raw_inventory_item).collect()
    }

    async fn get_inventory_item(&self, inventory_id: &str) -> StoreResult<Option<InventoryItem>> {
        let row = self
            .conn()
            .query_row(
                "SELECT inventory_id, part_name, part_number, description, category, quantity, \
                     price, orders, suppliers \
                 FROM inventory WHERE inventory_id = ?1",
                params![inventory_id],
                inventory_row,
            )
            .optional()?;
        row.map(raw_inventory_item).transpose()
    }

    async fn update_inventory_item(
        &self,
        inventory_id: &str,
        patch: &InventoryPatch,
    ) -> StoreResult<Option<InventoryItem>> {
        {
            let conn = self.conn();
            let mut sets = Vec::new();
            let mut values = Vec::new();
            if let Some(part_name) = &patch.part_name {
                sets.push("part_name = ?");
                values.push(Value::Text(part_name.clone()));
            }
            if let Some(part_number) = &patch.part_number {
                sets.push("part_number = ?");
                values.push(Value::Text(part_number.clone()));
            }
            if let Some(description) = &patch.description {
                sets.push("description = ?");
                values.push(Value::Text(description.clone()));
            }
            if let Some(category) = &patch.category {
                sets.push("category = ?");
                values.push(Value::Text(wire_text(category)));
            }
            if let Some(quantity) = patch.quantity {
                sets.push("quantity = ?");
                values.push(Value::Integer(quantity));
            }
            if let Some(price) = patch.price {
                sets.push("price = ?");
                values.push(Value::Real(price));
            }
            if let Some(orders) = &patch.orders {
                sets.push("orders = ?");
                values.push(Value::Text(json_text(orders)?));
            }
            if let Some(suppliers) = &patch.suppliers {
                sets.push("suppliers = ?");
                values.push(Value::Text(json_text(suppliers)?));
            }
            apply_patch(&conn, "inventory", "inventory_id", inventory_id, sets, values)?;
        }
        self.get_inventory_item(inventory_id).await
    }

    async fn delete_inventory_item(&self, inventory_id: &str) -> StoreResult<bool> {
        let deleted = self.conn().execute(
            "DELETE FROM inventory WHERE inventory_id = ?1",
            params![inventory_id],
        )?;
        Ok(deleted > 0)
    }

    async fn insert_procurement(&self, procurement: &Procurement) -> StoreResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO procurements (procurement_id, appointment_id, customer_id, \
                 vehicle_id, mechanic_id, services, appointment_date, appointment_time, \
                 status, telecaller, notes) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                procurement.procurement_id,
                procurement.appointment_id,
                procurement.customer_id,
                procurement.vehicle_id,
                procurement.mechanic_id,
                json_text(&procurement.services)?,
                dt_text(&procurement.appointment_date),
                procurement.appointment_time,
                wire_text(&procurement.status),
                procurement.telecaller,
                procurement.notes
            ],
        )?;
        for service in &procurement.services {
            tx.execute(
                "INSERT INTO procurement_services (appointment_id, service_id, pr_no) \
                 VALUES (?1, ?2, ?3) \
                 ON CONFLICT (appointment_id, service_id) DO UPDATE SET pr_no = excluded.pr_no",
                params![
                    procurement.appointment_id,
                    service.service_id,
                    procurement.procurement_id
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn list_procurements(&self) -> StoreResult<Vec<Procurement>> {
        let conn = self.conn();
        let rows = {
            let mut statement = conn.prepare(&format!(
                "SELECT {PROCUREMENT_COLUMNS} FROM procurements ORDER BY procurement_id"
            ))?;
            let rows = statement.query_map([], procurement_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        rows.into_iter().map(raw_procurement).collect()
    }

    async fn get_procurement(&self, procurement_id: &str) -> StoreResult<Option<Procurement>> {
        let row = self
            .conn()
            .query_row(
                &format!(
                    "SELECT {PROCUREMENT_COLUMNS} FROM procurements WHERE procurement_id = ?1"
                ),
                params![procurement_id],
                procurement_row,
            )
            .optional()?;
        row.map(raw_procurement).transpose()
    }

    async fn update_procurement(
        &self,
        procurement_id: &str,
        patch: &ProcurementPatch,
    ) -> StoreResult<Option<Procurement>> {
        {
            let mut conn = self.conn();
            let tx = conn.transaction()?;
            let mut sets = Vec::new();
            let mut values = Vec::new();
            if let Some(mechanic_id) = &patch.mechanic_id {
                sets.push("mechanic_id = ?");
                values.push(Value::Text(mechanic_id.clone()));
            }
            if let Some(services) = &patch.services {
                sets.push("services = ?");
                values.push(Value::Text(json_text(services)?));
            }
            if let Some(date) = &patch.appointment_date {
                sets.push("appointment_date = ?");
                values.push(Value::Text(dt_text(date)));
            }
            if let Some(time) = &patch.appointment_time {
                sets.push("appointment_time = ?");
                values.push(Value::Text(time.clone()));
            }
            if let Some(status) = &patch.status {
                sets.push("status = ?");
                values.push(Value::Text(wire_text(status)));
            }
            if let Some(telecaller) = &patch.telecaller {
                sets.push("telecaller = ?");
                values.push(Value::Text(telecaller.clone()));
            }
            if let Some(notes) = &patch.notes {
                sets.push("notes = ?");
                values.push(Value::Text(notes.clone()));
            }
            apply_patch(
                &tx,
                "procurements",
                "procurement_id",
                procurement_id,
                sets,
                values,
            )?;
            if let Some(services) = &patch.services {
                let appointment_id: Option<String> = tx
                    .query_row(
                        "SELECT appointment_id FROM procurements WHERE procurement_id = ?1",
                        params![procurement_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                if let Some(appointment_id) = appointment_id {
                    tx.execute(
                        "DELETE FROM procurement_services WHERE pr_no = ?1",
                        params![procurement_id],
                    )?;
                    for service in services {
                        tx.execute(
                            "INSERT INTO procurement_services (appointment_id, service_id, pr_no) \
                             VALUES (?1, ?2, ?3) \
                             ON CONFLICT (appointment_id, service_id) DO UPDATE SET \
                                 pr_no = excluded.pr_no",
                            params![appointment_id, service.service_id, procurement_id],
                        )?;
                    }
                }
            }
            tx.commit()?;
        }
        self.get_procurement(procurement_id).await
    }

    async fn delete_procurement(&self, procurement_id: &str) -> StoreResult<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM procurement_services WHERE pr_no = ?1",
            params![procurement_id],
        )?;
        let deleted = tx.execute(
            "DELETE FROM procurements WHERE procurement_id = ?1",
            params![procurement_id],
        )?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    async fn insert_mechanic(&self, mechanic: &Mechanic) -> StoreResult<()> {
        let result = self.conn().execute(
            "INSERT INTO mechanics (mechanic_id, mechanic_name, contact, specialties) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                mechanic.mechanic_id,
                mechanic.mechanic_name,
                json_text(&mechanic.contact)?,
                json_text(&mechanic.specialties)?
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(err) if is_constraint(&err) => {
                Err(StoreError::Duplicate(mechanic.mechanic_id.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn list_mechanics(&self) -> StoreResult<Vec<Mechanic>> {
        let conn = self.conn();
        let rows = {
            let mut statement = conn.prepare(
                "SELECT mechanic_id, mechanic_name, contact, specialties FROM mechanics \
                 ORDER BY mechanic_id",
            )?;
            let rows = statement.query_map([], mechanic_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        rows.into_iter().map(raw_mechanic).collect()
    }

    async fn get_mechanic(&self, mechanic_id: &str) -> StoreResult<Option<Mechanic>> {
        let row = self
            .conn()
            .query_row(
                "SELECT mechanic_id, mechanic_name, contact, specialties FROM mechanics \
                 WHERE mechanic_id = ?1",
                params![mechanic_id],
                mechanic_row,
            )
            .optional()?;
        row.map(raw_mechanic).transpose()
    }

    async fn update_mechanic(
        &self,
        mechanic_id: &str,
        patch: &MechanicPatch,
    ) -> StoreResult<Option<Mechanic>> {
        {
            let conn = self.conn();
            let mut sets = Vec::new();
            let mut values = Vec::new();
            if let Some(name) = &patch.mechanic_name {
                sets.push("mechanic_name = ?");
                values.push(Value::Text(name.clone()));
            }
            if let Some(contact) = &patch.contact {
                sets.push("contact = ?");
                values.push(Value::Text(json_text(contact)?));
            }
            if let Some(specialties) = &patch.specialties {
                sets.push("specialties = ?");
                values.push(Value::Text(json_text(specialties)?));
            }
            apply_patch(&conn, "mechanics", "mechanic_id", mechanic_id, sets, values)?;
        }
        self.get_mechanic(mechanic_id).await
    }

    async fn delete_mechanic(&self, mechanic_id: &str) -> StoreResult<bool> {
        let deleted = self.conn().execute(
            "DELETE FROM mechanics WHERE mechanic_id = ?1",
            params![mechanic_id],
        )?;
        Ok(deleted > 0)
    }

    async fn insert_supplier(&self, supplier: &Supplier) -> StoreResult<()> {
        self.conn().execute(
            "INSERT INTO suppliers (supplier_id, name, contact, payment_terms, \
                 shipping_options, products, notes) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                supplier.supplier_id,
                supplier.name,
                json_text(&supplier.contact)?,
                supplier.payment_terms,
                json_text(&supplier.shipping_options)?,
                json_text(&supplier.products)?,
                supplier.notes
            ],
        )?;
        Ok(())
    }

    async fn list_suppliers(&self) -> StoreResult<Vec<Supplier>> {
        let conn = self.conn();
        let rows = {
            let mut statement = conn.prepare(
                "SELECT supplier_id, name, contact, payment_terms, shipping_options, products, \
                     notes \
                 FROM suppliers ORDER BY supplier_id",
            )?;
            let rows = statement.query_map([], supplier_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        rows.into_iter().map(raw_supplier).collect()
    }

    async fn get_supplier(&self, supplier_id: &str) -> StoreResult<Option<Supplier>> {
        let row = self
            .conn()
            .query_row(
                "SELECT supplier_id, name, contact, payment_terms, shipping_options, products, \
                     notes \
                 FROM suppliers WHERE supplier_id = ?1",
                params![supplier_id],
                supplier_row,
            )
            .optional()?;
        row.map(raw_supplier).transpose()
    }

    async fn update_supplier(
        &self,
        supplier_id: &str,
        patch: &SupplierPatch,
    ) -> StoreResult<Option<Supplier>> {
        {
            let conn = self.conn();
            let mut sets = Vec::new();
            let mut values = Vec::new();
            if let Some(name) = &patch.name {
                sets.push("name = ?");
                values.push(Value::Text(name.clone()));
            }
            if let Some(contact) = &patch.contact {
                sets.push("contact = ?");
                values.push(Value::Text(json_text(contact)?));
            }
            if let Some(payment_terms) = &patch.payment_terms {
                sets.push("payment_terms = ?");
                values.push(Value::Text(payment_terms.clone()));
            }
            if let Some(shipping_options) = &patch.shipping_options {
                sets.push("shipping_options = ?");
                values.push(Value::Text(json_text(shipping_options)?));
            }
            if let Some(products) = &patch.products {
                sets.push("products = ?");
                values.push(Value::Text(json_text(products)?));
            }
            if let Some(notes) = &patch.notes {
                sets.push("notes = ?");
                values.push(Value::Text(notes.clone()));
            }
            apply_patch(&conn, "suppliers", "supplier_id", supplier_id, sets, values)?;
        }
        self.get_supplier(supplier_id).await
    }

    async fn delete_supplier(&self, supplier_id: &str) -> StoreResult<bool> {
        let deleted = self.conn().execute(
            "DELETE FROM suppliers WHERE supplier_id = ?1",
            params![supplier_id],
        )?;
        Ok(deleted > 0)
    }

    async fn insert_invoice(&self, invoice: &Invoice) -> StoreResult<()> {
        self.conn().execute(
            "INSERT INTO invoices (invoice_id, appointment_id, customer_id, total_amount, \
                 payment_status, payment_date) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                invoice.invoice_id,
                invoice.appointment_id,
                invoice.customer_id,
                invoice.total_amount,
                wire_text(&invoice.payment_status),
                invoice.payment_date.as_ref().map(dt_text)
            ],
        )?;
        Ok(())
    }

    async fn list_invoices(&self) -> StoreResult<Vec<Invoice>> {
        let conn = self.conn();
        let rows = {
            let mut statement = conn.prepare(
                "SELECT invoice_id, appointment_id, customer_id, total_amount, payment_status, \
                     payment_date \
                 FROM invoices ORDER BY invoice_id",
            )?;
            let rows = statement.query_map([], invoice_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        rows.into_iter().map(raw_invoice).collect()
    }

    async fn get_invoice(&self, invoice_id: &str) -> StoreResult<Option<Invoice>> {
        let row = self
            .conn()
            .query_row(
                "SELECT invoice_id, appointment_id, customer_id, total_amount, payment_status, \
                     payment_date \
                 FROM invoices WHERE invoice_id = ?1",
                params![invoice_id],
                invoice_row,
            )
            .optional()?;
        row.map(raw_invoice).transpose()
    }

    async fn mark_invoice_paid(
        &self,
        invoice_id: &str,
        paid_at: DateTime<Utc>,
    ) -> StoreResult<Option<Invoice>> {
        let updated = self.conn().execute(
            "UPDATE invoices SET payment_status = 'paid', payment_date = ?1 \
             WHERE invoice_id = ?2",
            params![dt_text(&paid_at), invoice_id],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        self.get_invoice(invoice_id).await
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let result = self.conn().execute(
            "INSERT INTO users (user_id, username, password_hash, email, role, created_at, \
                 updated_at, profile) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user.user_id,
                user.username,
                user.password_hash,
                user.email,
                wire_text(&user.role),
                dt_text(&user.created_at),
                dt_text(&user.updated_at),
                json_text(&user.profile)?
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(err) if is_constraint(&err) => Err(StoreError::Duplicate(user.username.clone())),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = self
            .conn()
            .query_row(
                "SELECT user_id, username, password_hash, email, role, created_at, updated_at, \
                     profile \
                 FROM users WHERE email = ?1",
                params![email],
                user_row,
            )
            .optional()?;
        row.map(raw_user).transpose()
    }
}

fn insert_service(
    conn: &Connection,
    appointment_id: &str,
    lane: ServiceLane,
    service: &ServiceEntry,
) -> StoreResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO {} (service_id, appointment_id, service_description, price, status, \
                 service_type, service_status) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            lane.table()
        ),
        params![
            service.service_id,
            appointment_id,
            service.service_description,
            service.price,
            wire_text(&service.status),
            service.service_type,
            service.service_status.as_ref().map(wire_text),
        ],
    )?;
    for item in &service.items_required {
        upsert_item(conn, &service.service_id, item)?;
    }
    Ok(())
}

// --- raw row tuples and their decoders ---

type JobCardRaw = (String, String, String, String, String, String);

fn job_card_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<JobCardRaw> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn raw_job_card(raw: JobCardRaw) -> StoreResult<JobCard> {
    let (job_card_id, vehicle_id, customer_id, estimate_items, status, created_at) = raw;
    Ok(JobCard {
        job_card_id,
        vehicle_id,
        customer_id,
        estimate_items: from_json(&estimate_items)?,
        status: from_wire(&status)?,
        created_at: parse_dt(&created_at).unwrap_or_default(),
    })
}

type InventoryRaw = (
    String,
    String,
    String,
    String,
    String,
    i64,
    f64,
    String,
    String,
);

fn inventory_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InventoryRaw> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

fn raw_inventory_item(raw: InventoryRaw) -> StoreResult<InventoryItem> {
    let (inventory_id, part_name, part_number, description, category, quantity, price, orders, suppliers) =
        raw;
    Ok(InventoryItem {
        inventory_id,
        part_name,
        part_number,
        description,
        category: from_wire(&category)?,
        quantity,
        price,
        orders: from_json(&orders)?,
        suppliers: from_json(&suppliers)?,
    })
}

const PROCUREMENT_COLUMNS: &str = "procurement_id, appointment_id, customer_id, vehicle_id, \
     mechanic_id, services, appointment_date, appointment_time, status, telecaller, notes";

type ProcurementRaw = (
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
);

fn procurement_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProcurementRaw> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
    ))
}

fn raw_procurement(raw: ProcurementRaw) -> StoreResult<Procurement> {
    let (
        procurement_id,
        appointment_id,
        customer_id,
        vehicle_id,
        mechanic_id,
        services,
        appointment_date,
        appointment_time,
        status,
        telecaller,
        notes,
    ) = raw;
    Ok(Procurement {
        procurement_id,
        appointment_id,
        customer_id,
        vehicle_id,
        mechanic_id,
        services: from_json(&services)?,
        appointment_date: parse_dt(&appointment_date).unwrap_or_default(),
        appointment_time,
        status: from_wire(&status)?,
        telecaller,
        notes,
    })
}

type MechanicRaw = (String, String, String, String);

fn mechanic_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MechanicRaw> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn raw_mechanic(raw: MechanicRaw) -> StoreResult<Mechanic> {
    let (mechanic_id, mechanic_name, contact, specialties) = raw;
    Ok(Mechanic {
        mechanic_id,
        mechanic_name,
        contact: from_json(&contact)?,
        specialties: from_json(&specialties)?,
    })
}

type SupplierRaw = (
    String,
    String,
    String,
    Option<String>,
    String,
    String,
    Option<String>,
);

fn supplier_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SupplierRaw> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn raw_supplier(raw: SupplierRaw) -> StoreResult<Supplier> {
    let (supplier_id, name, contact, payment_terms, shipping_options, products, notes) = raw;
    Ok(Supplier {
        supplier_id,
        name,
        contact: from_json(&contact)?,
        payment_terms,
        shipping_options: from_json(&shipping_options)?,
        products: from_json(&products)?,
        notes,
    })
}

type InvoiceRaw = (String, String, String, f64, String, Option<String>);

fn invoice_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InvoiceRaw> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn raw_invoice(raw: InvoiceRaw) -> StoreResult<Invoice> {
    let (invoice_id, appointment_id, customer_id, total_amount, payment_status, payment_date) = raw;
    Ok(Invoice {
        invoice_id,
        appointment_id,
        customer_id,
        total_amount,
        payment_status: from_wire(&payment_status)?,
        payment_date: payment_date.as_deref().and_then(parse_dt),
    })
}

type UserRaw = (
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
);

fn user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRaw> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn raw_user(raw: UserRaw) -> StoreResult<User> {
    let (user_id, username, password_hash, email, role, created_at, updated_at, profile) = raw;
    Ok(User {
        user_id,
        username,
        password_hash,
        email,
        role: from_wire(&role)?,
        created_at: parse_dt(&created_at).unwrap_or_default(),
        updated_at: parse_dt(&updated_at).unwrap_or_default(),
        profile: from_json(&profile)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_init_is_idempotent() {
        let conn = Connection::open_in_memory().expect("open");
        init_schema(&conn).expect("first");
        init_schema(&conn).expect("second");
    }

    #[test]
    fn wire_text_uses_serde_renames() {
        assert_eq!(wire_text(&ApprovalStatus::Released), "released");
        assert_eq!(wire_text(&Progress::Scheduled), "scheduled");
        assert_eq!(from_wire::<Progress>("completed").unwrap(), Progress::Completed);
        assert!(from_wire::<Progress>("Completed").is_err());
    }

    #[test]
    fn parse_dt_round_trips() {
        let now = Utc::now();
        let parsed = parse_dt(&dt_text(&now)).expect("parse");
        assert_eq!(parsed.timestamp_millis(), now.timestamp_millis());
    }
}
