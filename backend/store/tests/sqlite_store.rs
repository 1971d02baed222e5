//! End-to-end coverage of the relational backend through the `Store` trait.

use chrono::Utc;
use store::ids::{self, NumberRange};
use store::model::{
    Address, Appointment, AppointmentPatch, ApprovalStatus, Contact, Customer, CustomerPatch,
    CustomerVehicle, EstimateItem, InventoryCategory, InventoryItem, InventoryPatch, Invoice,
    JobCard, JobCardStatus, Mechanic, PaymentStatus, Procurement, ProcurementItem,
    ProcurementService, Profile, Progress, RequiredItem, Role, ServiceLane, ServiceUpsert, User,
};
use store::{SqliteStore, Store, StoreError};

async fn seeded_store() -> SqliteStore {
    let store = SqliteStore::open_in_memory().expect("open in-memory store");
    store
        .seed_ranges(&ids::default_ranges())
        .await
        .expect("seed ranges");
    store
}

fn vehicle(plate: &str) -> CustomerVehicle {
    CustomerVehicle {
        vehicle_id: plate.to_owned(),
        make: "Maruti".to_owned(),
        model: "Swift".to_owned(),
        fuel_type: "petrol".to_owned(),
        year: Some(2019),
        vin: Some(format!("VIN-{plate}")),
        plate_number: plate.to_owned(),
    }
}

fn customer(customer_id: &str, plate: &str) -> Customer {
    Customer {
        customer_id: customer_id.to_owned(),
        customer_name: "Asha Rao".to_owned(),
        gst_number: Some("29ABCDE1234F1Z5".to_owned()),
        contact: Contact {
            phone: Some("9876543210".to_owned()),
            email: Some("asha@example.com".to_owned()),
            address: Some(Address {
                street: Some("1 MG Road".to_owned()),
                city: Some("Bengaluru".to_owned()),
                state: Some("KA".to_owned()),
                zip: Some("560001".to_owned()),
                country: None,
            }),
        },
        vehicles: vec![vehicle(plate)],
    }
}

fn appointment(appointment_id: &str, vehicle_id: &str, status: Progress) -> Appointment {
    Appointment {
        appointment_id: appointment_id.to_owned(),
        customer_id: "CUST-1001".to_owned(),
        vehicle_id: vehicle_id.to_owned(),
        mechanic_id: None,
        km: Some(42_000),
        services_estimate: Vec::new(),
        services_actual: Vec::new(),
        appointment_date: Some(Utc::now()),
        appointment_time: Some("10:30".to_owned()),
        status,
        telecaller: "self".to_owned(),
        notes: None,
    }
}

fn service_upsert(description: &str) -> ServiceUpsert {
    ServiceUpsert {
        service_id: None,
        service_description: description.to_owned(),
        price: 1500.0,
        service_type: "maintenance".to_owned(),
        status: Some(ApprovalStatus::Approved),
        service_status: Some(Progress::Scheduled),
        items_required: vec![RequiredItem {
            item_id: "ITM-1".to_owned(),
            item_name: "engine oil".to_owned(),
            qty: Some("4".to_owned()),
            tax: Some("18".to_owned()),
            discount: None,
        }],
    }
}

#[tokio::test]
async fn allocator_mints_sequential_ids() {
    let store = seeded_store().await;
    assert_eq!(store.allocate_id("CUST").await.unwrap(), "CUST-1001");
    assert_eq!(store.allocate_id("CUST").await.unwrap(), "CUST-1002");
    assert_eq!(store.allocate_id("JOB").await.unwrap(), "JOB-1");
}

#[tokio::test]
async fn allocator_rejects_unknown_prefix() {
    let store = seeded_store().await;
    match store.allocate_id("NOPE").await {
        Err(StoreError::RangeMissing(prefix)) => assert_eq!(prefix, "NOPE"),
        other => panic!("expected RangeMissing, got {other:?}"),
    }
}

#[tokio::test]
async fn allocator_stops_at_range_end_without_burning_numbers() {
    let store = seeded_store().await;
    store
        .seed_ranges(&[NumberRange::new("Tiny", "TINY", 0, 2)])
        .await
        .unwrap();
    assert_eq!(store.allocate_id("TINY").await.unwrap(), "TINY-1");
    assert_eq!(store.allocate_id("TINY").await.unwrap(), "TINY-2");
    for _ in 0..2 {
        match store.allocate_id("TINY").await {
            Err(StoreError::RangeExhausted(prefix)) => assert_eq!(prefix, "TINY"),
            other => panic!("expected RangeExhausted, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn seeding_twice_keeps_running_numbers() {
    let store = seeded_store().await;
    store.allocate_id("CUST").await.unwrap();
    store.seed_ranges(&ids::default_ranges()).await.unwrap();
    assert_eq!(store.allocate_id("CUST").await.unwrap(), "CUST-1002");
}

#[tokio::test]
async fn customer_round_trips_with_vehicles() {
    let store = seeded_store().await;
    let created = customer("CUST-1001", "KA01AB1234");
    store.insert_customer(&created).await.unwrap();

    let loaded = store.get_customer("CUST-1001").await.unwrap().expect("present");
    assert_eq!(loaded, created);

    let all = store.list_customers().await.unwrap();
    assert_eq!(all.len(), 1);

    assert!(store.get_customer("CUST-9999").await.unwrap().is_none());
}

#[tokio::test]
async fn customer_patch_updates_only_given_fields() {
    let store = seeded_store().await;
    store
        .insert_customer(&customer("CUST-1001", "KA01AB1234"))
        .await
        .unwrap();

    let patch = CustomerPatch {
        customer_name: Some("Asha R. Rao".to_owned()),
        ..CustomerPatch::default()
    };
    let updated = store
        .update_customer("CUST-1001", &patch)
        .await
        .unwrap()
        .expect("present");
    assert_eq!(updated.customer_name, "Asha R. Rao");
    assert_eq!(updated.gst_number.as_deref(), Some("29ABCDE1234F1Z5"));
    assert_eq!(updated.vehicles.len(), 1);
}

#[tokio::test]
async fn vehicle_upsert_merges_by_plate_and_mirrors_registry() {
    let store = seeded_store().await;
    store
        .insert_customer(&customer("CUST-1001", "KA01AB1234"))
        .await
        .unwrap();

    let incoming = vec![
        CustomerVehicle {
            // Same plate, new model, no year/vin: those stay as stored.
            vehicle_id: String::new(),
            make: "Maruti".to_owned(),
            model: "Swift ZXi".to_owned(),
            fuel_type: "petrol".to_owned(),
            year: None,
            vin: None,
            plate_number: "KA01AB1234".to_owned(),
        },
        vehicle("KA05XY9999"),
    ];
    let updated = store
        .upsert_customer_vehicles("CUST-1001", &incoming)
        .await
        .unwrap()
        .expect("present");

    assert_eq!(updated.vehicles.len(), 2);
    let swift = updated
        .vehicles
        .iter()
        .find(|v| v.plate_number == "KA01AB1234")
        .expect("swift");
    assert_eq!(swift.model, "Swift ZXi");
    assert_eq!(swift.year, Some(2019));
    assert_eq!(swift.vin.as_deref(), Some("VIN-KA01AB1234"));

    let registry = store.vehicles_for_customer("CUST-1001").await.unwrap();
    assert_eq!(registry.len(), 2);
    let new_entry = store.get_vehicle("KA05XY9999").await.unwrap().expect("registered");
    assert_eq!(new_entry.customer_id, "CUST-1001");

    assert!(store
        .upsert_customer_vehicles("CUST-9999", &incoming)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn customer_delete_reports_absence() {
    let store = seeded_store().await;
    store
        .insert_customer(&customer("CUST-1001", "KA01AB1234"))
        .await
        .unwrap();
    assert!(store.delete_customer("CUST-1001").await.unwrap());
    assert!(!store.delete_customer("CUST-1001").await.unwrap());
}

#[tokio::test]
async fn open_appointment_blocks_only_non_completed() {
    let store = seeded_store().await;
    store
        .insert_appointment(&appointment("APMT-1", "KA01AB1234", Progress::Completed))
        .await
        .unwrap();
    assert!(store
        .open_appointment_for_vehicle("KA01AB1234")
        .await
        .unwrap()
        .is_none());

    store
        .insert_appointment(&appointment("APMT-2", "KA01AB1234", Progress::Scheduled))
        .await
        .unwrap();
    let open = store
        .open_appointment_for_vehicle("KA01AB1234")
        .await
        .unwrap()
        .expect("blocking appointment");
    assert_eq!(open.appointment_id, "APMT-2");
}

#[tokio::test]
async fn service_upserts_mint_ids_and_join_items() {
    let store = seeded_store().await;
    store
        .insert_appointment(&appointment("APMT-1", "KA01AB1234", Progress::Scheduled))
        .await
        .unwrap();

    let updated = store
        .upsert_services("APMT-1", ServiceLane::Actual, vec![service_upsert("Oil change")])
        .await
        .unwrap()
        .expect("appointment present");
    assert_eq!(updated.services_actual.len(), 1);
    let service = &updated.services_actual[0];
    assert_eq!(service.service_id, "SER-1");
    assert_eq!(service.items_required.len(), 1);
    assert_eq!(service.items_required[0].item_name, "engine oil");

    // Re-upsert under the minted id: updates in place, extends items.
    let mut second = service_upsert("Oil + filter change");
    second.service_id = Some("SER-1".to_owned());
    second.items_required.push(RequiredItem {
        item_id: "ITM-2".to_owned(),
        item_name: "oil filter".to_owned(),
        qty: Some("1".to_owned()),
        tax: None,
        discount: None,
    });
    let updated = store
        .upsert_services("APMT-1", ServiceLane::Actual, vec![second])
        .await
        .unwrap()
        .expect("appointment present");
    assert_eq!(updated.services_actual.len(), 1);
    assert_eq!(
        updated.services_actual[0].service_description,
        "Oil + filter change"
    );
    assert_eq!(updated.services_actual[0].items_required.len(), 2);

    // The estimate lane is untouched.
    assert!(updated.services_estimate.is_empty());

    assert!(store
        .upsert_services("APMT-404", ServiceLane::Actual, vec![service_upsert("x")])
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn service_status_updates_target_one_service() {
    let store = seeded_store().await;
    store
        .insert_appointment(&appointment("APMT-1", "KA01AB1234", Progress::Scheduled))
        .await
        .unwrap();
    store
        .upsert_services("APMT-1", ServiceLane::Actual, vec![service_upsert("Oil change")])
        .await
        .unwrap();

    let updated = store
        .update_service_status("APMT-1", "SER-1", Progress::Completed)
        .await
        .unwrap()
        .expect("service present");
    assert_eq!(
        updated.services_actual[0].service_status,
        Some(Progress::Completed)
    );

    assert!(store
        .update_service_status("APMT-1", "SER-404", Progress::Completed)
        .await
        .unwrap()
        .is_none());

    let lane = store
        .services_actual("APMT-1")
        .await
        .unwrap()
        .expect("appointment present");
    assert_eq!(lane.len(), 1);
    assert!(store.services_actual("APMT-404").await.unwrap().is_none());
}

#[tokio::test]
async fn appointment_patch_and_mechanic_assignment() {
    let store = seeded_store().await;
    store
        .insert_appointment(&appointment("APMT-1", "KA01AB1234", Progress::Scheduled))
        .await
        .unwrap();

    let patch = AppointmentPatch {
        status: Some(Progress::Completed),
        notes: Some("done early".to_owned()),
        ..AppointmentPatch::default()
    };
    let updated = store
        .update_appointment("APMT-1", &patch)
        .await
        .unwrap()
        .expect("present");
    assert_eq!(updated.status, Progress::Completed);
    assert_eq!(updated.notes.as_deref(), Some("done early"));
    assert_eq!(updated.km, Some(42_000));

    let updated = store
        .assign_mechanic("APMT-1", "MECH-9")
        .await
        .unwrap()
        .expect("present");
    assert_eq!(updated.mechanic_id.as_deref(), Some("MECH-9"));

    let updated = store.update_km("APMT-1", 43_500).await.unwrap().expect("present");
    assert_eq!(updated.km, Some(43_500));

    assert!(store.assign_mechanic("APMT-404", "MECH-9").await.unwrap().is_none());
}

#[tokio::test]
async fn appointment_delete_cascades_services_and_items() {
    let store = seeded_store().await;
    store
        .insert_appointment(&appointment("APMT-1", "KA01AB1234", Progress::Scheduled))
        .await
        .unwrap();
    store
        .upsert_services("APMT-1", ServiceLane::Actual, vec![service_upsert("Oil change")])
        .await
        .unwrap();

    assert!(store.delete_appointment("APMT-1").await.unwrap());
    assert!(store.get_appointment("APMT-1").await.unwrap().is_none());
    assert!(!store.delete_appointment("APMT-1").await.unwrap());
}

#[tokio::test]
async fn procurement_links_surface_pr_no_on_actual_services() {
    let store = seeded_store().await;
    store
        .insert_appointment(&appointment("APMT-1", "KA01AB1234", Progress::Scheduled))
        .await
        .unwrap();
    store
        .upsert_services("APMT-1", ServiceLane::Actual, vec![service_upsert("Oil change")])
        .await
        .unwrap();

    let procurement = Procurement {
        procurement_id: "PROC-1".to_owned(),
        appointment_id: "APMT-1".to_owned(),
        customer_id: "CUST-1001".to_owned(),
        vehicle_id: "KA01AB1234".to_owned(),
        mechanic_id: "MECH-9".to_owned(),
        services: vec![ProcurementService {
            service_id: "SER-1".to_owned(),
            service_description: "Oil change".to_owned(),
            price: 1500.0,
            items_required: vec![ProcurementItem {
                inventory_id: "INV-1".to_owned(),
                part_name: "engine oil".to_owned(),
                quantity: 4,
                price: 450.0,
                status: ApprovalStatus::Pending,
            }],
        }],
        appointment_date: Utc::now(),
        appointment_time: "10:30".to_owned(),
        status: Progress::Scheduled,
        telecaller: "self".to_owned(),
        notes: None,
    };
    store.insert_procurement(&procurement).await.unwrap();

    let loaded = store
        .get_appointment("APMT-1")
        .await
        .unwrap()
        .expect("present");
    assert_eq!(loaded.services_actual[0].pr_no.as_deref(), Some("PROC-1"));

    let round_trip = store
        .get_procurement("PROC-1")
        .await
        .unwrap()
        .expect("present");
    assert_eq!(round_trip.services.len(), 1);

    assert!(store.delete_procurement("PROC-1").await.unwrap());
    let loaded = store
        .get_appointment("APMT-1")
        .await
        .unwrap()
        .expect("present");
    assert_eq!(loaded.services_actual[0].pr_no, None);
}

#[tokio::test]
async fn job_card_status_transitions() {
    let store = seeded_store().await;
    let card = JobCard {
        job_card_id: "JOB-1".to_owned(),
        vehicle_id: "KA01AB1234".to_owned(),
        customer_id: "CUST-1001".to_owned(),
        estimate_items: vec![EstimateItem {
            description: "Replace brake pads".to_owned(),
            spare_list: "Brake pad set".to_owned(),
            qty: 1,
            rate: 2400.0,
            discount: 0.0,
            estimated_amount: 2400.0,
        }],
        status: JobCardStatus::Pending,
        created_at: Utc::now(),
    };
    store.insert_job_card(&card).await.unwrap();

    let accepted = store
        .set_job_card_status("JOB-1", JobCardStatus::Accepted)
        .await
        .unwrap()
        .expect("present");
    assert_eq!(accepted.status, JobCardStatus::Accepted);
    assert_eq!(accepted.estimate_items.len(), 1);

    assert!(store
        .set_job_card_status("JOB-404", JobCardStatus::Accepted)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn inventory_crud_round_trips() {
    let store = seeded_store().await;
    let item = InventoryItem {
        inventory_id: "INV-1".to_owned(),
        part_name: "engine oil".to_owned(),
        part_number: "EO-5W30".to_owned(),
        description: "Synthetic 5W30".to_owned(),
        category: InventoryCategory::Spares,
        quantity: 40,
        price: 450.0,
        orders: Vec::new(),
        suppliers: vec!["SUP-1".to_owned()],
    };
    store.insert_inventory_item(&item).await.unwrap();

    let patch = InventoryPatch {
        quantity: Some(36),
        ..InventoryPatch::default()
    };
    let updated = store
        .update_inventory_item("INV-1", &patch)
        .await
        .unwrap()
        .expect("present");
    assert_eq!(updated.quantity, 36);
    assert_eq!(updated.part_name, "engine oil");

    assert!(store.delete_inventory_item("INV-1").await.unwrap());
    assert!(store.get_inventory_item("INV-1").await.unwrap().is_none());
}

#[tokio::test]
async fn mechanic_duplicate_id_is_rejected() {
    let store = seeded_store().await;
    let mechanic = Mechanic {
        mechanic_id: "MECH-9".to_owned(),
        mechanic_name: "Ravi Kumar".to_owned(),
        contact: Contact {
            phone: Some("9000000001".to_owned()),
            email: None,
            address: None,
        },
        specialties: vec!["engine".to_owned(), "transmission".to_owned()],
    };
    store.insert_mechanic(&mechanic).await.unwrap();
    match store.insert_mechanic(&mechanic).await {
        Err(StoreError::Duplicate(id)) => assert_eq!(id, "MECH-9"),
        other => panic!("expected Duplicate, got {other:?}"),
    }

    let loaded = store.get_mechanic("MECH-9").await.unwrap().expect("present");
    assert_eq!(loaded.specialties.len(), 2);
}

#[tokio::test]
async fn invoice_payment_stamps_date() {
    let store = seeded_store().await;
    let invoice = Invoice {
        invoice_id: "INVC-1".to_owned(),
        appointment_id: "APMT-1".to_owned(),
        customer_id: "CUST-1001".to_owned(),
        total_amount: 1500.0,
        payment_status: PaymentStatus::Pending,
        payment_date: None,
    };
    store.insert_invoice(&invoice).await.unwrap();

    let paid_at = Utc::now();
    let paid = store
        .mark_invoice_paid("INVC-1", paid_at)
        .await
        .unwrap()
        .expect("present");
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(
        paid.payment_date.map(|d| d.timestamp()),
        Some(paid_at.timestamp())
    );

    assert!(store.mark_invoice_paid("INVC-404", paid_at).await.unwrap().is_none());
}

#[tokio::test]
async fn user_uniqueness_covers_username_and_email() {
    let store = seeded_store().await;
    let user = User {
        user_id: "USER-1".to_owned(),
        username: "frontdesk".to_owned(),
        password_hash: "$2b$10$hash".to_owned(),
        email: "frontdesk@example.com".to_owned(),
        role: Role::Customer,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        profile: Profile::default(),
    };
    store.insert_user(&user).await.unwrap();

    let mut same_email = user.clone();
    same_email.user_id = "USER-2".to_owned();
    same_email.username = "backoffice".to_owned();
    assert!(matches!(
        store.insert_user(&same_email).await,
        Err(StoreError::Duplicate(_))
    ));

    let mut same_name = user.clone();
    same_name.user_id = "USER-3".to_owned();
    same_name.email = "other@example.com".to_owned();
    assert!(matches!(
        store.insert_user(&same_name).await,
        Err(StoreError::Duplicate(_))
    ));

    let found = store
        .find_user_by_email("frontdesk@example.com")
        .await
        .unwrap()
        .expect("present");
    assert_eq!(found.user_id, "USER-1");
    assert!(store
        .find_user_by_email("nobody@example.com")
        .await
        .unwrap()
        .is_none());
}
