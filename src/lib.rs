//! Documentation of the vehicle service shop backend.
//!
//! # General Infrastructure
//! - One Rust server carries the REST API and the chat WebSocket on a single
//!   port.
//! - Persistence sits behind one trait with two interchangeable backends:
//!   Redis holds each entity as a JSON document in a per-collection hash,
//!   SQLite holds the same domain normalized into tables with joins. The
//!   `STORE_BACKEND` environment variable picks one at startup.
//! - Meilisearch is optional and only serves the customer search proxy; the
//!   backend runs fine without it.
//!
//! # Human-Readable Ids
//! Every entity id the frontend shows (`CUST-1042`, `JOB-57`, ...) comes out
//! of a shared counter keyed by prefix, bounded by a pre-allocated numeric
//! range. Minting is atomic on both backends: a guarded single-statement
//! `UPDATE` on SQLite, a server-side Lua script on Redis. When a range runs
//! out, allocation fails loudly instead of wrapping; a failed mint never
//! consumes a number.
//!
//! Vehicles are the exception: their plate number is their id, so they never
//! touch the counter. Mechanics bring their own ids.
//!
//! # Redis Layout
//! - One hash per collection (`shop:customers`, `shop:appointments`, ...),
//!   field = entity id, value = JSON document
//! - `shop:users:email` and `shop:users:name` index users for login and
//!   uniqueness
//! - `shop:ranges` holds the id ranges, mutated only by the allocator script
//!
//! # SQLite Layout
//! Appointments are fully normalized (`appointments`, `services_estimate`,
//! `services_actual`, `items_required`) and reassembled with left joins;
//! `procurement_services` links services to their procurement number, an
//! enrichment only this backend can surface. Everything else is one table per
//! entity with JSON text columns for low-churn nested lists.
//!
//! # Setup
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
//!
//! Run the server against SQLite (the default backend).
//! ```sh
//! cargo run -p server
//! ```
//!
//! Run against Redis.
//! ```sh
//! STORE_BACKEND=redis REDIS_URL=redis://127.0.0.1:6379 cargo run -p server
//! ```
//!
//! Smoke-test a running instance.
//! ```sh
//! cargo run -p tester -- http://127.0.0.1:9000
//! ```

pub mod api;
