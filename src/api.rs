//! # Frontend Specifications
//!
//! The wire surface the frontend programs against.
//!
//! ## Authentication
//! - `POST /auth/register` — username, password, email. Password policy:
//!   minimum 8 characters, an uppercase letter, a lowercase letter, a number
//!   and a special character.
//! - `POST /auth/login` — email + password, answers `{ "token": ... }`. The
//!   token is a bearer JWT (8 hours) carrying id, username and role.
//! - Customer routes require `Authorization: Bearer <token>`; the rest of
//!   the API is open.
//!
//! ## REST Resources
//! - `/customer` — CRUD plus `PUT /customer/vehicles/{id}` (vehicle list
//!   upsert, keyed by plate) and `GET /customer/search?q=&city=` (Meilisearch
//!   proxy, 503 when search is not configured).
//! - `/vehicle` — registry reads: all, by plate, by customer.
//! - `/appointment` — CRUD plus service-lane upserts
//!   (`POST .../services_estimate`, `POST .../services_actual`), mechanic
//!   assignment, km update, actual-services read and per-service status
//!   update. Booking a vehicle that already has a non-completed appointment
//!   answers 409 with the blocking appointment attached.
//! - `/jobcard` — create/list/get, `PUT .../status` (pending → accepted) and
//!   `POST .../apply`, which pushes the card's estimate lines into the open
//!   appointment of its vehicle.
//! - `/inventory`, `/procurement`, `/mechanic`, `/supplier` — CRUD.
//! - `/invoice` — raised from an appointment (total = sum of actual service
//!   prices), listed, fetched, and settled via `PUT /invoice/{id}/pay`.
//!
//! ## Validation Errors
//! Field problems answer 400 with `{ "errors": ["...", ...] }`, one message
//! per violation, all violations in one response.
//!
//! ## Chat
//! `GET /chat/ws` upgrades to a WebSocket. Events are JSON with a `type`
//! tag:
//!
//! - client → server: `{"type":"joinRoom","username":...,"room":...}` then
//!   `{"type":"chatMessage","text":...}`
//! - server → client: `{"type":"chatMessage","username":...,"text":...,
//!   "time":"HH:MM"}`
//!
//! Joining announces "X has joined the room." to existing members; leaving
//! announces "X has left the room.". A connection that chats before joining
//! is relayed as `Anonymous` in `General`.
