// lib.rs
// Invoice lifecycle engine: computes due dates and recurrence schedules,
// classifies standing invoices, and reconciles payment notifications
// against their state. The surrounding app owns views, PDF rendering and
// email; this crate owns the lifecycle logic and the notification
// collection's shape.

pub mod error;
pub mod lifecycle;
pub mod models;
pub mod runner;
pub mod store;
