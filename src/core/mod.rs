//! Core business logic, independent of any front end.
//!
//! Every mutating operation takes the caller's [`RequestContext`](crate::context::RequestContext)
//! and runs inside one database transaction. Helpers that take a generic
//! `ConnectionTrait` are meant to be called with that open transaction.

pub mod batch;
pub mod inventory;
pub mod invoice;
pub mod medicine;
pub mod movement;
pub mod order;
pub mod party;
pub mod recall;
pub mod report;
pub mod sales;
pub mod shipment;
pub mod unit;
