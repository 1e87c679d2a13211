//! Core types and rules for the Vouch supplier compliance tracker.
//!
//! - [`supplier`]: the record, its editable draft and the persisted envelope.
//! - [`compliance`]: completion and recheck rules applied on every save.
//! - [`pipeline`]: search, filter, sort and pagination over a collection.
//! - [`controller`]: the command interface that owns the collection.
//! - [`report`] and [`schedule`]: the daily summary and its trigger.
//! - [`store`]: the traits persistence backends implement.
//!
//! No HTTP, no database.

pub mod compliance;
pub mod controller;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod schedule;
pub mod store;
pub mod supplier;

pub use error::{Error, Result};
