//! Database module: row models and SQL repositories.
//!
//! This module is split into two submodules:
//! - `model`: view models returned by queries that join several tables.
//! - `repo`: SQL-only functions that map rows into entities.
//!
//! Handlers import from `eventdesk::db`; the repository API and the view
//! models are re-exported here.

pub mod model;
pub mod repo;

pub use repo::*;

pub use model::{
    AdminRecord, EventSummary, EventTrainerLink, EventWithTrainers, NewInvoice, ReviewWithSummary,
    UserSummary,
};
