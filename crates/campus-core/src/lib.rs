//! Core types and bootstrap logic for the Campus school-management backend.
//!
//! This crate is free of SQL dialects and HTTP. It describes the
//! entity tables, the migration ledger and the settings rows, and drives the
//! tiered bootstrap (migrations, schema file, direct table initialisation)
//! against any backend implementing [`store::SchemaStore`].

// Native `async fn` in traits; see `store.rs` for the `Send` bounds.
#![allow(async_fn_in_trait)]

pub mod bootstrap;
pub mod error;
pub mod initializer;
pub mod migration;
pub mod schema_file;
pub mod settings;
pub mod store;
pub mod table;

mod step;

pub use bootstrap::{
  Bootstrap, BootstrapPlan, BootstrapReport, BootstrapState, ReadyVia,
  initialize_database,
};
pub use error::{Error, Result};

#[cfg(test)]
mod tests;
