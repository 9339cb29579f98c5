//! SQLite backend for the Campus schema bootstrap and settings rows.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The entity catalog and the declared
//! migrations live here because their DDL is SQLite-specific.

mod encode;
mod settings;
mod store;

pub mod catalog;
pub mod error;
pub mod migrations;
pub mod schema;

pub use catalog::ENTITIES;
pub use error::{Error, Result};
pub use migrations::MIGRATIONS;
pub use store::{OpenOptions, SqliteStore};

use campus_core::{BootstrapPlan, schema_file::SchemaSource, table::render_schema};

/// A bootstrap plan over the full entity catalog and migration list.
///
/// Without an explicit schema file the fallback tier uses the script rendered
/// from the catalog itself.
pub fn default_plan(schema_file: Option<std::path::PathBuf>) -> Result<BootstrapPlan> {
  let schema = match schema_file {
    Some(path) => SchemaSource::File(path),
    None => SchemaSource::Inline(render_schema(ENTITIES)?),
  };
  Ok(BootstrapPlan::new(MIGRATIONS, ENTITIES).with_schema(schema))
}
