//! Error types for `campus-core`.

use std::time::Duration;

use thiserror::Error;

/// A boxed backend error, as produced by a [`SchemaStore`](crate::store::SchemaStore).
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// The database could not be reached at all.
  #[error("cannot reach database: {0}")]
  Connection(#[source] StoreError),

  /// The migration ledger could not be created, read or written.
  #[error("migration ledger error: {0}")]
  Ledger(#[source] StoreError),

  #[error("{step} timed out after {after:?}")]
  Timeout { step: String, after: Duration },

  #[error("cannot initialise {table}: parent table {parent} does not exist")]
  MissingDependency { table: String, parent: String },

  #[error("table {table} declares a dependency on unknown table {parent}")]
  UnknownDependency { table: String, parent: String },

  #[error("table {0} is declared more than once")]
  DuplicateTable(String),

  #[error("dependency cycle between tables: {}", .0.join(", "))]
  DependencyCycle(Vec<String>),

  #[error("initialiser for {table} failed: {source}")]
  Initializer {
    table:  String,
    #[source]
    source: StoreError,
  },

  #[error("schema file unusable: {0}")]
  SchemaFile(String),

  #[error("invalid setting: {0}")]
  InvalidSetting(String),

  #[error("bootstrap cannot start from state {0}")]
  InvalidState(crate::BootstrapState),

  #[error("store error: {0}")]
  Store(#[source] StoreError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) fn boxed<E>(e: E) -> StoreError
where
  E: std::error::Error + Send + Sync + 'static,
{
  Box::new(e)
}
