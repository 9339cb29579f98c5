//! The `SchemaStore` and `SettingsStore` traits.
//!
//! Implemented by storage backends (e.g. `campus-store-sqlite`). The
//! bootstrap logic in this crate and the HTTP layer depend on these
//! abstractions, never on a concrete backend, and receive the store handle
//! explicitly rather than through a process-wide global.

use std::future::Future;

use crate::{
  migration::{Migration, MigrationOutcome, MigrationRecord},
  settings::{
    SecuritySettings, SecuritySettingsUpdate, SystemSettings, SystemSettingsUpdate,
  },
  table::TableSpec,
};

/// Primitive schema operations used by the bootstrap tiers.
///
/// All methods return `Send` futures so the trait can be used from a
/// multi-threaded runtime.
pub trait SchemaStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Cheap round trip proving the database is reachable.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Ledger ────────────────────────────────────────────────────────────

  /// Create the `migrations` ledger table if it does not exist.
  fn ensure_ledger(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// All ledger rows, ordered by name.
  fn ledger(
    &self,
  ) -> impl Future<Output = Result<Vec<MigrationRecord>, Self::Error>> + Send + '_;

  fn ledger_record<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<MigrationRecord>, Self::Error>> + Send + 'a;

  /// Upsert the ledger row for `name`; there is never more than one.
  fn record_outcome<'a>(
    &'a self,
    name: &'a str,
    outcome: &'a MigrationOutcome,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Run every statement of `migration` in a single transaction.
  fn execute_migration(
    &self,
    migration: &'static Migration,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Tables ────────────────────────────────────────────────────────────

  fn table_exists<'a>(
    &'a self,
    table: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Execute the table's DDL. Must be idempotent and never recreate a table
  /// that already holds data.
  fn create_table(
    &self,
    spec: &'static TableSpec,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Execute the table's seed statement atomically. Returns `true` if a row
  /// was inserted, `false` if the default row already existed.
  fn insert_defaults_if_empty(
    &self,
    spec: &'static TableSpec,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Schema file ───────────────────────────────────────────────────────

  /// Execute a multi-statement schema text as one batch. Either every
  /// statement takes effect or none does.
  fn apply_schema<'a>(
    &'a self,
    sql: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// Read and update the singleton settings rows seeded during bootstrap.
pub trait SettingsStore: SchemaStore {
  /// The current system settings row, `None` if it was never seeded.
  fn system_settings(
    &self,
  ) -> impl Future<Output = Result<Option<SystemSettings>, Self::Error>> + Send + '_;

  /// Apply `update` to the row in place (creating it from defaults if
  /// absent) and return the result.
  fn update_system_settings(
    &self,
    update: SystemSettingsUpdate,
  ) -> impl Future<Output = Result<SystemSettings, Self::Error>> + Send + '_;

  fn security_settings(
    &self,
  ) -> impl Future<Output = Result<Option<SecuritySettings>, Self::Error>> + Send + '_;

  fn update_security_settings(
    &self,
    update: SecuritySettingsUpdate,
  ) -> impl Future<Output = Result<SecuritySettings, Self::Error>> + Send + '_;
}
