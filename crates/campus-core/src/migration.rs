//! Named migrations, the ledger that records them, and the runner that
//! applies each one at most once.

use std::{collections::HashSet, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  error::boxed,
  step::bounded,
  store::SchemaStore,
  table::TableSpec,
};

// ─── Declarations ────────────────────────────────────────────────────────────

/// A named schema mutation. Statements run in one transaction and must be
/// idempotent so that a migration converges against objects created outside
/// the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
  pub name:       &'static str,
  /// Catalog tables this migration creates. Their parents outside this list
  /// must already exist before it runs.
  pub creates:    &'static [&'static str],
  pub statements: &'static [&'static str],
}

/// Check that `migrations`, applied in order, never create a table before
/// one of its parents.
pub fn check_migration_order(
  migrations: &[Migration],
  tables: &[TableSpec],
) -> Result<()> {
  let mut created: HashSet<&str> = HashSet::new();

  for migration in migrations {
    for name in migration.creates {
      let spec = tables
        .iter()
        .find(|t| t.name == *name)
        .ok_or_else(|| Error::UnknownDependency {
          table:  migration.name.to_owned(),
          parent: (*name).to_owned(),
        })?;

      let unmet = spec.parents.iter().find(|parent| {
        **parent != spec.name
          && !created.contains(*parent)
          && !migration.creates.contains(*parent)
      });
      if let Some(parent) = unmet {
        return Err(Error::MissingDependency {
          table:  spec.name.to_owned(),
          parent: (*parent).to_owned(),
        });
      }
    }
    created.extend(migration.creates.iter().copied());
  }

  Ok(())
}

/// One row of the `migrations` ledger table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
  pub name:          String,
  pub success:       bool,
  pub executed_at:   DateTime<Utc>,
  pub error_message: Option<String>,
}

/// The result of a single migration attempt, as written to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
  Succeeded,
  Failed(String),
}

impl MigrationOutcome {
  pub fn is_success(&self) -> bool { matches!(self, Self::Succeeded) }

  pub fn error_message(&self) -> Option<&str> {
    match self {
      Self::Succeeded => None,
      Self::Failed(msg) => Some(msg),
    }
  }
}

/// Summary of one [`MigrationRunner::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
  pub applied: Vec<String>,
  pub skipped: Vec<String>,
  /// `(name, error message)` for each migration that failed this run.
  pub failed:  Vec<(String, String)>,
}

impl MigrationReport {
  pub fn has_failures(&self) -> bool { !self.failed.is_empty() }
}

// ─── Runner ──────────────────────────────────────────────────────────────────

/// Applies a fixed, ordered list of migrations, consulting and updating the
/// ledger.
///
/// A failing migration is recorded with `success = false` and does not stop
/// the run. Ledger failures and timeouts do.
pub struct MigrationRunner<'a, S> {
  store:      &'a S,
  migrations: &'static [Migration],
  tables:     &'static [TableSpec],
  timeout:    Duration,
}

impl<'a, S> MigrationRunner<'a, S>
where
  S: SchemaStore,
{
  pub fn new(
    store: &'a S,
    migrations: &'static [Migration],
    tables: &'static [TableSpec],
    timeout: Duration,
  ) -> Self {
    Self { store, migrations, tables, timeout }
  }

  pub async fn run(&self) -> Result<MigrationReport> {
    let mut report = MigrationReport::default();

    for migration in self.migrations {
      let existing = bounded(
        "ledger lookup",
        self.timeout,
        self.store.ledger_record(migration.name),
      )
      .await?
      .map_err(|e| Error::Ledger(boxed(e)))?;

      if existing.is_some_and(|r| r.success) {
        tracing::debug!(migration = migration.name, "already applied, skipping");
        report.skipped.push(migration.name.to_owned());
        continue;
      }

      let outcome = match self.unmet_dependency(migration).await? {
        Some(e) => MigrationOutcome::Failed(e.to_string()),
        None => {
          let step = format!("migration {}", migration.name);
          match bounded(&step, self.timeout, self.store.execute_migration(migration)).await? {
            Ok(()) => MigrationOutcome::Succeeded,
            Err(e) => MigrationOutcome::Failed(e.to_string()),
          }
        }
      };

      bounded(
        "ledger write",
        self.timeout,
        self.store.record_outcome(migration.name, &outcome),
      )
      .await?
      .map_err(|e| Error::Ledger(boxed(e)))?;

      match outcome {
        MigrationOutcome::Succeeded => {
          tracing::info!(migration = migration.name, "migration applied");
          report.applied.push(migration.name.to_owned());
        }
        MigrationOutcome::Failed(msg) => {
          tracing::warn!(migration = migration.name, error = %msg, "migration failed");
          report.failed.push((migration.name.to_owned(), msg));
        }
      }
    }

    Ok(report)
  }

  /// The first parent of a table created by `migration` that neither exists
  /// nor is created by the migration itself. SQLite accepts a `REFERENCES`
  /// clause to a missing table, so this is checked before executing.
  async fn unmet_dependency(&self, migration: &Migration) -> Result<Option<Error>> {
    for name in migration.creates {
      let Some(spec) = self.tables.iter().find(|t| t.name == *name) else {
        continue;
      };
      for parent in spec.parents {
        if *parent == spec.name || migration.creates.contains(parent) {
          continue;
        }
        let exists = bounded(
          &format!("existence check for {parent}"),
          self.timeout,
          self.store.table_exists(parent),
        )
        .await?
        .map_err(|e| Error::Store(boxed(e)))?;

        if !exists {
          return Ok(Some(Error::MissingDependency {
            table:  spec.name.to_owned(),
            parent: (*parent).to_owned(),
          }));
        }
      }
    }
    Ok(None)
  }

  /// Declared migrations without a successful ledger row, in declared order.
  pub async fn missing(&self) -> Result<Vec<&'static str>> {
    let records = bounded("ledger read", self.timeout, self.store.ledger())
      .await?
      .map_err(|e| Error::Ledger(boxed(e)))?;

    let done: HashSet<&str> = records
      .iter()
      .filter(|r| r.success)
      .map(|r| r.name.as_str())
      .collect();

    Ok(
      self
        .migrations
        .iter()
        .map(|m| m.name)
        .filter(|name| !done.contains(name))
        .collect(),
    )
  }

  /// `true` iff every declared migration has a successful ledger row.
  pub async fn check_complete(&self) -> Result<bool> {
    Ok(self.missing().await?.is_empty())
  }
}
