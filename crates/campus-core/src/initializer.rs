//! Direct, per-entity table initialisation: the last bootstrap tier.

use std::time::Duration;

use serde::Serialize;

use crate::{
  Error, Result,
  error::boxed,
  step::bounded,
  store::SchemaStore,
  table::{TableSpec, initialization_order},
};

/// Tables touched by [`TableInitializers::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InitReport {
  /// Every table in the order it was initialised.
  pub initialized: Vec<String>,
  /// Singleton tables whose default row was inserted by this run.
  pub seeded:      Vec<String>,
}

/// Drives one initialiser per entity table in foreign-key order.
pub struct TableInitializers<'a, S> {
  store:   &'a S,
  tables:  &'static [TableSpec],
  timeout: Duration,
}

impl<'a, S> TableInitializers<'a, S>
where
  S: SchemaStore,
{
  pub fn new(store: &'a S, tables: &'static [TableSpec], timeout: Duration) -> Self {
    Self { store, tables, timeout }
  }

  pub async fn run(&self) -> Result<InitReport> {
    let order = initialization_order(self.tables)?;
    let mut report = InitReport::default();

    for spec in order {
      let seeded = self.initialize(spec).await?;
      report.initialized.push(spec.name.to_owned());
      if seeded {
        report.seeded.push(spec.name.to_owned());
      }
    }

    Ok(report)
  }

  /// Create one table, refusing to run before its parents exist, then seed
  /// its default row if it is a singleton. Returns whether a row was seeded.
  pub async fn initialize(&self, spec: &'static TableSpec) -> Result<bool> {
    for parent in spec.parents.iter().filter(|p| **p != spec.name) {
      let exists = bounded(
        &format!("existence check for {parent}"),
        self.timeout,
        self.store.table_exists(parent),
      )
      .await?
      .map_err(|e| initializer_error(spec, e))?;

      if !exists {
        return Err(Error::MissingDependency {
          table:  spec.name.to_owned(),
          parent: (*parent).to_owned(),
        });
      }
    }

    bounded(
      &format!("create {}", spec.name),
      self.timeout,
      self.store.create_table(spec),
    )
    .await?
    .map_err(|e| initializer_error(spec, e))?;

    let seeded = if spec.is_singleton() {
      bounded(
        &format!("seed {}", spec.name),
        self.timeout,
        self.store.insert_defaults_if_empty(spec),
      )
      .await?
      .map_err(|e| initializer_error(spec, e))?
    } else {
      false
    };

    tracing::debug!(table = spec.name, seeded, "table initialised");
    Ok(seeded)
  }
}

fn initializer_error<E>(spec: &TableSpec, e: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  Error::Initializer { table: spec.name.to_owned(), source: boxed(e) }
}
